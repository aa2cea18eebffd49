//! Host capability model
//!
//! Every browser measurement API the collector touches is reached through the
//! [`Host`] trait. Each capability accessor returns `Option`: `None` means the
//! host does not expose it at all (a non-browser context, an older engine) and
//! the probe depending on it skips silently. A capability that exists but
//! fails a specific call reports [`PerfError`](crate::error::PerfError)
//! instead.
//!
//! All default methods describe a host with no capabilities, so test hosts
//! and [`DetachedHost`] only override what they support.

use crate::error::Result;
use crate::probes::vitals::VitalsLibrary;
use futures::future::LocalBoxFuture;
use serde_json::Value;
use std::rc::Rc;
use tracing::debug;

/// Releases one continuous subscription
pub type Disposer = Box<dyn FnOnce() -> Result<()>>;

/// Listener invoked on every delivery of a lifecycle signal
pub type Handler = Rc<dyn Fn()>;

/// Pending acquisition of the external vitals library
pub type VitalsFuture = LocalBoxFuture<'static, Result<Rc<dyn VitalsLibrary>>>;

/// The navigation-timing record of the current page load.
///
/// Every timestamp is relative to the navigation start and may be missing in
/// partial or synthetic records.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NavigationTiming {
    pub navigation_type: Option<String>,
    pub domain_lookup_start: Option<f64>,
    pub domain_lookup_end: Option<f64>,
    pub connect_start: Option<f64>,
    pub connect_end: Option<f64>,
    pub secure_connection_start: Option<f64>,
    pub request_start: Option<f64>,
    pub response_start: Option<f64>,
    pub response_end: Option<f64>,
    pub dom_interactive: Option<f64>,
    pub dom_content_loaded_event_end: Option<f64>,
    pub dom_complete: Option<f64>,
    pub load_event_start: Option<f64>,
    pub load_event_end: Option<f64>,
}

/// A paint-timing entry (`first-paint`, `first-contentful-paint`)
#[derive(Debug, Clone, PartialEq)]
pub struct PaintEntry {
    pub name: String,
    pub start_time: f64,
}

/// A main-thread task that exceeded the host's long-task threshold
#[derive(Debug, Clone, PartialEq)]
pub struct LongTaskEntry {
    pub start_time: f64,
    pub duration: f64,
    pub attribution: Option<Value>,
}

/// Load timing and size data for one fetched sub-resource
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResourceEntry {
    /// The resource URL
    pub name: String,
    pub initiator_type: Option<String>,
    pub start_time: f64,
    pub duration: f64,
    pub transfer_size: Option<f64>,
    pub encoded_body_size: Option<f64>,
    pub decoded_body_size: Option<f64>,
    pub next_hop_protocol: Option<String>,
}

/// Network quality as reported by the connection-information extension
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConnectionInfo {
    pub effective_type: Option<String>,
    pub downlink: Option<f64>,
    pub rtt: Option<f64>,
    pub save_data: Option<bool>,
}

/// JS heap usage as reported by the memory-introspection extension
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MemoryInfo {
    pub js_heap_size_limit: Option<f64>,
    pub total_js_heap_size: Option<f64>,
    pub used_js_heap_size: Option<f64>,
}

/// Page lifecycle signals the collector listens for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LifecycleSignal {
    /// `visibilitychange` on the document
    VisibilityChange,
    /// `pagehide` on the window
    PageHide,
}

impl LifecycleSignal {
    pub fn event_name(&self) -> &'static str {
        match self {
            LifecycleSignal::VisibilityChange => "visibilitychange",
            LifecycleSignal::PageHide => "pagehide",
        }
    }
}

/// One-shot reads of buffered timing entries
pub trait TimingSource {
    /// The navigation entry of the current page, if the host recorded one
    fn navigation_entry(&self) -> Result<Option<NavigationTiming>>;

    fn paint_entries(&self) -> Result<Vec<PaintEntry>>;

    /// Navigation type from the deprecated `performance.navigation` object
    fn legacy_navigation_type(&self) -> Option<String> {
        None
    }
}

/// Continuous observation of performance entries.
///
/// Handlers receive each delivered batch in host order. The returned disposer
/// disconnects the observer.
pub trait EntryObserver {
    fn observe_long_tasks(&self, handler: Box<dyn FnMut(Vec<LongTaskEntry>)>) -> Result<Disposer>;

    fn observe_resources(&self, handler: Box<dyn FnMut(Vec<ResourceEntry>)>) -> Result<Disposer>;
}

/// Document readiness and the load-completion signal
pub trait DocumentState {
    /// `true` once the document reached the `complete` ready state
    fn is_complete(&self) -> bool;

    /// Run `handler` when the load signal fires
    fn on_load(&self, handler: Box<dyn FnOnce()>) -> Result<()>;
}

/// Page visibility and unload listeners
pub trait LifecycleSource {
    fn listen(&self, signal: LifecycleSignal, handler: Handler) -> Result<Disposer>;

    fn is_hidden(&self) -> bool;
}

/// The execution environment the collector measures
pub trait Host {
    /// URL of the current page
    fn page_url(&self) -> Option<String> {
        None
    }

    /// Wall-clock epoch milliseconds
    fn now_ms(&self) -> i64 {
        chrono::Utc::now().timestamp_millis()
    }

    /// Uniform draw in `[0, 1)`
    fn random(&self) -> f64 {
        uniform()
    }

    fn timing(&self) -> Option<&dyn TimingSource> {
        None
    }

    fn observer(&self) -> Option<&dyn EntryObserver> {
        None
    }

    fn document(&self) -> Option<&dyn DocumentState> {
        None
    }

    fn lifecycle(&self) -> Option<&dyn LifecycleSource> {
        None
    }

    /// Connection information exposed under `alias` on the navigator
    fn connection_info(&self, _alias: &str) -> Option<ConnectionInfo> {
        None
    }

    fn memory_info(&self) -> Option<MemoryInfo> {
        None
    }

    /// Start acquiring the external vitals library, if the host can load one
    fn vitals(&self) -> Option<VitalsFuture> {
        None
    }

    /// Schedule `task` on the host's local executor.
    ///
    /// Returns `false` when the host has no executor; the task is dropped.
    fn spawn_local(&self, _task: LocalBoxFuture<'static, ()>) -> bool {
        false
    }

    /// How the current page was entered, best-effort
    fn navigation_type(&self) -> Option<String> {
        let timing = self.timing()?;
        match timing.navigation_entry() {
            Ok(Some(NavigationTiming {
                navigation_type: Some(kind),
                ..
            })) => Some(kind),
            _ => timing.legacy_navigation_type(),
        }
    }
}

/// A host exposing no capabilities, e.g. server-side rendering
#[derive(Debug, Clone, Copy, Default)]
pub struct DetachedHost;

impl Host for DetachedHost {}

/// Uniform draw in `[0, 1)` from the OS/browser entropy source.
///
/// Falls back to `0.0` when no entropy is available, which keeps a zero rate
/// closed and a full rate open.
fn uniform() -> f64 {
    let mut bytes = [0u8; 8];
    match getrandom::getrandom(&mut bytes) {
        Ok(()) => (u64::from_le_bytes(bytes) >> 11) as f64 / (1u64 << 53) as f64,
        Err(e) => {
            debug!("Entropy unavailable for sampling: {}", e);
            0.0
        }
    }
}
