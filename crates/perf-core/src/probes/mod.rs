//! Independent measurement probes
//!
//! Each probe owns one measurement source and reports through the shared
//! [`Emitter`]. Probes never reference each other:
//!
//! | Probe | Source | Kind |
//! |-------|--------|------|
//! | [`VitalsProbe`] | external vitals library | async, self-contained |
//! | [`NavigationProbe`] | navigation-timing entry | one-shot after load |
//! | [`PaintProbe`] | paint-timing entries | one-shot after load |
//! | [`LongTaskProbe`] | `longtask` observer | continuous |
//! | [`ResourceProbe`] | `resource` observer, filtered and sampled | continuous |
//! | [`LifecycleProbe`] | `visibilitychange` / `pagehide` | continuous |
//! | [`SnapshotProbe`] | connection and memory extensions | one-shot |

pub mod lifecycle;
pub mod long_task;
pub mod navigation;
pub mod paint;
pub mod resource;
pub mod snapshot;
pub mod vitals;

pub use lifecycle::LifecycleProbe;
pub use long_task::LongTaskProbe;
pub use navigation::NavigationProbe;
pub use paint::PaintProbe;
pub use resource::{ResourceFilter, ResourceProbe};
pub use snapshot::{SnapshotProbe, CONNECTION_ALIASES};
pub use vitals::{MetricReport, NoopVitals, VitalMetric, VitalsLibrary, VitalsProbe};

use crate::emit::Emitter;
use crate::error::Result;
use crate::event::Event;
use crate::host::{Disposer, Host};
use std::rc::Rc;
use tracing::trace;

/// Everything a probe needs: the host it measures and where events go
#[derive(Clone)]
pub struct ProbeContext {
    pub host: Rc<dyn Host>,
    pub emitter: Emitter,
}

impl ProbeContext {
    pub fn new(host: Rc<dyn Host>, emitter: Emitter) -> Self {
        Self { host, emitter }
    }

    pub fn emit(&self, event: Event) {
        self.emitter.emit(event);
    }
}

/// A single measurement strategy.
///
/// `start` registers whatever the probe needs and returns a disposer when it
/// holds a continuous subscription. One-shot probes return `Ok(None)`. An
/// `Err` only affects this probe.
pub trait Probe {
    fn name(&self) -> &'static str;

    fn start(&self, ctx: &ProbeContext) -> Result<Option<Disposer>>;
}

/// Run `report` once the document has loaded.
///
/// Runs immediately when the document is already complete, otherwise on the
/// host's load signal. The handler is `FnOnce`, so a host delivering the
/// signal twice cannot report twice. Without a document nothing runs.
pub(crate) fn when_loaded<F>(host: &dyn Host, probe: &'static str, report: F) -> Result<()>
where
    F: FnOnce() + 'static,
{
    let Some(document) = host.document() else {
        trace!(probe, "No document available, skipping");
        return Ok(());
    };

    if document.is_complete() {
        report();
        Ok(())
    } else {
        trace!(probe, "Document still loading, deferring until load");
        document.on_load(Box::new(report))
    }
}
