//! Analytics sink adapter
//!
//! The collector only knows an [`Emitter`]. This module bridges it to a
//! pluggable analytics destination: performance events are flattened into a
//! generic [`AnalyticsEvent`] named `"perf"` and handed to whichever
//! [`AnalyticsSink`] is active. Delivery is the sink's business; nothing here
//! buffers or retries.

use crate::emit::Emitter;
use crate::event::Event;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::cell::RefCell;
use std::rc::Rc;
use tracing::{info, warn};

/// Name under which performance events reach the sink
pub const PERF_EVENT_NAME: &str = "perf";

/// A generic analytics record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalyticsEvent {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub props: Option<Map<String, Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ts: Option<i64>,
}

/// Destination for analytics events
pub trait AnalyticsSink {
    fn track(&self, event: AnalyticsEvent);

    /// Page views are optional; sinks without them ignore the call
    fn page(&self, _name: &str, _props: Option<Map<String, Value>>) {}
}

/// Logs every event through `tracing`
#[derive(Debug, Clone, Copy, Default)]
pub struct ConsoleSink;

impl AnalyticsSink for ConsoleSink {
    fn track(&self, event: AnalyticsEvent) {
        info!(event = %event.name, props = ?event.props, "analytics event");
    }

    fn page(&self, name: &str, props: Option<Map<String, Value>>) {
        info!(page = name, props = ?props, "page view");
    }
}

/// Flatten a performance event for a generic sink.
///
/// The event's own fields become `props` (minus the timestamp, which moves to
/// `ts`). Events without a timestamp are stamped with `now_ms`.
pub fn perf_to_analytics(event: &Event, now_ms: i64) -> AnalyticsEvent {
    let props = match serde_json::to_value(event) {
        Ok(Value::Object(mut fields)) => {
            fields.remove("timestamp");
            Some(fields)
        }
        Ok(_) => None,
        Err(e) => {
            warn!("Failed to flatten performance event: {}", e);
            None
        }
    };

    AnalyticsEvent {
        name: PERF_EVENT_NAME.to_string(),
        props,
        ts: Some(event.timestamp.unwrap_or(now_ms)),
    }
}

/// Holds the active sink and routes events to it
pub struct Analytics {
    sink: RefCell<Rc<dyn AnalyticsSink>>,
    clock: Rc<dyn Fn() -> i64>,
}

impl Analytics {
    pub fn new(sink: Rc<dyn AnalyticsSink>) -> Self {
        Self::with_clock(sink, Rc::new(|| chrono::Utc::now().timestamp_millis()))
    }

    pub fn with_clock(sink: Rc<dyn AnalyticsSink>, clock: Rc<dyn Fn() -> i64>) -> Self {
        Self {
            sink: RefCell::new(sink),
            clock,
        }
    }

    /// Replace the active sink; later events go to the new one
    pub fn set_sink(&self, sink: Rc<dyn AnalyticsSink>) {
        *self.sink.borrow_mut() = sink;
    }

    fn active(&self) -> Rc<dyn AnalyticsSink> {
        self.sink.borrow().clone()
    }

    pub fn track(&self, name: &str, props: Option<Map<String, Value>>) {
        self.active().track(AnalyticsEvent {
            name: name.to_string(),
            props,
            ts: Some((self.clock)()),
        });
    }

    pub fn page(&self, name: &str, props: Option<Map<String, Value>>) {
        self.active().page(name, props);
    }

    pub fn track_perf(&self, event: &Event) {
        self.active().track(perf_to_analytics(event, (self.clock)()));
    }

    /// An emitter that forwards collector events to the active sink
    pub fn emitter(analytics: &Rc<Self>) -> Emitter {
        let analytics = Rc::clone(analytics);
        Emitter::new(move |event| analytics.track_perf(&event))
    }
}

impl Default for Analytics {
    fn default() -> Self {
        Self::new(Rc::new(ConsoleSink))
    }
}
