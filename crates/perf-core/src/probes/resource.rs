//! Resource loads, filtered then sampled

use super::{Probe, ProbeContext};
use crate::config::SampleRate;
use crate::error::Result;
use crate::event::{Category, Details, Event};
use crate::host::{Disposer, ResourceEntry};
use std::rc::Rc;
use tracing::trace;

/// Caller predicate over raw resource entries; `false` drops the entry
pub type ResourceFilter = Rc<dyn Fn(&ResourceEntry) -> bool>;

#[derive(Clone, Default)]
pub struct ResourceProbe {
    rate: SampleRate,
    filter: Option<ResourceFilter>,
}

impl ResourceProbe {
    pub fn new(rate: SampleRate, filter: Option<ResourceFilter>) -> Self {
        Self { rate, filter }
    }

    pub fn rate(&self) -> SampleRate {
        self.rate
    }

    /// Filter first, then draw: a rejected entry never consumes a draw
    fn admits(&self, entry: &ResourceEntry, draw: impl FnOnce() -> f64) -> bool {
        if let Some(filter) = &self.filter {
            if !filter(entry) {
                return false;
            }
        }
        self.rate.admits(draw())
    }

    pub fn to_event(entry: ResourceEntry, timestamp: i64) -> Event {
        let initiator = entry
            .initiator_type
            .as_deref()
            .filter(|t| !t.is_empty())
            .unwrap_or("other");

        let details = Details::new()
            .number("startTime", Some(entry.start_time))
            .number("transferSize", entry.transfer_size)
            .number("encodedBodySize", entry.encoded_body_size)
            .number("decodedBodySize", entry.decoded_body_size)
            .text("nextHopProtocol", entry.next_hop_protocol.as_deref())
            .text("initiatorType", entry.initiator_type.as_deref());

        Event::new(Category::Resource, format!("resource:{}", initiator))
            .with_value(entry.duration)
            .with_url(Some(entry.name))
            .with_timestamp(timestamp)
            .with_details(details)
    }
}

impl Probe for ResourceProbe {
    fn name(&self) -> &'static str {
        "resource"
    }

    fn start(&self, ctx: &ProbeContext) -> Result<Option<Disposer>> {
        let Some(observer) = ctx.host.observer() else {
            trace!("No entry observer, skipping resources");
            return Ok(None);
        };

        let probe = self.clone();
        let handler_ctx = ctx.clone();
        let disposer = observer.observe_resources(Box::new(move |entries| {
            let host = handler_ctx.host.as_ref();
            for entry in entries {
                if !probe.admits(&entry, || host.random()) {
                    continue;
                }
                handler_ctx.emit(Self::to_event(entry, host.now_ms()));
            }
        }))?;
        Ok(Some(disposer))
    }
}
