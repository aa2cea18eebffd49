//! Long tasks blocking the main thread

use super::{Probe, ProbeContext};
use crate::error::Result;
use crate::event::{Category, Details, Event};
use crate::host::{Disposer, Host, LongTaskEntry};
use tracing::trace;

#[derive(Debug, Clone, Copy, Default)]
pub struct LongTaskProbe;

impl LongTaskProbe {
    pub fn to_event(host: &dyn Host, entry: LongTaskEntry) -> Event {
        Event::new(Category::LongTask, "longtask")
            .with_value(entry.duration)
            .with_url(host.page_url())
            .with_timestamp(host.now_ms())
            .with_details(
                Details::new()
                    .number("startTime", Some(entry.start_time))
                    .number("duration", Some(entry.duration))
                    .json("attribution", entry.attribution),
            )
    }
}

impl Probe for LongTaskProbe {
    fn name(&self) -> &'static str {
        "long-task"
    }

    fn start(&self, ctx: &ProbeContext) -> Result<Option<Disposer>> {
        let Some(observer) = ctx.host.observer() else {
            trace!("No entry observer, skipping long tasks");
            return Ok(None);
        };

        let handler_ctx = ctx.clone();
        let disposer = observer.observe_long_tasks(Box::new(move |entries| {
            for entry in entries {
                handler_ctx.emit(Self::to_event(handler_ctx.host.as_ref(), entry));
            }
        }))?;
        Ok(Some(disposer))
    }
}
