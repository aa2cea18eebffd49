//! Page visibility and unload signals

use super::{Probe, ProbeContext};
use crate::error::Result;
use crate::event::{Category, Event};
use crate::host::{Disposer, Handler, LifecycleSignal};
use crate::teardown::release_all;
use std::rc::Rc;
use tracing::{debug, trace};

#[derive(Debug, Clone, Copy, Default)]
pub struct LifecycleProbe;

impl LifecycleProbe {
    fn emit_phase(ctx: &ProbeContext, phase: &str) {
        let host = ctx.host.as_ref();
        ctx.emit(
            Event::new(Category::Visibility, phase)
                .with_url(host.page_url())
                .with_timestamp(host.now_ms()),
        );
    }

    fn handler(ctx: &ProbeContext, signal: LifecycleSignal) -> Handler {
        let ctx = ctx.clone();
        match signal {
            LifecycleSignal::VisibilityChange => Rc::new(move || {
                let hidden = ctx.host.lifecycle().is_some_and(|l| l.is_hidden());
                if hidden {
                    Self::emit_phase(&ctx, "hidden");
                }
            }),
            LifecycleSignal::PageHide => Rc::new(move || Self::emit_phase(&ctx, "pagehide")),
        }
    }
}

impl Probe for LifecycleProbe {
    fn name(&self) -> &'static str {
        "lifecycle"
    }

    fn start(&self, ctx: &ProbeContext) -> Result<Option<Disposer>> {
        let Some(lifecycle) = ctx.host.lifecycle() else {
            trace!("No lifecycle source, skipping visibility");
            return Ok(None);
        };

        let mut registered: Vec<(&'static str, Disposer)> = Vec::new();
        let mut first_error = None;
        for signal in [LifecycleSignal::VisibilityChange, LifecycleSignal::PageHide] {
            match lifecycle.listen(signal, Self::handler(ctx, signal)) {
                Ok(disposer) => registered.push((signal.event_name(), disposer)),
                Err(e) => {
                    debug!(signal = signal.event_name(), "Listener registration failed: {}", e);
                    first_error.get_or_insert(e);
                }
            }
        }

        match (registered.is_empty(), first_error) {
            (true, Some(e)) => Err(e),
            _ => Ok(Some(Box::new(move || release_all(registered)))),
        }
    }
}
