//! Paint timing: first paint and first contentful paint

use super::{when_loaded, Probe, ProbeContext};
use crate::error::Result;
use crate::event::{Category, Event};
use crate::host::Disposer;
use tracing::{debug, trace};

#[derive(Debug, Clone, Copy, Default)]
pub struct PaintProbe;

impl PaintProbe {
    /// Read the paint entries and emit one event per entry
    pub fn report(ctx: &ProbeContext) {
        let host = ctx.host.as_ref();
        let Some(timing) = host.timing() else {
            trace!("No timing source, skipping paint timing");
            return;
        };

        let paints = match timing.paint_entries() {
            Ok(paints) => paints,
            Err(e) => {
                debug!("Paint timing read failed: {}", e);
                return;
            }
        };

        let url = host.page_url();
        let navigation_type = host.navigation_type();
        let timestamp = host.now_ms();
        for paint in paints {
            ctx.emit(
                Event::new(Category::Paint, paint.name)
                    .with_value(paint.start_time)
                    .with_url(url.clone())
                    .with_navigation_type(navigation_type.clone())
                    .with_timestamp(timestamp),
            );
        }
    }
}

impl Probe for PaintProbe {
    fn name(&self) -> &'static str {
        "paint"
    }

    fn start(&self, ctx: &ProbeContext) -> Result<Option<Disposer>> {
        let report_ctx = ctx.clone();
        when_loaded(ctx.host.as_ref(), self.name(), move || {
            PaintProbe::report(&report_ctx)
        })?;
        Ok(None)
    }
}
