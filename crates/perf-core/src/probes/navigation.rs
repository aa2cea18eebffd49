//! Navigation timing: derived intervals of the current page load

use super::{when_loaded, Probe, ProbeContext};
use crate::error::Result;
use crate::event::{Category, Event};
use crate::host::{Disposer, NavigationTiming};
use tracing::{debug, trace};

#[derive(Debug, Clone, Copy, Default)]
pub struct NavigationProbe;

fn span(end: Option<f64>, start: Option<f64>) -> Option<f64> {
    Some(end? - start?)
}

/// Named intervals derived from a navigation entry, in report order.
///
/// Intervals whose inputs are missing or that compute to NaN are left out.
pub fn intervals(nav: &NavigationTiming) -> Vec<(&'static str, f64)> {
    let tls = match nav.secure_connection_start {
        Some(secure) if secure > 0.0 => span(nav.connect_end, Some(secure)),
        _ => Some(0.0),
    };

    let candidates = [
        ("TTFB", nav.response_start),
        ("DNS", span(nav.domain_lookup_end, nav.domain_lookup_start)),
        ("TCP", span(nav.connect_end, nav.connect_start)),
        ("TLS", tls),
        ("Request", span(nav.response_start, nav.request_start)),
        ("Response", span(nav.response_end, nav.response_start)),
        ("DOMInteractive", nav.dom_interactive),
        ("DOMComplete", nav.dom_complete),
        ("DOMContentLoaded", nav.dom_content_loaded_event_end),
        ("LoadEvent", span(nav.load_event_end, nav.load_event_start)),
        (
            "FirstByteToInteractive",
            span(nav.dom_interactive, nav.response_start),
        ),
    ];

    candidates
        .into_iter()
        .filter_map(|(name, value)| value.filter(|v| !v.is_nan()).map(|v| (name, v)))
        .collect()
}

impl NavigationProbe {
    /// Read the navigation entry and emit its intervals
    pub fn report(ctx: &ProbeContext) {
        let host = ctx.host.as_ref();
        let Some(timing) = host.timing() else {
            trace!("No timing source, skipping navigation timing");
            return;
        };

        let nav = match timing.navigation_entry() {
            Ok(Some(nav)) => nav,
            Ok(None) => {
                trace!("No navigation entry recorded");
                return;
            }
            Err(e) => {
                debug!("Navigation timing read failed: {}", e);
                return;
            }
        };

        let url = host.page_url();
        let timestamp = host.now_ms();
        for (name, value) in intervals(&nav) {
            ctx.emit(
                Event::new(Category::NavigationTiming, name)
                    .with_value(value)
                    .with_url(url.clone())
                    .with_navigation_type(nav.navigation_type.clone())
                    .with_timestamp(timestamp),
            );
        }
    }
}

impl Probe for NavigationProbe {
    fn name(&self) -> &'static str {
        "navigation"
    }

    fn start(&self, ctx: &ProbeContext) -> Result<Option<Disposer>> {
        let report_ctx = ctx.clone();
        when_loaded(ctx.host.as_ref(), self.name(), move || {
            NavigationProbe::report(&report_ctx)
        })?;
        Ok(None)
    }
}
