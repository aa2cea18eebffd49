//! Core Web Vitals via an optional external measurement library
//!
//! The library is acquired asynchronously through [`Host::vitals`]. When the
//! host cannot provide it, or acquisition fails, the probe falls back to
//! [`NoopVitals`] and stays silent for the rest of the session.

use super::{Probe, ProbeContext};
use crate::error::Result;
use crate::event::{Category, Details, Event, Rating};
use crate::host::{Disposer, Host, VitalsFuture};
use serde_json::Value;
use std::fmt;
use std::rc::Rc;
use tracing::{debug, trace};

/// The tracked metrics, in registration order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VitalMetric {
    /// Largest Contentful Paint (loading speed)
    Lcp,
    /// Interaction to Next Paint (interactivity latency)
    Inp,
    /// Cumulative Layout Shift (visual stability, unitless)
    Cls,
    /// First Contentful Paint
    Fcp,
    /// Time to First Byte (server response)
    Ttfb,
}

impl VitalMetric {
    pub const ALL: [VitalMetric; 5] = [
        VitalMetric::Lcp,
        VitalMetric::Inp,
        VitalMetric::Cls,
        VitalMetric::Fcp,
        VitalMetric::Ttfb,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            VitalMetric::Lcp => "LCP",
            VitalMetric::Inp => "INP",
            VitalMetric::Cls => "CLS",
            VitalMetric::Fcp => "FCP",
            VitalMetric::Ttfb => "TTFB",
        }
    }

    /// Name of the library's registration function (`onLCP`, ...)
    pub fn handler_name(&self) -> &'static str {
        match self {
            VitalMetric::Lcp => "onLCP",
            VitalMetric::Inp => "onINP",
            VitalMetric::Cls => "onCLS",
            VitalMetric::Fcp => "onFCP",
            VitalMetric::Ttfb => "onTTFB",
        }
    }
}

impl fmt::Display for VitalMetric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One metric callback from the library
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MetricReport {
    pub value: f64,
    pub rating: Option<Rating>,
    /// Change since the previous report of the same metric instance
    pub delta: Option<f64>,
    /// Stable id of the metric instance
    pub id: Option<String>,
    pub navigation_type: Option<String>,
    pub attribution: Option<Value>,
}

/// The external vitals library, once acquired
pub trait VitalsLibrary {
    /// Register `handler` for `metric`.
    ///
    /// Fails when the library has no handler for the metric.
    fn on_metric(
        &self,
        metric: VitalMetric,
        report_all_changes: bool,
        handler: Box<dyn FnMut(MetricReport)>,
    ) -> Result<()>;
}

/// Stand-in used when the library cannot be acquired; registers nothing
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopVitals;

impl VitalsLibrary for NoopVitals {
    fn on_metric(
        &self,
        _metric: VitalMetric,
        _report_all_changes: bool,
        _handler: Box<dyn FnMut(MetricReport)>,
    ) -> Result<()> {
        Ok(())
    }
}

/// Wait for the library, degrading to [`NoopVitals`] on failure
pub async fn acquire(pending: VitalsFuture) -> Rc<dyn VitalsLibrary> {
    match pending.await {
        Ok(library) => library,
        Err(e) => {
            debug!("Vitals library unavailable, vitals disabled: {}", e);
            Rc::new(NoopVitals)
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct VitalsProbe;

impl VitalsProbe {
    /// Register one reporting handler per tracked metric
    pub fn register(library: &dyn VitalsLibrary, ctx: &ProbeContext) {
        for metric in VitalMetric::ALL {
            let ctx = ctx.clone();
            let handler = Box::new(move |report: MetricReport| {
                ctx.emit(Self::to_event(ctx.host.as_ref(), metric, report));
            });
            if let Err(e) = library.on_metric(metric, true, handler) {
                debug!(metric = metric.name(), "Skipping vitals metric: {}", e);
            }
        }
    }

    pub fn to_event(host: &dyn Host, metric: VitalMetric, report: MetricReport) -> Event {
        let navigation_type = report.navigation_type.or_else(|| host.navigation_type());
        Event::new(Category::Vitals, metric.name())
            .with_value(report.value)
            .with_rating(report.rating)
            .with_delta(report.delta)
            .with_id(report.id)
            .with_url(host.page_url())
            .with_navigation_type(navigation_type)
            .with_timestamp(host.now_ms())
            .with_details(Details::new().json("attribution", report.attribution))
    }
}

impl Probe for VitalsProbe {
    fn name(&self) -> &'static str {
        "vitals"
    }

    fn start(&self, ctx: &ProbeContext) -> Result<Option<Disposer>> {
        let Some(pending) = ctx.host.vitals() else {
            trace!("Host cannot load a vitals library");
            return Ok(None);
        };

        let task_ctx = ctx.clone();
        let spawned = ctx.host.spawn_local(Box::pin(async move {
            let library = acquire(pending).await;
            VitalsProbe::register(library.as_ref(), &task_ctx);
        }));
        if !spawned {
            trace!("Host has no local executor, vitals disabled");
        }

        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::emit::Emitter;
    use crate::error::PerfError;
    use futures::executor::LocalPool;
    use futures::future::LocalBoxFuture;
    use futures::task::LocalSpawnExt;
    use serde_json::json;
    use std::cell::RefCell;
    use std::collections::HashMap;

    type Handlers = RefCell<HashMap<VitalMetric, Box<dyn FnMut(MetricReport)>>>;

    /// Library exposing only the metrics it was built with
    struct ScriptedLibrary {
        supported: Vec<VitalMetric>,
        handlers: Handlers,
        all_changes: RefCell<Vec<bool>>,
    }

    impl ScriptedLibrary {
        fn new(supported: Vec<VitalMetric>) -> Rc<Self> {
            Rc::new(Self {
                supported,
                handlers: RefCell::new(HashMap::new()),
                all_changes: RefCell::new(Vec::new()),
            })
        }

        fn report(&self, metric: VitalMetric, report: MetricReport) {
            let mut handlers = self.handlers.borrow_mut();
            let handler = handlers.get_mut(&metric).expect("metric registered");
            handler(report);
        }
    }

    impl VitalsLibrary for ScriptedLibrary {
        fn on_metric(
            &self,
            metric: VitalMetric,
            report_all_changes: bool,
            handler: Box<dyn FnMut(MetricReport)>,
        ) -> Result<()> {
            if !self.supported.contains(&metric) {
                return Err(PerfError::VitalsLibrary(format!(
                    "{} is not exported",
                    metric.handler_name()
                )));
            }
            self.all_changes.borrow_mut().push(report_all_changes);
            self.handlers.borrow_mut().insert(metric, handler);
            Ok(())
        }
    }

    struct VitalsHost {
        library: RefCell<Option<std::result::Result<Rc<ScriptedLibrary>, PerfError>>>,
        spawner: Option<futures::executor::LocalSpawner>,
    }

    impl Host for VitalsHost {
        fn page_url(&self) -> Option<String> {
            Some("https://app.example/checkout".to_string())
        }

        fn now_ms(&self) -> i64 {
            42
        }

        fn vitals(&self) -> Option<VitalsFuture> {
            let outcome = self.library.borrow_mut().take()?;
            Some(Box::pin(async move {
                outcome.map(|lib| lib as Rc<dyn VitalsLibrary>)
            }))
        }

        fn spawn_local(&self, task: LocalBoxFuture<'static, ()>) -> bool {
            match &self.spawner {
                Some(spawner) => spawner.spawn_local(task).is_ok(),
                None => false,
            }
        }
    }

    fn recording() -> (Emitter, Rc<RefCell<Vec<Event>>>) {
        let events = Rc::new(RefCell::new(Vec::new()));
        let sink = events.clone();
        (Emitter::new(move |e| sink.borrow_mut().push(e)), events)
    }

    #[test]
    fn test_reports_become_vitals_events() {
        let library = ScriptedLibrary::new(VitalMetric::ALL.to_vec());
        let mut pool = LocalPool::new();
        let host = Rc::new(VitalsHost {
            library: RefCell::new(Some(Ok(library.clone()))),
            spawner: Some(pool.spawner()),
        });
        let (emitter, events) = recording();
        let ctx = ProbeContext::new(host, emitter);

        VitalsProbe.start(&ctx).unwrap();
        assert!(events.borrow().is_empty());
        pool.run_until_stalled();

        assert_eq!(*library.all_changes.borrow(), vec![true; 5]);

        library.report(
            VitalMetric::Lcp,
            MetricReport {
                value: 1800.0,
                rating: Some(Rating::Good),
                delta: Some(1800.0),
                id: Some("v4-123".to_string()),
                navigation_type: Some("navigate".to_string()),
                attribution: Some(json!({"element": "img.hero"})),
            },
        );

        let events = events.borrow();
        assert_eq!(events.len(), 1);
        let event = &events[0];
        assert_eq!(event.category, Category::Vitals);
        assert_eq!(event.name, "LCP");
        assert_eq!(event.value, Some(1800.0));
        assert_eq!(event.rating, Some(Rating::Good));
        assert_eq!(event.id.as_deref(), Some("v4-123"));
        assert_eq!(event.url.as_deref(), Some("https://app.example/checkout"));
        assert_eq!(event.navigation_type.as_deref(), Some("navigate"));
        assert_eq!(event.timestamp, Some(42));
        assert_eq!(
            event.detail("attribution"),
            Some(&json!({"element": "img.hero"}))
        );
    }

    #[test]
    fn test_report_without_attribution_has_no_details() {
        let library = ScriptedLibrary::new(vec![VitalMetric::Cls]);
        let mut pool = LocalPool::new();
        let host = Rc::new(VitalsHost {
            library: RefCell::new(Some(Ok(library.clone()))),
            spawner: Some(pool.spawner()),
        });
        let (emitter, events) = recording();
        VitalsProbe.start(&ProbeContext::new(host, emitter)).unwrap();
        pool.run_until_stalled();

        library.report(
            VitalMetric::Cls,
            MetricReport {
                value: 0.02,
                ..Default::default()
            },
        );

        let events = events.borrow();
        assert_eq!(events[0].name, "CLS");
        assert!(events[0].details.is_none());
    }

    #[test]
    fn test_missing_metric_handlers_are_skipped() {
        let library = ScriptedLibrary::new(vec![VitalMetric::Lcp, VitalMetric::Ttfb]);
        let mut pool = LocalPool::new();
        let host = Rc::new(VitalsHost {
            library: RefCell::new(Some(Ok(library.clone()))),
            spawner: Some(pool.spawner()),
        });
        let (emitter, _events) = recording();
        VitalsProbe.start(&ProbeContext::new(host, emitter)).unwrap();
        pool.run_until_stalled();

        let registered = library.handlers.borrow();
        assert_eq!(registered.len(), 2);
        assert!(registered.contains_key(&VitalMetric::Ttfb));
    }

    #[test]
    fn test_failed_acquisition_degrades_silently() {
        let mut pool = LocalPool::new();
        let host = Rc::new(VitalsHost {
            library: RefCell::new(Some(Err(PerfError::VitalsLibrary(
                "module not found".to_string(),
            )))),
            spawner: Some(pool.spawner()),
        });
        let (emitter, events) = recording();

        assert!(VitalsProbe.start(&ProbeContext::new(host, emitter)).unwrap().is_none());
        pool.run_until_stalled();
        assert!(events.borrow().is_empty());
    }

    #[test]
    fn test_no_executor_means_no_vitals() {
        let library = ScriptedLibrary::new(VitalMetric::ALL.to_vec());
        let host = Rc::new(VitalsHost {
            library: RefCell::new(Some(Ok(library.clone()))),
            spawner: None,
        });
        let (emitter, _events) = recording();
        VitalsProbe.start(&ProbeContext::new(host, emitter)).unwrap();
        assert!(library.handlers.borrow().is_empty());
    }

    #[test]
    fn test_noop_library_accepts_everything() {
        for metric in VitalMetric::ALL {
            assert!(NoopVitals.on_metric(metric, true, Box::new(|_| {})).is_ok());
        }
    }

    #[test]
    fn test_metric_names() {
        let names: Vec<_> = VitalMetric::ALL.iter().map(|m| m.name()).collect();
        assert_eq!(names, vec!["LCP", "INP", "CLS", "FCP", "TTFB"]);
        assert_eq!(VitalMetric::Inp.handler_name(), "onINP");
    }
}
