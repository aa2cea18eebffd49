//! Collector orchestration: start every probe, aggregate their disposers

use crate::config::CollectorConfig;
use crate::emit::Emitter;
use crate::event::Event;
use crate::host::{Host, ResourceEntry};
use crate::probes::{
    LifecycleProbe, LongTaskProbe, NavigationProbe, PaintProbe, Probe, ProbeContext,
    ResourceFilter, ResourceProbe, SnapshotProbe, VitalsProbe,
};
use crate::teardown::Teardown;
use std::fmt;
use std::rc::Rc;
use tracing::{debug, instrument};

/// Everything [`Collector::initialize`] needs from the caller
#[derive(Clone)]
pub struct CollectorOptions {
    /// Receives every normalized event
    pub emitter: Emitter,
    pub config: CollectorConfig,
    pub resource_filter: Option<ResourceFilter>,
}

impl CollectorOptions {
    pub fn new(emitter: impl Into<Emitter>) -> Self {
        Self {
            emitter: emitter.into(),
            config: CollectorConfig::default(),
            resource_filter: None,
        }
    }

    pub fn with_config(mut self, config: CollectorConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_resource_filter<F>(mut self, filter: F) -> Self
    where
        F: Fn(&ResourceEntry) -> bool + 'static,
    {
        self.resource_filter = Some(Rc::new(filter));
        self
    }
}

impl fmt::Debug for CollectorOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CollectorOptions")
            .field("config", &self.config)
            .field("resource_filter", &self.resource_filter.is_some())
            .finish()
    }
}

/// An ordered set of probes sharing one emitter
pub struct Collector {
    probes: Vec<Box<dyn Probe>>,
}

impl Collector {
    /// The standard probe set configured from `options`
    pub fn new(options: &CollectorOptions) -> Self {
        let config = &options.config;
        Self::with_probes(vec![
            Box::new(VitalsProbe),
            Box::new(NavigationProbe),
            Box::new(PaintProbe),
            Box::new(LongTaskProbe),
            Box::new(ResourceProbe::new(
                config.sample_rate(),
                options.resource_filter.clone(),
            )),
            Box::new(LifecycleProbe),
            Box::new(SnapshotProbe {
                include_network_info: config.include_network_info,
                include_memory_snapshot: config.include_memory_snapshot,
            }),
        ])
    }

    pub fn with_probes(probes: Vec<Box<dyn Probe>>) -> Self {
        Self { probes }
    }

    pub fn probe_names(&self) -> Vec<&'static str> {
        self.probes.iter().map(|p| p.name()).collect()
    }

    /// Start every probe against `host`.
    ///
    /// A probe that fails to start is logged and skipped; the others still
    /// run. Never fails, whatever the host lacks.
    pub fn start(self, host: Rc<dyn Host>, emitter: Emitter) -> Teardown {
        let ctx = ProbeContext::new(host, emitter);
        let teardown = Teardown::new();

        for probe in &self.probes {
            match probe.start(&ctx) {
                Ok(Some(disposer)) => teardown.push(probe.name(), disposer),
                Ok(None) => {}
                Err(e) => debug!(probe = probe.name(), "Probe did not start: {}", e),
            }
        }

        teardown
    }

    /// Build the standard probe set and start it
    ///
    /// # Example
    ///
    /// ```
    /// use perf_core::{Collector, CollectorOptions, DetachedHost};
    /// use std::rc::Rc;
    ///
    /// let teardown = Collector::initialize(
    ///     Rc::new(DetachedHost),
    ///     CollectorOptions::new(|event: perf_core::Event| println!("{:?}", event)),
    /// );
    /// teardown.teardown();
    /// ```
    #[instrument(skip_all, fields(sample_rate = options.config.sample_rate().get()))]
    pub fn initialize(host: Rc<dyn Host>, options: CollectorOptions) -> Teardown {
        let collector = Collector::new(&options);
        let teardown = collector.start(host, options.emitter);
        debug!(
            subscriptions = teardown.active_subscriptions(),
            "Performance collector initialized"
        );
        teardown
    }
}

impl fmt::Debug for Collector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Collector")
            .field("probes", &self.probe_names())
            .finish()
    }
}

/// Shorthand for [`Collector::initialize`] with a plain callback
pub fn initialize<F>(host: Rc<dyn Host>, emit: F, config: CollectorConfig) -> Teardown
where
    F: Fn(Event) + 'static,
{
    Collector::initialize(host, CollectorOptions::new(emit).with_config(config))
}
