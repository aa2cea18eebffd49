//! Client-side performance signal collection
//!
//! This crate subscribes to the browser's heterogeneous measurement sources,
//! normalizes everything into one [`Event`] shape and hands each event to a
//! caller-supplied [`Emitter`]. It is host-agnostic: every browser API is
//! reached through the capability traits in [`host`], so the same collector
//! runs in the browser (see the `perf-web-wasm` app) and in native tests.
//!
//! # Probes
//!
//! - **Vitals**: LCP, INP, CLS, FCP, TTFB from an optional external library
//! - **Navigation timing**: DNS, TCP, TLS, request/response, DOM phases
//! - **Paint timing**: first paint, first contentful paint
//! - **Long tasks**: main-thread blocking tasks
//! - **Resources**: sub-resource loads, filtered and sampled
//! - **Lifecycle**: page hidden, page hide
//! - **Snapshots**: network quality and JS heap usage
//!
//! Missing capabilities are skipped silently; initialization never fails.
//!
//! # Example
//!
//! ```
//! use perf_core::{Collector, CollectorConfig, CollectorOptions, DetachedHost, Event};
//! use std::rc::Rc;
//!
//! let options = CollectorOptions::new(|event: Event| {
//!     println!("{} {} {:?}", event.category, event.name, event.value);
//! })
//! .with_config(CollectorConfig::default().with_resource_sample_rate(0.1))
//! .with_resource_filter(|entry| entry.initiator_type.as_deref() != Some("beacon"));
//!
//! let teardown = Collector::initialize(Rc::new(DetachedHost), options);
//! teardown.teardown();
//! ```

pub mod collector;
pub mod config;
pub mod emit;
pub mod error;
pub mod event;
pub mod host;
pub mod probes;
pub mod sink;
pub mod teardown;

pub use collector::{initialize, Collector, CollectorOptions};
pub use config::{CollectorConfig, SampleRate, DEFAULT_RESOURCE_SAMPLE_RATE};
pub use emit::Emitter;
pub use error::{PerfError, Result};
pub use event::{Category, Details, Event, Rating};
pub use host::{DetachedHost, Disposer, Host};
pub use probes::{MetricReport, NoopVitals, Probe, ProbeContext, VitalMetric, VitalsLibrary};
pub use sink::{Analytics, AnalyticsEvent, AnalyticsSink, ConsoleSink};
pub use teardown::Teardown;
