//! `initPerformanceTracking` options as passed from JavaScript

use crate::js;
use js_sys::Function;
use perf_core::{CollectorConfig, CollectorOptions, Emitter, Event};
use tracing::warn;
use wasm_bindgen::prelude::*;

/// Parsed `{ track, resourceSampleRate?, resourceFilter?, includeNetworkInfo?,
/// includeMemorySnapshot?, vitalsModule? }`
pub struct TrackingOptions {
    pub track: Function,
    pub config: CollectorConfig,
    /// Applied by the browser host to raw `PerformanceResourceTiming` entries
    pub resource_filter: Option<Function>,
    pub vitals_module: Option<JsValue>,
}

impl TrackingOptions {
    /// Values of the wrong type are ignored in favor of the defaults; only a
    /// missing `track` is an error.
    pub fn from_js(options: &JsValue) -> Result<Self, JsValue> {
        let track = js::function(options, "track")
            .ok_or_else(|| JsValue::from_str("options.track must be a function"))?;

        let mut config = CollectorConfig::default();
        if let Some(rate) = js::number(options, "resourceSampleRate") {
            config = config.with_resource_sample_rate(rate);
        }
        if let Some(enabled) = js::boolean(options, "includeNetworkInfo") {
            config = config.with_network_info(enabled);
        }
        if let Some(enabled) = js::boolean(options, "includeMemorySnapshot") {
            config = config.with_memory_snapshot(enabled);
        }

        Ok(Self {
            track,
            config,
            resource_filter: js::function(options, "resourceFilter"),
            vitals_module: js::get(options, "vitalsModule"),
        })
    }

    pub fn into_collector_options(self) -> CollectorOptions {
        CollectorOptions::new(js_emitter(self.track)).with_config(self.config)
    }
}

/// Deliver events to a JS callback as plain objects
pub fn js_emitter(track: Function) -> Emitter {
    Emitter::new(move |event: Event| {
        let delivered = js::to_plain(&event).and_then(|event| track.call1(&JsValue::NULL, &event));
        if let Err(e) = delivered {
            warn!("track callback failed: {}", js::describe(&e));
        }
    })
}
