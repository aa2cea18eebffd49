//! WASM bindings for client-side performance tracking
//!
//! Wires `perf-core` to the real browser: [`host::WebHost`] implements the
//! host capabilities on top of `web-sys`, and the exported functions give
//! JavaScript the collector plus a pluggable analytics sink.
//!
//! ## Usage (JavaScript)
//!
//! ```javascript
//! import init, { initPerformanceTracking, trackPerf, useDataLayerSink } from './pkg/perf_web_wasm.js';
//!
//! await init();
//!
//! useDataLayerSink();
//! const tracking = initPerformanceTracking({
//!     track: trackPerf,
//!     resourceSampleRate: 0.1,
//!     resourceFilter: (entry) => entry.initiatorType !== "beacon",
//!     includeMemorySnapshot: true,
//! });
//!
//! // later, e.g. on SPA unmount
//! tracking.teardown();
//! ```

pub mod host;
pub mod js;
pub mod options;
pub mod sink;
pub mod vitals;

use perf_core::{Analytics, Collector, DetachedHost, Event, Host, Teardown};
use serde_json::{Map, Value};
use std::rc::Rc;
use wasm_bindgen::prelude::*;

pub use host::WebHost;
pub use options::TrackingOptions;
pub use sink::{CallbackSink, DataLayerSink, WebConsoleSink};

thread_local! {
    static ANALYTICS: Rc<Analytics> = Rc::new(Analytics::with_clock(
        sink::default_sink(),
        Rc::new(|| js_sys::Date::now() as i64),
    ));
}

/// Initialize the WASM module
/// Called automatically by wasm-bindgen
#[wasm_bindgen(start)]
pub fn init() {
    console_error_panic_hook::set_once();
}

/// Get the library version
#[wasm_bindgen]
pub fn get_version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}

/// Handle returned by `initPerformanceTracking`
#[wasm_bindgen]
pub struct PerfTracking {
    teardown: Teardown,
}

#[wasm_bindgen]
impl PerfTracking {
    /// Release every observer and listener; safe to call more than once
    pub fn teardown(&self) {
        self.teardown.teardown();
    }

    #[wasm_bindgen(getter, js_name = isTornDown)]
    pub fn is_torn_down(&self) -> bool {
        self.teardown.is_torn_down()
    }

    #[wasm_bindgen(getter, js_name = activeSubscriptions)]
    pub fn active_subscriptions(&self) -> usize {
        self.teardown.active_subscriptions()
    }
}

/// Start collecting performance signals.
///
/// Outside a window context nothing is collected and the returned handle is
/// already empty. Fails only when `options.track` is not a function.
#[wasm_bindgen(js_name = initPerformanceTracking)]
pub fn init_performance_tracking(options: JsValue) -> Result<PerfTracking, JsValue> {
    let options = TrackingOptions::from_js(&options)?;

    let host = WebHost::from_window(
        options.vitals_module.clone(),
        options.resource_filter.clone(),
    );
    let host: Rc<dyn Host> = match host {
        Some(host) => Rc::new(host),
        None => Rc::new(DetachedHost),
    };

    Ok(PerfTracking {
        teardown: Collector::initialize(host, options.into_collector_options()),
    })
}

fn props_from_js(props: JsValue) -> Result<Option<Map<String, Value>>, JsValue> {
    if props.is_undefined() || props.is_null() {
        return Ok(None);
    }
    serde_wasm_bindgen::from_value(props)
        .map(Some)
        .map_err(|e| JsValue::from_str(&format!("Invalid props: {}", e)))
}

/// Send a performance event through the active analytics sink
#[wasm_bindgen(js_name = trackPerf)]
pub fn track_perf(event: JsValue) -> Result<(), JsValue> {
    let event: Event = serde_wasm_bindgen::from_value(event)
        .map_err(|e| JsValue::from_str(&format!("Invalid performance event: {}", e)))?;
    ANALYTICS.with(|analytics| analytics.track_perf(&event));
    Ok(())
}

#[wasm_bindgen]
pub fn track(name: &str, props: JsValue) -> Result<(), JsValue> {
    let props = props_from_js(props)?;
    ANALYTICS.with(|analytics| analytics.track(name, props));
    Ok(())
}

#[wasm_bindgen]
pub fn page(name: &str, props: JsValue) -> Result<(), JsValue> {
    let props = props_from_js(props)?;
    ANALYTICS.with(|analytics| analytics.page(name, props));
    Ok(())
}

/// Replace the active sink with a JS object `{ track, page? }`
#[wasm_bindgen(js_name = setAnalyticsSink)]
pub fn set_analytics_sink(sink: JsValue) -> Result<(), JsValue> {
    let sink = CallbackSink::from_js(&sink)?;
    ANALYTICS.with(|analytics| analytics.set_sink(Rc::new(sink)));
    Ok(())
}

#[wasm_bindgen(js_name = useConsoleSink)]
pub fn use_console_sink() {
    ANALYTICS.with(|analytics| analytics.set_sink(Rc::new(WebConsoleSink)));
}

#[wasm_bindgen(js_name = useDataLayerSink)]
pub fn use_data_layer_sink() {
    ANALYTICS.with(|analytics| analytics.set_sink(Rc::new(DataLayerSink)));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_version() {
        let version = get_version();
        assert!(!version.is_empty());
    }
}
