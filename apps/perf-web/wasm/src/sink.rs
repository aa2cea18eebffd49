//! Browser analytics sinks

use crate::js;
use js_sys::{Array, Function};
use perf_core::{AnalyticsEvent, AnalyticsSink};
use serde_json::{Map, Value};
use std::rc::Rc;
use tracing::warn;
use wasm_bindgen::prelude::*;
use web_sys::console;

/// Writes events to the browser console
#[derive(Debug, Clone, Copy, Default)]
pub struct WebConsoleSink;

impl AnalyticsSink for WebConsoleSink {
    fn track(&self, event: AnalyticsEvent) {
        let props = js::to_plain(&event.props).unwrap_or(JsValue::UNDEFINED);
        console::info_2(&JsValue::from_str(&event.name), &props);
    }

    fn page(&self, name: &str, props: Option<Map<String, Value>>) {
        let props = js::to_plain(&props).unwrap_or(JsValue::UNDEFINED);
        console::info_2(&JsValue::from_str(name), &props);
    }
}

/// Pushes events onto `window.dataLayer`, creating it when missing
#[derive(Debug, Clone, Copy, Default)]
pub struct DataLayerSink;

impl DataLayerSink {
    fn push(record: Map<String, Value>) {
        let Some(window) = web_sys::window() else {
            return;
        };
        let layer = match js::get(&window, "dataLayer") {
            Some(layer) => layer,
            None => {
                let layer = Array::new();
                if let Err(e) = js_sys::Reflect::set(&window, &"dataLayer".into(), &layer) {
                    warn!("Could not create dataLayer: {}", js::describe(&e));
                    return;
                }
                layer.into()
            }
        };

        let pushed = js::to_plain(&record).and_then(|record| js::call1(&layer, "push", &record));
        if let Err(e) = pushed {
            warn!("dataLayer push failed: {}", js::describe(&e));
        }
    }
}

/// `{event: name, ...props, ts}`
pub fn data_layer_record(event: &AnalyticsEvent, now_ms: i64) -> Map<String, Value> {
    let mut record = Map::new();
    record.insert("event".to_string(), Value::from(event.name.clone()));
    if let Some(props) = &event.props {
        record.extend(props.clone());
    }
    record.insert("ts".to_string(), Value::from(event.ts.unwrap_or(now_ms)));
    record
}

/// `{event: "page_view", page: name, ...props}`
pub fn page_view_record(name: &str, props: Option<Map<String, Value>>) -> Map<String, Value> {
    let mut record = Map::new();
    record.insert("event".to_string(), Value::from("page_view"));
    record.insert("page".to_string(), Value::from(name));
    if let Some(props) = props {
        record.extend(props);
    }
    record
}

impl AnalyticsSink for DataLayerSink {
    fn track(&self, event: AnalyticsEvent) {
        Self::push(data_layer_record(&event, js_sys::Date::now() as i64));
    }

    fn page(&self, name: &str, props: Option<Map<String, Value>>) {
        Self::push(page_view_record(name, props));
    }
}

/// A sink implemented in JavaScript as `{ track, page? }`
pub struct CallbackSink {
    track: Function,
    page: Option<Function>,
}

impl CallbackSink {
    pub fn from_js(sink: &JsValue) -> Result<Self, JsValue> {
        let track = js::function(sink, "track")
            .ok_or_else(|| JsValue::from_str("Analytics sink must have a track function"))?;
        Ok(Self {
            track,
            page: js::function(sink, "page"),
        })
    }
}

impl AnalyticsSink for CallbackSink {
    fn track(&self, event: AnalyticsEvent) {
        let delivered =
            js::to_plain(&event).and_then(|event| self.track.call1(&JsValue::NULL, &event));
        if let Err(e) = delivered {
            warn!("Analytics sink track failed: {}", js::describe(&e));
        }
    }

    fn page(&self, name: &str, props: Option<Map<String, Value>>) {
        let Some(page) = &self.page else {
            return;
        };
        let delivered = js::to_plain(&props)
            .and_then(|props| page.call2(&JsValue::NULL, &JsValue::from_str(name), &props));
        if let Err(e) = delivered {
            warn!("Analytics sink page failed: {}", js::describe(&e));
        }
    }
}

/// Data layer in release builds running in a window, console otherwise
pub fn default_sink() -> Rc<dyn AnalyticsSink> {
    if !cfg!(debug_assertions) && web_sys::window().is_some() {
        Rc::new(DataLayerSink)
    } else {
        Rc::new(WebConsoleSink)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_data_layer_record_spreads_props() {
        let mut props = Map::new();
        props.insert("category".to_string(), json!("paint"));
        props.insert("value".to_string(), json!(92.5));
        let event = AnalyticsEvent {
            name: "perf".to_string(),
            props: Some(props),
            ts: Some(42),
        };

        assert_eq!(
            Value::Object(data_layer_record(&event, 7)),
            json!({"event": "perf", "category": "paint", "value": 92.5, "ts": 42})
        );
    }

    #[test]
    fn test_data_layer_record_stamps_missing_ts() {
        let event = AnalyticsEvent {
            name: "signup".to_string(),
            props: None,
            ts: None,
        };
        assert_eq!(
            Value::Object(data_layer_record(&event, 7)),
            json!({"event": "signup", "ts": 7})
        );
    }

    #[test]
    fn test_page_view_record() {
        let mut props = Map::new();
        props.insert("section".to_string(), json!("checkout"));
        assert_eq!(
            Value::Object(page_view_record("/cart", Some(props))),
            json!({"event": "page_view", "page": "/cart", "section": "checkout"})
        );
    }
}
