//! Browser implementation of the collector's host capabilities
//!
//! Timeline entries and vendor extensions are read through `Reflect` rather
//! than typed bindings, since engines disagree on which fields exist.

use crate::js;
use crate::vitals;
use futures::future::LocalBoxFuture;
use js_sys::{Array, Function};
use perf_core::host::{
    ConnectionInfo, DocumentState, EntryObserver, Handler, LifecycleSignal, LifecycleSource,
    LongTaskEntry, MemoryInfo, NavigationTiming, PaintEntry, ResourceEntry, TimingSource,
    VitalsFuture,
};
use perf_core::{Disposer, Host, PerfError, Result};
use tracing::debug;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{
    AddEventListenerOptions, Document, EventTarget, Performance, PerformanceObserver, Window,
};

/// Everything the collector can reach from a browser window
pub struct WebHost {
    window: Window,
    performance: Option<Performance>,
    timing: Option<WebTiming>,
    observer: Option<WebObserver>,
    document: Option<WebDocument>,
    lifecycle: Option<WebLifecycle>,
    vitals_module: Option<JsValue>,
}

impl WebHost {
    /// Probe the current global for capabilities.
    ///
    /// Returns `None` outside a window context (workers, server rendering).
    /// `vitals_module` replaces the dynamic import of `web-vitals` when set;
    /// `resource_filter` sees each raw resource timing entry before parsing.
    pub fn from_window(
        vitals_module: Option<JsValue>,
        resource_filter: Option<Function>,
    ) -> Option<Self> {
        let window = web_sys::window()?;
        let performance = window.performance();
        let document = window.document();

        let observer = js::get(&window, "PerformanceObserver").map(|constructor| WebObserver {
            supported_types: js::get(&constructor, "supportedEntryTypes")
                .map(|types| Array::from(&types)),
            resource_filter,
        });

        Some(Self {
            timing: performance.clone().map(|performance| WebTiming { performance }),
            observer,
            document: document.clone().map(|document| WebDocument {
                window: window.clone(),
                document,
            }),
            lifecycle: document.map(|document| WebLifecycle {
                window: window.clone(),
                document,
            }),
            performance,
            window,
            vitals_module,
        })
    }
}

impl Host for WebHost {
    fn page_url(&self) -> Option<String> {
        self.window.location().href().ok()
    }

    fn now_ms(&self) -> i64 {
        js_sys::Date::now() as i64
    }

    fn random(&self) -> f64 {
        js_sys::Math::random()
    }

    fn timing(&self) -> Option<&dyn TimingSource> {
        self.timing.as_ref().map(|t| t as &dyn TimingSource)
    }

    fn observer(&self) -> Option<&dyn EntryObserver> {
        self.observer.as_ref().map(|o| o as &dyn EntryObserver)
    }

    fn document(&self) -> Option<&dyn DocumentState> {
        self.document.as_ref().map(|d| d as &dyn DocumentState)
    }

    fn lifecycle(&self) -> Option<&dyn LifecycleSource> {
        self.lifecycle.as_ref().map(|l| l as &dyn LifecycleSource)
    }

    fn connection_info(&self, alias: &str) -> Option<ConnectionInfo> {
        let navigator = self.window.navigator();
        js::get(&navigator, alias).map(|connection| parse_connection(&connection))
    }

    fn memory_info(&self) -> Option<MemoryInfo> {
        let performance = self.performance.as_ref()?;
        js::get(performance, "memory").map(|memory| parse_memory(&memory))
    }

    fn vitals(&self) -> Option<VitalsFuture> {
        Some(Box::pin(vitals::load(self.vitals_module.clone())))
    }

    fn spawn_local(&self, task: LocalBoxFuture<'static, ()>) -> bool {
        wasm_bindgen_futures::spawn_local(task);
        true
    }
}

// ============================================================================
// Performance timeline
// ============================================================================

pub struct WebTiming {
    performance: Performance,
}

impl WebTiming {
    fn entries(&self, entry_type: &'static str) -> Result<Array> {
        let entries = js::call1(
            &self.performance,
            "getEntriesByType",
            &JsValue::from_str(entry_type),
        )
        .map_err(|e| PerfError::read(entry_type, js::describe(&e)))?;

        entries
            .dyn_into::<Array>()
            .map_err(|_| PerfError::read(entry_type, "getEntriesByType did not return an array"))
    }
}

impl TimingSource for WebTiming {
    fn navigation_entry(&self) -> Result<Option<NavigationTiming>> {
        let entries = self.entries("navigation")?;
        let first = entries.get(0);
        if first.is_undefined() {
            return Ok(None);
        }
        Ok(Some(parse_navigation(&first)))
    }

    fn paint_entries(&self) -> Result<Vec<PaintEntry>> {
        let entries = self.entries("paint")?;
        Ok(entries.iter().filter_map(|e| parse_paint(&e)).collect())
    }

    fn legacy_navigation_type(&self) -> Option<String> {
        let navigation = js::get(&self.performance, "navigation")?;
        js::number(&navigation, "type").map(legacy_type_name)
    }
}

/// Name for a numeric `performance.navigation.type`
pub fn legacy_type_name(code: f64) -> String {
    match code as u32 {
        0 => "navigate".to_string(),
        1 => "reload".to_string(),
        2 => "back_forward".to_string(),
        other => other.to_string(),
    }
}

fn parse_navigation(entry: &JsValue) -> NavigationTiming {
    NavigationTiming {
        navigation_type: js::string(entry, "type"),
        domain_lookup_start: js::number(entry, "domainLookupStart"),
        domain_lookup_end: js::number(entry, "domainLookupEnd"),
        connect_start: js::number(entry, "connectStart"),
        connect_end: js::number(entry, "connectEnd"),
        secure_connection_start: js::number(entry, "secureConnectionStart"),
        request_start: js::number(entry, "requestStart"),
        response_start: js::number(entry, "responseStart"),
        response_end: js::number(entry, "responseEnd"),
        dom_interactive: js::number(entry, "domInteractive"),
        dom_content_loaded_event_end: js::number(entry, "domContentLoadedEventEnd"),
        dom_complete: js::number(entry, "domComplete"),
        load_event_start: js::number(entry, "loadEventStart"),
        load_event_end: js::number(entry, "loadEventEnd"),
    }
}

fn parse_paint(entry: &JsValue) -> Option<PaintEntry> {
    Some(PaintEntry {
        name: js::string(entry, "name")?,
        start_time: js::number(entry, "startTime")?,
    })
}

fn parse_long_task(entry: &JsValue) -> Option<LongTaskEntry> {
    Some(LongTaskEntry {
        start_time: js::number(entry, "startTime")?,
        duration: js::number(entry, "duration")?,
        attribution: js::get(entry, "attribution").and_then(|a| js::to_json(&a)),
    })
}

fn parse_resource(entry: &JsValue) -> Option<ResourceEntry> {
    Some(ResourceEntry {
        name: js::string(entry, "name")?,
        initiator_type: js::string(entry, "initiatorType"),
        start_time: js::number(entry, "startTime").unwrap_or_default(),
        duration: js::number(entry, "duration").unwrap_or_default(),
        transfer_size: js::number(entry, "transferSize"),
        encoded_body_size: js::number(entry, "encodedBodySize"),
        decoded_body_size: js::number(entry, "decodedBodySize"),
        next_hop_protocol: js::string(entry, "nextHopProtocol"),
    })
}

fn parse_connection(connection: &JsValue) -> ConnectionInfo {
    ConnectionInfo {
        effective_type: js::string(connection, "effectiveType"),
        downlink: js::number(connection, "downlink"),
        rtt: js::number(connection, "rtt"),
        save_data: js::boolean(connection, "saveData"),
    }
}

fn parse_memory(memory: &JsValue) -> MemoryInfo {
    MemoryInfo {
        js_heap_size_limit: js::number(memory, "jsHeapSizeLimit"),
        total_js_heap_size: js::number(memory, "totalJSHeapSize"),
        used_js_heap_size: js::number(memory, "usedJSHeapSize"),
    }
}

// ============================================================================
// PerformanceObserver
// ============================================================================

pub struct WebObserver {
    /// `PerformanceObserver.supportedEntryTypes`, when the engine exposes it
    supported_types: Option<Array>,
    resource_filter: Option<Function>,
}

impl WebObserver {
    fn supports(&self, entry_type: &str) -> bool {
        match &self.supported_types {
            Some(types) => types.includes(&JsValue::from_str(entry_type), 0),
            None => true,
        }
    }

    fn observe<T: 'static>(
        &self,
        entry_type: &'static str,
        parse: fn(&JsValue) -> Option<T>,
        admit: Option<Function>,
        mut handler: Box<dyn FnMut(Vec<T>)>,
    ) -> Result<Disposer> {
        if !self.supports(entry_type) {
            return Err(PerfError::subscribe(entry_type, "entry type not supported"));
        }

        let callback = Closure::wrap(Box::new(move |list: JsValue| {
            let Some(entries) = js::function(&list, "getEntries").and_then(|f| f.call0(&list).ok())
            else {
                return;
            };
            let parsed: Vec<T> = Array::from(&entries)
                .iter()
                .filter(|entry| admit.as_ref().map_or(true, |f| admits_resource(f, entry)))
                .filter_map(|entry| parse(&entry))
                .collect();
            if !parsed.is_empty() {
                handler(parsed);
            }
        }) as Box<dyn FnMut(JsValue)>);

        let observer = PerformanceObserver::new(callback.as_ref().unchecked_ref())
            .map_err(|e| PerfError::subscribe(entry_type, js::describe(&e)))?;
        let init = js::object(&[
            ("type", JsValue::from_str(entry_type)),
            ("buffered", JsValue::TRUE),
        ])
        .map_err(|e| PerfError::subscribe(entry_type, js::describe(&e)))?;
        js::call1(&observer, "observe", &init)
            .map_err(|e| PerfError::subscribe(entry_type, js::describe(&e)))?;

        Ok(Box::new(move || {
            observer.disconnect();
            drop(callback);
            Ok(())
        }))
    }
}

impl EntryObserver for WebObserver {
    fn observe_long_tasks(&self, handler: Box<dyn FnMut(Vec<LongTaskEntry>)>) -> Result<Disposer> {
        self.observe("longtask", parse_long_task, None, handler)
    }

    fn observe_resources(&self, handler: Box<dyn FnMut(Vec<ResourceEntry>)>) -> Result<Disposer> {
        self.observe(
            "resource",
            parse_resource,
            self.resource_filter.clone(),
            handler,
        )
    }
}

/// Run a page-supplied resource filter on a raw timing entry.
///
/// Entries the filter throws on are dropped.
pub fn admits_resource(filter: &Function, entry: &JsValue) -> bool {
    match filter.call1(&JsValue::NULL, entry) {
        Ok(keep) => keep.is_truthy(),
        Err(e) => {
            debug!(
                url = %js::string(entry, "name").unwrap_or_default(),
                "resourceFilter threw: {}",
                js::describe(&e)
            );
            false
        }
    }
}

// ============================================================================
// Document and lifecycle
// ============================================================================

pub struct WebDocument {
    window: Window,
    document: Document,
}

impl DocumentState for WebDocument {
    fn is_complete(&self) -> bool {
        self.document.ready_state() == "complete"
    }

    fn on_load(&self, handler: Box<dyn FnOnce()>) -> Result<()> {
        let callback = Closure::once_into_js(move || handler());
        let options = AddEventListenerOptions::new();
        options.set_once(true);

        self.window
            .add_event_listener_with_callback_and_add_event_listener_options(
                "load",
                callback.unchecked_ref(),
                &options,
            )
            .map_err(|e| PerfError::subscribe("load", js::describe(&e)))
    }
}

pub struct WebLifecycle {
    window: Window,
    document: Document,
}

impl WebLifecycle {
    fn target(&self, signal: LifecycleSignal) -> EventTarget {
        match signal {
            LifecycleSignal::VisibilityChange => self.document.clone().unchecked_into(),
            LifecycleSignal::PageHide => self.window.clone().unchecked_into(),
        }
    }
}

impl LifecycleSource for WebLifecycle {
    fn listen(&self, signal: LifecycleSignal, handler: Handler) -> Result<Disposer> {
        let name = signal.event_name();
        let target = self.target(signal);
        let callback = Closure::wrap(Box::new(move || handler()) as Box<dyn FnMut()>);

        target
            .add_event_listener_with_callback(name, callback.as_ref().unchecked_ref())
            .map_err(|e| PerfError::subscribe(name, js::describe(&e)))?;

        Ok(Box::new(move || {
            let removed =
                target.remove_event_listener_with_callback(name, callback.as_ref().unchecked_ref());
            match removed {
                Ok(()) => Ok(()),
                Err(e) => {
                    // Still attached; the closure has to outlive the listener
                    callback.forget();
                    Err(PerfError::Release(format!("{}: {}", name, js::describe(&e))))
                }
            }
        }))
    }

    fn is_hidden(&self) -> bool {
        js::string(&self.document, "visibilityState").as_deref() == Some("hidden")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_legacy_type_names() {
        assert_eq!(legacy_type_name(0.0), "navigate");
        assert_eq!(legacy_type_name(1.0), "reload");
        assert_eq!(legacy_type_name(2.0), "back_forward");
        assert_eq!(legacy_type_name(255.0), "255");
    }
}
