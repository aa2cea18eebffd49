//! Bridge to the `web-vitals` JavaScript module

use crate::js;
use js_sys::Promise;
use perf_core::{MetricReport, PerfError, Rating, Result, VitalMetric, VitalsLibrary};
use std::rc::Rc;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::JsFuture;

/// Module specifier used when the page does not hand in a module
pub const VITALS_SPECIFIER: &str = "web-vitals";

#[wasm_bindgen(inline_js = "export function import_module(specifier) { return import(specifier); }")]
extern "C" {
    #[wasm_bindgen(catch)]
    fn import_module(specifier: &str) -> std::result::Result<Promise, JsValue>;
}

/// An imported `web-vitals` module
pub struct JsVitals {
    module: JsValue,
}

impl VitalsLibrary for JsVitals {
    fn on_metric(
        &self,
        metric: VitalMetric,
        report_all_changes: bool,
        mut handler: Box<dyn FnMut(MetricReport)>,
    ) -> Result<()> {
        let register = js::function(&self.module, metric.handler_name()).ok_or_else(|| {
            PerfError::VitalsLibrary(format!("{} is not exported", metric.handler_name()))
        })?;

        let callback = Closure::wrap(Box::new(move |report: JsValue| {
            if let Some(report) = parse_report(&report) {
                handler(report);
            }
        }) as Box<dyn FnMut(JsValue)>);

        let options = js::object(&[(
            "reportAllChanges",
            JsValue::from_bool(report_all_changes),
        )])
        .map_err(|e| PerfError::VitalsLibrary(js::describe(&e)))?;

        register
            .call2(&self.module, callback.as_ref(), &options)
            .map_err(|e| PerfError::VitalsLibrary(js::describe(&e)))?;

        // The library keeps its callbacks for the page lifetime and has no unsubscribe
        callback.forget();
        Ok(())
    }
}

fn parse_report(metric: &JsValue) -> Option<MetricReport> {
    Some(MetricReport {
        value: js::number(metric, "value")?,
        rating: js::string(metric, "rating").and_then(|r| r.parse::<Rating>().ok()),
        delta: js::number(metric, "delta"),
        id: js::string(metric, "id"),
        navigation_type: js::string(metric, "navigationType"),
        attribution: js::get(metric, "attribution").and_then(|a| js::to_json(&a)),
    })
}

/// Resolve the vitals module.
///
/// A module handed in by the page wins (awaited first when it is a promise);
/// otherwise the module is imported dynamically by [`VITALS_SPECIFIER`].
pub async fn load(module: Option<JsValue>) -> Result<Rc<dyn VitalsLibrary>> {
    let module = match module {
        Some(module) => resolve(module).await?,
        None => import(VITALS_SPECIFIER).await?,
    };
    Ok(Rc::new(JsVitals { module }))
}

async fn resolve(value: JsValue) -> Result<JsValue> {
    match value.dyn_into::<Promise>() {
        Ok(promise) => JsFuture::from(promise)
            .await
            .map_err(|e| PerfError::VitalsLibrary(js::describe(&e))),
        Err(value) => Ok(value),
    }
}

pub(crate) async fn import(specifier: &str) -> Result<JsValue> {
    let pending =
        import_module(specifier).map_err(|e| PerfError::VitalsLibrary(js::describe(&e)))?;
    JsFuture::from(pending)
        .await
        .map_err(|e| PerfError::VitalsLibrary(js::describe(&e)))
}
