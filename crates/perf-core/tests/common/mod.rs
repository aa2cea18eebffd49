//! Scripted host for integration tests
//!
//! Each capability is an `Option` so tests can remove any subset. Observers,
//! listeners and load handlers are recorded so tests can deliver entries and
//! signals by hand and check what teardown released.

#![allow(dead_code)]

use futures::executor::LocalSpawner;
use futures::future::LocalBoxFuture;
use futures::task::LocalSpawnExt;
use perf_core::host::{
    ConnectionInfo, DocumentState, EntryObserver, Handler, LifecycleSignal, LifecycleSource,
    LongTaskEntry, MemoryInfo, NavigationTiming, PaintEntry, ResourceEntry, TimingSource,
    VitalsFuture,
};
use perf_core::{Disposer, Emitter, Event, Host, PerfError, Result};
use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;

pub const PAGE_URL: &str = "https://shop.example/products/42";
pub const NOW: i64 = 1_700_000_000_000;

/// Install a test subscriber once so `tracing` output shows up on failure
pub fn init_logging() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::TRACE)
        .with_test_writer()
        .try_init();
}

/// Collects every emitted event
pub fn recorder() -> (Emitter, Rc<RefCell<Vec<Event>>>) {
    let events = Rc::new(RefCell::new(Vec::new()));
    let sink = events.clone();
    (Emitter::new(move |event| sink.borrow_mut().push(event)), events)
}

/// Registered callbacks, addressable by slot so disposers can remove them
pub struct Slots<T> {
    items: Rc<RefCell<Vec<Option<T>>>>,
}

impl<T> Clone for Slots<T> {
    fn clone(&self) -> Self {
        Self {
            items: self.items.clone(),
        }
    }
}

impl<T> Default for Slots<T> {
    fn default() -> Self {
        Self {
            items: Rc::new(RefCell::new(Vec::new())),
        }
    }
}

impl<T: 'static> Slots<T> {
    pub fn add(&self, item: T) -> usize {
        let mut items = self.items.borrow_mut();
        items.push(Some(item));
        items.len() - 1
    }

    pub fn remove(&self, slot: usize) -> bool {
        self.items.borrow_mut()[slot].take().is_some()
    }

    pub fn active(&self) -> usize {
        self.items.borrow().iter().filter(|i| i.is_some()).count()
    }

    pub fn for_each(&self, mut f: impl FnMut(&mut T)) {
        for item in self.items.borrow_mut().iter_mut().flatten() {
            f(item);
        }
    }

    /// Disposer that removes `slot`, or fails when `fail` is set
    pub fn disposer(&self, slot: usize, fail: bool) -> Disposer {
        let slots = self.clone();
        Box::new(move || {
            if fail {
                return Err(PerfError::Release("host refused to disconnect".to_string()));
            }
            slots.remove(slot);
            Ok(())
        })
    }
}

pub struct FakeTiming {
    pub navigation: std::result::Result<Option<NavigationTiming>, PerfError>,
    pub paints: std::result::Result<Vec<PaintEntry>, PerfError>,
    pub legacy_type: Option<String>,
    pub navigation_reads: Cell<u32>,
    pub paint_reads: Cell<u32>,
}

impl Default for FakeTiming {
    fn default() -> Self {
        Self {
            navigation: Ok(None),
            paints: Ok(Vec::new()),
            legacy_type: None,
            navigation_reads: Cell::new(0),
            paint_reads: Cell::new(0),
        }
    }
}

impl TimingSource for FakeTiming {
    fn navigation_entry(&self) -> Result<Option<NavigationTiming>> {
        self.navigation_reads.set(self.navigation_reads.get() + 1);
        self.navigation.clone()
    }

    fn paint_entries(&self) -> Result<Vec<PaintEntry>> {
        self.paint_reads.set(self.paint_reads.get() + 1);
        self.paints.clone()
    }

    fn legacy_navigation_type(&self) -> Option<String> {
        self.legacy_type.clone()
    }
}

type LongTaskHandler = Box<dyn FnMut(Vec<LongTaskEntry>)>;
type ResourceHandler = Box<dyn FnMut(Vec<ResourceEntry>)>;

#[derive(Default)]
pub struct FakeObserver {
    pub long_tasks: Slots<LongTaskHandler>,
    pub resources: Slots<ResourceHandler>,
    pub refuse_long_tasks: bool,
    pub refuse_resources: bool,
    pub fail_disconnect: bool,
}

impl FakeObserver {
    pub fn push_long_tasks(&self, entries: Vec<LongTaskEntry>) {
        self.long_tasks.for_each(|h| h(entries.clone()));
    }

    pub fn push_resources(&self, entries: Vec<ResourceEntry>) {
        self.resources.for_each(|h| h(entries.clone()));
    }
}

impl EntryObserver for FakeObserver {
    fn observe_long_tasks(&self, handler: LongTaskHandler) -> Result<Disposer> {
        if self.refuse_long_tasks {
            return Err(PerfError::subscribe("longtask", "entry type not supported"));
        }
        let slot = self.long_tasks.add(handler);
        Ok(self.long_tasks.disposer(slot, self.fail_disconnect))
    }

    fn observe_resources(&self, handler: ResourceHandler) -> Result<Disposer> {
        if self.refuse_resources {
            return Err(PerfError::subscribe("resource", "entry type not supported"));
        }
        let slot = self.resources.add(handler);
        Ok(self.resources.disposer(slot, self.fail_disconnect))
    }
}

#[derive(Default)]
pub struct FakeDocument {
    pub complete: Cell<bool>,
    pub load_handlers: RefCell<Vec<Box<dyn FnOnce()>>>,
}

impl FakeDocument {
    /// Deliver the load signal to every pending handler
    pub fn fire_load(&self) {
        self.complete.set(true);
        let handlers = std::mem::take(&mut *self.load_handlers.borrow_mut());
        for handler in handlers {
            handler();
        }
    }

    pub fn pending(&self) -> usize {
        self.load_handlers.borrow().len()
    }
}

impl DocumentState for FakeDocument {
    fn is_complete(&self) -> bool {
        self.complete.get()
    }

    fn on_load(&self, handler: Box<dyn FnOnce()>) -> Result<()> {
        self.load_handlers.borrow_mut().push(handler);
        Ok(())
    }
}

#[derive(Default)]
pub struct FakeLifecycle {
    pub hidden: Cell<bool>,
    pub listeners: Slots<(LifecycleSignal, Handler)>,
    pub refuse: Option<LifecycleSignal>,
}

impl FakeLifecycle {
    pub fn dispatch(&self, signal: LifecycleSignal) {
        let mut matching = Vec::new();
        self.listeners.for_each(|(s, handler)| {
            if *s == signal {
                matching.push(handler.clone());
            }
        });
        for handler in matching {
            handler();
        }
    }
}

impl LifecycleSource for FakeLifecycle {
    fn listen(&self, signal: LifecycleSignal, handler: Handler) -> Result<Disposer> {
        if self.refuse == Some(signal) {
            return Err(PerfError::subscribe("lifecycle", "listener rejected"));
        }
        let slot = self.listeners.add((signal, handler));
        Ok(self.listeners.disposer(slot, false))
    }

    fn is_hidden(&self) -> bool {
        self.hidden.get()
    }
}

type VitalsOutcome = Box<dyn FnOnce() -> VitalsFuture>;

pub struct FakeHost {
    pub timing: Option<FakeTiming>,
    pub observer: Option<FakeObserver>,
    pub document: Option<FakeDocument>,
    pub lifecycle: Option<FakeLifecycle>,
    pub connections: HashMap<&'static str, ConnectionInfo>,
    pub memory: Option<MemoryInfo>,
    pub draw: Cell<f64>,
    pub vitals: RefCell<Option<VitalsOutcome>>,
    pub spawner: Option<LocalSpawner>,
}

impl FakeHost {
    /// No capabilities at all
    pub fn bare() -> Self {
        Self {
            timing: None,
            observer: None,
            document: None,
            lifecycle: None,
            connections: HashMap::new(),
            memory: None,
            draw: Cell::new(0.0),
            vitals: RefCell::new(None),
            spawner: None,
        }
    }

    /// Timing, observer, document and lifecycle present; nothing recorded yet
    pub fn browser() -> Self {
        Self {
            timing: Some(FakeTiming::default()),
            observer: Some(FakeObserver::default()),
            document: Some(FakeDocument::default()),
            lifecycle: Some(FakeLifecycle::default()),
            ..Self::bare()
        }
    }

    pub fn with_vitals<F>(self, load: F) -> Self
    where
        F: FnOnce() -> VitalsFuture + 'static,
    {
        *self.vitals.borrow_mut() = Some(Box::new(load));
        self
    }

    pub fn with_spawner(mut self, spawner: LocalSpawner) -> Self {
        self.spawner = Some(spawner);
        self
    }

    pub fn fake_observer(&self) -> &FakeObserver {
        self.observer.as_ref().expect("observer capability")
    }

    pub fn fake_document(&self) -> &FakeDocument {
        self.document.as_ref().expect("document capability")
    }

    pub fn fake_lifecycle(&self) -> &FakeLifecycle {
        self.lifecycle.as_ref().expect("lifecycle capability")
    }
}

impl Host for FakeHost {
    fn page_url(&self) -> Option<String> {
        Some(PAGE_URL.to_string())
    }

    fn now_ms(&self) -> i64 {
        NOW
    }

    fn random(&self) -> f64 {
        self.draw.get()
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
        self.connections.get(alias).cloned()
    }

    fn memory_info(&self) -> Option<MemoryInfo> {
        self.memory.clone()
    }

    fn vitals(&self) -> Option<VitalsFuture> {
        self.vitals.borrow_mut().take().map(|load| load())
    }

    fn spawn_local(&self, task: LocalBoxFuture<'static, ()>) -> bool {
        match &self.spawner {
            Some(spawner) => spawner.spawn_local(task).is_ok(),
            None => false,
        }
    }
}

pub fn resource(url: &str, initiator: &str) -> ResourceEntry {
    ResourceEntry {
        name: url.to_string(),
        initiator_type: Some(initiator.to_string()),
        start_time: 100.0,
        duration: 35.0,
        transfer_size: Some(1024.0),
        encoded_body_size: Some(900.0),
        decoded_body_size: Some(2700.0),
        next_hop_protocol: Some("h2".to_string()),
    }
}

pub fn long_task(start_time: f64, duration: f64) -> LongTaskEntry {
    LongTaskEntry {
        start_time,
        duration,
        attribution: None,
    }
}
