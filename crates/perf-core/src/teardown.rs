//! Aggregate disposal of continuous subscriptions

use crate::error::Result;
use crate::host::Disposer;
use std::cell::{Cell, RefCell};
use std::fmt;
use tracing::{debug, warn};

/// Invoke every disposer, even when some fail.
///
/// Failures are logged; the first one is returned after all disposers ran.
pub fn release_all(disposers: Vec<(&'static str, Disposer)>) -> Result<()> {
    let mut first_error = None;
    for (owner, dispose) in disposers {
        if let Err(e) = dispose() {
            warn!(owner, "Failed to release subscription: {}", e);
            first_error.get_or_insert(e);
        }
    }
    first_error.map_or(Ok(()), Err)
}

/// Handle returned by [`Collector::initialize`](crate::Collector::initialize).
///
/// [`teardown`](Teardown::teardown) disconnects every continuous
/// subscription the probes registered. It is safe to call any number of
/// times; only the first call releases anything. Dropping the handle leaves
/// the subscriptions active for the rest of the page's life.
#[must_use = "without the handle the subscriptions can never be released"]
#[derive(Default)]
pub struct Teardown {
    disposers: RefCell<Vec<(&'static str, Disposer)>>,
    torn_down: Cell<bool>,
}

impl Teardown {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn push(&self, owner: &'static str, disposer: Disposer) {
        self.disposers.borrow_mut().push((owner, disposer));
    }

    /// Number of subscriptions still held
    pub fn active_subscriptions(&self) -> usize {
        self.disposers.borrow().len()
    }

    pub fn is_torn_down(&self) -> bool {
        self.torn_down.get()
    }

    pub fn teardown(&self) {
        if self.torn_down.replace(true) {
            return;
        }
        // Taken out first so a disposer that re-enters teardown finds nothing.
        let disposers = std::mem::take(&mut *self.disposers.borrow_mut());
        debug!(count = disposers.len(), "Tearing down collector");
        if let Err(e) = release_all(disposers) {
            debug!("Teardown finished with release failures, first: {}", e);
        }
    }
}

impl fmt::Debug for Teardown {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Teardown")
            .field("active_subscriptions", &self.active_subscriptions())
            .field("torn_down", &self.is_torn_down())
            .finish()
    }
}
