//! The single narrow interface every probe reports through

use crate::event::Event;
use std::fmt;
use std::rc::Rc;

/// Shared handle to the caller's emission callback.
///
/// Cloning is cheap; every probe holds its own clone. The collector never
/// awaits or inspects the callback, it only hands events over.
#[derive(Clone)]
pub struct Emitter {
    callback: Rc<dyn Fn(Event)>,
}

impl Emitter {
    pub fn new<F>(callback: F) -> Self
    where
        F: Fn(Event) + 'static,
    {
        Self {
            callback: Rc::new(callback),
        }
    }

    pub fn emit(&self, event: Event) {
        (self.callback)(event);
    }
}

impl fmt::Debug for Emitter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Emitter").finish_non_exhaustive()
    }
}

impl<F> From<F> for Emitter
where
    F: Fn(Event) + 'static,
{
    fn from(callback: F) -> Self {
        Emitter::new(callback)
    }
}
