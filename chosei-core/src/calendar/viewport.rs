//! Viewport-scoped pointer listeners.
//!
//! A drag that leaves the grid must still end when the pointer is released,
//! so release handlers live on the viewport rather than on the grid. Each
//! registration returns a [`Subscription`] that unregisters on drop.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use tracing::trace;

/// Where the pointer was released.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PointerRelease {
    pub inside_grid: bool,
}

impl PointerRelease {
    pub fn inside() -> Self {
        Self { inside_grid: true }
    }

    pub fn outside() -> Self {
        Self { inside_grid: false }
    }
}

type ReleaseHandler = Rc<RefCell<Box<dyn FnMut(PointerRelease)>>>;

#[derive(Default)]
struct Registry {
    next_id: u64,
    handlers: Vec<(u64, ReleaseHandler)>,
}

/// The whole visible surface. Cheap to clone; clones share listeners.
#[derive(Clone, Default)]
pub struct Viewport {
    registry: Rc<RefCell<Registry>>,
}

impl Viewport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler for pointer releases anywhere in the viewport.
    pub fn on_pointer_up(&self, handler: impl FnMut(PointerRelease) + 'static) -> Subscription {
        let mut registry = self.registry.borrow_mut();
        let id = registry.next_id;
        registry.next_id += 1;
        registry
            .handlers
            .push((id, Rc::new(RefCell::new(Box::new(handler)))));

        Subscription {
            id,
            registry: Rc::downgrade(&self.registry),
        }
    }

    /// Deliver a pointer release to every registered handler.
    pub fn release_pointer(&self, release: PointerRelease) {
        // Snapshot first so handlers may subscribe or unsubscribe while running.
        let handlers: Vec<ReleaseHandler> = self
            .registry
            .borrow()
            .handlers
            .iter()
            .map(|(_, handler)| Rc::clone(handler))
            .collect();

        trace!(listeners = handlers.len(), ?release, "Pointer released");

        for handler in handlers {
            if let Ok(mut handler) = handler.try_borrow_mut() {
                (*handler)(release);
            }
        }
    }

    pub fn listener_count(&self) -> usize {
        self.registry.borrow().handlers.len()
    }
}

/// Keeps a viewport listener registered for as long as it is alive.
#[must_use = "dropping a Subscription unregisters the listener"]
pub struct Subscription {
    id: u64,
    registry: Weak<RefCell<Registry>>,
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(registry) = self.registry.upgrade() {
            registry
                .borrow_mut()
                .handlers
                .retain(|(id, _)| *id != self.id);
        }
    }
}
