use std::cell::RefCell;

use crate::event::{EventHandler, SessionEvent};

/// A simple event bus for broadcasting session events to registered handlers
pub struct EventBus {
    handlers: RefCell<Vec<Box<dyn EventHandler>>>,
}

impl Clone for EventBus {
    fn clone(&self) -> Self {
        // When cloning, create a new empty event bus
        Self::new()
    }
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus")
            .field("handlers", &format!("<{} handlers>", self.handlers.borrow().len()))
            .finish()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl EventBus {
    /// Creates a new event bus
    pub fn new() -> Self {
        Self {
            handlers: RefCell::new(Vec::new()),
        }
    }

    /// Subscribe a handler to receive events
    pub fn subscribe(&self, handler: Box<dyn EventHandler>) {
        self.handlers.borrow_mut().push(handler);
    }

    /// Emit an event to all registered handlers.
    ///
    /// Events emitted from inside a handler are dropped.
    pub fn emit(&self, event: SessionEvent) {
        let Ok(mut handlers) = self.handlers.try_borrow_mut() else {
            log::warn!("Dropping re-entrant event: {:?}", event);
            return;
        };
        log::trace!("Emitting {:?} to {} handlers", event, handlers.len());
        for handler in handlers.iter_mut() {
            handler.handle_event(&event);
        }
    }

    /// Number of subscribed handlers
    pub fn handler_count(&self) -> usize {
        self.handlers.borrow().len()
    }
}
