//! The application-wide event bus.
//!
//! A `Dispatcher` is a cheap, clonable handle to one [`Registry`]. It is an
//! explicit context object: the composition root creates the default
//! instance and hands clones to whatever needs to publish or subscribe.

use std::fmt;
use std::sync::{Arc, Weak};

use crate::bus::event::{Event, Payload, Shape};
use crate::bus::registry::{BusError, Registry, Teardown, Token};

/// Handle to the global subscription registry.
#[derive(Clone)]
pub struct Dispatcher {
    registry: Arc<Registry>,
}

impl fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Dispatcher").field(&self.registry).finish()
    }
}

impl Default for Dispatcher {
    fn default() -> Self {
        Self::new()
    }
}

impl Dispatcher {
    /// Create an isolated bus.
    pub fn new() -> Self {
        Self {
            registry: Arc::new(Registry::new("global")),
        }
    }

    /// Subscribe `handler` to every event satisfying `shape`.
    pub fn subscribe<F>(&self, shape: Shape, handler: F) -> Token
    where
        F: Fn(&Event) + Send + Sync + 'static,
    {
        self.registry.subscribe(shape, handler)
    }

    /// Subscribe with teardown callbacks.
    pub fn subscribe_with<F>(&self, shape: Shape, handler: F, teardowns: Vec<Teardown>) -> Token
    where
        F: Fn(&Event) + Send + Sync + 'static,
    {
        self.registry.subscribe_with(shape, handler, teardowns)
    }

    /// Subscribe by shape name.
    pub fn subscribe_named<F>(
        &self,
        shape: &str,
        handler: F,
        teardowns: Vec<Teardown>,
    ) -> Result<Token, BusError>
    where
        F: Fn(&Event) + Send + Sync + 'static,
    {
        self.registry.subscribe_named(shape, handler, teardowns)
    }

    /// Subscribe to a payload type.
    pub fn on<T, F>(&self, handler: F) -> Token
    where
        T: Payload,
        F: Fn(&T) + Send + Sync + 'static,
    {
        self.registry.on(handler)
    }

    /// Deliver `event` synchronously; returns the number of handlers invoked.
    pub fn dispatch(&self, event: &Event) -> usize {
        self.registry.dispatch(event)
    }

    /// Remove a subscription; `false` if it was already gone.
    pub fn unsubscribe(&self, token: Token) -> bool {
        self.registry.unsubscribe(token)
    }

    /// Number of live subscriptions.
    pub fn len(&self) -> usize {
        self.registry.len()
    }

    /// True when nothing is subscribed.
    pub fn is_empty(&self) -> bool {
        self.registry.is_empty()
    }

    /// A handle that does not keep the bus alive.
    ///
    /// Handlers stored inside the bus use this to publish back into it
    /// without forming a reference cycle.
    pub fn downgrade(&self) -> WeakDispatcher {
        WeakDispatcher {
            registry: Arc::downgrade(&self.registry),
        }
    }
}

/// Non-owning counterpart of [`Dispatcher`].
#[derive(Debug, Clone)]
pub struct WeakDispatcher {
    registry: Weak<Registry>,
}

impl WeakDispatcher {
    /// Recover a strong handle if the bus still exists.
    pub fn upgrade(&self) -> Option<Dispatcher> {
        self.registry.upgrade().map(|registry| Dispatcher { registry })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bus::event::Click;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_clones_share_one_bus() {
        let bus = Dispatcher::new();
        let other = bus.clone();
        let hits = Arc::new(AtomicUsize::new(0));
        let h = Arc::clone(&hits);
        other.on::<Click, _>(move |_| {
            h.fetch_add(1, Ordering::SeqCst);
        });

        assert_eq!(bus.dispatch(&Event::Click(Click { x: 1, y: 2 })), 1);
        assert_eq!(hits.load(Ordering::SeqCst), 1);
        assert_eq!(bus.len(), 1);
    }

    #[test]
    fn test_separate_instances_are_isolated() {
        let a = Dispatcher::new();
        let b = Dispatcher::new();
        a.subscribe(Shape::Any, |_| panic!("delivered across buses"));
        assert_eq!(b.dispatch(&Event::custom("ping", 1)), 0);
    }

    #[test]
    fn test_weak_handle() {
        let bus = Dispatcher::new();
        let weak = bus.downgrade();
        assert!(weak.upgrade().is_some());
        drop(bus);
        assert!(weak.upgrade().is_none());
    }
}
