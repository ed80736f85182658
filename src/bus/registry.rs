//! Shape-keyed subscription registry.
//!
//! # Responsibilities
//! - Keep, per shape, the ordered list of subscriber entries
//! - Deliver events to every compatible entry in subscription order
//! - Remove entries by token and run their teardown callbacks
//!
//! # Design Decisions
//! - One mutex guards the buckets; handlers never run while it is held
//! - Dispatch iterates a snapshot, so subscribe/unsubscribe from inside a
//!   handler never skips or repeats an entry of the in-flight pass
//! - Teardown runs synchronously, exactly once, after the entry is gone
//! - Order across shapes is global subscription order, not bucket order

use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use thiserror::Error;

use crate::bus::event::{Event, Payload, Shape};
use crate::observability::metrics;

/// A subscriber callback.
pub type Handler = Arc<dyn Fn(&Event) + Send + Sync>;

/// A callback run once when its subscription is removed.
pub type Teardown = Box<dyn FnOnce() + Send>;

/// Errors reported by the bus.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BusError {
    /// The named shape is not one the bus knows.
    #[error("unknown event shape '{0}'")]
    UnknownShape(String),
}

static NEXT_REGISTRY_ID: AtomicU64 = AtomicU64::new(1);

/// Opaque handle to one subscription.
///
/// Only identifies the entry; the registry keeps ownership.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Token {
    registry: u64,
    seq: u64,
}

struct Slot {
    seq: u64,
    handler: Handler,
    teardowns: Vec<Teardown>,
}

#[derive(Default)]
struct Buckets {
    by_shape: HashMap<Shape, Vec<Slot>>,
    next_seq: u64,
    len: usize,
}

/// Holds subscriber entries keyed by the shape they accept.
pub struct Registry {
    id: u64,
    label: String,
    state: Mutex<Buckets>,
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registry")
            .field("id", &self.id)
            .field("label", &self.label)
            .field("len", &self.len())
            .finish()
    }
}

impl Registry {
    /// Create an empty registry; `label` names it in logs and metrics.
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            id: NEXT_REGISTRY_ID.fetch_add(1, Ordering::Relaxed),
            label: label.into(),
            state: Mutex::new(Buckets::default()),
        }
    }

    /// Label given at construction.
    pub fn label(&self) -> &str {
        &self.label
    }

    // Handlers run outside the lock, so a poisoned guard still holds
    // consistent buckets.
    fn state(&self) -> MutexGuard<'_, Buckets> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Subscribe `handler` to every event satisfying `shape`.
    pub fn subscribe<F>(&self, shape: Shape, handler: F) -> Token
    where
        F: Fn(&Event) + Send + Sync + 'static,
    {
        self.subscribe_with(shape, handler, Vec::new())
    }

    /// Subscribe with teardown callbacks run when the entry is removed.
    pub fn subscribe_with<F>(&self, shape: Shape, handler: F, teardowns: Vec<Teardown>) -> Token
    where
        F: Fn(&Event) + Send + Sync + 'static,
    {
        let (token, len) = {
            let mut state = self.state();
            let seq = state.next_seq;
            state.next_seq += 1;
            state.len += 1;
            state.by_shape.entry(shape).or_default().push(Slot {
                seq,
                handler: Arc::new(handler),
                teardowns,
            });
            (
                Token {
                    registry: self.id,
                    seq,
                },
                state.len,
            )
        };

        tracing::debug!(registry = %self.label, shape = %shape, seq = token.seq, "Subscribed");
        metrics::record_subscriptions(&self.label, len);
        token
    }

    /// Subscribe to a payload type, receiving the unwrapped value.
    pub fn on<T, F>(&self, handler: F) -> Token
    where
        T: Payload,
        F: Fn(&T) + Send + Sync + 'static,
    {
        self.subscribe(T::SHAPE, move |event| {
            if let Some(payload) = T::extract(event) {
                handler(payload);
            }
        })
    }

    /// Subscribe by shape name, e.g. from configuration.
    ///
    /// An unknown name is rejected here rather than silently never firing.
    pub fn subscribe_named<F>(
        &self,
        shape: &str,
        handler: F,
        teardowns: Vec<Teardown>,
    ) -> Result<Token, BusError>
    where
        F: Fn(&Event) + Send + Sync + 'static,
    {
        let shape: Shape = shape.parse()?;
        Ok(self.subscribe_with(shape, handler, teardowns))
    }

    /// Deliver `event` to every compatible subscriber, in subscription order.
    ///
    /// Returns the number of handlers invoked; zero is not an error.
    pub fn dispatch(&self, event: &Event) -> usize {
        let shape = event.shape();
        let snapshot: Vec<(u64, Handler)> = {
            let state = self.state();
            let mut snapshot: Vec<(u64, Handler)> = shape
                .satisfies()
                .iter()
                .filter_map(|s| state.by_shape.get(s))
                .flatten()
                .map(|slot| (slot.seq, Arc::clone(&slot.handler)))
                .collect();
            snapshot.sort_unstable_by_key(|(seq, _)| *seq);
            snapshot
        };

        for (_, handler) in &snapshot {
            handler(event);
        }

        tracing::trace!(registry = %self.label, shape = %shape, delivered = snapshot.len(), "Dispatched");
        metrics::record_dispatch(shape, snapshot.len());
        snapshot.len()
    }

    /// Remove the entry behind `token` and run its teardowns.
    ///
    /// Returns `false` when the token is unknown or already removed.
    /// Teardowns may call back into this registry; the lock is released
    /// before they run.
    pub fn unsubscribe(&self, token: Token) -> bool {
        if token.registry != self.id {
            return false;
        }

        let (removed, len) = {
            let mut state = self.state();
            let mut removed = None;
            for slots in state.by_shape.values_mut() {
                if let Some(pos) = slots.iter().position(|slot| slot.seq == token.seq) {
                    removed = Some(slots.remove(pos));
                    break;
                }
            }
            if removed.is_some() {
                state.len -= 1;
            }
            (removed, state.len)
        };

        let Some(slot) = removed else {
            tracing::debug!(registry = %self.label, seq = token.seq, "Unsubscribe for unknown token ignored");
            return false;
        };

        tracing::debug!(registry = %self.label, seq = token.seq, teardowns = slot.teardowns.len(), "Unsubscribed");
        metrics::record_subscriptions(&self.label, len);
        for teardown in slot.teardowns {
            teardown();
        }
        true
    }

    /// Whether `token` still refers to a live entry.
    pub fn contains(&self, token: Token) -> bool {
        token.registry == self.id
            && self
                .state()
                .by_shape
                .values()
                .flatten()
                .any(|slot| slot.seq == token.seq)
    }

    /// Number of live entries.
    pub fn len(&self) -> usize {
        self.state().len
    }

    /// True when nothing is subscribed.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
