//! Per-owner notification scopes layered on the global bus.
//!
//! # Responsibilities
//! - Give each owner a private registry
//! - Forward global `Scoped` envelopes addressed to that owner
//! - Keep a directory of scopes created on demand
//!
//! # Design Decisions
//! - Exactly one global subscription per scope, removed when the scope goes
//! - `publish` stays local; `publish_global` skips the owner filter
//! - The forwarding handler holds the private registry, never the scope, so
//!   dropping the last scope handle releases everything

use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};

use dashmap::DashMap;
use uuid::Uuid;

use crate::bus::dispatcher::Dispatcher;
use crate::bus::event::{Event, Payload, Scoped, Shape};
use crate::bus::registry::{Registry, Teardown, Token};

struct ScopeInner {
    owner_id: String,
    local: Arc<Registry>,
    global: Dispatcher,
    forward: Mutex<Option<Token>>,
}

impl ScopeInner {
    fn close(&self) -> bool {
        let token = self
            .forward
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        match token {
            Some(token) => {
                tracing::debug!(owner = %self.owner_id, "Scope closed");
                self.global.unsubscribe(token)
            }
            None => false,
        }
    }
}

impl Drop for ScopeInner {
    fn drop(&mut self) {
        self.close();
    }
}

const SCOPE_LABEL: &str = "scope";

/// A private bus for one owner, fed by envelopes on the global bus.
#[derive(Clone)]
pub struct ScopedNotifier {
    inner: Arc<ScopeInner>,
}

impl fmt::Debug for ScopedNotifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScopedNotifier")
            .field("owner_id", &self.inner.owner_id)
            .field("local", &self.inner.local)
            .finish()
    }
}

impl ScopedNotifier {
    /// Create a scope for `owner_id` on `global`.
    pub fn new(global: &Dispatcher, owner_id: impl Into<String>) -> Self {
        let owner_id = owner_id.into();
        // Shared by all scopes; owner ids go in tracing fields only.
        let local = Arc::new(Registry::new(SCOPE_LABEL));

        let target = Arc::clone(&local);
        let owner = owner_id.clone();
        let token = global.on::<Scoped, _>(move |envelope| {
            if envelope.owner_id == owner {
                target.dispatch(&envelope.payload);
            }
        });

        tracing::debug!(owner = %owner_id, "Scope created");
        Self {
            inner: Arc::new(ScopeInner {
                owner_id,
                local,
                global: global.clone(),
                forward: Mutex::new(Some(token)),
            }),
        }
    }

    /// Owner this scope filters on.
    pub fn owner_id(&self) -> &str {
        &self.inner.owner_id
    }

    /// Subscribe on the private registry.
    pub fn subscribe<F>(&self, shape: Shape, handler: F) -> Token
    where
        F: Fn(&Event) + Send + Sync + 'static,
    {
        self.inner.local.subscribe(shape, handler)
    }

    /// Subscribe on the private registry with teardown callbacks.
    pub fn subscribe_with<F>(&self, shape: Shape, handler: F, teardowns: Vec<Teardown>) -> Token
    where
        F: Fn(&Event) + Send + Sync + 'static,
    {
        self.inner.local.subscribe_with(shape, handler, teardowns)
    }

    /// Subscribe to a payload type on the private registry.
    pub fn on<T, F>(&self, handler: F) -> Token
    where
        T: Payload,
        F: Fn(&T) + Send + Sync + 'static,
    {
        self.inner.local.on(handler)
    }

    /// Remove a private subscription.
    pub fn unsubscribe(&self, token: Token) -> bool {
        self.inner.local.unsubscribe(token)
    }

    /// Deliver to this scope's subscribers only.
    pub fn publish(&self, event: &Event) -> usize {
        self.inner.local.dispatch(event)
    }

    /// Deliver on the global bus, to every scope and global subscriber.
    pub fn publish_global(&self, event: &Event) -> usize {
        self.inner.global.dispatch(event)
    }

    /// Stop receiving global envelopes. Returns `false` if already closed.
    ///
    /// Local publish/subscribe keep working after close.
    pub fn close(&self) -> bool {
        self.inner.close()
    }

    /// Number of private subscriptions.
    pub fn len(&self) -> usize {
        self.inner.local.len()
    }

    /// True when nothing is subscribed privately.
    pub fn is_empty(&self) -> bool {
        self.inner.local.is_empty()
    }
}

/// Scopes by owner id, created on first use.
#[derive(Clone)]
pub struct ScopeDirectory {
    global: Dispatcher,
    scopes: Arc<DashMap<String, ScopedNotifier>>,
}

impl fmt::Debug for ScopeDirectory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScopeDirectory")
            .field("scopes", &self.scopes.len())
            .finish()
    }
}

impl ScopeDirectory {
    /// Create an empty directory over `global`.
    pub fn new(global: &Dispatcher) -> Self {
        Self {
            global: global.clone(),
            scopes: Arc::new(DashMap::new()),
        }
    }

    /// The scope for `owner_id`, creating it if needed.
    pub fn scope(&self, owner_id: &str) -> ScopedNotifier {
        self.scopes
            .entry(owner_id.to_string())
            .or_insert_with(|| ScopedNotifier::new(&self.global, owner_id))
            .value()
            .clone()
    }

    /// A new scope with a random owner id.
    pub fn anonymous(&self) -> ScopedNotifier {
        self.scope(&Uuid::new_v4().to_string())
    }

    /// Existing scope for `owner_id`.
    pub fn get(&self, owner_id: &str) -> Option<ScopedNotifier> {
        self.scopes.get(owner_id).map(|entry| entry.value().clone())
    }

    /// Forget a scope. It shuts down once the last outside handle drops.
    pub fn remove(&self, owner_id: &str) -> bool {
        self.scopes.remove(owner_id).is_some()
    }

    /// Known owner ids, unordered.
    pub fn owners(&self) -> Vec<String> {
        self.scopes.iter().map(|entry| entry.key().clone()).collect()
    }

    /// Number of scopes.
    pub fn len(&self) -> usize {
        self.scopes.len()
    }

    /// True when no scope exists.
    pub fn is_empty(&self) -> bool {
        self.scopes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bus::event::Custom;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn counter(scope: &ScopedNotifier) -> Arc<AtomicUsize> {
        let hits = Arc::new(AtomicUsize::new(0));
        let h = Arc::clone(&hits);
        scope.on::<Custom, _>(move |_| {
            h.fetch_add(1, Ordering::SeqCst);
        });
        hits
    }

    #[test]
    fn test_owner_filter() {
        let global = Dispatcher::new();
        let a = ScopedNotifier::new(&global, "A");
        let hits = counter(&a);

        global.dispatch(&Event::scoped("B", Event::custom("x", 1)));
        assert_eq!(hits.load(Ordering::SeqCst), 0);

        global.dispatch(&Event::scoped("A", Event::custom("x", 1)));
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_publish_is_local() {
        let global = Dispatcher::new();
        let a = ScopedNotifier::new(&global, "A");
        let hits = counter(&a);
        global.subscribe(Shape::Custom, |_| panic!("local publish reached the global bus"));

        assert_eq!(a.publish(&Event::custom("x", 1)), 1);
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_drop_releases_global_subscription() {
        let global = Dispatcher::new();
        let scope = ScopedNotifier::new(&global, "A");
        let copy = scope.clone();
        assert_eq!(global.len(), 1);

        drop(scope);
        assert_eq!(global.len(), 1);
        drop(copy);
        assert_eq!(global.len(), 0);
    }

    #[test]
    fn test_close_is_idempotent() {
        let global = Dispatcher::new();
        let scope = ScopedNotifier::new(&global, "A");
        let hits = counter(&scope);

        assert!(scope.close());
        assert!(!scope.close());
        global.dispatch(&Event::scoped("A", Event::custom("x", 1)));
        assert_eq!(hits.load(Ordering::SeqCst), 0);
        assert_eq!(scope.publish(&Event::custom("x", 1)), 1);
    }

    #[test]
    fn test_directory_creates_on_demand() {
        let global = Dispatcher::new();
        let directory = ScopeDirectory::new(&global);
        let first = directory.scope("u1");
        let again = directory.scope("u1");
        assert_eq!(first.owner_id(), again.owner_id());
        assert_eq!(directory.len(), 1);
        assert_eq!(global.len(), 1);

        let anon = directory.anonymous();
        assert_eq!(anon.owner_id().len(), 36);
        assert_eq!(directory.len(), 2);

        assert!(directory.remove("u1"));
        assert!(!directory.remove("u1"));
        assert!(directory.get("u1").is_none());
    }

    #[test]
    fn test_registry_label_is_shared_across_owners() {
        let global = Dispatcher::new();
        let directory = ScopeDirectory::new(&global);
        let named = directory.scope("u1");
        let anon = directory.anonymous();

        assert_eq!(named.inner.local.label(), "scope");
        assert_eq!(anon.inner.local.label(), "scope");
        assert_eq!(anon.inner.owner_id.len(), 36);
    }
}
