//! Route registration and lookup.
//!
//! # Responsibilities
//! - Own the route tree and the name → node index
//! - Register top-level and nested routes
//! - Test paths against nodes and resolve every named route at once
//! - Publish frozen route tables to concurrent readers
//!
//! # Design Decisions
//! - Built with `&mut self`, queried through `&self`; no locks on the read path
//! - Reloads build a fresh manager and swap it in atomically
//! - Explicit `matched: false` rather than a silent default route

use std::collections::HashMap;
use std::sync::Arc;

use arc_swap::ArcSwap;

use crate::config::RouteConfig;
use crate::observability::metrics;
use crate::routing::tree::{RouteNode, RouteTree};
use crate::routing::types::{NodeId, RouteError, RouteMatch, RouteOutcome};

/// Root container for a route tree.
#[derive(Debug, Clone, Default)]
pub struct RouteManager {
    tree: RouteTree,
    names: HashMap<String, NodeId>,
}

impl RouteManager {
    /// Create an empty manager.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a manager from configured routes, in declaration order.
    ///
    /// A route's `parent` must name a route declared before it.
    pub fn from_config(routes: &[RouteConfig]) -> Result<Self, RouteError> {
        let mut manager = Self::new();
        for route in routes {
            let parent = match &route.parent {
                Some(parent) => manager.lookup_name(parent).ok_or_else(|| {
                    RouteError::UnknownParent {
                        route: route.name.clone(),
                        parent: parent.clone(),
                    }
                })?,
                None => NodeId::ROOT,
            };
            manager.register_named(&route.name, parent, &route.pattern)?;
        }
        tracing::debug!(routes = routes.len(), nodes = manager.tree.len(), "Route table built");
        Ok(manager)
    }

    /// Register a pattern under the root.
    pub fn register_top(&mut self, pattern: &str) -> Result<NodeId, RouteError> {
        self.register(NodeId::ROOT, pattern)
    }

    /// Register a pattern relative to `parent`, returning the leaf node.
    pub fn register(&mut self, parent: NodeId, pattern: &str) -> Result<NodeId, RouteError> {
        let id = self.tree.register(parent, pattern)?;
        tracing::debug!(parent = %parent, node = %id, pattern, "Route registered");
        Ok(id)
    }

    /// Alias of [`register`](Self::register) for nested scopes.
    pub fn child(&mut self, parent: NodeId, pattern: &str) -> Result<NodeId, RouteError> {
        self.register(parent, pattern)
    }

    /// Register a pattern and give its leaf a unique name.
    pub fn register_named(
        &mut self,
        name: &str,
        parent: NodeId,
        pattern: &str,
    ) -> Result<NodeId, RouteError> {
        if self.names.contains_key(name) {
            return Err(RouteError::DuplicateName(name.to_string()));
        }
        let id = self.register(parent, pattern)?;
        self.tree.set_name(id, name)?;
        self.names.insert(name.to_string(), id);
        Ok(id)
    }

    /// Node registered under `name`.
    pub fn lookup_name(&self, name: &str) -> Option<NodeId> {
        self.names.get(name).copied()
    }

    /// Borrow a node view.
    pub fn node(&self, id: NodeId) -> Result<RouteNode<'_>, RouteError> {
        self.tree.node(id)
    }

    /// The underlying arena.
    pub fn tree(&self) -> &RouteTree {
        &self.tree
    }

    /// Test `path` against the node `id`.
    pub fn test(&self, id: NodeId, path: &str) -> Result<RouteMatch, RouteError> {
        let result = self.node(id)?.test(path);
        metrics::record_route_test(result.matched);
        Ok(result)
    }

    /// First endpoint reachable from the root for `path`.
    pub fn lookup(&self, path: &str) -> Option<(NodeId, RouteMatch)> {
        let found = self.node(NodeId::ROOT).ok()?.locate(path);
        metrics::record_route_test(found.is_some());
        found
    }

    /// Evaluate every terminal route against `path`, in registration order.
    pub fn resolve(&self, path: &str) -> Vec<RouteOutcome> {
        self.tree
            .terminals()
            .map(|node| {
                let result = node.test(path);
                metrics::record_route_test(result.matched);
                RouteOutcome {
                    node: node.id(),
                    name: node.name().map(str::to_string),
                    pattern: node.full_pattern(),
                    result,
                }
            })
            .collect()
    }
}

/// Shared, atomically swappable route table.
#[derive(Debug, Clone)]
pub struct LiveRoutes {
    inner: Arc<ArcSwap<RouteManager>>,
}

impl LiveRoutes {
    /// Wrap a built manager.
    pub fn new(manager: RouteManager) -> Self {
        Self {
            inner: Arc::new(ArcSwap::from_pointee(manager)),
        }
    }

    /// Current table snapshot.
    pub fn load(&self) -> Arc<RouteManager> {
        self.inner.load_full()
    }

    /// Replace the table; readers holding a snapshot keep the old one.
    pub fn store(&self, manager: RouteManager) {
        self.inner.store(Arc::new(manager));
    }
}

impl Default for LiveRoutes {
    fn default() -> Self {
        Self::new(RouteManager::new())
    }
}
