//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Registration (build once):
//!     pattern string "/models/*"
//!     → matcher.rs (compile to Pattern chain)
//!     → tree.rs (append nodes to the arena)
//!     → router.rs (RouteManager, optional names)
//!     → LiveRoutes (frozen, swapped on reload)
//!
//! Lookup (query many):
//!     Location (location.rs) → path or hash
//!     → RouteNode::test / RouteManager::resolve
//!     → RouteMatch { params, remainder, matched }
//!     → listener.rs publishes Route events on the bus
//! ```
//!
//! # Design Decisions
//! - Trees are immutable once built; reload means rebuild + swap
//! - No regex, no specificity ordering: first registered sibling wins
//! - A miss is `matched: false`, never an error

pub mod listener;
pub mod location;
pub mod matcher;
pub mod router;
pub mod tree;
pub mod types;

pub use location::{Location, RouteSource};
pub use matcher::Pattern;
pub use router::{LiveRoutes, RouteManager};
pub use tree::{RouteNode, RouteTree};
pub use types::{NodeId, RouteError, RouteMatch, RouteOutcome, RouteResult};
