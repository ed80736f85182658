//! Waypost: hierarchical route matching and a typed event bus.
//!
//! # Architecture Overview
//!
//! ```text
//!   Navigate(Location) ──▶ bus::Dispatcher ──▶ routing::listener
//!                               ▲                     │
//!                               │                     ▼
//!                               └──── Route(RouteOutcome) per terminal route
//!
//!   bus::ScopedNotifier: owner-local registry, fed by Scoped events
//!   config ──▶ runtime::Runtime (composition root, hot reload)
//! ```

// Core subsystems
pub mod bus;
pub mod routing;

// Cross-cutting concerns
pub mod config;
pub mod lifecycle;
pub mod observability;

pub mod runtime;

pub use bus::{Dispatcher, Event, Payload, ScopeDirectory, ScopedNotifier, Shape, Token};
pub use config::WaypostConfig;
pub use routing::{Location, RouteManager, RouteMatch, RouteOutcome, RouteSource};
pub use runtime::Runtime;
