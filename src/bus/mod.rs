//! Event bus subsystem.
//!
//! # Data Flow
//! ```text
//! producer
//!     → Dispatcher::dispatch(&Event)          (dispatcher.rs, global registry)
//!     → Registry: shapes the event satisfies   (event.rs table)
//!     → handlers, in subscription order        (registry.rs)
//!
//! Event::Scoped { owner_id, payload }
//!     → each ScopedNotifier's forwarding handler (scoped.rs)
//!     → owner matches → private registry dispatch(payload)
//! ```
//!
//! # Design Decisions
//! - Closed event enum; the shape is an explicit discriminant
//! - Synchronous delivery, no queue, no background task
//! - No hidden singleton: the bus is an explicit, clonable context object

pub mod dispatcher;
pub mod event;
pub mod registry;
pub mod scoped;

pub use dispatcher::{Dispatcher, WeakDispatcher};
pub use event::{Click, Custom, Event, Key, Payload, Scoped, Shape, ViewUpdate};
pub use registry::{BusError, Handler, Registry, Teardown, Token};
pub use scoped::{ScopeDirectory, ScopedNotifier};
