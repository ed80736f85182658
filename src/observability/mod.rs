//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! bus, routing and config produce:
//!     → logging.rs (structured log events via tracing)
//!     → metrics.rs (counters and gauges via the metrics facade)
//! ```
//!
//! # Design Decisions
//! - Structured logging (JSON) for machine parsing
//! - Metrics are cheap and no-ops until a recorder is installed

pub mod logging;
pub mod metrics;

pub use logging::{init_logging, LoggingError};
