//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for a waypost
//! runtime. All types derive Serde traits for deserialization from TOML.

use serde::{Deserialize, Serialize};

use crate::routing::RouteSource;

/// Root configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct WaypostConfig {
    /// How navigations are turned into routable paths.
    pub routing: RoutingConfig,

    /// Route definitions, in registration order.
    pub routes: Vec<RouteConfig>,

    /// Notification scopes created at startup.
    pub scopes: ScopeConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Routing behaviour.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct RoutingConfig {
    /// Route on the URL path or on the hash fragment.
    pub source: RouteSource,
}

/// One route registration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct RouteConfig {
    /// Route identifier for logging and route events.
    pub name: String,

    /// Pattern, e.g. `/models/*` or `:id`.
    pub pattern: String,

    /// Name of a route declared earlier to nest this pattern under.
    #[serde(default)]
    pub parent: Option<String>,
}

/// Scopes known up front.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct ScopeConfig {
    /// Owner ids to create scopes for.
    pub owners: Vec<String>,
}

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human readable, for development.
    #[default]
    Pretty,
    /// One JSON object per line.
    Json,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Log output format.
    pub log_format: LogFormat,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
        }
    }
}
