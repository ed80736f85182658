//! Metric recording for dispatch, subscriptions and route matching.
//!
//! Recording goes through the `metrics` facade. Without an installed
//! recorder every call is a no-op, so library users opt in by installing
//! one of their own.
//!
//! # Metrics
//! - `waypost_dispatch_total` (counter): dispatched events by shape
//! - `waypost_handlers_invoked_total` (counter): handler calls by shape
//! - `waypost_subscriptions` (gauge): live entries by registry label
//! - `waypost_route_tests_total` (counter): route tests by outcome
//! - `waypost_config_reloads_total` (counter): reload attempts by outcome

use crate::bus::Shape;

/// Record one dispatch of a `shape` event reaching `handlers` entries.
pub fn record_dispatch(shape: Shape, handlers: usize) {
    ::metrics::counter!("waypost_dispatch_total", "shape" => shape.as_str()).increment(1);
    ::metrics::counter!("waypost_handlers_invoked_total", "shape" => shape.as_str())
        .increment(handlers as u64);
}

/// Record the current number of entries held by a registry.
pub fn record_subscriptions(registry: &str, count: usize) {
    ::metrics::gauge!("waypost_subscriptions", "registry" => registry.to_string())
        .set(count as f64);
}

/// Record the outcome of a route test.
pub fn record_route_test(matched: bool) {
    let outcome = if matched { "hit" } else { "miss" };
    ::metrics::counter!("waypost_route_tests_total", "outcome" => outcome).increment(1);
}

/// Record a configuration reload; `outcome` is `"applied"` or `"rejected"`.
pub fn record_config_reload(outcome: &'static str) {
    ::metrics::counter!("waypost_config_reloads_total", "outcome" => outcome).increment(1);
}
