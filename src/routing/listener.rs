//! Navigation → route change bridge.
//!
//! Subscribes a live route table to `Navigate` events. Every navigation is
//! resolved against all terminal routes and one `Route` event per route is
//! dispatched back on the same bus, matched or not, so views can show or
//! hide themselves without knowing about the tree.

use crate::bus::{Dispatcher, Event, Token};
use crate::routing::location::{Location, RouteSource};
use crate::routing::router::LiveRoutes;

/// Start resolving navigations on `dispatcher` against `routes`.
///
/// Returns the token of the `Navigate` subscription; unsubscribe it to stop.
pub fn listen(routes: LiveRoutes, dispatcher: &Dispatcher, source: RouteSource) -> Token {
    let bus = dispatcher.downgrade();
    dispatcher.on::<Location, _>(move |location| {
        let Some(bus) = bus.upgrade() else {
            return;
        };
        let table = routes.load();
        let target = location.target(source);
        let outcomes = table.resolve(target);

        tracing::debug!(
            location = %location,
            path = target,
            matched = outcomes.iter().filter(|o| o.result.matched).count(),
            routes = outcomes.len(),
            "Navigation resolved"
        );
        for outcome in outcomes {
            bus.dispatch(&Event::Route(outcome));
        }
    })
}
