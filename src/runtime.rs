//! Runtime composition root.
//!
//! # Responsibilities
//! - Own the global dispatcher, the live route table and the scope directory
//! - Keep the navigation listener subscribed for the runtime's lifetime
//! - Apply reloaded configurations atomically
//!
//! # Design Decisions
//! - No process-wide singleton; every runtime is an isolated instance
//! - A rejected reload leaves the previous route table in place

use std::sync::{Mutex, PoisonError};

use tokio::sync::{broadcast, mpsc};

use crate::bus::{Dispatcher, Event, ScopeDirectory, Token};
use crate::config::WaypostConfig;
use crate::observability::metrics;
use crate::routing::{listener, LiveRoutes, Location, RouteError, RouteManager, RouteSource};

struct Navigation {
    source: RouteSource,
    token: Token,
}

/// One self-contained routing and notification instance.
pub struct Runtime {
    dispatcher: Dispatcher,
    routes: LiveRoutes,
    scopes: ScopeDirectory,
    navigation: Mutex<Navigation>,
}

impl Runtime {
    /// Build a runtime from a validated configuration.
    pub fn new(config: &WaypostConfig) -> Result<Self, RouteError> {
        let dispatcher = Dispatcher::new();
        let routes = LiveRoutes::new(RouteManager::from_config(&config.routes)?);
        let scopes = ScopeDirectory::new(&dispatcher);
        for owner in &config.scopes.owners {
            scopes.scope(owner);
        }

        let source = config.routing.source;
        let token = listener::listen(routes.clone(), &dispatcher, source);

        tracing::info!(
            routes = config.routes.len(),
            scopes = scopes.len(),
            source = ?source,
            "Runtime started"
        );

        Ok(Self {
            dispatcher,
            routes,
            scopes,
            navigation: Mutex::new(Navigation { source, token }),
        })
    }

    /// The global dispatcher.
    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    /// The live route table.
    pub fn routes(&self) -> &LiveRoutes {
        &self.routes
    }

    /// Scoped notifiers by owner.
    pub fn scopes(&self) -> &ScopeDirectory {
        &self.scopes
    }

    /// Dispatch a `Navigate` event for `url`.
    ///
    /// Returns the number of handlers the navigation reached.
    pub fn navigate(&self, url: &str) -> Result<usize, RouteError> {
        let location = Location::parse(url)?;
        Ok(self.dispatcher.dispatch(&Event::Navigate(location)))
    }

    /// Replace the route table, routing source and scopes with `config`'s.
    ///
    /// Scopes for owners no longer listed stay open; they are dropped only
    /// through [`ScopeDirectory::remove`].
    pub fn reload(&self, config: &WaypostConfig) -> Result<(), RouteError> {
        let manager = match RouteManager::from_config(&config.routes) {
            Ok(manager) => manager,
            Err(e) => {
                metrics::record_config_reload("rejected");
                tracing::warn!(error = %e, "Reload rejected, keeping current routes");
                return Err(e);
            }
        };
        self.routes.store(manager);

        let mut navigation = self.navigation.lock().unwrap_or_else(PoisonError::into_inner);
        if navigation.source != config.routing.source {
            self.dispatcher.unsubscribe(navigation.token);
            navigation.source = config.routing.source;
            navigation.token =
                listener::listen(self.routes.clone(), &self.dispatcher, navigation.source);
        }
        drop(navigation);

        for owner in &config.scopes.owners {
            self.scopes.scope(owner);
        }

        metrics::record_config_reload("applied");
        tracing::info!(routes = config.routes.len(), "Configuration reloaded");
        Ok(())
    }

    /// Apply configurations from `updates` until shutdown or the channel closes.
    pub async fn follow(
        &self,
        mut updates: mpsc::UnboundedReceiver<WaypostConfig>,
        mut shutdown: broadcast::Receiver<()>,
    ) {
        loop {
            tokio::select! {
                update = updates.recv() => match update {
                    Some(config) => {
                        // Failures are logged by reload.
                        let _ = self.reload(&config);
                    }
                    None => break,
                },
                _ = shutdown.recv() => break,
            }
        }
        tracing::debug!("Stopped following configuration updates");
    }
}

impl Drop for Runtime {
    fn drop(&mut self) {
        let navigation = self.navigation.get_mut().unwrap_or_else(PoisonError::into_inner);
        self.dispatcher.unsubscribe(navigation.token);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::parse_config;
    use crate::routing::RouteOutcome;
    use std::sync::Arc;

    fn config(text: &str) -> WaypostConfig {
        parse_config(text).unwrap()
    }

    const ROUTES: &str = r#"
        [[routes]]
        name = "models"
        pattern = "/models/*"

        [[routes]]
        name = "model"
        pattern = ":id"
        parent = "models"

        [scopes]
        owners = ["panel"]
    "#;

    #[test]
    fn test_navigate_reaches_route_handlers() {
        let runtime = Runtime::new(&config(ROUTES)).unwrap();
        assert!(runtime.scopes().get("panel").is_some());

        let seen: Arc<Mutex<Vec<RouteOutcome>>> = Arc::default();
        let sink = Arc::clone(&seen);
        runtime.dispatcher().on::<RouteOutcome, _>(move |outcome| {
            sink.lock().unwrap().push(outcome.clone());
        });

        runtime.navigate("/models/7").unwrap();
        let seen = seen.lock().unwrap();
        let model = seen
            .iter()
            .find(|o| o.name.as_deref() == Some("model"))
            .unwrap();
        assert!(model.result.matched);
        assert_eq!(model.result.param("id"), Some("7"));
    }

    #[test]
    fn test_reload_switches_source() {
        let runtime = Runtime::new(&config(ROUTES)).unwrap();
        let mut next = config(ROUTES);
        next.routing.source = RouteSource::Hash;
        runtime.reload(&next).unwrap();

        let hits = Arc::new(Mutex::new(0));
        let sink = Arc::clone(&hits);
        runtime.dispatcher().on::<RouteOutcome, _>(move |outcome| {
            if outcome.result.matched {
                *sink.lock().unwrap() += 1;
            }
        });

        runtime.navigate("/elsewhere#/models/3").unwrap();
        // Both the tail route and its child match.
        assert_eq!(*hits.lock().unwrap(), 2);
    }

    #[test]
    fn test_drop_unsubscribes_listener() {
        let runtime = Runtime::new(&WaypostConfig::default()).unwrap();
        let dispatcher = runtime.dispatcher().clone();
        assert_eq!(dispatcher.len(), 1);
        drop(runtime);
        assert_eq!(dispatcher.len(), 0);
    }

    #[test]
    fn test_navigate_decodes_before_matching() {
        let runtime = Runtime::new(&config(
            r#"
            [[routes]]
            name = "cafe"
            pattern = "/café"

            [[routes]]
            name = "files"
            pattern = "/my files/:name"
            "#,
        ))
        .unwrap();

        let seen: Arc<Mutex<Vec<RouteOutcome>>> = Arc::default();
        let sink = Arc::clone(&seen);
        runtime.dispatcher().on::<RouteOutcome, _>(move |outcome| {
            if outcome.result.matched {
                sink.lock().unwrap().push(outcome.clone());
            }
        });

        runtime.navigate("/café").unwrap();
        runtime.navigate("https://host/my%20files/a%20b").unwrap();

        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 2);
        assert_eq!(seen[0].name.as_deref(), Some("cafe"));
        assert_eq!(seen[1].name.as_deref(), Some("files"));
        assert_eq!(seen[1].result.param("name"), Some("a b"));
    }

    #[test]
    fn test_invalid_url() {
        let runtime = Runtime::new(&WaypostConfig::default()).unwrap();
        assert!(matches!(
            runtime.navigate("http://[::1"),
            Err(RouteError::InvalidLocation { .. })
        ));
    }
}
