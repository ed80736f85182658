//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Check referential integrity (parents are declared before children)
//! - Validate values (patterns compile, known log levels, unique ids)

use std::collections::HashSet;

use thiserror::Error;

use crate::config::schema::WaypostConfig;
use crate::routing::{matcher, RouteError};

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// A single semantic problem in a configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// Route at this position has no name.
    #[error("route #{0} has an empty name")]
    EmptyRouteName(usize),

    /// Two routes share a name.
    #[error("duplicate route name '{0}'")]
    DuplicateRouteName(String),

    /// A parent is missing or declared later.
    #[error("route '{route}' references undeclared parent '{parent}'")]
    UnknownParent { route: String, parent: String },

    /// The pattern does not compile.
    #[error("route '{route}' has an invalid pattern: {source}")]
    InvalidPattern { route: String, source: RouteError },

    /// Unsupported log level.
    #[error("unknown log level '{0}'")]
    InvalidLogLevel(String),

    /// Scope owner id is empty.
    #[error("scope owner #{0} is empty")]
    EmptyOwner(usize),

    /// Scope owner id listed twice.
    #[error("duplicate scope owner '{0}'")]
    DuplicateOwner(String),
}

/// Validate a parsed configuration, collecting every problem found.
pub fn validate_config(config: &WaypostConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    let mut declared = HashSet::new();
    for (i, route) in config.routes.iter().enumerate() {
        if route.name.trim().is_empty() {
            errors.push(ValidationError::EmptyRouteName(i));
        } else if !declared.insert(route.name.as_str()) {
            errors.push(ValidationError::DuplicateRouteName(route.name.clone()));
        }

        if let Some(parent) = &route.parent {
            // A route cannot nest under itself.
            if parent == &route.name || !declared.contains(parent.as_str()) {
                errors.push(ValidationError::UnknownParent {
                    route: route.name.clone(),
                    parent: parent.clone(),
                });
            }
        }

        if let Err(source) = matcher::parse_pattern(&route.pattern) {
            errors.push(ValidationError::InvalidPattern {
                route: route.name.clone(),
                source,
            });
        }
    }

    let level = config.observability.log_level.to_lowercase();
    if !LOG_LEVELS.contains(&level.as_str()) {
        errors.push(ValidationError::InvalidLogLevel(
            config.observability.log_level.clone(),
        ));
    }

    let mut owners = HashSet::new();
    for (i, owner) in config.scopes.owners.iter().enumerate() {
        if owner.trim().is_empty() {
            errors.push(ValidationError::EmptyOwner(i));
        } else if !owners.insert(owner.as_str()) {
            errors.push(ValidationError::DuplicateOwner(owner.clone()));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::schema::RouteConfig;

    fn route(name: &str, pattern: &str, parent: Option<&str>) -> RouteConfig {
        RouteConfig {
            name: name.into(),
            pattern: pattern.into(),
            parent: parent.map(Into::into),
        }
    }

    #[test]
    fn test_default_is_valid() {
        assert!(validate_config(&WaypostConfig::default()).is_ok());
    }

    #[test]
    fn test_parent_must_be_declared_first() {
        let mut config = WaypostConfig::default();
        config.routes = vec![
            route("model", ":id", Some("models")),
            route("models", "/models/*", None),
            route("loop", "/x", Some("loop")),
        ];
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(
            errors,
            vec![
                ValidationError::UnknownParent {
                    route: "model".into(),
                    parent: "models".into()
                },
                ValidationError::UnknownParent {
                    route: "loop".into(),
                    parent: "loop".into()
                },
            ]
        );
    }

    #[test]
    fn test_collects_all_errors() {
        let mut config = WaypostConfig::default();
        config.routes = vec![
            route("", "/a", None),
            route("b", "/users/:", None),
            route("b", "/c", None),
        ];
        config.observability.log_level = "loud".into();
        config.scopes.owners = vec!["u1".into(), "u1".into(), " ".into()];

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 6);
        assert!(errors.contains(&ValidationError::EmptyRouteName(0)));
        assert!(errors.contains(&ValidationError::DuplicateRouteName("b".into())));
        assert!(errors.contains(&ValidationError::InvalidLogLevel("loud".into())));
        assert!(errors.contains(&ValidationError::DuplicateOwner("u1".into())));
        assert!(errors.contains(&ValidationError::EmptyOwner(2)));
        assert!(errors
            .iter()
            .any(|e| matches!(e, ValidationError::InvalidPattern { route, .. } if route == "b")));
    }
}
