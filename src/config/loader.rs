//! Configuration loading from disk.

use std::fs;
use std::path::Path;

use thiserror::Error;

use crate::config::schema::WaypostConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation failed: {}", join(.0))]
    Validation(Vec<ValidationError>),
}

fn join(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Parse and validate configuration text.
pub fn parse_config(content: &str) -> Result<WaypostConfig, ConfigError> {
    let config: WaypostConfig = toml::from_str(content)?;
    validate_config(&config).map_err(ConfigError::Validation)?;
    Ok(config)
}

/// Load and validate configuration from a TOML file.
pub fn load_config(path: &Path) -> Result<WaypostConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    let config = parse_config(&content)?;
    tracing::info!(path = %path.display(), routes = config.routes.len(), "Configuration loaded");
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_valid() {
        let config = parse_config(
            r#"
            [[routes]]
            name = "home"
            pattern = "/home/*"
            "#,
        )
        .unwrap();
        assert_eq!(config.routes[0].name, "home");
    }

    #[test]
    fn test_parse_syntax_error() {
        assert!(matches!(parse_config("[[routes]"), Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_validation_error_display() {
        let err = parse_config(
            r#"
            [[routes]]
            name = "a"
            pattern = "/a"

            [[routes]]
            name = "a"
            pattern = "/b"

            [observability]
            log_level = "loud"
            "#,
        )
        .unwrap_err();
        assert_eq!(
            err.to_string(),
            "Validation failed: duplicate route name 'a', unknown log level 'loud'"
        );
    }

    #[test]
    fn test_missing_file() {
        let path = std::env::temp_dir().join("waypost_missing_config.toml");
        assert!(matches!(load_config(&path), Err(ConfigError::Io(_))));
    }
}
