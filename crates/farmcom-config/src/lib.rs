//! FarmCom chat configuration.
//!
//! TOML-based configuration for the model connection, the assistant's
//! fixed texts, and logging. Every section uses serde defaults so a
//! partial (or empty) file works out of the box.
//!
//! ```rust,no_run
//! let config = farmcom_config::load_config(None).expect("failed to load config");
//! println!("model: {}", config.model.id);
//! ```

pub mod schema;
pub mod toml_loader;
pub mod validation;

pub use schema::{AssistantConfig, FarmcomConfig, LogLevel, LoggingConfig, ModelConfig};
pub use schema::CONFIG_SCHEMA_VERSION;

use std::path::Path;

use farmcom_common::ConfigError;

/// Load and validate the config.
///
/// With `Some(path)` the file must exist. With `None` the platform default
/// path is used and a commented default file is created on first run.
/// Validation failures are returned as `ConfigError::ValidationError`.
pub fn load_config(path: Option<&Path>) -> Result<FarmcomConfig, ConfigError> {
    let config = match path {
        Some(path) => toml_loader::load_from_path(path)?,
        None => toml_loader::load_default()?,
    };
    validation::validate(&config)?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_schema_version_is_1() {
        assert_eq!(CONFIG_SCHEMA_VERSION, 1);
    }

    #[test]
    fn load_config_rejects_invalid_values() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[model]\ntemperature = 9.5\n").unwrap();

        let err = load_config(Some(&path)).unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError(_)));
        assert!(err.to_string().contains("model.temperature"));
    }

    #[test]
    fn load_config_with_explicit_missing_path_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.toml");

        let err = load_config(Some(&path)).unwrap_err();
        assert!(matches!(err, ConfigError::FileNotFound(_)));
    }
}
