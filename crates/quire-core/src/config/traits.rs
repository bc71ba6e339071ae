//! Core configuration trait

use crate::QuireError;
use serde::de::DeserializeOwned;
use std::path::Path;

/// Trait for TOML-backed engine configuration
///
/// Implementors only provide `validate`; parsing and file loading are shared.
/// Every loader validates before returning.
pub trait QuireConfig: Clone + Send + Sync + DeserializeOwned + 'static {
    /// Error type for configuration operations
    type Error: From<QuireError>;

    /// Validate the configuration
    fn validate(&self) -> Result<(), Self::Error>;

    /// Parse and validate configuration from TOML text
    fn from_toml_str(content: &str) -> Result<Self, Self::Error> {
        let config: Self = toml::from_str(content).map_err(QuireError::from)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a TOML file
    fn load_from_file(path: &Path) -> Result<Self, Self::Error> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            QuireError::storage(format!(
                "Failed to read config file {}: {e}",
                path.display()
            ))
        })?;
        Self::from_toml_str(&content)
    }
}
