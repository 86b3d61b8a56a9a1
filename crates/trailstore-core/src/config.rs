//! Store configuration.
//!
//! Loaded from TOML, optionally overlaid with `TRAILSTORE_*` environment
//! variables, and applied exactly once through `Db::from_config`.

use crate::{
    db::memory::IndexVisibility,
    error::{Error, ErrorOrigin},
};
use serde::{Deserialize, Serialize};
use std::{fs, path::Path};
use thiserror::Error as ThisError;

pub const ENV_TABLE_PREFIX: &str = "TRAILSTORE_TABLE_PREFIX";
pub const ENV_INDEX_VISIBILITY: &str = "TRAILSTORE_INDEX_VISIBILITY";

///
/// ConfigError
///

#[derive(Debug, ThisError)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid value for {key}: '{value}' ({reason})")]
    InvalidValue {
        key: String,
        value: String,
        reason: String,
    },
}

impl From<ConfigError> for Error {
    fn from(err: ConfigError) -> Self {
        Self::validation(ErrorOrigin::Config, err.to_string())
    }
}

///
/// StoreConfig
///

#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
#[serde(deny_unknown_fields)]
pub struct StoreConfig {
    #[serde(default)]
    pub tables: TablesConfig,

    #[serde(default)]
    pub memory: MemoryConfig,
}

///
/// TablesConfig
///

#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
#[serde(deny_unknown_fields)]
pub struct TablesConfig {
    /// Prepended to every record type's table name, e.g. `"dev-"`.
    #[serde(default)]
    pub prefix: String,
}

///
/// MemoryConfig
///

#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
#[serde(deny_unknown_fields)]
pub struct MemoryConfig {
    #[serde(default)]
    pub index_visibility: IndexVisibility,
}

impl StoreConfig {
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        let config = toml::from_str::<Self>(source)?;
        config.validate()?;

        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let source = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;

        Self::from_toml_str(&source)
    }

    /// Overlay values from the process environment.
    pub fn with_env_overrides(self) -> Result<Self, ConfigError> {
        self.apply_overrides(|key| std::env::var(key).ok())
    }

    /// Overlay values from any lookup; `with_env_overrides` passes the
    /// process environment.
    pub fn apply_overrides(
        mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        if let Some(prefix) = lookup(ENV_TABLE_PREFIX) {
            self.tables.prefix = prefix;
        }

        if let Some(raw) = lookup(ENV_INDEX_VISIBILITY) {
            self.memory.index_visibility = match raw.trim().to_ascii_lowercase().as_str() {
                "immediate" => IndexVisibility::Immediate,
                "deferred" => IndexVisibility::Deferred,
                _ => {
                    return Err(ConfigError::InvalidValue {
                        key: ENV_INDEX_VISIBILITY.to_string(),
                        value: raw,
                        reason: "expected 'immediate' or 'deferred'".to_string(),
                    });
                }
            };
        }

        self.validate()?;

        Ok(self)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let prefix = &self.tables.prefix;
        if let Some(bad) = prefix
            .chars()
            .find(|c| !(c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.')))
        {
            return Err(ConfigError::InvalidValue {
                key: "tables.prefix".to_string(),
                value: prefix.clone(),
                reason: format!("character '{bad}' is not allowed in a table name"),
            });
        }

        Ok(())
    }
}

///
/// TESTS
///
