//! Engine configuration.
//!
//! Loaded from, in increasing precedence:
//! - built-in defaults
//! - `projection.toml`, `.projection.toml`, `config/projection.toml`
//! - an explicit file passed with `--config`
//! - environment variables (`PROJECTION__NAMING__OUTPUT_CASE=snake`)
//!
//! ## Example config file (projection.toml):
//! ```toml
//! [naming]
//! output_case = "camel"
//!
//! [selection]
//! fields_key = "fields"
//! args_key = "args"
//!
//! [pagination]
//! max_limit = 500
//! ```

use std::path::Path;

use config_crate::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};

use crate::naming::{NameCase, NamingConvention};
use crate::selection::SelectionSyntax;

const CONFIG_LOCATIONS: [&str; 3] = [
    "projection.toml",
    ".projection.toml",
    "config/projection.toml",
];

/// Top-level engine configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    #[serde(default)]
    pub naming: NamingConfig,

    #[serde(default)]
    pub selection: SelectionSyntax,

    #[serde(default)]
    pub pagination: PaginationConfig,
}

/// Client-facing naming
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NamingConfig {
    /// Casing applied to output keys and decoded from request names
    #[serde(default)]
    pub output_case: NameCase,
}

/// Page limits for read actions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaginationConfig {
    #[serde(default = "default_max_limit")]
    pub max_limit: usize,
}

fn default_max_limit() -> usize {
    500
}

impl Default for PaginationConfig {
    fn default() -> Self {
        Self {
            max_limit: default_max_limit(),
        }
    }
}

impl EngineConfig {
    /// Load configuration from default locations
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(None)
    }

    /// Load configuration, adding an explicit (required) file
    pub fn load_from(config_path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut builder = Config::builder();

        for location in CONFIG_LOCATIONS {
            builder = builder.add_source(File::with_name(location).required(false));
        }

        if let Some(path) = config_path {
            builder = builder.add_source(File::from(path.to_path_buf()).required(true));
        }

        builder = builder.add_source(
            Environment::with_prefix("PROJECTION")
                .separator("__")
                .try_parsing(true),
        );

        let config: EngineConfig = builder.build()?.try_deserialize()?;
        tracing::debug!(
            naming = ?config.naming.output_case,
            max_limit = config.pagination.max_limit,
            "loaded engine configuration"
        );
        Ok(config)
    }

    /// Render as TOML (for `--print-config` style output)
    pub fn to_toml(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }

    pub fn naming(&self) -> NamingConvention {
        NamingConvention::from_case(self.naming.output_case)
    }

    pub fn syntax(&self) -> SelectionSyntax {
        self.selection.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn default_config() {
        let config = EngineConfig::default();
        assert_eq!(config.naming.output_case, NameCase::Camel);
        assert_eq!(config.selection.fields_key, "fields");
        assert_eq!(config.selection.args_key, "args");
        assert_eq!(config.pagination.max_limit, 500);
        assert_eq!(config.naming().label(), "camel");
    }

    #[test]
    fn serialize_config() {
        let toml_str = EngineConfig::default().to_toml().unwrap();
        assert!(toml_str.contains("[naming]"));
        assert!(toml_str.contains("output_case = \"camel\""));
        assert!(toml_str.contains("[pagination]"));
    }

    #[test]
    fn load_explicit_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("engine.toml");
        fs::write(
            &path,
            "[naming]\noutput_case = \"snake\"\n\n[selection]\nfields_key = \"children\"\n",
        )
        .unwrap();

        let config = EngineConfig::load_from(Some(&path)).unwrap();
        assert_eq!(config.naming.output_case, NameCase::Snake);
        assert_eq!(config.selection.fields_key, "children");
        // Unset keys keep their defaults.
        assert_eq!(config.selection.args_key, "args");
        assert_eq!(config.pagination.max_limit, 500);
    }

    #[test]
    fn missing_explicit_file_is_an_error() {
        let result = EngineConfig::load_from(Some(Path::new("/nonexistent/engine.toml")));
        assert!(result.is_err());
    }
}
