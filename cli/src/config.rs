//! Layered configuration for the admin shell.
//!
//! Sources, lowest priority first:
//! 1. Built-in defaults
//! 2. User-level `~/.config/civictrack/admin.toml`
//! 3. `./civictrack-admin.toml` in the working directory
//! 4. The file named by `--config`
//! 5. Environment variables (`CIVICTRACK_*`, `__` separates sections)
//! 6. Command-line flags, applied by [`AdminConfig::apply_overrides`]
//!
//! `CIVICTRACK_API__BASE_URL` maps to `api.base_url`,
//! `CIVICTRACK_LOGGING__DIRECTORY` to `logging.directory`, and so on.

use std::path::{Path, PathBuf};
use std::time::Duration;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use shared::capabilities::ValidatedUrl;
use shared::image_processing::ProcessingConfig;
use shared::{
    IssueOrdering, DEFAULT_API_BASE_URL, DEFAULT_JPEG_QUALITY, MAX_CONCURRENT_ENCODES,
    MAX_IMAGE_BYTES, MAX_PROCESSED_DIMENSION,
};
use thiserror::Error;

pub const LOCAL_CONFIG_FILE: &str = "civictrack-admin.toml";
pub const ENV_PREFIX: &str = "CIVICTRACK_";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration error: {0}")]
    Figment(#[from] Box<figment::Error>),

    #[error("Configuration file '{}' does not exist", path.display())]
    MissingFile { path: PathBuf },

    #[error("Invalid configuration value for '{field}': {reason}")]
    InvalidValue { field: String, reason: String },
}

impl From<figment::Error> for ConfigError {
    fn from(e: figment::Error) -> Self {
        Self::Figment(Box::new(e))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ApiConfig {
    pub base_url: String,
    pub timeout_secs: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_API_BASE_URL.to_string(),
            timeout_secs: 30,
        }
    }
}

impl ApiConfig {
    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct DisplayConfig {
    #[serde(default)]
    pub issue_order: IssueOrdering,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ImageConfig {
    pub max_input_bytes: usize,
    /// Longest side of a staged photo after downscaling.
    pub max_dimension: u32,
    pub jpeg_quality: u8,
    pub max_concurrent: usize,
}

impl Default for ImageConfig {
    fn default() -> Self {
        Self {
            max_input_bytes: MAX_IMAGE_BYTES,
            max_dimension: MAX_PROCESSED_DIMENSION,
            jpeg_quality: DEFAULT_JPEG_QUALITY,
            max_concurrent: MAX_CONCURRENT_ENCODES,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct LoggingConfig {
    pub level: String,
    /// Enables the daily-rolling JSON log file when set.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub directory: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "warn".into(),
            directory: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct AdminConfig {
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub display: DisplayConfig,
    #[serde(default)]
    pub image: ImageConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Values given on the command line. `None` leaves the layered value alone.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub api_url: Option<String>,
    pub issue_order: Option<IssueOrdering>,
    pub log_level: Option<String>,
}

impl AdminConfig {
    /// Loads every layer, applies command-line overrides and validates the result.
    pub fn load(
        explicit: Option<&Path>,
        overrides: &ConfigOverrides,
    ) -> Result<Self, ConfigError> {
        let mut config: Self = Self::figment(explicit)?.extract()?;
        config.apply_overrides(overrides);
        config.validate()?;
        Ok(config)
    }

    /// Builds the provider chain without extracting it.
    pub fn figment(explicit: Option<&Path>) -> Result<Figment, ConfigError> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        if let Some(global_path) = Self::global_config_path() {
            if global_path.exists() {
                figment = figment.merge(Toml::file(global_path));
            }
        }

        let local_path = PathBuf::from(LOCAL_CONFIG_FILE);
        if local_path.exists() {
            figment = figment.merge(Toml::file(local_path));
        }

        if let Some(path) = explicit {
            if !path.exists() {
                return Err(ConfigError::MissingFile {
                    path: path.to_path_buf(),
                });
            }
            figment = figment.merge(Toml::file(path));
        }

        Ok(figment.merge(Env::prefixed(ENV_PREFIX).split("__")))
    }

    pub fn apply_overrides(&mut self, overrides: &ConfigOverrides) {
        if let Some(url) = &overrides.api_url {
            self.api.base_url.clone_from(url);
        }
        if let Some(order) = overrides.issue_order {
            self.display.issue_order = order;
        }
        if let Some(level) = &overrides.log_level {
            self.logging.level.clone_from(level);
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        ValidatedUrl::new(self.api.base_url.as_str()).map_err(|e| ConfigError::InvalidValue {
            field: "api.base_url".into(),
            reason: e.to_string(),
        })?;

        if self.api.timeout_secs == 0 {
            return Err(invalid("api.timeout_secs", "must be at least 1"));
        }
        if !(1..=100).contains(&self.image.jpeg_quality) {
            return Err(invalid("image.jpeg_quality", "must be between 1 and 100"));
        }
        if self.image.max_concurrent == 0 {
            return Err(invalid("image.max_concurrent", "must be at least 1"));
        }
        if self.image.max_dimension == 0 {
            return Err(invalid("image.max_dimension", "must be at least 1"));
        }
        Ok(())
    }

    #[must_use]
    pub fn processing_config(&self) -> ProcessingConfig {
        ProcessingConfig {
            max_input_bytes: self.image.max_input_bytes,
            output_max_dimension: self.image.max_dimension,
            jpeg_quality: self.image.jpeg_quality,
            max_concurrent_ops: self.image.max_concurrent,
            ..ProcessingConfig::default()
        }
    }

    fn global_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("civictrack").join("admin.toml"))
    }
}

fn invalid(field: &str, reason: &str) -> ConfigError {
    ConfigError::InvalidValue {
        field: field.into(),
        reason: reason.into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use figment::Jail;
    use pretty_assertions::assert_eq;

    fn isolate(jail: &mut Jail) {
        let dir = jail.directory().to_path_buf();
        jail.set_env("XDG_CONFIG_HOME", dir.join("xdg").display());
        jail.set_env("HOME", dir.display());
    }

    #[test]
    fn defaults_extract_without_files() {
        Jail::expect_with(|jail| {
            isolate(jail);
            let config = AdminConfig::load(None, &ConfigOverrides::default())
                .map_err(|e| e.to_string())?;
            assert_eq!(config, AdminConfig::default());
            assert_eq!(config.api.base_url, "http://localhost:8080");
            assert_eq!(config.display.issue_order, IssueOrdering::Priority);
            Ok(())
        });
    }

    #[test]
    fn local_file_then_env_then_flags() {
        Jail::expect_with(|jail| {
            isolate(jail);
            jail.create_file(
                LOCAL_CONFIG_FILE,
                r#"
                [api]
                base_url = "http://file.example:9000"
                timeout_secs = 5

                [display]
                issue_order = "arrival"
                "#,
            )?;

            let config = AdminConfig::load(None, &ConfigOverrides::default())
                .map_err(|e| e.to_string())?;
            assert_eq!(config.api.base_url, "http://file.example:9000");
            assert_eq!(config.api.timeout_secs, 5);
            assert_eq!(config.display.issue_order, IssueOrdering::Arrival);

            jail.set_env("CIVICTRACK_API__BASE_URL", "http://env.example");
            let config = AdminConfig::load(None, &ConfigOverrides::default())
                .map_err(|e| e.to_string())?;
            assert_eq!(config.api.base_url, "http://env.example");
            assert_eq!(config.api.timeout_secs, 5);

            let overrides = ConfigOverrides {
                api_url: Some("http://flag.example".into()),
                issue_order: Some(IssueOrdering::Priority),
                log_level: Some("debug".into()),
            };
            let config = AdminConfig::load(None, &overrides).map_err(|e| e.to_string())?;
            assert_eq!(config.api.base_url, "http://flag.example");
            assert_eq!(config.display.issue_order, IssueOrdering::Priority);
            assert_eq!(config.logging.level, "debug");
            Ok(())
        });
    }

    #[test]
    fn explicit_file_beats_local_file() {
        Jail::expect_with(|jail| {
            isolate(jail);
            jail.create_file(LOCAL_CONFIG_FILE, "[image]\njpeg_quality = 70\n")?;
            jail.create_file("ops.toml", "[image]\njpeg_quality = 60\n")?;

            let config = AdminConfig::load(Some(Path::new("ops.toml")), &ConfigOverrides::default())
                .map_err(|e| e.to_string())?;
            assert_eq!(config.image.jpeg_quality, 60);
            assert_eq!(config.processing_config().jpeg_quality, 60);
            Ok(())
        });
    }

    #[test]
    fn missing_explicit_file_is_an_error() {
        Jail::expect_with(|jail| {
            isolate(jail);
            let result = AdminConfig::load(
                Some(Path::new("nowhere.toml")),
                &ConfigOverrides::default(),
            );
            assert!(matches!(result, Err(ConfigError::MissingFile { .. })));
            Ok(())
        });
    }

    #[test]
    fn invalid_values_are_rejected() {
        Jail::expect_with(|jail| {
            isolate(jail);
            jail.set_env("CIVICTRACK_IMAGE__JPEG_QUALITY", "0");
            let result = AdminConfig::load(None, &ConfigOverrides::default());
            assert!(matches!(
                result,
                Err(ConfigError::InvalidValue { ref field, .. }) if field == "image.jpeg_quality"
            ));
            Ok(())
        });
    }

    #[test]
    fn unusable_base_url_is_rejected() {
        let overrides = ConfigOverrides {
            api_url: Some("ftp://files.example".into()),
            ..ConfigOverrides::default()
        };
        let mut config = AdminConfig::default();
        config.apply_overrides(&overrides);
        assert!(config.validate().is_err());
    }
}
