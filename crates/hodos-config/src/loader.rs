//! Layered configuration loading.
//!
//! Layers apply in order, later ones overriding earlier ones:
//! 1. Defaults or a preset
//! 2. A TOML or JSON file (or string)
//! 3. Environment variables under a prefix

use std::collections::HashMap;
use std::env;
use std::fs;
use std::path::Path;

use crate::{ConfigError, HodosConfig, LogFormat};

/// Configuration loader with layered approach.
///
/// # Example
///
/// ```no_run
/// use hodos_config::ConfigLoader;
///
/// # fn main() -> Result<(), hodos_config::ConfigError> {
/// let config = ConfigLoader::new()
///     .with_defaults()
///     .with_file("routes.toml")?
///     .with_env_prefix("HODOS")
///     .load()?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct ConfigLoader {
    config: HodosConfig,
    env_prefix: Option<String>,
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigLoader {
    /// Create a new loader holding default values.
    #[must_use]
    pub fn new() -> Self {
        Self {
            config: HodosConfig::default(),
            env_prefix: None,
        }
    }

    /// Reset to default configuration values.
    #[must_use]
    pub fn with_defaults(mut self) -> Self {
        self.config = HodosConfig::default();
        self
    }

    /// Start with the development preset.
    ///
    /// ```
    /// use hodos_config::ConfigLoader;
    ///
    /// let config = ConfigLoader::new().with_development().load().unwrap();
    /// assert_eq!(config.logging.level, "debug");
    /// ```
    #[must_use]
    pub fn with_development(mut self) -> Self {
        self.config = HodosConfig::development();
        self
    }

    /// Start with the production preset.
    #[must_use]
    pub fn with_production(mut self) -> Self {
        self.config = HodosConfig::production();
        self
    }

    /// Load configuration from a file.
    ///
    /// The format follows the extension: `.toml` or `.json`.
    pub fn with_file<P: AsRef<Path>>(mut self, path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(ConfigError::file_not_found(path));
        }

        let content = fs::read_to_string(path).map_err(|e| ConfigError::read_error(path, e))?;

        self.config = Self::parse_file(&content, path)?;
        tracing::debug!(path = %path.display(), routes = self.config.routing.routes.len(), "loaded configuration file");

        Ok(self)
    }

    /// Load configuration from a file if it exists.
    pub fn with_optional_file<P: AsRef<Path>>(self, path: P) -> Result<Self, ConfigError> {
        if path.as_ref().exists() {
            self.with_file(path)
        } else {
            Ok(self)
        }
    }

    /// Load configuration from a string in the given format (`toml` or `json`).
    ///
    /// ```
    /// use hodos_config::ConfigLoader;
    ///
    /// let toml = r#"
    ///     [[routing.routes]]
    ///     template = "/posts/:id"
    ///     defaults = { controller = "Posts", action = "view" }
    /// "#;
    ///
    /// let config = ConfigLoader::new().with_string(toml, "toml").unwrap().load().unwrap();
    /// assert_eq!(config.routing.routes[0].template, "/posts/:id");
    /// ```
    pub fn with_string(mut self, content: &str, format: &str) -> Result<Self, ConfigError> {
        self.config = match format.to_lowercase().as_str() {
            "toml" => toml::from_str(content)?,
            "json" => serde_json::from_str(content)?,
            _ => {
                return Err(ConfigError::validation_error(format!(
                    "unsupported configuration format: {format}"
                )))
            }
        };
        Ok(self)
    }

    /// Set environment variable prefix for overrides.
    ///
    /// Variables use the format `PREFIX__SECTION__KEY`, for example
    /// `HODOS__LOGGING__LEVEL=debug` or `HODOS__ROUTING__EXTENSIONS=json,xml`.
    #[must_use]
    pub fn with_env_prefix(mut self, prefix: &str) -> Self {
        self.env_prefix = Some(prefix.to_uppercase());
        self
    }

    /// Load a `.env` file into the process environment, if one exists.
    pub fn with_dotenv(self) -> Result<Self, ConfigError> {
        match dotenvy::dotenv() {
            Ok(path) => tracing::debug!(path = %path.display(), "loaded .env file"),
            Err(e) if e.not_found() => {}
            Err(e) => return Err(ConfigError::validation_error(format!("failed to load .env file: {e}"))),
        }
        Ok(self)
    }

    /// Apply environment overrides, validate, and return the configuration.
    pub fn load(mut self) -> Result<HodosConfig, ConfigError> {
        if let Some(prefix) = self.env_prefix.take() {
            self.apply_env_overrides(&prefix)?;
        }

        self.config.validate()?;

        Ok(self.config)
    }

    /// Return the configuration without environment overrides or validation.
    #[must_use]
    pub fn load_unvalidated(self) -> HodosConfig {
        self.config
    }

    fn parse_file(content: &str, path: &Path) -> Result<HodosConfig, ConfigError> {
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_lowercase);

        match extension.as_deref() {
            Some("toml") => Ok(toml::from_str(content)?),
            Some("json") => Ok(serde_json::from_str(content)?),
            _ => Err(ConfigError::validation_error(format!(
                "unsupported configuration file format: {}",
                path.display()
            ))),
        }
    }

    fn apply_env_overrides(&mut self, prefix: &str) -> Result<(), ConfigError> {
        let env_vars: HashMap<String, String> = env::vars()
            .filter(|(k, _)| k.starts_with(prefix))
            .collect();

        for (key, value) in env_vars {
            self.apply_env_var(&key, &value, prefix)?;
        }

        Ok(())
    }

    fn apply_env_var(&mut self, key: &str, value: &str, prefix: &str) -> Result<(), ConfigError> {
        let Some(rest) = key.strip_prefix(prefix).and_then(|k| k.strip_prefix("__")) else {
            // Shares the prefix text but not the separator, e.g. HODOSX_FOO.
            return Ok(());
        };

        let parts: Vec<&str> = rest.split("__").collect();
        let logging = &mut self.config.logging;

        match parts.as_slice() {
            ["LOGGING", "ENABLED"] => {
                logging.enabled = parse_bool(value)
                    .ok_or_else(|| ConfigError::env_parse_error(key, "expected boolean"))?;
            }
            ["LOGGING", "LEVEL"] => {
                logging.level = value.to_string();
            }
            ["LOGGING", "FORMAT"] => {
                logging.format = match value.to_lowercase().as_str() {
                    "json" => LogFormat::Json,
                    "pretty" => LogFormat::Pretty,
                    _ => return Err(ConfigError::env_parse_error(key, "expected 'json' or 'pretty'")),
                };
            }
            ["LOGGING", "ANSI_ENABLED"] => {
                logging.ansi_enabled = parse_bool(value)
                    .ok_or_else(|| ConfigError::env_parse_error(key, "expected boolean"))?;
            }
            ["LOGGING", "INCLUDE_LOCATION"] => {
                logging.include_location = parse_bool(value)
                    .ok_or_else(|| ConfigError::env_parse_error(key, "expected boolean"))?;
            }
            ["ROUTING", "EXTENSIONS"] => {
                self.config.routing.extensions = value
                    .split(',')
                    .map(str::trim)
                    .filter(|ext| !ext.is_empty())
                    .map(str::to_string)
                    .collect();
            }
            _ => {
                tracing::debug!(var = key, "ignoring unknown configuration variable");
            }
        }

        Ok(())
    }
}

fn parse_bool(s: &str) -> Option<bool> {
    match s.to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_loader_new() {
        let config = ConfigLoader::new().load().unwrap();
        assert_eq!(config, HodosConfig::default());
    }

    #[test]
    fn test_loader_presets() {
        let config = ConfigLoader::new().with_development().load().unwrap();
        assert_eq!(config.logging.format, LogFormat::Pretty);

        let config = ConfigLoader::new().with_production().load().unwrap();
        assert_eq!(config.logging.format, LogFormat::Json);

        let config = ConfigLoader::new()
            .with_development()
            .with_defaults()
            .load()
            .unwrap();
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_loader_with_string_json() {
        let json = r#"{
            "routing": {
                "extensions": ["json"],
                "routes": [{"template": "/pages/*", "name": "pages", "defaults": {"controller": "Pages"}}]
            }
        }"#;

        let config = ConfigLoader::new().with_string(json, "json").unwrap().load().unwrap();
        assert_eq!(config.routing.extensions, vec!["json"]);
        assert_eq!(config.routing.routes[0].name.as_deref(), Some("pages"));
        assert_eq!(config.routing.routes[0].defaults["controller"], "Pages");
    }

    #[test]
    fn test_loader_with_string_unknown_format() {
        let err = ConfigLoader::new().with_string("", "yaml").unwrap_err();
        assert!(err.to_string().contains("unsupported configuration format: yaml"));
    }

    #[test]
    fn test_loader_rejects_unknown_fields() {
        let toml = r#"
            [routing]
            extentions = ["json"]
        "#;
        let err = ConfigLoader::new().with_string(toml, "toml").unwrap_err();
        assert!(matches!(err, ConfigError::TomlError(_)));
    }

    #[test]
    fn test_loader_with_file_not_found() {
        let err = ConfigLoader::new().with_file("/nonexistent/routes.toml").unwrap_err();
        assert!(matches!(err, ConfigError::FileNotFound { .. }));
    }

    #[test]
    fn test_loader_with_optional_file_not_found() {
        let config = ConfigLoader::new()
            .with_optional_file("/nonexistent/routes.toml")
            .unwrap()
            .load()
            .unwrap();
        assert_eq!(config, HodosConfig::default());
    }

    #[test]
    fn test_load_unvalidated_skips_validation() {
        let toml = r#"
            [[routing.routes]]
            template = "no-leading-slash"
        "#;
        let loader = ConfigLoader::new().with_string(toml, "toml").unwrap();
        let config = loader.load_unvalidated();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_parse_bool() {
        for truthy in ["true", "TRUE", "1", "yes", "on"] {
            assert_eq!(parse_bool(truthy), Some(true));
        }
        for falsy in ["false", "False", "0", "no", "off"] {
            assert_eq!(parse_bool(falsy), Some(false));
        }
        assert_eq!(parse_bool("maybe"), None);
        assert_eq!(parse_bool(""), None);
    }

    // Env overrides are exercised through apply_env_var directly; mutating the
    // process environment would race with other tests.

    #[test]
    fn test_apply_env_var_logging() {
        let mut loader = ConfigLoader::new();
        loader.apply_env_var("TEST__LOGGING__LEVEL", "debug", "TEST").unwrap();
        loader.apply_env_var("TEST__LOGGING__FORMAT", "Pretty", "TEST").unwrap();
        loader.apply_env_var("TEST__LOGGING__ANSI_ENABLED", "on", "TEST").unwrap();
        loader.apply_env_var("TEST__LOGGING__INCLUDE_LOCATION", "1", "TEST").unwrap();
        loader.apply_env_var("TEST__LOGGING__ENABLED", "no", "TEST").unwrap();

        let logging = &loader.config.logging;
        assert_eq!(logging.level, "debug");
        assert_eq!(logging.format, LogFormat::Pretty);
        assert!(logging.ansi_enabled);
        assert!(logging.include_location);
        assert!(!logging.enabled);
    }

    #[test]
    fn test_apply_env_var_extensions() {
        let mut loader = ConfigLoader::new();
        loader.apply_env_var("TEST__ROUTING__EXTENSIONS", "json, xml,,rss", "TEST").unwrap();
        assert_eq!(loader.config.routing.extensions, vec!["json", "xml", "rss"]);
    }

    #[test]
    fn test_apply_env_var_invalid() {
        let mut loader = ConfigLoader::new();
        assert!(loader.apply_env_var("TEST__LOGGING__ENABLED", "maybe", "TEST").is_err());
        assert!(loader.apply_env_var("TEST__LOGGING__FORMAT", "xml", "TEST").is_err());
    }

    #[test]
    fn test_apply_env_var_ignores_unknown() {
        let mut loader = ConfigLoader::new();
        loader.apply_env_var("TEST__ROUTING__ROUTES", "ignored", "TEST").unwrap();
        loader.apply_env_var("TESTING", "ignored", "TEST").unwrap();
        assert_eq!(loader.config, HodosConfig::default());
    }
}
