use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;
use url::Url;

use stratus_ensemble::WeightTable;

/// Configuration validation errors
#[derive(Debug, Clone)]
pub struct ConfigValidationError {
    pub field: String,
    pub message: String,
}

impl std::fmt::Display for ConfigValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Result of config validation
#[derive(Debug, Clone, Default)]
pub struct ValidationResult {
    pub errors: Vec<ConfigValidationError>,
    pub warnings: Vec<ConfigValidationError>,
}

impl ValidationResult {
    /// Returns true if there are no errors (warnings are OK)
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    /// Add an error
    pub fn add_error(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.errors.push(ConfigValidationError {
            field: field.into(),
            message: message.into(),
        });
    }

    /// Add a warning
    pub fn add_warning(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.warnings.push(ConfigValidationError {
            field: field.into(),
            message: message.into(),
        });
    }

    /// Get a user-friendly message summarizing all errors
    pub fn error_summary(&self) -> String {
        if self.errors.is_empty() {
            return String::new();
        }
        self.errors
            .iter()
            .map(|e| e.to_string())
            .collect::<Vec<_>>()
            .join("; ")
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Forecast provider settings
    #[serde(default)]
    pub meteo: MeteoConfig,

    /// Forecast cache settings
    #[serde(default)]
    pub cache: CacheConfig,
}

/// Open-Meteo endpoints and the set of models to ensemble.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MeteoConfig {
    /// Base URL of the forecast API (the client appends `/forecast`)
    pub forecast_api_url: String,

    /// Base URL of the air-quality API
    pub air_quality_api_url: String,

    /// Base URL of the geocoding API
    pub geocoding_api_url: String,

    /// Base URL of the zip/postal-code lookup API (Zippopotam)
    pub postal_api_url: String,

    /// Days of forecast to request per model (Open-Meteo allows up to 16)
    pub forecast_days: u8,

    /// Models to fetch and ensemble
    pub models: Vec<String>,

    /// Relative trust weight per model; unlisted models count as 1.0.
    /// Updated by hand when verification shows a model over- or
    /// under-performing.
    pub model_weights: HashMap<String, f64>,
}

impl MeteoConfig {
    /// The configured weights as an ensemble weight table.
    pub fn weight_table(&self) -> WeightTable {
        self.model_weights
            .iter()
            .map(|(model, &weight)| (model.clone(), weight))
            .collect()
    }
}

impl Default for MeteoConfig {
    fn default() -> Self {
        Self {
            forecast_api_url: "https://api.open-meteo.com/v1".to_string(),
            air_quality_api_url: "https://air-quality-api.open-meteo.com/v1".to_string(),
            geocoding_api_url: "https://geocoding-api.open-meteo.com/v1".to_string(),
            postal_api_url: "https://api.zippopotam.us".to_string(),
            forecast_days: 10,
            models: vec![
                "gfs_seamless".to_string(),
                "ecmwf_ifs04".to_string(),
                "icon_seamless".to_string(),
                "gem_seamless".to_string(),
                "jma_seamless".to_string(),
                "meteofrance_seamless".to_string(),
            ],
            model_weights: HashMap::from([
                ("gfs_seamless".to_string(), 1.0),
                ("ecmwf_ifs04".to_string(), 1.2),
                ("icon_seamless".to_string(), 1.0),
                ("gem_seamless".to_string(), 0.9),
                ("jma_seamless".to_string(), 0.9),
                ("meteofrance_seamless".to_string(), 1.0),
            ]),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Forecast cache time-to-live in minutes
    pub ttl_minutes: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self { ttl_minutes: 15 }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            meteo: MeteoConfig::default(),
            cache: CacheConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from file, creating default if it doesn't exist
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path()?;

        if !config_path.exists() {
            let config = Self::default();
            config.save()?;
            return Ok(config);
        }

        let contents =
            std::fs::read_to_string(&config_path).context("Failed to read config file")?;

        let config: Config = toml::from_str(&contents).context("Failed to parse config file")?;

        Ok(config)
    }

    /// Load configuration and validate it
    ///
    /// Returns the config along with any validation warnings.
    /// Returns an error if validation fails with critical errors.
    pub fn load_validated() -> Result<(Self, ValidationResult)> {
        let config = Self::load()?;
        let validation = config.validate();

        if !validation.is_valid() {
            anyhow::bail!(
                "Configuration validation failed: {}",
                validation.error_summary()
            );
        }

        if !validation.warnings.is_empty() {
            for warning in &validation.warnings {
                tracing::warn!("Config warning: {}", warning);
            }
        }

        Ok((config, validation))
    }

    /// Validate the configuration
    ///
    /// Returns a ValidationResult containing any errors or warnings.
    pub fn validate(&self) -> ValidationResult {
        let mut result = ValidationResult::default();

        self.validate_url(&self.meteo.forecast_api_url, "meteo.forecast_api_url", &mut result);
        self.validate_url(
            &self.meteo.air_quality_api_url,
            "meteo.air_quality_api_url",
            &mut result,
        );
        self.validate_url(
            &self.meteo.geocoding_api_url,
            "meteo.geocoding_api_url",
            &mut result,
        );
        self.validate_url(&self.meteo.postal_api_url, "meteo.postal_api_url", &mut result);

        if self.meteo.models.is_empty() {
            result.add_error("meteo.models", "At least one forecast model is required");
        }

        if self.meteo.forecast_days == 0 {
            result.add_error("meteo.forecast_days", "Forecast days must be greater than 0");
        } else if self.meteo.forecast_days > 16 {
            result.add_error(
                "meteo.forecast_days",
                "Open-Meteo serves at most 16 forecast days",
            );
        }

        for (model, &weight) in &self.meteo.model_weights {
            if weight <= 0.0 || !weight.is_finite() {
                result.add_error(
                    "meteo.model_weights",
                    format!("Weight for {} must be a positive number", model),
                );
            }
            if !self.meteo.models.contains(model) {
                result.add_warning(
                    "meteo.model_weights",
                    format!("Weight configured for unfetched model {}", model),
                );
            }
        }

        if self.cache.ttl_minutes == 0 {
            result.add_warning("cache.ttl_minutes", "Forecast caching disabled (0 minutes)");
        } else if self.cache.ttl_minutes > 180 {
            result.add_warning(
                "cache.ttl_minutes",
                "Cache TTL over 3 hours will serve stale forecasts",
            );
        }

        result
    }

    /// Validate a URL field
    fn validate_url(&self, url_str: &str, field_name: &str, result: &mut ValidationResult) {
        match Url::parse(url_str) {
            Ok(url) => {
                if url.scheme() != "http" && url.scheme() != "https" {
                    result.add_error(
                        field_name,
                        format!("URL must use http or https scheme, got: {}", url.scheme()),
                    );
                }

                if url.host().is_none() {
                    result.add_error(field_name, "URL must have a host");
                }
            }
            Err(e) => {
                result.add_error(field_name, format!("Invalid URL: {}", e));
            }
        }
    }

    /// Save configuration to file
    pub fn save(&self) -> Result<()> {
        let config_path = Self::config_path()?;

        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent).context("Failed to create config directory")?;
        }

        let contents = toml::to_string_pretty(self).context("Failed to serialize config")?;

        std::fs::write(&config_path, contents).context("Failed to write config file")?;

        Ok(())
    }

    /// Get the path to the configuration file
    fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .context("Failed to get config directory")?
            .join("stratus");

        Ok(config_dir.join("config.toml"))
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;

    #[test]
    fn test_valid_default_config() {
        let config = Config::default();
        let result = config.validate();
        assert!(
            result.is_valid(),
            "Default config should be valid: {:?}",
            result.errors
        );
    }

    #[test]
    fn test_default_weights_match_model_list() {
        let config = Config::default();
        let result = config.validate();
        assert!(result.warnings.is_empty(), "unexpected: {:?}", result.warnings);

        let table = config.meteo.weight_table();
        assert_eq!(table.weight_of("ecmwf_ifs04"), 1.2);
    }

    #[test]
    fn test_invalid_url() {
        let mut config = Config::default();
        config.meteo.forecast_api_url = "not-a-url".to_string();
        let result = config.validate();
        assert!(!result.is_valid());
        assert!(result
            .errors
            .iter()
            .any(|e| e.field == "meteo.forecast_api_url"));
    }

    #[test]
    fn test_invalid_url_scheme() {
        let mut config = Config::default();
        config.meteo.geocoding_api_url = "ftp://localhost:8080".to_string();
        let result = config.validate();
        assert!(!result.is_valid());
        assert!(result.errors.iter().any(|e| e.message.contains("http or https")));
    }

    #[test]
    fn test_empty_model_list_is_error() {
        let mut config = Config::default();
        config.meteo.models.clear();
        let result = config.validate();
        assert!(!result.is_valid());
        assert!(result.errors.iter().any(|e| e.field == "meteo.models"));
    }

    #[test]
    fn test_nonpositive_weight_is_error() {
        let mut config = Config::default();
        config
            .meteo
            .model_weights
            .insert("gfs_seamless".to_string(), 0.0);
        let result = config.validate();
        assert!(!result.is_valid());
    }

    #[test]
    fn test_unfetched_weight_is_warning() {
        let mut config = Config::default();
        config
            .meteo
            .model_weights
            .insert("retired_model".to_string(), 1.1);
        let result = config.validate();
        assert!(result.is_valid());
        assert!(result
            .warnings
            .iter()
            .any(|w| w.message.contains("retired_model")));
    }

    #[test]
    fn test_too_many_forecast_days_is_error() {
        let mut config = Config::default();
        config.meteo.forecast_days = 17;
        let result = config.validate();
        assert!(!result.is_valid());
    }

    #[test]
    fn test_toml_round_trip() {
        let config = Config::default();
        let text = toml::to_string_pretty(&config).unwrap();
        let back: Config = toml::from_str(&text).unwrap();
        assert_eq!(back.meteo.models, config.meteo.models);
        assert_eq!(back.cache.ttl_minutes, config.cache.ttl_minutes);
    }

    #[test]
    fn test_validation_result_error_summary() {
        let mut result = ValidationResult::default();
        result.add_error("field1", "error1");
        result.add_error("field2", "error2");
        let summary = result.error_summary();
        assert!(summary.contains("field1"));
        assert!(summary.contains("field2"));
    }
}
