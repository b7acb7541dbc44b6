//! Engine configuration.
//!
//! Sources, later overriding earlier:
//!
//! 1. Built-in defaults ([`EngineConfig::default`]).
//! 2. A YAML file ([`EngineConfig::from_yaml_file`]); absent keys keep
//!    their defaults.
//! 3. Environment variables ([`EngineConfig::apply_env`]):
//!    - `DUTY_REFERENCE_UNIT_VALUE` (default: 412000)
//!    - `DUTY_FALLBACK_USD_RATE` (default: 12850)
//!    - `DUTY_DEFAULT_VAT_PERCENT` (default: 12)
//!    - `DUTY_OLD_VEHICLE_AGE_YEARS` (default: 3)

use std::path::Path;

use serde::{Deserialize, Serialize};

/// Statutory reference unit value (БРВ), local currency.
pub const DEFAULT_REFERENCE_UNIT_VALUE: f64 = 412_000.0;

/// Local currency per USD used when no rate has been published.
pub const DEFAULT_FALLBACK_USD_RATE: f64 = 12_850.0;

/// Configuration for [`DutyCalculator`](crate::DutyCalculator).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Reference unit value in local currency.
    pub reference_unit_value: f64,
    /// Exchange rate used when the reference data has no USD snapshot.
    pub fallback_usd_rate: f64,
    /// VAT stamped on tariffs built from rate tables.
    pub default_vat_percent: f64,
    /// Vehicles older than this many years pay the old-vehicle levy.
    pub old_vehicle_age_years: i32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            reference_unit_value: DEFAULT_REFERENCE_UNIT_VALUE,
            fallback_usd_rate: DEFAULT_FALLBACK_USD_RATE,
            default_vat_percent: duty_core::DEFAULT_VAT_PERCENT,
            old_vehicle_age_years: duty_levy::recycling::DEFAULT_OLD_AGE_YEARS,
        }
    }
}

impl EngineConfig {
    /// Defaults overridden by the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::default().apply_env(|var| std::env::var(var).ok())
    }

    /// Load a YAML file over the defaults.
    pub fn from_yaml_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.display().to_string(),
            source: e,
        })?;
        let config: Self = serde_yaml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Defaults, then the optional file, then the process environment.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let base = match path {
            Some(p) => Self::from_yaml_file(p)?,
            None => Self::default(),
        };
        base.apply_env(|var| std::env::var(var).ok())
    }

    /// Override fields from variables returned by `lookup`.
    pub fn apply_env<F>(mut self, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = env_f64(&lookup, "DUTY_REFERENCE_UNIT_VALUE")? {
            self.reference_unit_value = v;
        }
        if let Some(v) = env_f64(&lookup, "DUTY_FALLBACK_USD_RATE")? {
            self.fallback_usd_rate = v;
        }
        if let Some(v) = env_f64(&lookup, "DUTY_DEFAULT_VAT_PERCENT")? {
            self.default_vat_percent = v;
        }
        if let Some(raw) = lookup("DUTY_OLD_VEHICLE_AGE_YEARS") {
            self.old_vehicle_age_years = raw.trim().parse().map_err(|_| ConfigError::InvalidValue {
                var: "DUTY_OLD_VEHICLE_AGE_YEARS".to_string(),
                value: raw.clone(),
            })?;
        }
        self.validate()?;
        Ok(self)
    }

    /// Reject values the engine cannot compute with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let positive = [
            ("reference_unit_value", self.reference_unit_value),
            ("fallback_usd_rate", self.fallback_usd_rate),
        ];
        for (field, value) in positive {
            if !(value.is_finite() && value > 0.0) {
                return Err(ConfigError::OutOfRange { field, value });
            }
        }
        if !(self.default_vat_percent.is_finite() && self.default_vat_percent >= 0.0) {
            return Err(ConfigError::OutOfRange {
                field: "default_vat_percent",
                value: self.default_vat_percent,
            });
        }
        if self.old_vehicle_age_years < 0 {
            return Err(ConfigError::OutOfRange {
                field: "old_vehicle_age_years",
                value: f64::from(self.old_vehicle_age_years),
            });
        }
        Ok(())
    }
}

fn env_f64<F>(lookup: &F, var: &str) -> Result<Option<f64>, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(var) {
        None => Ok(None),
        Some(raw) => raw
            .trim()
            .parse::<f64>()
            .map(Some)
            .map_err(|_| ConfigError::InvalidValue {
                var: var.to_string(),
                value: raw,
            }),
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("invalid value for {var}: \"{value}\"")]
    InvalidValue { var: String, value: String },
    #[error("{field} out of range: {value}")]
    OutOfRange { field: &'static str, value: f64 },
}
