//! Configuration module for the risk engine.
//!
//! Provides configuration loading, validation, and environment variable
//! interpolation for every engine component.
//!
//! Market-context knobs (grid width, damping factors, bucket width) carry
//! defaults. Domain thresholds (Greek limits, score weights, conflict
//! thresholds, hedge rates, safety and capital limits) do not: a section that is absent stays `None`
//! and the operation that needs it fails with a configuration error.
//!
//! # Usage
//!
//! ```rust,ignore
//! use risk_engine::config::load_config;
//!
//! let config = load_config(Some("engine.yaml"))?;
//! let limits = config.greek_limits()?;
//! ```

mod greeks;
mod observability;
mod payoff;
mod portfolio;
mod safety;
mod scoring;
mod simulation;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use greeks::{GreekLimit, GreekLimits};
pub use observability::{LogFormat, LoggingConfig, ObservabilityConfig};
pub use payoff::PayoffConfig;
pub use portfolio::{ConflictThresholds, HedgingConfig};
pub use safety::{CapitalConfig, SafetyConfig};
pub use scoring::{MAX_SCORE_WEIGHT, RiskBands, RiskScoringConfig, ScoreWeights};
pub use simulation::{
    AccelerationTier, DrawModel, MonteCarloConfig, PnlModel, ThetaConfig, WhatIfConfig,
};

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read configuration file.
    #[error("Failed to read config file '{path}': {source}")]
    ReadError {
        /// Path to the config file.
        path: String,
        /// The underlying IO error.
        source: std::io::Error,
    },

    /// Failed to parse YAML configuration.
    #[error("Failed to parse config YAML: {0}")]
    ParseError(#[from] serde_yaml_bw::Error),

    /// Configuration validation failed.
    #[error("Config validation failed: {0}")]
    ValidationError(String),

    /// A section required by the requested operation is absent.
    #[error("Missing required config section: {0}")]
    MissingSection(&'static str),
}

/// Root configuration structure.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Payoff grid configuration.
    #[serde(default)]
    pub payoff: PayoffConfig,
    /// Greek exposure limits (required for classification).
    #[serde(default)]
    pub greeks: Option<GreekLimits>,
    /// Risk scoring configuration (required for scoring and what-if).
    #[serde(default)]
    pub risk_scoring: Option<RiskScoringConfig>,
    /// What-if configuration.
    #[serde(default)]
    pub what_if: WhatIfConfig,
    /// Theta decay configuration.
    #[serde(default)]
    pub theta: ThetaConfig,
    /// Monte Carlo configuration.
    #[serde(default)]
    pub monte_carlo: MonteCarloConfig,
    /// Conflict thresholds (required for conflict detection).
    #[serde(default)]
    pub conflicts: Option<ConflictThresholds>,
    /// Hedging configuration (required for hedge recommendations).
    #[serde(default)]
    pub hedging: Option<HedgingConfig>,
    /// Safety checklist thresholds (required for the checklist).
    #[serde(default)]
    pub safety: Option<SafetyConfig>,
    /// Capital-at-risk fractions (required for capital analysis).
    #[serde(default)]
    pub capital: Option<CapitalConfig>,
    /// Observability configuration.
    #[serde(default)]
    pub observability: ObservabilityConfig,
}

impl EngineConfig {
    /// Greek limits.
    ///
    /// # Errors
    ///
    /// Returns `MissingSection` when `greeks` is absent.
    pub fn greek_limits(&self) -> Result<&GreekLimits, ConfigError> {
        self.greeks.as_ref().ok_or(ConfigError::MissingSection("greeks"))
    }

    /// Risk scoring configuration.
    ///
    /// # Errors
    ///
    /// Returns `MissingSection` when `risk_scoring` is absent.
    pub fn risk_scoring(&self) -> Result<&RiskScoringConfig, ConfigError> {
        self.risk_scoring
            .as_ref()
            .ok_or(ConfigError::MissingSection("risk_scoring"))
    }

    /// Conflict thresholds.
    ///
    /// # Errors
    ///
    /// Returns `MissingSection` when `conflicts` is absent.
    pub fn conflict_thresholds(&self) -> Result<&ConflictThresholds, ConfigError> {
        self.conflicts
            .as_ref()
            .ok_or(ConfigError::MissingSection("conflicts"))
    }

    /// Hedging configuration.
    ///
    /// # Errors
    ///
    /// Returns `MissingSection` when `hedging` is absent.
    pub fn hedging(&self) -> Result<&HedgingConfig, ConfigError> {
        self.hedging.as_ref().ok_or(ConfigError::MissingSection("hedging"))
    }

    /// Safety checklist thresholds.
    ///
    /// # Errors
    ///
    /// Returns `MissingSection` when `safety` is absent.
    pub fn safety(&self) -> Result<&SafetyConfig, ConfigError> {
        self.safety.as_ref().ok_or(ConfigError::MissingSection("safety"))
    }

    /// Capital-at-risk fractions.
    ///
    /// # Errors
    ///
    /// Returns `MissingSection` when `capital` is absent.
    pub fn capital(&self) -> Result<&CapitalConfig, ConfigError> {
        self.capital.as_ref().ok_or(ConfigError::MissingSection("capital"))
    }
}

// ============================================
// Configuration Loading
// ============================================

/// Load configuration from a YAML file with environment variable interpolation.
///
/// # Arguments
///
/// * `path` - Optional path to the config file. Defaults to "config.yaml".
///
/// # Errors
///
/// Returns a `ConfigError` if the file cannot be read, parsed, or validated.
pub fn load_config(path: Option<&str>) -> Result<EngineConfig, ConfigError> {
    let path = path.unwrap_or("config.yaml");

    let contents = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
        path: path.to_string(),
        source: e,
    })?;

    load_config_from_string(&contents)
}

/// Load configuration from a YAML string (useful for testing).
///
/// # Errors
///
/// Returns a `ConfigError` if the YAML cannot be parsed or validated.
pub fn load_config_from_string(yaml: &str) -> Result<EngineConfig, ConfigError> {
    let interpolated = interpolate_env_vars(yaml);
    let config: EngineConfig = serde_yaml_bw::from_str(&interpolated)?;
    validate_config(&config)?;
    Ok(config)
}

/// Interpolate environment variables in a string.
///
/// Supports both `${VAR}` and `${VAR:-default}` syntax.
#[allow(clippy::expect_used)] // Regex is compile-time constant
fn interpolate_env_vars(input: &str) -> String {
    use std::sync::OnceLock;

    static ENV_VAR_REGEX: OnceLock<regex::Regex> = OnceLock::new();

    let re = ENV_VAR_REGEX.get_or_init(|| {
        regex::Regex::new(r"\$\{([A-Za-z_][A-Za-z0-9_]*)(?::-([^}]*))?\}")
            .expect("env var regex is valid")
    });

    re.replace_all(input, |cap: &regex::Captures<'_>| {
        let default_value = cap.get(2).map_or("", |m| m.as_str());
        match std::env::var(&cap[1]) {
            Ok(v) if !v.is_empty() => v,
            _ => default_value.to_string(),
        }
    })
    .into_owned()
}

/// Validate every present section.
///
/// # Errors
///
/// Returns the first `ValidationError` found.
pub fn validate_config(config: &EngineConfig) -> Result<(), ConfigError> {
    config.payoff.validate()?;
    if let Some(limits) = &config.greeks {
        limits.validate()?;
    }
    if let Some(scoring) = &config.risk_scoring {
        scoring.validate()?;
    }
    config.what_if.validate()?;
    config.theta.validate()?;
    config.monte_carlo.validate()?;
    if let Some(thresholds) = &config.conflicts {
        thresholds.validate()?;
    }
    if let Some(hedging) = &config.hedging {
        hedging.validate()?;
    }
    if let Some(safety) = &config.safety {
        safety.validate()?;
    }
    if let Some(capital) = &config.capital {
        capital.validate()?;
    }
    Ok(())
}
