//! What-if, theta decay and Monte Carlo configuration.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use super::ConfigError;

// ============================================
// What-If
// ============================================

/// How the spot move contributes to what-if P&L.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PnlModel {
    /// Reprice every leg at the shocked spot.
    #[default]
    FullRepricing,
    /// First-order approximation: `delta * spot_change * delta_scale`.
    DeltaLinear,
}

/// What-if scenario configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WhatIfConfig {
    /// Spot P&L model.
    #[serde(default)]
    pub pnl_model: PnlModel,
    /// Multiplier on the delta term (`DeltaLinear` only).
    #[serde(default = "default_one")]
    pub delta_scale: Decimal,
    /// Multiplier on the vega term; vega is per IV point.
    #[serde(default = "default_one")]
    pub vega_scale: Decimal,
    /// Delta damping applied under a non-neutral scenario.
    #[serde(default = "default_delta_damping")]
    pub delta_damping: Decimal,
    /// Gamma damping applied under a non-neutral scenario.
    #[serde(default = "default_gamma_damping")]
    pub gamma_damping: Decimal,
    /// Vega damping applied under a non-neutral scenario.
    #[serde(default = "default_vega_damping")]
    pub vega_damping: Decimal,
    /// Days over which theta fades to zero.
    #[serde(default = "default_theta_reference_days")]
    pub theta_reference_days: u32,
}

impl Default for WhatIfConfig {
    fn default() -> Self {
        Self {
            pnl_model: PnlModel::default(),
            delta_scale: default_one(),
            vega_scale: default_one(),
            delta_damping: default_delta_damping(),
            gamma_damping: default_gamma_damping(),
            vega_damping: default_vega_damping(),
            theta_reference_days: default_theta_reference_days(),
        }
    }
}

impl WhatIfConfig {
    /// Validate scales and damping factors.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError` for negative scales, damping outside
    /// [0, 1], or a zero theta reference period.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.delta_scale < Decimal::ZERO || self.vega_scale < Decimal::ZERO {
            return Err(ConfigError::ValidationError(
                "what_if scales must be non-negative".to_string(),
            ));
        }
        for (name, value) in [
            ("delta_damping", self.delta_damping),
            ("gamma_damping", self.gamma_damping),
            ("vega_damping", self.vega_damping),
        ] {
            if value < Decimal::ZERO || value > Decimal::ONE {
                return Err(ConfigError::ValidationError(format!(
                    "what_if.{name} must be between 0 and 1"
                )));
            }
        }
        if self.theta_reference_days == 0 {
            return Err(ConfigError::ValidationError(
                "what_if.theta_reference_days must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

fn default_one() -> Decimal {
    Decimal::ONE
}

fn default_delta_damping() -> Decimal {
    dec!(0.95)
}

fn default_gamma_damping() -> Decimal {
    dec!(0.9)
}

fn default_vega_damping() -> Decimal {
    dec!(0.95)
}

const fn default_theta_reference_days() -> u32 {
    30
}

// ============================================
// Theta Decay
// ============================================

/// Theta multiplier applied when `days_remaining <= within_days`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccelerationTier {
    /// Inclusive upper bound on days remaining.
    pub within_days: u32,
    /// Theta multiplier.
    pub multiplier: Decimal,
}

/// Theta decay projection configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThetaConfig {
    /// Acceleration schedule; the tightest matching tier wins.
    #[serde(default = "default_acceleration")]
    pub acceleration: Vec<AccelerationTier>,
    /// Days remaining at or below which a projected day is critical.
    #[serde(default = "default_critical_within_days")]
    pub critical_within_days: u32,
}

impl Default for ThetaConfig {
    fn default() -> Self {
        Self {
            acceleration: default_acceleration(),
            critical_within_days: default_critical_within_days(),
        }
    }
}

impl ThetaConfig {
    /// Multiplier for a given number of days remaining.
    #[must_use]
    pub fn multiplier(&self, days_remaining: u32) -> Decimal {
        self.acceleration
            .iter()
            .filter(|tier| days_remaining <= tier.within_days)
            .min_by_key(|tier| tier.within_days)
            .map_or(Decimal::ONE, |tier| tier.multiplier)
    }

    /// Validate the schedule.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError` on negative multipliers or duplicate tiers.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut seen = Vec::with_capacity(self.acceleration.len());
        for tier in &self.acceleration {
            if tier.multiplier < Decimal::ZERO {
                return Err(ConfigError::ValidationError(format!(
                    "theta.acceleration multiplier for {} days must be non-negative",
                    tier.within_days
                )));
            }
            if seen.contains(&tier.within_days) {
                return Err(ConfigError::ValidationError(format!(
                    "theta.acceleration has duplicate tier for {} days",
                    tier.within_days
                )));
            }
            seen.push(tier.within_days);
        }
        Ok(())
    }
}

const fn default_critical_within_days() -> u32 {
    7
}

fn default_acceleration() -> Vec<AccelerationTier> {
    vec![
        AccelerationTier {
            within_days: 7,
            multiplier: dec!(1.5),
        },
        AccelerationTier {
            within_days: 15,
            multiplier: dec!(1.2),
        },
    ]
}

// ============================================
// Monte Carlo
// ============================================

/// Terminal spot distribution.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DrawModel {
    /// Driftless log-normal move with sigma from the strategy's IV and
    /// horizon from its days to expiry.
    #[default]
    LogNormal,
    /// Uniform relative move in `[-range, +range]`.
    Uniform {
        /// Half-width of the move as a fraction of spot.
        range: Decimal,
    },
}

/// Monte Carlo configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonteCarloConfig {
    /// Terminal spot distribution.
    #[serde(default)]
    pub draw_model: DrawModel,
    /// Width of P&L distribution buckets.
    #[serde(default = "default_bucket_width")]
    pub bucket_width: Decimal,
    /// Draws per parallel batch (cancellation is checked between batches).
    #[serde(default = "default_mc_batch_size")]
    pub batch_size: usize,
    /// Calendar days per year for the log-normal horizon.
    #[serde(default = "default_days_per_year")]
    pub days_per_year: u32,
    /// Daily price paths included in each report.
    #[serde(default = "default_sample_paths")]
    pub sample_paths: usize,
}

impl Default for MonteCarloConfig {
    fn default() -> Self {
        Self {
            draw_model: DrawModel::default(),
            bucket_width: default_bucket_width(),
            batch_size: default_mc_batch_size(),
            days_per_year: default_days_per_year(),
            sample_paths: default_sample_paths(),
        }
    }
}

impl MonteCarloConfig {
    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError` for a non-positive bucket width, zero batch
    /// size or year length, or a uniform range outside (0, 1).
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.bucket_width <= Decimal::ZERO {
            return Err(ConfigError::ValidationError(
                "monte_carlo.bucket_width must be positive".to_string(),
            ));
        }
        if self.batch_size == 0 {
            return Err(ConfigError::ValidationError(
                "monte_carlo.batch_size must be positive".to_string(),
            ));
        }
        if self.days_per_year == 0 {
            return Err(ConfigError::ValidationError(
                "monte_carlo.days_per_year must be positive".to_string(),
            ));
        }
        if let DrawModel::Uniform { range } = self.draw_model
            && (range <= Decimal::ZERO || range >= Decimal::ONE)
        {
            return Err(ConfigError::ValidationError(
                "monte_carlo.draw_model.range must be between 0 and 1 (exclusive)".to_string(),
            ));
        }
        Ok(())
    }
}

fn default_bucket_width() -> Decimal {
    dec!(5000)
}

const fn default_mc_batch_size() -> usize {
    1024
}

const fn default_days_per_year() -> u32 {
    365
}

const fn default_sample_paths() -> usize {
    10
}
