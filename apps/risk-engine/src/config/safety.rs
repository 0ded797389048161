//! Pre-trade safety checklist and capital-at-risk configuration.
//!
//! Both sections are required by the operations that use them.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::ConfigError;

/// Thresholds for the pre-trade safety checklist.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SafetyConfig {
    /// Margin usage (percent of available capital) above which a warning is raised.
    pub max_margin_pct: Decimal,
    /// Take-profit to stop-loss ratio below which a warning is raised.
    pub min_risk_reward: Decimal,
    /// Implied volatility (percent) above which the environment counts as high.
    pub high_iv: Decimal,
    /// Fewer days to expiry than this raise a near-expiry warning.
    pub near_expiry_days: u32,
    /// More days to expiry than this raise a long-dated warning.
    pub long_expiry_days: u32,
}

impl SafetyConfig {
    /// Validate thresholds.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError` when a threshold is out of range or the
    /// expiry window is empty.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_margin_pct < Decimal::ZERO || self.max_margin_pct > Decimal::ONE_HUNDRED {
            return Err(ConfigError::ValidationError(
                "safety.max_margin_pct must be between 0 and 100".to_string(),
            ));
        }
        if self.min_risk_reward < Decimal::ZERO || self.high_iv < Decimal::ZERO {
            return Err(ConfigError::ValidationError(
                "safety.min_risk_reward and high_iv must be non-negative".to_string(),
            ));
        }
        if self.near_expiry_days > self.long_expiry_days {
            return Err(ConfigError::ValidationError(format!(
                "safety.near_expiry_days ({}) must not exceed long_expiry_days ({})",
                self.near_expiry_days, self.long_expiry_days
            )));
        }
        Ok(())
    }
}

/// Fractions used to size capital at risk from blocked margin.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CapitalConfig {
    /// Floor on potential loss as a fraction of total margin.
    pub margin_loss_floor: Decimal,
    /// One-day value-at-risk estimate as a fraction of total margin.
    pub var_margin_fraction: Decimal,
    /// Stress-test loss as a fraction of total margin.
    pub stress_margin_fraction: Decimal,
    /// Margin usage (percent) above which liquidation risk is high.
    pub liquidation_margin_pct: Decimal,
}

impl CapitalConfig {
    /// Validate fractions.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError` when a fraction is outside `[0, 1]` or the
    /// liquidation bound is outside `[0, 100]`.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (name, value) in [
            ("margin_loss_floor", self.margin_loss_floor),
            ("var_margin_fraction", self.var_margin_fraction),
            ("stress_margin_fraction", self.stress_margin_fraction),
        ] {
            if value < Decimal::ZERO || value > Decimal::ONE {
                return Err(ConfigError::ValidationError(format!(
                    "capital.{name} must be between 0 and 1"
                )));
            }
        }
        if self.liquidation_margin_pct < Decimal::ZERO
            || self.liquidation_margin_pct > Decimal::ONE_HUNDRED
        {
            return Err(ConfigError::ValidationError(
                "capital.liquidation_margin_pct must be between 0 and 100".to_string(),
            ));
        }
        Ok(())
    }
}
