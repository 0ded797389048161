//! Cross-strategy conflict and hedging configuration.
//!
//! Both sections are required; there are no built-in thresholds.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::ConfigError;

/// Conflict detection thresholds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConflictThresholds {
    /// Strategies on one symbol that constitute overexposure (at least 2).
    pub min_strategies_per_symbol: usize,
    /// Bound on the sum of positive strategy vega.
    pub max_positive_vega: Decimal,
    /// Pairwise correlation at or above which strategies are flagged.
    pub high_correlation: Decimal,
}

impl ConflictThresholds {
    /// Validate thresholds.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError` when any threshold is out of range.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.min_strategies_per_symbol < 2 {
            return Err(ConfigError::ValidationError(
                "conflicts.min_strategies_per_symbol must be at least 2".to_string(),
            ));
        }
        if self.max_positive_vega < Decimal::ZERO {
            return Err(ConfigError::ValidationError(
                "conflicts.max_positive_vega must be non-negative".to_string(),
            ));
        }
        if self.high_correlation < -Decimal::ONE || self.high_correlation > Decimal::ONE {
            return Err(ConfigError::ValidationError(
                "conflicts.high_correlation must be between -1 and 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// Hedge sizing and cost configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HedgingConfig {
    /// Fraction of net delta the hedge should neutralize.
    pub target_reduction: Decimal,
    /// Option hedge cost as a fraction of notional.
    pub option_cost_rate: Decimal,
    /// Futures hedge cost as a fraction of notional.
    pub future_cost_rate: Decimal,
}

impl HedgingConfig {
    /// Validate rates.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError` when the target is outside (0, 1] or a
    /// cost rate is negative.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.target_reduction <= Decimal::ZERO || self.target_reduction > Decimal::ONE {
            return Err(ConfigError::ValidationError(
                "hedging.target_reduction must be in (0, 1]".to_string(),
            ));
        }
        if self.option_cost_rate < Decimal::ZERO || self.future_cost_rate < Decimal::ZERO {
            return Err(ConfigError::ValidationError(
                "hedging cost rates must be non-negative".to_string(),
            ));
        }
        Ok(())
    }
}
