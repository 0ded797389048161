//! Payoff curve grid configuration.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use super::ConfigError;

/// Payoff curve grid configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PayoffConfig {
    /// Half-width of the price grid as a fraction of spot.
    #[serde(default = "default_price_range_fraction")]
    pub price_range_fraction: Decimal,
    /// Number of grid intervals (the curve has `steps + 1` points).
    #[serde(default = "default_steps")]
    pub steps: u32,
    /// Grid points evaluated between cancellation checks.
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
}

impl Default for PayoffConfig {
    fn default() -> Self {
        Self {
            price_range_fraction: default_price_range_fraction(),
            steps: default_steps(),
            batch_size: default_batch_size(),
        }
    }
}

impl PayoffConfig {
    /// Validate grid parameters.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError` when the fraction is outside (0, 1) or
    /// `steps`/`batch_size` is zero.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.price_range_fraction <= Decimal::ZERO || self.price_range_fraction >= Decimal::ONE {
            return Err(ConfigError::ValidationError(
                "payoff.price_range_fraction must be between 0 and 1 (exclusive)".to_string(),
            ));
        }
        if self.steps == 0 {
            return Err(ConfigError::ValidationError(
                "payoff.steps must be positive".to_string(),
            ));
        }
        if self.batch_size == 0 {
            return Err(ConfigError::ValidationError(
                "payoff.batch_size must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

fn default_price_range_fraction() -> Decimal {
    dec!(0.2)
}

const fn default_steps() -> u32 {
    100
}

const fn default_batch_size() -> usize {
    64
}
