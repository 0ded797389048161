//! Greek exposure limits.
//!
//! No defaults: limits encode desk policy and must be supplied.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::ConfigError;

/// Safe/warning/max thresholds for one Greek, compared against `|value|`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GreekLimit {
    /// Upper bound of the safe band.
    pub safe: Decimal,
    /// Upper bound of the caution band.
    pub warning: Decimal,
    /// Hard limit used for utilization.
    pub max: Decimal,
}

impl GreekLimit {
    /// Create a limit.
    #[must_use]
    pub const fn new(safe: Decimal, warning: Decimal, max: Decimal) -> Self {
        Self { safe, warning, max }
    }

    fn validate(&self, name: &str) -> Result<(), ConfigError> {
        if self.safe <= Decimal::ZERO || self.safe > self.warning || self.warning > self.max {
            return Err(ConfigError::ValidationError(format!(
                "greeks.{name} limits must satisfy 0 < safe <= warning <= max \
                 (got safe={}, warning={}, max={})",
                self.safe, self.warning, self.max
            )));
        }
        Ok(())
    }
}

/// Per-Greek exposure limits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GreekLimits {
    /// Delta limits.
    pub delta: GreekLimit,
    /// Gamma limits.
    pub gamma: GreekLimit,
    /// Theta limits.
    pub theta: GreekLimit,
    /// Vega limits.
    pub vega: GreekLimit,
}

impl GreekLimits {
    /// Validate every limit.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError` naming the first inconsistent Greek.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.delta.validate("delta")?;
        self.gamma.validate("gamma")?;
        self.theta.validate("theta")?;
        self.vega.validate("vega")
    }
}
