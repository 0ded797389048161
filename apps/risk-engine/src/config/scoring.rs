//! Risk scoring configuration.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::ConfigError;

/// Largest accepted sub-score weight.
pub const MAX_SCORE_WEIGHT: Decimal = Decimal::from_parts(1_000_000, 0, 0, false, 0);

/// Weights of the three risk sub-scores.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreWeights {
    /// Weight of the P&L drawdown sub-score.
    pub pnl: Decimal,
    /// Weight of the Greeks sub-score.
    pub greeks: Decimal,
    /// Weight of the margin usage sub-score.
    pub margin: Decimal,
}

impl ScoreWeights {
    /// Sum of all weights.
    #[must_use]
    pub fn total(&self) -> Decimal {
        self.pnl + self.greeks + self.margin
    }
}

/// Lower bounds of the caution, warning and breach bands.
///
/// Scores below `caution` are safe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RiskBands {
    /// Lower bound of the caution band.
    #[serde(default = "default_caution")]
    pub caution: u8,
    /// Lower bound of the warning band.
    #[serde(default = "default_warning")]
    pub warning: u8,
    /// Lower bound of the breach band.
    #[serde(default = "default_breach")]
    pub breach: u8,
}

impl Default for RiskBands {
    fn default() -> Self {
        Self {
            caution: default_caution(),
            warning: default_warning(),
            breach: default_breach(),
        }
    }
}

const fn default_caution() -> u8 {
    40
}

const fn default_warning() -> u8 {
    60
}

const fn default_breach() -> u8 {
    80
}

/// Risk scoring configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RiskScoringConfig {
    /// Sub-score weights.
    pub weights: ScoreWeights,
    /// P&L magnitude that maps to `k1` points of P&L sub-score.
    pub reference_loss_unit: Decimal,
    /// P&L sub-score multiplier.
    pub k1: Decimal,
    /// Greeks sub-score multiplier.
    pub k2: Decimal,
    /// Classification bands.
    #[serde(default)]
    pub bands: RiskBands,
}

impl RiskScoringConfig {
    /// Validate weights, constants and bands.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError` on negative weights, weights above
    /// [`MAX_SCORE_WEIGHT`], a zero weight sum, non-positive constants, or
    /// unordered bands.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let w = &self.weights;
        if w.pnl < Decimal::ZERO || w.greeks < Decimal::ZERO || w.margin < Decimal::ZERO {
            return Err(ConfigError::ValidationError(
                "risk_scoring.weights must be non-negative".to_string(),
            ));
        }
        if w.pnl > MAX_SCORE_WEIGHT || w.greeks > MAX_SCORE_WEIGHT || w.margin > MAX_SCORE_WEIGHT {
            return Err(ConfigError::ValidationError(format!(
                "risk_scoring.weights must not exceed {MAX_SCORE_WEIGHT}"
            )));
        }
        if w.total() <= Decimal::ZERO {
            return Err(ConfigError::ValidationError(
                "risk_scoring.weights must not all be zero".to_string(),
            ));
        }
        if self.reference_loss_unit <= Decimal::ZERO {
            return Err(ConfigError::ValidationError(
                "risk_scoring.reference_loss_unit must be positive".to_string(),
            ));
        }
        if self.k1 < Decimal::ZERO || self.k2 < Decimal::ZERO {
            return Err(ConfigError::ValidationError(
                "risk_scoring.k1 and k2 must be non-negative".to_string(),
            ));
        }
        let b = &self.bands;
        if !(0 < b.caution && b.caution < b.warning && b.warning < b.breach && b.breach <= 100) {
            return Err(ConfigError::ValidationError(format!(
                "risk_scoring.bands must satisfy 0 < caution < warning < breach <= 100 \
                 (got {}, {}, {})",
                b.caution, b.warning, b.breach
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn config(pnl: Decimal) -> RiskScoringConfig {
        RiskScoringConfig {
            weights: ScoreWeights {
                pnl,
                greeks: dec!(0.3),
                margin: dec!(0.3),
            },
            reference_loss_unit: dec!(10000),
            k1: dec!(10),
            k2: dec!(0.1),
            bands: RiskBands::default(),
        }
    }

    #[test]
    fn test_weight_bounds() {
        assert!(config(dec!(0.4)).validate().is_ok());
        assert!(config(MAX_SCORE_WEIGHT).validate().is_ok());
        assert!(matches!(
            config(MAX_SCORE_WEIGHT + Decimal::ONE).validate(),
            Err(ConfigError::ValidationError(_))
        ));
        assert!(config(Decimal::MAX).validate().is_err());
        assert!(config(dec!(-0.1)).validate().is_err());
    }
}
