//! Composite 0-100 risk score.
//!
//! Three sub-scores, each clamped to [0, 100]:
//!
//! | Sub-score | Formula |
//! |-----------|---------|
//! | P&L | `|pnl| / reference_loss_unit * k1` |
//! | Greeks | `(|delta| + |gamma| * 10 + |vega| / 10 + |theta| / 10) * k2` |
//! | Margin | `margin_used_pct` |
//!
//! The final score is their weighted average, clamped and rounded half away
//! from zero.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::{RiskBands, RiskScoringConfig};
use crate::error::{EngineError, EngineResult};
use crate::options::{Greeks, Strategy};

const TEN: Decimal = Decimal::TEN;

/// Risk band.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RiskBand {
    /// Below the caution bound.
    Safe,
    /// Between caution and warning bounds.
    Caution,
    /// Between warning and breach bounds.
    Warning,
    /// At or above the breach bound.
    Breach,
}

impl RiskBand {
    /// Band for a score under the given bounds.
    #[must_use]
    pub const fn from_score(score: u8, bands: &RiskBands) -> Self {
        if score >= bands.breach {
            Self::Breach
        } else if score >= bands.warning {
            Self::Warning
        } else if score >= bands.caution {
            Self::Caution
        } else {
            Self::Safe
        }
    }

    /// Guidance for this band.
    #[must_use]
    pub const fn recommendations(&self) -> &'static [&'static str] {
        match self {
            Self::Warning | Self::Breach => &[
                "Consider reducing position sizes",
                "Review stop loss settings",
                "Add hedging positions",
            ],
            Self::Caution => &[
                "Monitor positions closely",
                "Consider tightening risk limits",
            ],
            Self::Safe => &["Risk is within acceptable limits"],
        }
    }
}

impl std::fmt::Display for RiskBand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Safe => write!(f, "SAFE"),
            Self::Caution => write!(f, "CAUTION"),
            Self::Warning => write!(f, "WARNING"),
            Self::Breach => write!(f, "BREACH"),
        }
    }
}

/// Guidance strings for a band.
#[must_use]
pub fn recommendations(band: RiskBand) -> Vec<String> {
    band.recommendations()
        .iter()
        .map(|s| (*s).to_string())
        .collect()
}

/// Sub-scores behind a [`RiskScore`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreComponents {
    /// P&L drawdown sub-score.
    pub pnl: Decimal,
    /// Greeks sub-score.
    pub greeks: Decimal,
    /// Margin usage sub-score.
    pub margin: Decimal,
}

/// Composite risk score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RiskScore {
    /// Score in [0, 100].
    pub value: u8,
    /// Band derived from `value`.
    pub band: RiskBand,
    /// Sub-scores.
    pub components: ScoreComponents,
}

/// Stateless risk scorer over validated configuration.
#[derive(Debug, Clone)]
pub struct RiskScorer {
    config: RiskScoringConfig,
}

impl RiskScorer {
    /// Create a scorer.
    ///
    /// # Errors
    ///
    /// Returns `Configuration` when weights, constants or bands are invalid.
    pub fn new(config: RiskScoringConfig) -> EngineResult<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    /// Configured bands.
    #[must_use]
    pub const fn bands(&self) -> &RiskBands {
        &self.config.bands
    }

    /// Score a strategy at its current mark.
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` when `margin_used_pct` is outside [0, 100].
    pub fn score(
        &self,
        strategy: &Strategy,
        greeks: &Greeks,
        margin_used_pct: Decimal,
    ) -> EngineResult<RiskScore> {
        let score = self.score_values(strategy.current_pnl, greeks, margin_used_pct)?;
        debug!(
            strategy_id = %strategy.id,
            score = score.value,
            band = %score.band,
            "Scored strategy risk"
        );
        Ok(score)
    }

    /// Score an arbitrary P&L/Greeks/margin combination.
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` when `margin_used_pct` is outside [0, 100].
    pub fn score_values(
        &self,
        pnl: Decimal,
        greeks: &Greeks,
        margin_used_pct: Decimal,
    ) -> EngineResult<RiskScore> {
        if margin_used_pct < Decimal::ZERO || margin_used_pct > Decimal::ONE_HUNDRED {
            return Err(EngineError::invalid_input(format!(
                "margin used percent must be between 0 and 100, got {margin_used_pct}"
            )));
        }

        let cfg = &self.config;
        let components = ScoreComponents {
            pnl: saturating_pct(
                pnl.abs()
                    .checked_div(cfg.reference_loss_unit)
                    .and_then(|v| v.checked_mul(cfg.k1)),
            ),
            greeks: saturating_pct(greeks_magnitude(greeks).and_then(|v| v.checked_mul(cfg.k2))),
            margin: margin_used_pct,
        };

        let w = &cfg.weights;
        let weighted = [
            (components.pnl, w.pnl),
            (components.greeks, w.greeks),
            (components.margin, w.margin),
        ]
        .into_iter()
        .try_fold(Decimal::ZERO, |acc, (score, weight)| {
            score.checked_mul(weight).and_then(|v| acc.checked_add(v))
        })
        .and_then(|sum| sum.checked_div(w.total()))
        .ok_or_else(|| EngineError::overflow("weighted risk score"))?;
        let rounded = clamp_pct(weighted)
            .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero);
        // Clamped to [0, 100] above.
        let value = rounded.to_u8().unwrap_or(100);

        Ok(RiskScore {
            value,
            band: RiskBand::from_score(value, &cfg.bands),
            components,
        })
    }
}

/// `None` on overflow, which only happens far above the 100 cap.
fn greeks_magnitude(g: &Greeks) -> Option<Decimal> {
    g.delta
        .abs()
        .checked_add(g.gamma.abs().checked_mul(TEN)?)?
        .checked_add(g.vega.abs() / TEN)?
        .checked_add(g.theta.abs() / TEN)
}

fn saturating_pct(value: Option<Decimal>) -> Decimal {
    value.map_or(Decimal::ONE_HUNDRED, clamp_pct)
}

fn clamp_pct(value: Decimal) -> Decimal {
    value.clamp(Decimal::ZERO, Decimal::ONE_HUNDRED)
}
