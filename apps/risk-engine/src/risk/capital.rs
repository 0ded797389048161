//! Capital at risk and the max-loss limiter.
//!
//! Losses are expiry payoffs over the configured price grid with every
//! strike added as a sample, so piecewise-linear extrema are exact inside
//! the grid. Unbounded legs are measured at the grid edge.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::config::{CapitalConfig, PayoffConfig};
use crate::error::{EngineError, EngineResult};
use crate::options::{InstrumentType, Strategy};
use crate::payoff::{PayoffCurve, PayoffCurveBuilder, payoff_at, refine_key_levels};

/// Guidance attached to a failed max-loss check.
pub const MAX_LOSS_RECOMMENDATIONS: [&str; 4] = [
    "Consider reducing position size",
    "Add protective options to limit downside",
    "Set tighter stop loss levels",
    "Use hedging strategies like protective puts",
];

/// Outcome of [`validate_max_loss`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MaxLossCheck {
    /// `potential_loss <= allowed_max_loss`.
    pub is_valid: bool,
    /// Worst expiry loss over the grid, as a positive amount.
    pub current_max_loss: Decimal,
    /// Caller's limit.
    pub allowed_max_loss: Decimal,
    /// `max(current_max_loss, total_margin * margin_loss_floor)`.
    pub potential_loss: Decimal,
    /// Empty when the check passes.
    pub recommendations: Vec<String>,
}

/// Liquidation risk from margin usage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LiquidationRisk {
    /// Margin usage above the configured bound.
    High,
    /// Within bounds, or no capital known.
    Low,
}

/// Capital at risk in one leg.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LegRisk {
    /// Position of the leg within its strategy.
    pub index: usize,
    /// Instrument held.
    pub instrument_type: InstrumentType,
    /// Strike (options only).
    pub strike: Option<Decimal>,
    /// Margin blocked for the leg.
    pub margin: Decimal,
    /// Worst expiry loss of the leg alone, as a positive amount.
    pub potential_loss: Decimal,
    /// Share of the summed leg losses, in percent.
    pub risk_contribution_pct: Decimal,
}

/// Capital analysis for one strategy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CapitalAtRisk {
    /// Strategy analysed.
    pub strategy_id: String,
    /// Total blocked margin.
    pub capital_deployed: Decimal,
    /// Worst strategy loss over the grid, or the deployed margin when the
    /// strategy cannot lose inside the grid.
    pub max_potential_loss: Decimal,
    /// Deployed margin as a percentage of available capital, when known.
    pub portfolio_pct: Option<Decimal>,
    /// Per-leg breakdown in leg order.
    pub leg_breakdown: Vec<LegRisk>,
    /// Value-at-risk estimate from margin.
    pub var_estimate: Decimal,
    /// Stress-test loss from margin.
    pub stress_loss: Decimal,
    /// Liquidation risk.
    pub liquidation_risk: LiquidationRisk,
}

/// Check the strategy's potential loss against `max_allowed_loss`.
///
/// # Errors
///
/// Returns `InvalidInput` for a negative limit or a strategy that cannot be
/// priced, `InvalidLeg` for a malformed leg and `Configuration` for invalid
/// fractions.
pub fn validate_max_loss(
    strategy: &Strategy,
    max_allowed_loss: Decimal,
    payoff: &PayoffConfig,
    capital: &CapitalConfig,
) -> EngineResult<MaxLossCheck> {
    if max_allowed_loss < Decimal::ZERO {
        return Err(EngineError::invalid_input(format!(
            "max allowed loss must be non-negative, got {max_allowed_loss}"
        )));
    }
    capital.validate()?;

    let curve = PayoffCurveBuilder::from_config(strategy, payoff).build()?;
    let current_max_loss = worst_loss(strategy, &curve)?;
    let potential_loss = current_max_loss.max(strategy.total_margin() * capital.margin_loss_floor);
    let is_valid = potential_loss <= max_allowed_loss;
    let recommendations = if is_valid {
        Vec::new()
    } else {
        MAX_LOSS_RECOMMENDATIONS
            .iter()
            .map(|s| (*s).to_string())
            .collect()
    };

    info!(
        strategy_id = %strategy.id,
        potential_loss = %potential_loss,
        allowed = %max_allowed_loss,
        is_valid,
        "Validated max loss"
    );

    Ok(MaxLossCheck {
        is_valid,
        current_max_loss,
        allowed_max_loss: max_allowed_loss,
        potential_loss,
        recommendations,
    })
}

/// Break down the capital a strategy puts at risk.
///
/// # Errors
///
/// Returns `InvalidInput`/`InvalidLeg` when the strategy cannot be priced
/// and `Configuration` for invalid fractions.
pub fn capital_at_risk(
    strategy: &Strategy,
    payoff: &PayoffConfig,
    capital: &CapitalConfig,
) -> EngineResult<CapitalAtRisk> {
    capital.validate()?;
    let curve = PayoffCurveBuilder::from_config(strategy, payoff).build()?;

    let margin = strategy.total_margin();
    let worst = worst_loss(strategy, &curve)?;
    let max_potential_loss = if worst > Decimal::ZERO { worst } else { margin };

    let usage_pct = strategy
        .available_capital
        .filter(|c| *c > Decimal::ZERO)
        .map(|c| {
            margin
                .checked_div(c)
                .and_then(|ratio| ratio.checked_mul(Decimal::ONE_HUNDRED))
                .unwrap_or(Decimal::MAX)
        });
    let portfolio_pct = usage_pct.map(|pct| pct.round_dp(2));
    let liquidation_risk = if usage_pct.is_some_and(|pct| pct > capital.liquidation_margin_pct) {
        LiquidationRisk::High
    } else {
        LiquidationRisk::Low
    };

    let leg_losses = leg_losses(strategy, &curve)?;
    let total_leg_loss: Decimal = leg_losses.iter().sum();
    let leg_breakdown = strategy
        .legs
        .iter()
        .zip(leg_losses)
        .enumerate()
        .map(|(index, (leg, potential_loss))| LegRisk {
            index,
            instrument_type: leg.instrument_type,
            strike: leg.strike,
            margin: leg.margin,
            potential_loss,
            risk_contribution_pct: if total_leg_loss.is_zero() {
                Decimal::ZERO
            } else {
                (potential_loss / total_leg_loss * Decimal::ONE_HUNDRED).round_dp(2)
            },
        })
        .collect();

    debug!(
        strategy_id = %strategy.id,
        deployed = %margin,
        max_loss = %max_potential_loss,
        liquidation = ?liquidation_risk,
        "Computed capital at risk"
    );

    Ok(CapitalAtRisk {
        strategy_id: strategy.id.clone(),
        capital_deployed: margin,
        max_potential_loss,
        portfolio_pct,
        leg_breakdown,
        var_estimate: margin * capital.var_margin_fraction,
        stress_loss: margin * capital.stress_margin_fraction,
        liquidation_risk,
    })
}

fn worst_loss(strategy: &Strategy, curve: &PayoffCurve) -> EngineResult<Decimal> {
    let levels = refine_key_levels(strategy, curve)?;
    Ok((-levels.max_loss).max(Decimal::ZERO))
}

/// Worst expiry loss of each leg on its own over grid spots and strikes.
fn leg_losses(strategy: &Strategy, curve: &PayoffCurve) -> EngineResult<Vec<Decimal>> {
    let mut spots: Vec<Decimal> = curve.points().iter().map(|p| p.spot_price).collect();
    if let Some((low, high)) = curve.range() {
        spots.extend(
            strategy
                .strikes()
                .into_iter()
                .filter(|s| *s > low && *s < high),
        );
    }

    strategy
        .legs
        .iter()
        .enumerate()
        .map(|(index, leg)| -> EngineResult<Decimal> {
            let mut worst = Decimal::ZERO;
            for spot in &spots {
                let payoff = payoff_at(leg, *spot, strategy.underlying_price)
                    .map_err(|e| e.at_leg(index))?;
                worst = worst.min(payoff);
            }
            Ok(-worst)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::Leg;
    use rust_decimal_macros::dec;

    fn capital() -> CapitalConfig {
        CapitalConfig {
            margin_loss_floor: dec!(0.1),
            var_margin_fraction: dec!(0.05),
            stress_margin_fraction: dec!(0.15),
            liquidation_margin_pct: dec!(80),
        }
    }

    fn short_straddle() -> Strategy {
        Strategy::new(
            "ss",
            "X",
            dec!(100),
            vec![
                Leg::call(dec!(100), -1, dec!(5)).with_margin(dec!(600)),
                Leg::put(dec!(100), -1, dec!(5)).with_margin(dec!(400)),
            ],
        )
        .with_available_capital(dec!(4000))
    }

    #[test]
    fn test_max_loss_uses_margin_floor() {
        // Grid loss 10 at the edges, floor 1000 * 0.1 = 100.
        let check =
            validate_max_loss(&short_straddle(), dec!(50), &PayoffConfig::default(), &capital())
                .unwrap();
        assert!(!check.is_valid);
        assert_eq!(check.current_max_loss, dec!(10));
        assert_eq!(check.potential_loss, dec!(100));
        assert_eq!(check.recommendations.len(), 4);
        assert_eq!(check.recommendations[0], "Consider reducing position size");

        let ok =
            validate_max_loss(&short_straddle(), dec!(100), &PayoffConfig::default(), &capital())
                .unwrap();
        assert!(ok.is_valid);
        assert!(ok.recommendations.is_empty());
    }

    #[test]
    fn test_max_loss_from_payoff_dominates() {
        let strategy = Strategy::new(
            "lc",
            "X",
            dec!(100),
            vec![Leg::call(dec!(100), 10, dec!(5)).with_margin(dec!(50))],
        );
        let check =
            validate_max_loss(&strategy, dec!(40), &PayoffConfig::default(), &capital()).unwrap();
        // Premium paid: 10 * 5.
        assert_eq!(check.current_max_loss, dec!(50));
        assert_eq!(check.potential_loss, dec!(50));
        assert!(!check.is_valid);
    }

    #[test]
    fn test_negative_limit_rejected() {
        assert!(matches!(
            validate_max_loss(
                &short_straddle(),
                dec!(-1),
                &PayoffConfig::default(),
                &capital()
            ),
            Err(EngineError::InvalidInput { .. })
        ));
    }

    #[test]
    fn test_capital_at_risk_breakdown() {
        let analysis =
            capital_at_risk(&short_straddle(), &PayoffConfig::default(), &capital()).unwrap();
        assert_eq!(analysis.capital_deployed, dec!(1000));
        assert_eq!(analysis.max_potential_loss, dec!(10));
        assert_eq!(analysis.portfolio_pct, Some(dec!(25)));
        assert_eq!(analysis.var_estimate, dec!(50));
        assert_eq!(analysis.stress_loss, dec!(150));
        assert_eq!(analysis.liquidation_risk, LiquidationRisk::Low);

        // Each short leg alone loses 20 - 5 at its grid edge.
        let legs = &analysis.leg_breakdown;
        assert_eq!(legs.len(), 2);
        assert_eq!(legs[0].instrument_type, InstrumentType::Call);
        assert_eq!(legs[0].margin, dec!(600));
        assert_eq!(legs[0].potential_loss, dec!(15));
        assert_eq!(legs[1].potential_loss, dec!(15));
        assert_eq!(legs[0].risk_contribution_pct, dec!(50));
    }

    #[test]
    fn test_liquidation_risk_above_bound() {
        let strategy = short_straddle().with_available_capital(dec!(1200));
        let analysis = capital_at_risk(&strategy, &PayoffConfig::default(), &capital()).unwrap();
        // 1000 > 1200 * 0.8
        assert_eq!(analysis.liquidation_risk, LiquidationRisk::High);
        assert_eq!(analysis.portfolio_pct, Some(dec!(83.33)));
    }

    #[test]
    fn test_unknown_capital_has_no_percentage() {
        let strategy = Strategy {
            available_capital: None,
            ..short_straddle()
        };
        let analysis = capital_at_risk(&strategy, &PayoffConfig::default(), &capital()).unwrap();
        assert_eq!(analysis.portfolio_pct, None);
        assert_eq!(analysis.liquidation_risk, LiquidationRisk::Low);
    }

    #[test]
    fn test_riskless_strategy_falls_back_to_margin() {
        // A long call priced at zero cannot lose at expiry.
        let strategy = Strategy::new(
            "free",
            "X",
            dec!(100),
            vec![Leg::call(dec!(100), 1, Decimal::ZERO).with_margin(dec!(75))],
        );
        let analysis = capital_at_risk(&strategy, &PayoffConfig::default(), &capital()).unwrap();
        assert_eq!(analysis.max_potential_loss, dec!(75));
        assert_eq!(analysis.leg_breakdown[0].potential_loss, Decimal::ZERO);
        assert_eq!(analysis.leg_breakdown[0].risk_contribution_pct, Decimal::ZERO);
    }
}
