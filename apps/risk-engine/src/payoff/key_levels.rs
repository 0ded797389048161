//! Max profit, max loss and breakevens.
//!
//! Expiry payoff is piecewise-linear in spot with kinks only at strikes.
//! On a plain grid the extrema can fall between samples;
//! [`refine_key_levels`] adds every in-range strike as a sample, which makes
//! both the extrema and the interpolated breakevens exact.

use rust_decimal::Decimal;
use serde::Serialize;
use tracing::debug;

use crate::error::{EngineError, EngineResult};
use crate::options::Strategy;

use super::curve::{PayoffCurve, PayoffPoint};
use super::leg::StrategyPayoff;

/// Key levels of a payoff curve.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct KeyLevels {
    /// Highest payoff over the range.
    pub max_profit: Decimal,
    /// Lowest payoff over the range (negative when the strategy can lose).
    pub max_loss: Decimal,
    /// Spots where P&L crosses zero, ascending.
    pub breakevens: Vec<Decimal>,
}

/// Key levels from the curve samples alone.
///
/// Breakevens are found where `pnl` changes sign between consecutive points
/// and placed by linear interpolation. A sample whose `pnl` is exactly zero
/// is reported once, even if its neighbours are also zero.
#[must_use]
pub fn compute_key_levels(curve: &PayoffCurve) -> KeyLevels {
    levels_from_points(curve.points())
}

/// Key levels with every strike inside the curve's range added as a sample.
///
/// # Errors
///
/// Returns `InvalidInput`/`InvalidLeg` when the strategy cannot be priced.
pub fn refine_key_levels(strategy: &Strategy, curve: &PayoffCurve) -> EngineResult<KeyLevels> {
    let pricer = StrategyPayoff::new(strategy)?;
    let Some((low, high)) = curve.range() else {
        return Ok(compute_key_levels(curve));
    };

    let mut points = curve.points().to_vec();
    for strike in strategy.strikes() {
        if strike > low && strike < high {
            let payoff = pricer.payoff_at(strike)?;
            let pnl = payoff
                .checked_sub(strategy.current_pnl)
                .ok_or_else(|| EngineError::overflow("strike pnl"))?;
            points.push(PayoffPoint {
                spot_price: strike,
                payoff,
                pnl,
            });
        }
    }
    points.sort_by(|a, b| a.spot_price.cmp(&b.spot_price));
    points.dedup_by(|a, b| a.spot_price == b.spot_price);

    debug!(
        strategy_id = %strategy.id,
        added = points.len() - curve.len(),
        "Refined key levels at strikes"
    );

    Ok(levels_from_points(&points))
}

fn levels_from_points(points: &[PayoffPoint]) -> KeyLevels {
    let (max_profit, max_loss) = points
        .iter()
        .map(|p| p.payoff)
        .fold(None, |acc: Option<(Decimal, Decimal)>, v| match acc {
            None => Some((v, v)),
            Some((hi, lo)) => Some((hi.max(v), lo.min(v))),
        })
        .unwrap_or((Decimal::ZERO, Decimal::ZERO));

    let mut breakevens = Vec::new();
    for (i, point) in points.iter().enumerate() {
        let previous = i.checked_sub(1).map(|j| &points[j]);
        if point.pnl.is_zero() {
            if previous.is_none_or(|p| !p.pnl.is_zero()) {
                breakevens.push(point.spot_price);
            }
            continue;
        }
        if let Some(prev) = previous
            && crosses_zero(prev.pnl, point.pnl)
        {
            breakevens.push(interpolate_zero(prev, point));
        }
    }

    KeyLevels {
        max_profit,
        max_loss,
        breakevens,
    }
}

fn crosses_zero(a: Decimal, b: Decimal) -> bool {
    (a < Decimal::ZERO && b > Decimal::ZERO) || (a > Decimal::ZERO && b < Decimal::ZERO)
}

/// Spot where the segment between `a` and `b` hits zero P&L.
fn interpolate_zero(a: &PayoffPoint, b: &PayoffPoint) -> Decimal {
    let span = a.pnl.abs() + b.pnl.abs();
    a.spot_price + (b.spot_price - a.spot_price) * a.pnl.abs() / span
}
