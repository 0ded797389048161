//! Expiry payoff for single legs and whole strategies.

use rust_decimal::Decimal;

use crate::error::{EngineError, EngineResult};
use crate::options::{Leg, Strategy};

/// Payoff of one leg at `spot`.
///
/// CALL and PUT pay intrinsic value minus premium. STOCK pays the move from
/// `reference_spot`. Shorts are negated and the result is scaled by lot size.
///
/// # Errors
///
/// Returns `InvalidLeg` when the leg is malformed and `InvalidInput` when
/// the spot is not positive, when a STOCK leg's reference spot is not
/// positive, or when the payoff leaves the decimal range. Option legs ignore
/// the reference spot.
pub fn payoff_at(leg: &Leg, spot: Decimal, reference_spot: Decimal) -> EngineResult<Decimal> {
    leg.validate()?;
    ensure_positive("spot price", spot)?;
    if !leg.instrument_type.is_option() {
        ensure_positive("reference spot", reference_spot)?;
    }
    leg_payoff(leg, spot, reference_spot)
}

/// Leg payoff without validation; callers validate the leg first.
fn leg_payoff(leg: &Leg, spot: Decimal, reference_spot: Decimal) -> EngineResult<Decimal> {
    let raw = match (leg.instrument_type.is_option(), leg.strike) {
        (true, Some(strike)) => leg
            .instrument_type
            .intrinsic(strike, spot)
            .unwrap_or(Decimal::ZERO)
            .checked_sub(leg.premium),
        _ => spot.checked_sub(reference_spot),
    };
    let directed = raw.map(|r| if leg.is_long() { r } else { -r });
    directed
        .and_then(|d| d.checked_mul(leg.units()))
        .ok_or_else(|| EngineError::overflow("leg payoff"))
}

fn ensure_positive(name: &str, value: Decimal) -> EngineResult<()> {
    if value <= Decimal::ZERO {
        return Err(EngineError::invalid_input(format!(
            "{name} must be positive, got {value}"
        )));
    }
    Ok(())
}

/// A strategy whose legs and context have been validated for pricing.
///
/// Construction checks every leg once so that repeated evaluation over a
/// grid or a set of simulated spots cannot fail part-way.
#[derive(Debug, Clone, Copy)]
pub struct StrategyPayoff<'a> {
    strategy: &'a Strategy,
}

impl<'a> StrategyPayoff<'a> {
    /// Validate `strategy` for payoff evaluation.
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` for an empty leg list or non-positive spot and
    /// `InvalidLeg` (with index) for the first malformed leg.
    pub fn new(strategy: &'a Strategy) -> EngineResult<Self> {
        strategy.ensure_priceable()?;
        strategy.ensure_valid_legs()?;
        Ok(Self { strategy })
    }

    /// The validated strategy.
    #[must_use]
    pub const fn strategy(&self) -> &'a Strategy {
        self.strategy
    }

    /// Total expiry payoff at `spot`.
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` when `spot` is not positive or the payoff
    /// leaves the decimal range.
    pub fn payoff_at(&self, spot: Decimal) -> EngineResult<Decimal> {
        ensure_positive("spot price", spot)?;
        self.strategy.legs.iter().try_fold(Decimal::ZERO, |total, leg| {
            let payoff = leg_payoff(leg, spot, self.strategy.underlying_price)?;
            total
                .checked_add(payoff)
                .ok_or_else(|| EngineError::overflow("strategy payoff"))
        })
    }
}

/// Total expiry payoff of `strategy` at `spot`.
///
/// # Errors
///
/// See [`StrategyPayoff::new`] and [`StrategyPayoff::payoff_at`].
pub fn strategy_payoff_at(strategy: &Strategy, spot: Decimal) -> EngineResult<Decimal> {
    StrategyPayoff::new(strategy)?.payoff_at(spot)
}
