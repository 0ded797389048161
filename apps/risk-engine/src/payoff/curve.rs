//! Payoff curve over a linear price grid.

use rust_decimal::Decimal;
use serde::Serialize;
use tracing::debug;

use crate::cancellation::{self, Cancellation};
use crate::config::PayoffConfig;
use crate::error::{EngineError, EngineResult};
use crate::options::Strategy;

use super::leg::StrategyPayoff;

/// One sample of the payoff curve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PayoffPoint {
    /// Underlying price at expiry.
    pub spot_price: Decimal,
    /// Total strategy payoff.
    pub payoff: Decimal,
    /// `payoff - current_pnl`.
    pub pnl: Decimal,
}

/// Materialized payoff curve, ascending in spot. Never empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct PayoffCurve {
    points: Vec<PayoffPoint>,
}

impl PayoffCurve {
    /// Points in ascending spot order.
    #[must_use]
    pub fn points(&self) -> &[PayoffPoint] {
        &self.points
    }

    /// Number of points.
    #[must_use]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Whether the curve has no points.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Lowest and highest spot on the grid.
    #[must_use]
    pub fn range(&self) -> Option<(Decimal, Decimal)> {
        Some((self.points.first()?.spot_price, self.points.last()?.spot_price))
    }

    #[cfg(test)]
    pub(crate) const fn from_points(points: Vec<PayoffPoint>) -> Self {
        Self { points }
    }
}

/// Builder for payoff curves.
#[derive(Debug, Clone)]
pub struct PayoffCurveBuilder<'a> {
    strategy: &'a Strategy,
    price_range_fraction: Decimal,
    steps: u32,
    batch_size: usize,
    cancellation: Option<&'a Cancellation>,
}

impl<'a> PayoffCurveBuilder<'a> {
    /// Start a builder with the default grid (±20%, 100 steps).
    #[must_use]
    pub fn new(strategy: &'a Strategy) -> Self {
        Self::from_config(strategy, &PayoffConfig::default())
    }

    /// Start a builder from configuration.
    #[must_use]
    pub const fn from_config(strategy: &'a Strategy, config: &PayoffConfig) -> Self {
        Self {
            strategy,
            price_range_fraction: config.price_range_fraction,
            steps: config.steps,
            batch_size: config.batch_size,
            cancellation: None,
        }
    }

    /// Set the grid half-width as a fraction of spot.
    #[must_use]
    pub const fn price_range_fraction(mut self, fraction: Decimal) -> Self {
        self.price_range_fraction = fraction;
        self
    }

    /// Set the number of grid intervals.
    #[must_use]
    pub const fn steps(mut self, steps: u32) -> Self {
        self.steps = steps;
        self
    }

    /// Attach a cancellation signal, checked once per batch of grid points.
    #[must_use]
    pub const fn cancellation(mut self, cancellation: &'a Cancellation) -> Self {
        self.cancellation = Some(cancellation);
        self
    }

    /// Build the curve.
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` for an empty leg list, a non-positive spot,
    /// `steps == 0`, or a fraction outside (0, 1); `InvalidLeg` for the
    /// first malformed leg; `Cancelled` if the signal fires. No partial
    /// curve is ever returned.
    pub fn build(self) -> EngineResult<PayoffCurve> {
        let pricer = StrategyPayoff::new(self.strategy)?;
        if self.steps == 0 {
            return Err(EngineError::invalid_input("steps must be positive"));
        }
        if self.price_range_fraction <= Decimal::ZERO || self.price_range_fraction >= Decimal::ONE
        {
            return Err(EngineError::invalid_input(format!(
                "price range fraction must be between 0 and 1, got {}",
                self.price_range_fraction
            )));
        }

        let spot = self.strategy.underlying_price;
        let grid_overflow = || EngineError::overflow("price grid");
        let low = spot
            .checked_mul(Decimal::ONE - self.price_range_fraction)
            .ok_or_else(grid_overflow)?;
        let high = spot
            .checked_mul(Decimal::ONE + self.price_range_fraction)
            .ok_or_else(grid_overflow)?;
        let step = (high - low) / Decimal::from(self.steps);
        let batch_size = self.batch_size.max(1);

        let indices: Vec<u32> = (0..=self.steps).collect();
        let mut points = Vec::with_capacity(indices.len());
        for batch in indices.chunks(batch_size) {
            cancellation::check(self.cancellation)?;
            for &i in batch {
                let spot_price = if i == self.steps {
                    high
                } else {
                    // Bounded by `high`, so this cannot overflow once `high` fits.
                    low + step * Decimal::from(i)
                };
                let payoff = pricer.payoff_at(spot_price)?;
                let pnl = payoff
                    .checked_sub(self.strategy.current_pnl)
                    .ok_or_else(|| EngineError::overflow("curve pnl"))?;
                points.push(PayoffPoint {
                    spot_price,
                    payoff,
                    pnl,
                });
            }
        }

        debug!(
            strategy_id = %self.strategy.id,
            points = points.len(),
            low = %low,
            high = %high,
            "Built payoff curve"
        );

        Ok(PayoffCurve { points })
    }
}

/// Build a payoff curve of `steps + 1` points over `spot * (1 ± fraction)`.
///
/// # Errors
///
/// See [`PayoffCurveBuilder::build`].
pub fn build_payoff_curve(
    strategy: &Strategy,
    price_range_fraction: Decimal,
    steps: u32,
) -> EngineResult<PayoffCurve> {
    PayoffCurveBuilder::new(strategy)
        .price_range_fraction(price_range_fraction)
        .steps(steps)
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::Leg;
    use rust_decimal_macros::dec;

    fn long_call() -> Strategy {
        Strategy::new(
            "lc",
            "NIFTY",
            dec!(100),
            vec![Leg::call(dec!(100), 1, dec!(5))],
        )
        .with_current_pnl(dec!(-2))
    }

    #[test]
    fn test_curve_has_steps_plus_one_points() {
        let curve = build_payoff_curve(&long_call(), dec!(0.2), 100).unwrap();
        assert_eq!(curve.len(), 101);
        assert_eq!(curve.range(), Some((dec!(80), dec!(120))));
        assert_eq!(curve.points()[1].spot_price, dec!(80.4));
    }

    #[test]
    fn test_curve_pnl_is_payoff_minus_current() {
        let curve = build_payoff_curve(&long_call(), dec!(0.2), 4).unwrap();
        let last = curve.points().last().unwrap();
        assert_eq!(last.spot_price, dec!(120));
        assert_eq!(last.payoff, dec!(15));
        assert_eq!(last.pnl, dec!(17));
    }

    #[test]
    fn test_curve_is_idempotent() {
        let strategy = long_call();
        let a = build_payoff_curve(&strategy, dec!(0.1), 37).unwrap();
        let b = build_payoff_curve(&strategy, dec!(0.1), 37).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_curve_rejects_bad_parameters() {
        let s = long_call();
        assert!(matches!(
            build_payoff_curve(&s, dec!(0.2), 0),
            Err(EngineError::InvalidInput { .. })
        ));
        assert!(build_payoff_curve(&s, Decimal::ZERO, 10).is_err());
        assert!(build_payoff_curve(&s, Decimal::ONE, 10).is_err());
    }

    #[test]
    fn test_curve_rejects_out_of_range_spot() {
        let s = Strategy::new(
            "huge",
            "X",
            dec!(70000000000000000000000000000),
            vec![Leg::stock(1)],
        );
        assert!(matches!(
            build_payoff_curve(&s, dec!(0.2), 10),
            Err(EngineError::InvalidInput { .. })
        ));
    }

    #[test]
    fn test_curve_rejects_empty_strategy() {
        let s = Strategy::new("empty", "NIFTY", dec!(100), vec![]);
        assert!(matches!(
            build_payoff_curve(&s, dec!(0.2), 10),
            Err(EngineError::InvalidInput { .. })
        ));
    }

    #[test]
    fn test_curve_fails_atomically_on_cancel() {
        let s = long_call();
        let cancel = Cancellation::new();
        cancel.cancel();
        let result = PayoffCurveBuilder::new(&s).cancellation(&cancel).build();
        assert_eq!(result, Err(EngineError::Cancelled));
    }
}
