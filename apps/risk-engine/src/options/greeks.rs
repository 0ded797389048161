//! Greeks value type.
//!
//! Leg Greeks are stored per unit of a long position. Portfolio Greeks are
//! produced only by [`crate::risk::aggregate`], which scales each leg by its
//! signed quantity.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Greeks for a leg (per unit) or a strategy (portfolio-scaled).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Greeks {
    /// Delta - rate of change of value with respect to the underlying price.
    pub delta: Decimal,
    /// Gamma - rate of change of delta with respect to the underlying price.
    pub gamma: Decimal,
    /// Theta - value change per calendar day.
    pub theta: Decimal,
    /// Vega - value change per 1 point of implied volatility.
    pub vega: Decimal,
}

impl Greeks {
    /// All-zero Greeks.
    pub const ZERO: Self = Self {
        delta: Decimal::ZERO,
        gamma: Decimal::ZERO,
        theta: Decimal::ZERO,
        vega: Decimal::ZERO,
    };

    /// Create new Greeks.
    #[must_use]
    pub const fn new(delta: Decimal, gamma: Decimal, theta: Decimal, vega: Decimal) -> Self {
        Self {
            delta,
            gamma,
            theta,
            vega,
        }
    }

    /// Scale Greeks by a quantity (positive for long, negative for short).
    #[must_use]
    pub fn scale(&self, quantity: Decimal) -> Self {
        Self {
            delta: self.delta * quantity,
            gamma: self.gamma * quantity,
            theta: self.theta * quantity,
            vega: self.vega * quantity,
        }
    }

    /// Add another Greeks to this one.
    #[must_use]
    pub fn add(&self, other: &Self) -> Self {
        Self {
            delta: self.delta + other.delta,
            gamma: self.gamma + other.gamma,
            theta: self.theta + other.theta,
            vega: self.vega + other.vega,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_greeks_scale() {
        let greeks = Greeks::new(dec!(0.5), dec!(0.01), dec!(-5), dec!(10));

        // Scale by +10 (long 10 units)
        let scaled = greeks.scale(dec!(10));
        assert_eq!(scaled.delta, dec!(5));
        assert_eq!(scaled.gamma, dec!(0.1));
        assert_eq!(scaled.theta, dec!(-50));

        // Scale by -5 (short 5 units)
        let scaled = greeks.scale(dec!(-5));
        assert_eq!(scaled.delta, dec!(-2.5));
        assert_eq!(scaled.vega, dec!(-50));
    }

    #[test]
    fn test_greeks_add() {
        let g1 = Greeks::new(dec!(5), dec!(1), dec!(-10), dec!(20));
        let g2 = Greeks::new(dec!(-3), dec!(2), dec!(-5), dec!(10));

        let sum = g1.add(&g2);
        assert_eq!(sum, Greeks::new(dec!(2), dec!(3), dec!(-15), dec!(30)));
    }

    #[test]
    fn test_zero_is_default() {
        assert_eq!(Greeks::ZERO, Greeks::default());
    }
}
