//! Strategy leg types.
//!
//! A leg is one option or stock position within a strategy. Quantity is
//! signed: positive for long, negative for short, magnitude is lot size.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::LegDefect;

use super::greeks::Greeks;
use super::types::InstrumentType;

/// A single leg of a strategy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Leg {
    /// Instrument held.
    pub instrument_type: InstrumentType,
    /// Strike price (options only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub strike: Option<Decimal>,
    /// Signed quantity (positive = long, negative = short).
    pub quantity: i64,
    /// Price paid or received per unit.
    #[serde(default)]
    pub premium: Decimal,
    /// Per-unit Greeks of a long position.
    #[serde(default)]
    pub greeks: Greeks,
    /// Margin blocked for this leg.
    #[serde(default)]
    pub margin: Decimal,
}

impl Leg {
    /// Create an option leg.
    #[must_use]
    pub const fn option(
        instrument_type: InstrumentType,
        strike: Decimal,
        quantity: i64,
        premium: Decimal,
    ) -> Self {
        Self {
            instrument_type,
            strike: Some(strike),
            quantity,
            premium,
            greeks: Greeks::ZERO,
            margin: Decimal::ZERO,
        }
    }

    /// Create a call leg.
    #[must_use]
    pub const fn call(strike: Decimal, quantity: i64, premium: Decimal) -> Self {
        Self::option(InstrumentType::Call, strike, quantity, premium)
    }

    /// Create a put leg.
    #[must_use]
    pub const fn put(strike: Decimal, quantity: i64, premium: Decimal) -> Self {
        Self::option(InstrumentType::Put, strike, quantity, premium)
    }

    /// Create a stock leg.
    #[must_use]
    pub const fn stock(quantity: i64) -> Self {
        Self {
            instrument_type: InstrumentType::Stock,
            strike: None,
            quantity,
            premium: Decimal::ZERO,
            greeks: Greeks::ZERO,
            margin: Decimal::ZERO,
        }
    }

    /// Set per-unit Greeks for this leg.
    #[must_use]
    pub const fn with_greeks(mut self, greeks: Greeks) -> Self {
        self.greeks = greeks;
        self
    }

    /// Set blocked margin for this leg.
    #[must_use]
    pub const fn with_margin(mut self, margin: Decimal) -> Self {
        self.margin = margin;
        self
    }

    /// Check the leg's fields against its instrument type.
    ///
    /// # Errors
    ///
    /// Returns the first [`LegDefect`] found.
    pub fn validate(&self) -> Result<(), LegDefect> {
        match (self.instrument_type.is_option(), self.strike) {
            (true, None) => return Err(LegDefect::MissingStrike),
            (true, Some(strike)) if strike <= Decimal::ZERO => {
                return Err(LegDefect::NonPositiveStrike(strike));
            }
            (false, Some(_)) => return Err(LegDefect::UnexpectedStrike),
            _ => {}
        }

        if self.quantity == 0 {
            return Err(LegDefect::ZeroQuantity);
        }
        if self.premium < Decimal::ZERO {
            return Err(LegDefect::NegativePremium(self.premium));
        }
        if self.margin < Decimal::ZERO {
            return Err(LegDefect::NegativeMargin(self.margin));
        }
        Ok(())
    }

    /// Whether this is a long position.
    #[must_use]
    pub const fn is_long(&self) -> bool {
        self.quantity > 0
    }

    /// Lot size (absolute quantity).
    #[must_use]
    pub fn units(&self) -> Decimal {
        Decimal::from(self.quantity.unsigned_abs())
    }

    /// Signed quantity as a decimal.
    #[must_use]
    pub fn signed_quantity(&self) -> Decimal {
        Decimal::from(self.quantity)
    }

    /// Greeks scaled by signed quantity.
    #[must_use]
    pub fn position_greeks(&self) -> Greeks {
        self.greeks.scale(self.signed_quantity())
    }

    /// Net premium (positive = credit, negative = debit).
    #[must_use]
    pub fn net_premium(&self) -> Decimal {
        -self.premium * self.signed_quantity()
    }
}
