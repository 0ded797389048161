//! Core instrument types.
//!
//! Defines the instrument kinds a strategy leg can hold and the
//! intrinsic-value rule for each.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Instrument held by a leg.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InstrumentType {
    /// Call option (right to buy).
    Call,
    /// Put option (right to sell).
    Put,
    /// The underlying itself.
    Stock,
}

impl InstrumentType {
    /// Whether this instrument is an option (requires a strike).
    #[must_use]
    pub const fn is_option(&self) -> bool {
        matches!(self, Self::Call | Self::Put)
    }

    /// Intrinsic value of one unit at `spot`.
    ///
    /// Returns `None` for stock, whose value is measured against a
    /// reference spot rather than a strike.
    #[must_use]
    pub fn intrinsic(&self, strike: Decimal, spot: Decimal) -> Option<Decimal> {
        match self {
            Self::Call => Some((spot - strike).max(Decimal::ZERO)),
            Self::Put => Some((strike - spot).max(Decimal::ZERO)),
            Self::Stock => None,
        }
    }
}

impl std::fmt::Display for InstrumentType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Call => write!(f, "CALL"),
            Self::Put => write!(f, "PUT"),
            Self::Stock => write!(f, "STOCK"),
        }
    }
}
