//! Strategy type definitions.
//!
//! A strategy is the frozen snapshot every engine computation operates on.
//! The engine only ever borrows it; results are returned as new values.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::{EngineError, EngineResult};

use super::leg::Leg;

/// A single stop-loss or take-profit control.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ControlLimit {
    /// Whether the control is active.
    pub enabled: bool,
    /// `true` = `fixed_amount` applies, `false` = `percentage` of margin applies.
    pub is_fixed_amount: bool,
    /// Absolute P&L threshold.
    #[serde(default)]
    pub fixed_amount: Decimal,
    /// Threshold as a percentage of total margin.
    #[serde(default)]
    pub percentage: Decimal,
}

impl ControlLimit {
    /// Fixed-amount control.
    #[must_use]
    pub const fn fixed(amount: Decimal) -> Self {
        Self {
            enabled: true,
            is_fixed_amount: true,
            fixed_amount: amount,
            percentage: Decimal::ZERO,
        }
    }

    /// Percentage-of-margin control.
    #[must_use]
    pub const fn percent_of_margin(percentage: Decimal) -> Self {
        Self {
            enabled: true,
            is_fixed_amount: false,
            fixed_amount: Decimal::ZERO,
            percentage,
        }
    }

    /// Absolute P&L threshold given the strategy's total margin.
    ///
    /// Returns `None` when the control is disabled.
    #[must_use]
    pub fn threshold(&self, total_margin: Decimal) -> Option<Decimal> {
        if !self.enabled {
            return None;
        }
        let amount = if self.is_fixed_amount {
            self.fixed_amount
        } else {
            total_margin * self.percentage / Decimal::ONE_HUNDRED
        };
        Some(amount.abs())
    }
}

/// Stop-loss and take-profit settings for a strategy.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RiskControls {
    /// Stop-loss control.
    #[serde(default)]
    pub stop_loss: Option<ControlLimit>,
    /// Take-profit control.
    #[serde(default)]
    pub take_profit: Option<ControlLimit>,
}

/// A multi-leg strategy plus its market context.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Strategy {
    /// Strategy identifier.
    pub id: String,
    /// Underlying symbol.
    pub underlying_symbol: String,
    /// Ordered legs.
    pub legs: Vec<Leg>,
    /// Current spot of the underlying.
    pub underlying_price: Decimal,
    /// Implied volatility in percent (e.g., 18.5).
    #[serde(default)]
    pub implied_volatility: Decimal,
    /// Calendar days to expiry.
    #[serde(default)]
    pub days_to_expiry: u32,
    /// Mark-to-market P&L at `underlying_price`.
    #[serde(default)]
    pub current_pnl: Decimal,
    /// Optional stop-loss/take-profit controls.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub risk_controls: Option<RiskControls>,
    /// Capital available to the strategy, used to derive margin usage.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub available_capital: Option<Decimal>,
}

impl Strategy {
    /// Create a strategy with default market context.
    #[must_use]
    pub fn new(
        id: impl Into<String>,
        underlying_symbol: impl Into<String>,
        underlying_price: Decimal,
        legs: Vec<Leg>,
    ) -> Self {
        Self {
            id: id.into(),
            underlying_symbol: underlying_symbol.into(),
            legs,
            underlying_price,
            implied_volatility: Decimal::ZERO,
            days_to_expiry: 0,
            current_pnl: Decimal::ZERO,
            risk_controls: None,
            available_capital: None,
        }
    }

    /// Set implied volatility (percent).
    #[must_use]
    pub const fn with_implied_volatility(mut self, iv: Decimal) -> Self {
        self.implied_volatility = iv;
        self
    }

    /// Set days to expiry.
    #[must_use]
    pub const fn with_days_to_expiry(mut self, days: u32) -> Self {
        self.days_to_expiry = days;
        self
    }

    /// Set current mark-to-market P&L.
    #[must_use]
    pub const fn with_current_pnl(mut self, pnl: Decimal) -> Self {
        self.current_pnl = pnl;
        self
    }

    /// Set stop-loss/take-profit controls.
    #[must_use]
    pub fn with_risk_controls(mut self, controls: RiskControls) -> Self {
        self.risk_controls = Some(controls);
        self
    }

    /// Set available capital.
    #[must_use]
    pub const fn with_available_capital(mut self, capital: Decimal) -> Self {
        self.available_capital = Some(capital);
        self
    }

    /// Check the strategy-level invariants required by payoff computations.
    ///
    /// Leg-level checks are left to the caller so that each component can
    /// decide whether a bad leg aborts the call or is skipped and reported.
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` when the leg list is empty, the spot is not
    /// positive, or the implied volatility is negative.
    pub fn ensure_priceable(&self) -> EngineResult<()> {
        if self.legs.is_empty() {
            return Err(EngineError::invalid_input(format!(
                "strategy '{}' has no legs",
                self.id
            )));
        }
        if self.underlying_price <= Decimal::ZERO {
            return Err(EngineError::invalid_input(format!(
                "underlying price must be positive, got {}",
                self.underlying_price
            )));
        }
        if self.implied_volatility < Decimal::ZERO {
            return Err(EngineError::invalid_input(format!(
                "implied volatility must be non-negative, got {}",
                self.implied_volatility
            )));
        }
        Ok(())
    }

    /// Validate every leg, failing on the first defect.
    ///
    /// # Errors
    ///
    /// Returns `InvalidLeg` carrying the index of the offending leg.
    pub fn ensure_valid_legs(&self) -> EngineResult<()> {
        for (index, leg) in self.legs.iter().enumerate() {
            leg.validate()
                .map_err(|defect| EngineError::from(defect).at_leg(index))?;
        }
        Ok(())
    }

    /// Total margin blocked across legs.
    #[must_use]
    pub fn total_margin(&self) -> Decimal {
        self.legs.iter().map(|l| l.margin).sum()
    }

    /// Net premium across legs (positive = credit).
    #[must_use]
    pub fn net_premium(&self) -> Decimal {
        self.legs.iter().map(Leg::net_premium).sum()
    }

    /// Margin usage in percent of available capital, clamped to `[0, 100]`.
    ///
    /// Zero when no capital is known.
    #[must_use]
    pub fn margin_used_pct(&self) -> Decimal {
        match self.available_capital {
            Some(capital) if capital > Decimal::ZERO => (self.total_margin() / capital
                * Decimal::ONE_HUNDRED)
                .clamp(Decimal::ZERO, Decimal::ONE_HUNDRED),
            _ => Decimal::ZERO,
        }
    }

    /// Strikes of all option legs, ascending and de-duplicated.
    #[must_use]
    pub fn strikes(&self) -> Vec<Decimal> {
        let mut strikes: Vec<Decimal> = self.legs.iter().filter_map(|l| l.strike).collect();
        strikes.sort();
        strikes.dedup();
        strikes
    }
}
