//! What-if scenario engine.
//!
//! Applies a spot/IV/time shock to a strategy and recomputes P&L, Greeks,
//! risk score and stop-loss/take-profit breaches. Deterministic.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::{PnlModel, WhatIfConfig};
use crate::error::{EngineError, EngineResult};
use crate::options::{Greeks, Strategy};
use crate::payoff::StrategyPayoff;
use crate::risk::{RiskScore, RiskScorer, aggregate};

/// Input shock.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scenario {
    /// Relative spot move in percent.
    #[serde(default)]
    pub spot_change_pct: Decimal,
    /// Relative IV move in percent of current IV.
    #[serde(default)]
    pub iv_change_pct: Decimal,
    /// Calendar days elapsed.
    #[serde(default)]
    pub time_decay_days: u32,
}

impl Scenario {
    /// No shock at all.
    pub const NEUTRAL: Self = Self {
        spot_change_pct: Decimal::ZERO,
        iv_change_pct: Decimal::ZERO,
        time_decay_days: 0,
    };

    /// Create a scenario.
    #[must_use]
    pub const fn new(spot_change_pct: Decimal, iv_change_pct: Decimal, time_decay_days: u32) -> Self {
        Self {
            spot_change_pct,
            iv_change_pct,
            time_decay_days,
        }
    }

    /// Whether every component is zero.
    #[must_use]
    pub fn is_neutral(&self) -> bool {
        self.spot_change_pct.is_zero() && self.iv_change_pct.is_zero() && self.time_decay_days == 0
    }
}

/// A scenario with a caller-facing name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NamedScenario {
    /// Display name.
    pub name: String,
    /// The shock.
    #[serde(flatten)]
    pub scenario: Scenario,
}

impl NamedScenario {
    /// Create a named scenario.
    #[must_use]
    pub fn new(name: impl Into<String>, scenario: Scenario) -> Self {
        Self {
            name: name.into(),
            scenario,
        }
    }
}

/// Which risk control fired.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ControlKind {
    /// Stop loss.
    StopLoss,
    /// Take profit.
    TakeProfit,
}

impl std::fmt::Display for ControlKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::StopLoss => write!(f, "Stop Loss Breach"),
            Self::TakeProfit => write!(f, "Take Profit Hit"),
        }
    }
}

/// A breached stop-loss or take-profit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LimitBreach {
    /// Control that fired.
    pub control: ControlKind,
    /// Absolute P&L threshold of the control.
    pub threshold: Decimal,
}

/// Outcome of one scenario.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimulationResult {
    /// Shocked spot.
    pub new_underlying_price: Decimal,
    /// Shocked implied volatility (percent).
    pub new_iv: Decimal,
    /// P&L after the shock.
    pub new_pnl: Decimal,
    /// `new_pnl - current_pnl`.
    pub pnl_change: Decimal,
    /// Approximate Greeks after the shock.
    pub new_greeks: Greeks,
    /// Risk score after the shock.
    pub new_risk_score: RiskScore,
    /// Every control breached at `new_pnl`.
    pub breached_limits: Vec<LimitBreach>,
}

/// Result of one named scenario.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NamedResult {
    /// Scenario name.
    pub name: String,
    /// Outcome.
    pub result: SimulationResult,
}

/// Stateless what-if engine.
#[derive(Debug, Clone)]
pub struct WhatIfEngine {
    config: WhatIfConfig,
    scorer: RiskScorer,
}

impl WhatIfEngine {
    /// Create an engine.
    ///
    /// # Errors
    ///
    /// Returns `Configuration` when the what-if configuration is invalid.
    pub fn new(config: WhatIfConfig, scorer: RiskScorer) -> EngineResult<Self> {
        config.validate()?;
        Ok(Self { config, scorer })
    }

    /// Apply one scenario.
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` when the spot change is -100% or lower, the IV
    /// change is below -100%, the strategy cannot be priced, or an
    /// intermediate value leaves the decimal range;
    /// `InvalidLeg` for malformed legs.
    pub fn apply_scenario(
        &self,
        strategy: &Strategy,
        scenario: &Scenario,
    ) -> EngineResult<SimulationResult> {
        let pricer = StrategyPayoff::new(strategy)?;
        if scenario.spot_change_pct <= -Decimal::ONE_HUNDRED {
            return Err(EngineError::invalid_input(format!(
                "spot change must be above -100%, got {}%",
                scenario.spot_change_pct
            )));
        }
        if scenario.iv_change_pct < -Decimal::ONE_HUNDRED {
            return Err(EngineError::invalid_input(format!(
                "IV change must be at least -100%, got {}%",
                scenario.iv_change_pct
            )));
        }

        let spot = strategy.underlying_price;
        let iv = strategy.implied_volatility;
        let greeks = aggregate(&strategy.legs).greeks;

        let new_spot = within_range(
            "shocked spot",
            spot.checked_mul(Decimal::ONE + scenario.spot_change_pct / Decimal::ONE_HUNDRED),
        )?;
        let new_iv = within_range(
            "shocked IV",
            iv.checked_mul(Decimal::ONE + scenario.iv_change_pct / Decimal::ONE_HUNDRED),
        )?;

        let spot_term = match self.config.pnl_model {
            PnlModel::FullRepricing => within_range(
                "spot P&L",
                pricer.payoff_at(new_spot)?.checked_sub(pricer.payoff_at(spot)?),
            )?,
            PnlModel::DeltaLinear => within_range(
                "spot P&L",
                (new_spot - spot)
                    .checked_mul(greeks.delta)
                    .and_then(|v| v.checked_mul(self.config.delta_scale)),
            )?,
        };
        let vega_term = within_range(
            "vega P&L",
            (new_iv - iv)
                .checked_mul(greeks.vega)
                .and_then(|v| v.checked_mul(self.config.vega_scale)),
        )?;
        let theta_term = within_range(
            "theta P&L",
            greeks
                .theta
                .checked_mul(Decimal::from(scenario.time_decay_days)),
        )?;
        let new_pnl = within_range(
            "scenario P&L",
            strategy
                .current_pnl
                .checked_add(spot_term)
                .and_then(|v| v.checked_add(vega_term))
                .and_then(|v| v.checked_add(theta_term)),
        )?;

        let new_greeks = self.shocked_greeks(&greeks, scenario);
        let new_risk_score =
            self.scorer
                .score_values(new_pnl, &new_greeks, strategy.margin_used_pct())?;
        let breached_limits = breached_limits(strategy, new_pnl);

        debug!(
            strategy_id = %strategy.id,
            new_spot = %new_spot,
            new_pnl = %new_pnl,
            score = new_risk_score.value,
            breaches = breached_limits.len(),
            "Applied what-if scenario"
        );

        Ok(SimulationResult {
            new_underlying_price: new_spot,
            new_iv,
            new_pnl,
            pnl_change: within_range("P&L change", new_pnl.checked_sub(strategy.current_pnl))?,
            new_greeks,
            new_risk_score,
            breached_limits,
        })
    }

    /// Apply every scenario in order.
    ///
    /// # Errors
    ///
    /// Fails on the first scenario that fails; no partial list is returned.
    pub fn run_scenarios(
        &self,
        strategy: &Strategy,
        scenarios: &[NamedScenario],
    ) -> EngineResult<Vec<NamedResult>> {
        scenarios
            .iter()
            .map(|named| {
                Ok(NamedResult {
                    name: named.name.clone(),
                    result: self.apply_scenario(strategy, &named.scenario)?,
                })
            })
            .collect()
    }

    fn shocked_greeks(&self, greeks: &Greeks, scenario: &Scenario) -> Greeks {
        if scenario.is_neutral() {
            return *greeks;
        }
        let days = Decimal::from(scenario.time_decay_days);
        let reference = Decimal::from(self.config.theta_reference_days);
        let theta_factor = (Decimal::ONE - days / reference).max(Decimal::ZERO);
        Greeks {
            delta: greeks.delta * self.config.delta_damping,
            gamma: greeks.gamma * self.config.gamma_damping,
            theta: greeks.theta * theta_factor,
            vega: greeks.vega * self.config.vega_damping,
        }
    }
}

fn within_range(what: &str, value: Option<Decimal>) -> EngineResult<Decimal> {
    value.ok_or_else(|| EngineError::overflow(what))
}

/// Controls breached at `pnl`.
///
/// Stop loss fires at `pnl <= -threshold`, take profit at `pnl >= threshold`.
#[must_use]
pub fn breached_limits(strategy: &Strategy, pnl: Decimal) -> Vec<LimitBreach> {
    let Some(controls) = &strategy.risk_controls else {
        return Vec::new();
    };
    let margin = strategy.total_margin();
    let mut breaches = Vec::new();

    if let Some(threshold) = controls.stop_loss.as_ref().and_then(|c| c.threshold(margin))
        && pnl <= -threshold
    {
        breaches.push(LimitBreach {
            control: ControlKind::StopLoss,
            threshold,
        });
    }
    if let Some(threshold) = controls
        .take_profit
        .as_ref()
        .and_then(|c| c.threshold(margin))
        && pnl >= threshold
    {
        breaches.push(LimitBreach {
            control: ControlKind::TakeProfit,
            threshold,
        });
    }
    breaches
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{RiskBands, RiskScoringConfig, ScoreWeights};
    use crate::options::{ControlLimit, Leg, RiskControls};
    use rust_decimal_macros::dec;

    fn scorer() -> RiskScorer {
        RiskScorer::new(RiskScoringConfig {
            weights: ScoreWeights {
                pnl: dec!(1),
                greeks: dec!(1),
                margin: dec!(1),
            },
            reference_loss_unit: dec!(10000),
            k1: dec!(10),
            k2: dec!(0.1),
            bands: RiskBands::default(),
        })
        .unwrap()
    }

    fn engine(config: WhatIfConfig) -> WhatIfEngine {
        WhatIfEngine::new(config, scorer()).unwrap()
    }

    fn short_straddle() -> Strategy {
        let call = Greeks::new(dec!(0.5), dec!(0.002), dec!(-6), dec!(12));
        let put = Greeks::new(dec!(-0.5), dec!(0.002), dec!(-6), dec!(12));
        Strategy::new(
            "straddle",
            "NIFTY",
            dec!(20000),
            vec![
                Leg::call(dec!(20000), -50, dec!(200))
                    .with_greeks(call)
                    .with_margin(dec!(60000)),
                Leg::put(dec!(20000), -50, dec!(200))
                    .with_greeks(put)
                    .with_margin(dec!(40000)),
            ],
        )
        .with_implied_volatility(dec!(15))
        .with_current_pnl(dec!(1000))
        .with_available_capital(dec!(400000))
    }

    #[test]
    fn test_neutral_scenario_keeps_pnl_and_greeks() {
        let strategy = short_straddle();
        let result = engine(WhatIfConfig::default())
            .apply_scenario(&strategy, &Scenario::NEUTRAL)
            .unwrap();
        assert_eq!(result.new_pnl, strategy.current_pnl);
        assert_eq!(result.pnl_change, Decimal::ZERO);
        assert_eq!(result.new_greeks, aggregate(&strategy.legs).greeks);
        assert_eq!(result.new_underlying_price, dec!(20000));
        assert!(result.breached_limits.is_empty());
    }

    #[test]
    fn test_full_repricing_spot_move() {
        let strategy = short_straddle();
        let result = engine(WhatIfConfig::default())
            .apply_scenario(&strategy, &Scenario::new(dec!(2), Decimal::ZERO, 0))
            .unwrap();
        // payoff(20000) = 400 * 50 = 20000; payoff(20400) = 0.
        assert_eq!(result.new_underlying_price, dec!(20400));
        assert_eq!(result.new_pnl, dec!(1000) - dec!(20000));
    }

    #[test]
    fn test_delta_linear_model() {
        let strategy = short_straddle().with_current_pnl(Decimal::ZERO);
        let config = WhatIfConfig {
            pnl_model: PnlModel::DeltaLinear,
            ..WhatIfConfig::default()
        };
        // Net delta is zero, so only vega and theta contribute.
        let result = engine(config)
            .apply_scenario(&strategy, &Scenario::new(dec!(5), dec!(20), 2))
            .unwrap();
        // vega = -1200, IV 15 -> 18; theta = +600/day.
        assert_eq!(result.new_iv, dec!(18));
        assert_eq!(result.new_pnl, dec!(-3600) + dec!(1200));
    }

    #[test]
    fn test_shocked_greeks_are_damped() {
        let strategy = short_straddle();
        let base = aggregate(&strategy.legs).greeks;
        let result = engine(WhatIfConfig::default())
            .apply_scenario(&strategy, &Scenario::new(Decimal::ZERO, dec!(10), 15))
            .unwrap();
        assert_eq!(result.new_greeks.gamma, base.gamma * dec!(0.9));
        assert_eq!(result.new_greeks.vega, base.vega * dec!(0.95));
        assert_eq!(result.new_greeks.theta, base.theta * dec!(0.5));
    }

    #[test]
    fn test_theta_fades_to_zero_past_reference() {
        let strategy = short_straddle();
        let result = engine(WhatIfConfig::default())
            .apply_scenario(&strategy, &Scenario::new(Decimal::ZERO, Decimal::ZERO, 45))
            .unwrap();
        assert_eq!(result.new_greeks.theta, Decimal::ZERO);
    }

    #[test]
    fn test_stop_loss_and_take_profit_breaches() {
        let strategy = short_straddle().with_risk_controls(RiskControls {
            stop_loss: Some(ControlLimit::fixed(dec!(5000))),
            take_profit: Some(ControlLimit::percent_of_margin(dec!(5))),
        });
        let engine = engine(WhatIfConfig::default());

        let crash = engine
            .apply_scenario(&strategy, &Scenario::new(dec!(-5), Decimal::ZERO, 0))
            .unwrap();
        assert_eq!(
            crash.breached_limits,
            vec![LimitBreach {
                control: ControlKind::StopLoss,
                threshold: dec!(5000),
            }]
        );

        // Take profit: 5% of 100,000 margin.
        let decay = engine
            .apply_scenario(&strategy, &Scenario::new(Decimal::ZERO, Decimal::ZERO, 10))
            .unwrap();
        assert_eq!(decay.new_pnl, dec!(7000));
        assert_eq!(decay.breached_limits[0].control, ControlKind::TakeProfit);
        assert_eq!(decay.breached_limits[0].threshold, dec!(5000));
    }

    #[test]
    fn test_rejects_total_wipeout_spot() {
        let strategy = short_straddle();
        let result = engine(WhatIfConfig::default())
            .apply_scenario(&strategy, &Scenario::new(dec!(-100), Decimal::ZERO, 0));
        assert!(matches!(result, Err(EngineError::InvalidInput { .. })));
    }

    #[test]
    fn test_extreme_shock_is_rejected_not_panicking() {
        let strategy = Strategy::new(
            "huge",
            "X",
            dec!(1000000000000000000000000000),
            vec![Leg::stock(1)],
        );
        let result = engine(WhatIfConfig::default())
            .apply_scenario(&strategy, &Scenario::new(dec!(1000), Decimal::ZERO, 0));
        assert!(matches!(result, Err(EngineError::InvalidInput { .. })));
    }

    #[test]
    fn test_run_scenarios_keeps_names_and_order() {
        let strategy = short_straddle();
        let scenarios = vec![
            NamedScenario::new("flat", Scenario::NEUTRAL),
            NamedScenario::new("rally", Scenario::new(dec!(1), Decimal::ZERO, 0)),
        ];
        let results = engine(WhatIfConfig::default())
            .run_scenarios(&strategy, &scenarios)
            .unwrap();
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].name, "flat");
        assert_eq!(results[1].name, "rally");
        assert!(results[1].result.new_pnl < results[0].result.new_pnl);
    }

    #[test]
    fn test_control_kind_display() {
        assert_eq!(ControlKind::StopLoss.to_string(), "Stop Loss Breach");
        assert_eq!(ControlKind::TakeProfit.to_string(), "Take Profit Hit");
    }
}
