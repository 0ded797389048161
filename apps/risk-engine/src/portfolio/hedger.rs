//! Rule-based hedge recommendations for detected conflicts.
//!
//! For each high conflict on a symbol the affected strategies' net delta is
//! offset by `target_reduction` through two alternatives: a protective
//! option (put against long delta, call against short delta) and a futures
//! position.
//!
//! Vega concentration is offset the same way in vega units with an
//! at-the-money straddle, sold against long vega. Its cost is charged on the
//! straddle's approximate premium, `hedge vega * mean IV`.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::conflicts::{Conflict, ConflictKind, Severity};
use crate::config::HedgingConfig;
use crate::error::{EngineError, EngineResult};
use crate::options::Strategy;
use crate::risk::aggregate;

/// Symbol reported for hedges that span several underlyings.
pub const PORTFOLIO: &str = "PORTFOLIO";

/// Hedge instrument.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HedgeInstrument {
    /// Protective put.
    Put,
    /// Protective call.
    Call,
    /// Futures position.
    Future,
    /// At-the-money straddle.
    Straddle,
}

/// A proposed hedge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HedgeRecommendation {
    /// Instrument to trade.
    pub instrument_type: HedgeInstrument,
    /// Underlying symbol.
    pub symbol: String,
    /// Delta units to offset, or vega units for a straddle.
    pub quantity: Decimal,
    /// Estimated cost.
    pub cost: Decimal,
    /// Share of gross delta (or vega) exposure removed, in percent.
    pub risk_reduction_pct: Decimal,
    /// Priority.
    pub priority: Severity,
    /// Strategies the hedge protects.
    pub target_strategy_ids: Vec<String>,
    /// Human-readable reason.
    pub rationale: String,
}

/// Recommend hedges for the high-severity symbol conflicts and any vega
/// concentration in `conflicts`.
///
/// Hedges costing more than `cost_budget` are dropped. The result is
/// ordered by priority, then by risk reduction descending.
///
/// # Errors
///
/// Returns `InvalidInput` for a negative budget and `Configuration` for
/// invalid hedging rates.
pub fn recommend(
    strategies: &[Strategy],
    conflicts: &[Conflict],
    cost_budget: Decimal,
    config: &HedgingConfig,
) -> EngineResult<Vec<HedgeRecommendation>> {
    if cost_budget < Decimal::ZERO {
        return Err(EngineError::invalid_input(format!(
            "cost budget must be non-negative, got {cost_budget}"
        )));
    }
    config.validate()?;

    let mut candidates = Vec::new();
    for conflict in conflicts {
        if conflict.kind == ConflictKind::VegaConcentration {
            let targets: Vec<&Strategy> = strategies
                .iter()
                .filter(|s| conflict.affected_strategy_ids.contains(&s.id))
                .collect();
            let symbol = conflict.symbol.as_deref().unwrap_or(PORTFOLIO);
            candidates.extend(vega_hedge(symbol, conflict.severity, &targets, config));
            continue;
        }
        if conflict.severity != Severity::High {
            continue;
        }
        let Some(symbol) = conflict.symbol.as_deref() else {
            continue;
        };
        let targets: Vec<&Strategy> = strategies
            .iter()
            .filter(|s| {
                s.underlying_symbol == symbol && conflict.affected_strategy_ids.contains(&s.id)
            })
            .collect();
        candidates.extend(hedges_for(symbol, &targets, config));
    }

    let proposed = candidates.len();
    let mut hedges: Vec<HedgeRecommendation> = candidates
        .into_iter()
        .filter(|h| h.cost <= cost_budget)
        .collect();
    hedges.sort_by(|a, b| {
        a.priority
            .cmp(&b.priority)
            .then_with(|| b.risk_reduction_pct.cmp(&a.risk_reduction_pct))
    });

    info!(
        conflicts = conflicts.len(),
        proposed,
        within_budget = hedges.len(),
        budget = %cost_budget,
        "Hedge recommendations ready"
    );
    Ok(hedges)
}

fn hedges_for(
    symbol: &str,
    targets: &[&Strategy],
    config: &HedgingConfig,
) -> Vec<HedgeRecommendation> {
    if targets.is_empty() {
        return Vec::new();
    }
    let deltas: Vec<Decimal> = targets
        .iter()
        .map(|s| aggregate(&s.legs).greeks.delta)
        .collect();
    let net_delta: Decimal = deltas.iter().sum();
    if net_delta.is_zero() {
        debug!(symbol, "Net delta is flat; no hedge needed");
        return Vec::new();
    }

    let spot = targets.iter().map(|s| s.underlying_price).sum::<Decimal>()
        / Decimal::from(targets.len());
    let hedge_delta = net_delta.abs() * config.target_reduction;
    let notional = hedge_delta * spot;
    let gross: Decimal = deltas.iter().map(|d| d.abs() * spot).sum();
    let risk_reduction_pct = if gross.is_zero() {
        Decimal::ZERO
    } else {
        (notional / gross * Decimal::ONE_HUNDRED)
            .min(Decimal::ONE_HUNDRED)
            .round_dp(2)
    };
    let target_strategy_ids: Vec<String> = targets.iter().map(|s| s.id.clone()).collect();
    let quantity = hedge_delta.round_dp(4);

    let long = net_delta > Decimal::ZERO;
    let (option, side, direction) = if long {
        (HedgeInstrument::Put, "Short", "downside")
    } else {
        (HedgeInstrument::Call, "Long", "upside")
    };

    vec![
        HedgeRecommendation {
            instrument_type: option,
            symbol: symbol.to_string(),
            quantity,
            cost: (notional * config.option_cost_rate).round_dp(2),
            risk_reduction_pct,
            priority: Severity::High,
            target_strategy_ids: target_strategy_ids.clone(),
            rationale: format!(
                "Protect against {direction} risk in {symbol}-heavy portfolio (net delta {net_delta})"
            ),
        },
        HedgeRecommendation {
            instrument_type: HedgeInstrument::Future,
            symbol: symbol.to_string(),
            quantity,
            cost: (notional * config.future_cost_rate).round_dp(2),
            risk_reduction_pct,
            priority: Severity::Medium,
            target_strategy_ids,
            rationale: format!("{side} {symbol} future as a delta hedge for directional exposure"),
        },
    ]
}

fn vega_hedge(
    symbol: &str,
    priority: Severity,
    targets: &[&Strategy],
    config: &HedgingConfig,
) -> Option<HedgeRecommendation> {
    if targets.is_empty() {
        return None;
    }
    let vegas: Vec<Decimal> = targets
        .iter()
        .map(|s| aggregate(&s.legs).greeks.vega)
        .collect();
    let net_vega: Decimal = vegas.iter().sum();
    if net_vega.is_zero() {
        debug!(symbol, "Net vega is flat; no hedge needed");
        return None;
    }

    let mean_iv = targets.iter().map(|s| s.implied_volatility).sum::<Decimal>()
        / Decimal::from(targets.len());
    let hedge_vega = net_vega.abs() * config.target_reduction;
    let gross: Decimal = vegas.iter().map(|v| v.abs()).sum();
    let risk_reduction_pct = (hedge_vega / gross * Decimal::ONE_HUNDRED)
        .min(Decimal::ONE_HUNDRED)
        .round_dp(2);
    let side = if net_vega > Decimal::ZERO { "Sell" } else { "Buy" };

    Some(HedgeRecommendation {
        instrument_type: HedgeInstrument::Straddle,
        symbol: symbol.to_string(),
        quantity: hedge_vega.round_dp(4),
        cost: (hedge_vega * mean_iv * config.option_cost_rate).round_dp(2),
        risk_reduction_pct,
        priority,
        target_strategy_ids: targets.iter().map(|s| s.id.clone()).collect(),
        rationale: format!(
            "{side} ATM straddle to offset {hedge_vega} of net vega {net_vega}"
        ),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConflictThresholds;
    use crate::options::{Greeks, Leg};
    use crate::portfolio::{ConflictKind, detect_conflicts};
    use rust_decimal_macros::dec;

    fn config() -> HedgingConfig {
        HedgingConfig {
            target_reduction: dec!(0.5),
            option_cost_rate: dec!(0.02),
            future_cost_rate: dec!(0.001),
        }
    }

    fn strategy(id: &str, symbol: &str, qty: i64, delta: Decimal) -> Strategy {
        let leg = Leg::call(dec!(20000), qty, dec!(100))
            .with_greeks(Greeks::new(delta, dec!(0), dec!(0), dec!(0)));
        Strategy::new(id, symbol, dec!(20000), vec![leg])
    }

    fn high_conflicts(strategies: &[Strategy]) -> Vec<Conflict> {
        let thresholds = ConflictThresholds {
            min_strategies_per_symbol: 2,
            max_positive_vega: dec!(1000000),
            high_correlation: dec!(1),
        };
        let n = strategies.len();
        let matrix = vec![vec![Decimal::ZERO; n]; n];
        detect_conflicts(strategies, &matrix, &thresholds).unwrap()
    }

    #[test]
    fn test_long_delta_gets_put_and_short_future() {
        // Deltas +30 and +10: net 40, gross 40 * 20000.
        let strategies = vec![
            strategy("a", "NIFTY", 50, dec!(0.6)),
            strategy("b", "NIFTY", 20, dec!(0.5)),
        ];
        let conflicts = high_conflicts(&strategies);
        let hedges = recommend(&strategies, &conflicts, dec!(100000), &config()).unwrap();
        assert_eq!(hedges.len(), 2);

        let put = &hedges[0];
        assert_eq!(put.instrument_type, HedgeInstrument::Put);
        assert_eq!(put.priority, Severity::High);
        assert_eq!(put.quantity, dec!(20));
        // notional 20 * 20000 = 400000
        assert_eq!(put.cost, dec!(8000));
        assert_eq!(put.risk_reduction_pct, dec!(50));
        assert_eq!(put.target_strategy_ids, vec!["a", "b"]);

        let future = &hedges[1];
        assert_eq!(future.instrument_type, HedgeInstrument::Future);
        assert_eq!(future.priority, Severity::Medium);
        assert_eq!(future.cost, dec!(400));
        assert!(future.rationale.starts_with("Short NIFTY"));
    }

    #[test]
    fn test_short_delta_gets_call() {
        let strategies = vec![
            strategy("a", "NIFTY", -50, dec!(0.6)),
            strategy("b", "NIFTY", 20, dec!(0.5)),
        ];
        let conflicts = high_conflicts(&strategies);
        let hedges = recommend(&strategies, &conflicts, dec!(100000), &config()).unwrap();
        assert_eq!(hedges[0].instrument_type, HedgeInstrument::Call);
        // net -20, gross 40: hedge 10 of 40.
        assert_eq!(hedges[0].risk_reduction_pct, dec!(25));
        assert!(hedges[1].rationale.starts_with("Long NIFTY"));
    }

    #[test]
    fn test_flat_delta_needs_no_hedge() {
        let strategies = vec![
            strategy("a", "NIFTY", -50, dec!(0.4)),
            strategy("b", "NIFTY", 20, dec!(1)),
        ];
        let conflicts = high_conflicts(&strategies);
        assert_eq!(conflicts.len(), 1);
        assert!(
            recommend(&strategies, &conflicts, dec!(100000), &config())
                .unwrap()
                .is_empty()
        );
    }

    #[test]
    fn test_budget_filters_expensive_hedges() {
        let strategies = vec![
            strategy("a", "NIFTY", 50, dec!(0.6)),
            strategy("b", "NIFTY", 20, dec!(0.5)),
        ];
        let conflicts = high_conflicts(&strategies);
        let hedges = recommend(&strategies, &conflicts, dec!(1000), &config()).unwrap();
        assert_eq!(hedges.len(), 1);
        assert_eq!(hedges[0].instrument_type, HedgeInstrument::Future);
        assert!(
            recommend(&strategies, &conflicts, Decimal::ZERO, &config())
                .unwrap()
                .is_empty()
        );
    }

    #[test]
    fn test_ordering_by_priority_then_reduction() {
        let strategies = vec![
            strategy("a", "NIFTY", 50, dec!(0.6)),
            strategy("b", "NIFTY", 20, dec!(0.5)),
            strategy("c", "BANKNIFTY", -50, dec!(0.6)),
            strategy("d", "BANKNIFTY", 20, dec!(0.5)),
        ];
        let conflicts = high_conflicts(&strategies);
        let hedges = recommend(&strategies, &conflicts, dec!(100000), &config()).unwrap();
        let summary: Vec<_> = hedges
            .iter()
            .map(|h| (h.priority, h.symbol.as_str(), h.risk_reduction_pct))
            .collect();
        assert_eq!(
            summary,
            vec![
                (Severity::High, "NIFTY", dec!(50)),
                (Severity::High, "BANKNIFTY", dec!(25)),
                (Severity::Medium, "NIFTY", dec!(50)),
                (Severity::Medium, "BANKNIFTY", dec!(25)),
            ]
        );
    }

    #[test]
    fn test_negative_budget_rejected() {
        assert!(matches!(
            recommend(&[], &[], dec!(-1), &config()),
            Err(EngineError::InvalidInput { .. })
        ));
    }

    #[test]
    fn test_ignores_non_high_conflicts() {
        let strategies = vec![strategy("a", "NIFTY", 50, dec!(0.6))];
        let conflict = Conflict {
            kind: ConflictKind::CorrelatedExposure,
            severity: Severity::Medium,
            title: "Correlated Exposure".to_string(),
            description: String::new(),
            symbol: Some("NIFTY".to_string()),
            affected_strategy_ids: vec!["a".to_string()],
            recommendations: Vec::new(),
        };
        assert!(
            recommend(&strategies, &[conflict], dec!(100000), &config())
                .unwrap()
                .is_empty()
        );
    }

    fn vega_strategy(id: &str, symbol: &str, qty: i64, vega: Decimal) -> Strategy {
        let leg = Leg::call(dec!(20000), qty, dec!(100))
            .with_greeks(Greeks::new(dec!(0), dec!(0), dec!(0), vega));
        Strategy::new(id, symbol, dec!(20000), vec![leg]).with_implied_volatility(dec!(20))
    }

    #[test]
    fn test_vega_concentration_gets_short_straddle() {
        // Vegas +600 and +200 on different symbols; -100 is left out.
        let strategies = vec![
            vega_strategy("a", "NIFTY", 50, dec!(12)),
            vega_strategy("b", "BANKNIFTY", 20, dec!(10)),
            vega_strategy("c", "FINNIFTY", -10, dec!(10)),
        ];
        let thresholds = ConflictThresholds {
            min_strategies_per_symbol: 2,
            max_positive_vega: dec!(500),
            high_correlation: dec!(1),
        };
        let matrix = vec![vec![Decimal::ZERO; 3]; 3];
        let conflicts = detect_conflicts(&strategies, &matrix, &thresholds).unwrap();
        assert_eq!(conflicts.len(), 1);
        assert_eq!(conflicts[0].kind, ConflictKind::VegaConcentration);

        let hedges = recommend(&strategies, &conflicts, dec!(100000), &config()).unwrap();
        assert_eq!(hedges.len(), 1);
        let straddle = &hedges[0];
        assert_eq!(straddle.instrument_type, HedgeInstrument::Straddle);
        assert_eq!(straddle.symbol, PORTFOLIO);
        assert_eq!(straddle.priority, Severity::Medium);
        // Net 800, half hedged.
        assert_eq!(straddle.quantity, dec!(400));
        assert_eq!(straddle.risk_reduction_pct, dec!(50));
        // 400 vega * 20 IV points * 0.02
        assert_eq!(straddle.cost, dec!(160));
        assert_eq!(straddle.target_strategy_ids, vec!["a", "b"]);
        assert!(straddle.rationale.starts_with("Sell ATM straddle"));

        assert!(
            recommend(&strategies, &conflicts, dec!(100), &config())
                .unwrap()
                .is_empty()
        );
    }
}
