//! Cross-strategy conflict detection.
//!
//! Rules, in output order:
//!
//! | Rule | Severity | Trigger |
//! |------|----------|---------|
//! | Overexposure | high | `min_strategies_per_symbol` or more strategies on one symbol |
//! | Vega concentration | medium | sum of positive strategy vega above `max_positive_vega` |
//! | Correlated exposure | low | pair correlation at or above `high_correlation` |

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::ConflictThresholds;
use crate::error::{EngineError, EngineResult};
use crate::options::Strategy;
use crate::risk::aggregate;

/// Severity of a conflict, also used as hedge priority. Orders high first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Act now.
    High,
    /// Review soon.
    Medium,
    /// Informational.
    Low,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::High => write!(f, "high"),
            Self::Medium => write!(f, "medium"),
            Self::Low => write!(f, "low"),
        }
    }
}

/// Conflict rule that fired.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ConflictKind {
    /// Too many strategies on one underlying.
    Overexposure,
    /// Too much aggregate positive vega.
    VegaConcentration,
    /// Two strategies move together.
    CorrelatedExposure,
}

/// A detected conflict.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Conflict {
    /// Rule that fired.
    pub kind: ConflictKind,
    /// Severity.
    pub severity: Severity,
    /// Short title.
    pub title: String,
    /// One-line description.
    pub description: String,
    /// Underlying symbol, for symbol-level conflicts.
    pub symbol: Option<String>,
    /// Strategies involved, in input order.
    pub affected_strategy_ids: Vec<String>,
    /// Free-text guidance.
    pub recommendations: Vec<String>,
}

/// Detect conflicts across `strategies`.
///
/// `correlation_matrix[i][j]` is the correlation between strategies `i`
/// and `j`; only the upper triangle is read.
///
/// # Errors
///
/// Returns `InvalidInput` when the matrix is not N×N or has an entry outside
/// [-1, 1], and `Configuration` when the thresholds are invalid.
pub fn detect_conflicts(
    strategies: &[Strategy],
    correlation_matrix: &[Vec<Decimal>],
    thresholds: &ConflictThresholds,
) -> EngineResult<Vec<Conflict>> {
    thresholds.validate()?;
    validate_matrix(correlation_matrix, strategies.len())?;

    let mut conflicts = overexposure(strategies, thresholds);
    conflicts.extend(vega_concentration(strategies, thresholds));
    conflicts.extend(correlated_pairs(strategies, correlation_matrix, thresholds, &conflicts));

    debug!(
        strategies = strategies.len(),
        conflicts = conflicts.len(),
        "Detected portfolio conflicts"
    );
    Ok(conflicts)
}

fn validate_matrix(matrix: &[Vec<Decimal>], n: usize) -> EngineResult<()> {
    if matrix.len() != n {
        return Err(EngineError::invalid_input(format!(
            "correlation matrix has {} rows, expected {n}",
            matrix.len()
        )));
    }
    for (i, row) in matrix.iter().enumerate() {
        if row.len() != n {
            return Err(EngineError::invalid_input(format!(
                "correlation matrix row {i} has {} columns, expected {n}",
                row.len()
            )));
        }
        if let Some((j, value)) = row
            .iter()
            .enumerate()
            .find(|(_, v)| **v < -Decimal::ONE || **v > Decimal::ONE)
        {
            return Err(EngineError::invalid_input(format!(
                "correlation [{i}][{j}] = {value} is outside [-1, 1]"
            )));
        }
    }
    Ok(())
}

fn overexposure(strategies: &[Strategy], thresholds: &ConflictThresholds) -> Vec<Conflict> {
    let mut by_symbol: BTreeMap<&str, Vec<&Strategy>> = BTreeMap::new();
    for strategy in strategies {
        by_symbol
            .entry(strategy.underlying_symbol.as_str())
            .or_default()
            .push(strategy);
    }

    by_symbol
        .into_iter()
        .filter(|(_, group)| group.len() >= thresholds.min_strategies_per_symbol)
        .map(|(symbol, group)| Conflict {
            kind: ConflictKind::Overexposure,
            severity: Severity::High,
            title: format!("High {symbol} Exposure"),
            description: format!(
                "{} strategies concentrated on {symbol} creating overexposure risk",
                group.len()
            ),
            symbol: Some(symbol.to_string()),
            affected_strategy_ids: group.iter().map(|s| s.id.clone()).collect(),
            recommendations: vec![
                format!("Consider reducing position size in one of the {symbol} strategies"),
                "Add hedging positions in different sectors".to_string(),
                "Implement cross-hedge with international indices".to_string(),
            ],
        })
        .collect()
}

fn vega_concentration(
    strategies: &[Strategy],
    thresholds: &ConflictThresholds,
) -> Option<Conflict> {
    let positive: Vec<(&Strategy, Decimal)> = strategies
        .iter()
        .map(|s| (s, aggregate(&s.legs).greeks.vega))
        .filter(|(_, vega)| *vega > Decimal::ZERO)
        .collect();
    let total: Decimal = positive.iter().map(|(_, vega)| *vega).sum();
    if total <= thresholds.max_positive_vega {
        return None;
    }

    Some(Conflict {
        kind: ConflictKind::VegaConcentration,
        severity: Severity::Medium,
        title: "Vega Concentration".to_string(),
        description: format!(
            "Net positive vega of {total} across {} strategies exceeds {}",
            positive.len(),
            thresholds.max_positive_vega
        ),
        symbol: None,
        affected_strategy_ids: positive.iter().map(|(s, _)| s.id.clone()).collect(),
        recommendations: vec![
            "Add negative vega positions to balance exposure".to_string(),
            "Consider calendar spreads to reduce vega risk".to_string(),
            "Monitor IV levels closely for exit opportunities".to_string(),
        ],
    })
}

fn correlated_pairs(
    strategies: &[Strategy],
    matrix: &[Vec<Decimal>],
    thresholds: &ConflictThresholds,
    existing: &[Conflict],
) -> Vec<Conflict> {
    let already_grouped = |a: &Strategy, b: &Strategy| {
        existing.iter().any(|c| {
            c.kind == ConflictKind::Overexposure
                && c.affected_strategy_ids.contains(&a.id)
                && c.affected_strategy_ids.contains(&b.id)
        })
    };

    let mut conflicts = Vec::new();
    for (i, a) in strategies.iter().enumerate() {
        for (j, b) in strategies.iter().enumerate().skip(i + 1) {
            let correlation = matrix[i][j];
            if correlation < thresholds.high_correlation || already_grouped(a, b) {
                continue;
            }
            conflicts.push(Conflict {
                kind: ConflictKind::CorrelatedExposure,
                severity: Severity::Low,
                title: "Correlated Exposure".to_string(),
                description: format!(
                    "{} and {} have correlation {correlation}",
                    a.id, b.id
                ),
                symbol: None,
                affected_strategy_ids: vec![a.id.clone(), b.id.clone()],
                recommendations: vec![
                    "Size correlated strategies as a single exposure".to_string(),
                    "Diversify into less correlated underlyings".to_string(),
                ],
            });
        }
    }
    conflicts
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::{Greeks, Leg};
    use rust_decimal_macros::dec;

    fn thresholds() -> ConflictThresholds {
        ConflictThresholds {
            min_strategies_per_symbol: 2,
            max_positive_vega: dec!(1000),
            high_correlation: dec!(0.8),
        }
    }

    fn strategy(id: &str, symbol: &str, vega: Decimal) -> Strategy {
        let leg = Leg::call(dec!(100), 10, dec!(2))
            .with_greeks(Greeks::new(dec!(0.5), dec!(0.01), dec!(-1), vega));
        Strategy::new(id, symbol, dec!(100), vec![leg])
    }

    fn identity(n: usize) -> Vec<Vec<Decimal>> {
        (0..n)
            .map(|i| {
                (0..n)
                    .map(|j| if i == j { Decimal::ONE } else { Decimal::ZERO })
                    .collect()
            })
            .collect()
    }

    #[test]
    fn test_overexposure_on_shared_symbol() {
        let strategies = vec![
            strategy("ic", "NIFTY", dec!(1)),
            strategy("bcs", "BANKNIFTY", dec!(1)),
            strategy("ss", "NIFTY", dec!(1)),
        ];
        let conflicts = detect_conflicts(&strategies, &identity(3), &thresholds()).unwrap();
        assert_eq!(conflicts.len(), 1);
        let c = &conflicts[0];
        assert_eq!(c.kind, ConflictKind::Overexposure);
        assert_eq!(c.severity, Severity::High);
        assert_eq!(c.title, "High NIFTY Exposure");
        assert_eq!(c.symbol.as_deref(), Some("NIFTY"));
        assert_eq!(c.affected_strategy_ids, vec!["ic", "ss"]);
        assert_eq!(c.recommendations.len(), 3);
    }

    #[test]
    fn test_vega_concentration_lists_positive_vega_only() {
        // Position vega = 10 * per-unit vega.
        let strategies = vec![
            strategy("a", "X", dec!(60)),
            strategy("b", "Y", dec!(-100)),
            strategy("c", "Z", dec!(50)),
        ];
        let conflicts = detect_conflicts(&strategies, &identity(3), &thresholds()).unwrap();
        assert_eq!(conflicts.len(), 1);
        assert_eq!(conflicts[0].kind, ConflictKind::VegaConcentration);
        assert_eq!(conflicts[0].severity, Severity::Medium);
        assert_eq!(conflicts[0].affected_strategy_ids, vec!["a", "c"]);
    }

    #[test]
    fn test_vega_at_bound_is_not_a_conflict() {
        let strategies = vec![strategy("a", "X", dec!(100))];
        let conflicts = detect_conflicts(&strategies, &identity(1), &thresholds()).unwrap();
        assert!(conflicts.is_empty());
    }

    #[test]
    fn test_correlated_pairs_skip_same_symbol_group() {
        let strategies = vec![
            strategy("a", "NIFTY", dec!(1)),
            strategy("b", "NIFTY", dec!(1)),
            strategy("c", "BANKNIFTY", dec!(1)),
        ];
        let matrix = vec![
            vec![dec!(1), dec!(0.95), dec!(0.85)],
            vec![dec!(0.95), dec!(1), dec!(0.2)],
            vec![dec!(0.85), dec!(0.2), dec!(1)],
        ];
        let conflicts = detect_conflicts(&strategies, &matrix, &thresholds()).unwrap();
        let kinds: Vec<_> = conflicts.iter().map(|c| c.kind).collect();
        assert_eq!(
            kinds,
            vec![ConflictKind::Overexposure, ConflictKind::CorrelatedExposure]
        );
        assert_eq!(conflicts[1].affected_strategy_ids, vec!["a", "c"]);
        assert_eq!(conflicts[1].severity, Severity::Low);
    }

    #[test]
    fn test_matrix_shape_and_range_checked() {
        let strategies = vec![strategy("a", "X", dec!(1)), strategy("b", "Y", dec!(1))];
        assert!(matches!(
            detect_conflicts(&strategies, &identity(3), &thresholds()),
            Err(EngineError::InvalidInput { .. })
        ));
        let ragged = vec![vec![dec!(1), dec!(0)], vec![dec!(1)]];
        assert!(detect_conflicts(&strategies, &ragged, &thresholds()).is_err());
        let out_of_range = vec![vec![dec!(1), dec!(1.5)], vec![dec!(1.5), dec!(1)]];
        assert!(matches!(
            detect_conflicts(&strategies, &out_of_range, &thresholds()),
            Err(EngineError::InvalidInput { .. })
        ));
    }

    #[test]
    fn test_invalid_thresholds() {
        let mut bad = thresholds();
        bad.min_strategies_per_symbol = 1;
        assert!(matches!(
            detect_conflicts(&[], &[], &bad),
            Err(EngineError::Configuration { .. })
        ));
    }

    #[test]
    fn test_no_strategies_no_conflicts() {
        assert!(detect_conflicts(&[], &[], &thresholds()).unwrap().is_empty());
    }
}
