//! Summary statistics and P&L distribution buckets.

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

const TWO: Decimal = Decimal::TWO;
const THOUSAND: Decimal = Decimal::ONE_THOUSAND;
const TOLERANCE: Decimal = Decimal::from_parts(1, 0, 0, false, 20);

/// A statistic that could not be computed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DegenerateStatistic {
    /// Every draw produced the same P&L, so the Sharpe ratio is undefined.
    ZeroStandardDeviation,
    /// No draws were run.
    EmptySimulationSet,
}

/// Aggregate statistics over simulated P&L. `None` when undefined.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PnlStatistics {
    /// Fraction of draws with `pnl > 0`, in `[0, 1]`.
    pub win_rate: Option<Decimal>,
    /// Mean P&L.
    pub avg_pnl: Option<Decimal>,
    /// Best draw.
    pub max_pnl: Option<Decimal>,
    /// Worst draw.
    pub min_pnl: Option<Decimal>,
    /// Population standard deviation.
    pub std_dev: Option<Decimal>,
    /// `avg_pnl / std_dev`.
    pub sharpe_ratio: Option<Decimal>,
    /// P&L at the 5th percentile.
    pub var95: Option<Decimal>,
    /// P&L at the 1st percentile.
    pub var99: Option<Decimal>,
}

/// One bucket of the P&L histogram.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PnlBucket {
    /// Short label, e.g. `-10K`.
    pub bucket_label: String,
    /// Lower bound (inclusive).
    pub bucket_start: Decimal,
    /// Draws in `[bucket_start, bucket_start + width)`.
    pub count: usize,
    /// Share of all draws, in percent.
    pub percentage: Decimal,
}

/// Compute statistics and report which ones are degenerate.
pub(crate) fn summarize(pnls: &[Decimal]) -> (PnlStatistics, Vec<DegenerateStatistic>) {
    if pnls.is_empty() {
        return (
            PnlStatistics::default(),
            vec![DegenerateStatistic::EmptySimulationSet],
        );
    }

    let mut sorted = pnls.to_vec();
    sorted.sort_unstable();
    let n = sorted.len();
    let count = Decimal::from(n);

    let wins = sorted.iter().filter(|p| **p > Decimal::ZERO).count();
    // Divide before summing; the total of many large draws can leave the range.
    let mean: Decimal = sorted.iter().map(|p| *p / count).sum();
    let std_dev = population_std_dev(&sorted, mean);

    let mut degenerate = Vec::new();
    let sharpe_ratio = if std_dev.is_zero() {
        degenerate.push(DegenerateStatistic::ZeroStandardDeviation);
        None
    } else {
        Some((mean / std_dev).round_dp(4))
    };

    let stats = PnlStatistics {
        win_rate: Some((Decimal::from(wins) / count).round_dp(4)),
        avg_pnl: Some(mean.round_dp(2)),
        max_pnl: sorted.last().copied(),
        min_pnl: sorted.first().copied(),
        std_dev: Some(std_dev.round_dp(2)),
        sharpe_ratio,
        var95: Some(sorted[n * 5 / 100]),
        var99: Some(sorted[n / 100]),
    };
    (stats, degenerate)
}

/// Histogram keyed by `floor(pnl / width) * width`, ascending.
pub(crate) fn buckets(pnls: &[Decimal], width: Decimal) -> Vec<PnlBucket> {
    if pnls.is_empty() || width <= Decimal::ZERO {
        return Vec::new();
    }
    let mut counts: BTreeMap<Decimal, usize> = BTreeMap::new();
    for pnl in pnls {
        let start = (*pnl / width).floor() * width;
        *counts.entry(start.normalize()).or_default() += 1;
    }

    let total = Decimal::from(pnls.len());
    counts
        .into_iter()
        .map(|(start, count)| PnlBucket {
            bucket_label: format!("{}K", (start / THOUSAND).round_dp(1).normalize()),
            bucket_start: start,
            count,
            percentage: (Decimal::from(count) / total * Decimal::ONE_HUNDRED).round_dp(2),
        })
        .collect()
}

/// Scaled by the largest deviation so the squares stay in range.
fn population_std_dev(values: &[Decimal], mean: Decimal) -> Decimal {
    let scale = values
        .iter()
        .map(|v| (*v - mean).abs())
        .max()
        .unwrap_or(Decimal::ZERO);
    if scale.is_zero() {
        return Decimal::ZERO;
    }
    let sum_sq: Decimal = values
        .iter()
        .map(|v| {
            let r = (*v - mean) / scale;
            r * r
        })
        .sum();
    let variance = sum_sq / Decimal::from(values.len());
    sqrt_decimal(variance).map_or(Decimal::ZERO, |root| root * scale)
}

/// Square root by Newton's method.
pub(crate) fn sqrt_decimal(value: Decimal) -> Option<Decimal> {
    if value < Decimal::ZERO {
        return None;
    }
    if value.is_zero() {
        return Some(Decimal::ZERO);
    }

    let mut guess = if value > Decimal::ONE {
        value / TWO
    } else {
        Decimal::ONE
    };
    for _ in 0..100 {
        let next = (guess + value / guess) / TWO;
        if (next - guess).abs() < TOLERANCE {
            return Some(next);
        }
        guess = next;
    }
    Some(guess)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_summarize_basic() {
        let pnls = [dec!(-2000), dec!(4000), dec!(1000), dec!(-1000)];
        let (stats, degenerate) = summarize(&pnls);
        assert!(degenerate.is_empty());
        assert_eq!(stats.win_rate, Some(dec!(0.5)));
        assert_eq!(stats.avg_pnl, Some(dec!(500)));
        assert_eq!(stats.max_pnl, Some(dec!(4000)));
        assert_eq!(stats.min_pnl, Some(dec!(-2000)));
        // Deviations 2500, 3500, 500, 1500 -> variance 5250000 -> ~2291.29
        assert_eq!(stats.std_dev, Some(dec!(2291.29)));
        assert_eq!(stats.var95, Some(dec!(-2000)));
        assert_eq!(stats.var99, Some(dec!(-2000)));
    }

    #[test]
    fn test_var_indices() {
        let pnls: Vec<Decimal> = (0..200).map(Decimal::from).collect();
        let (stats, _) = summarize(&pnls);
        assert_eq!(stats.var95, Some(dec!(10)));
        assert_eq!(stats.var99, Some(dec!(2)));
    }

    #[test]
    fn test_win_rate_is_a_fraction() {
        let pnls = [dec!(10), dec!(0), dec!(-5)];
        let (stats, _) = summarize(&pnls);
        assert_eq!(stats.win_rate, Some(dec!(0.3333)));

        let (all_wins, _) = summarize(&[dec!(1); 8]);
        assert_eq!(all_wins.win_rate, Some(Decimal::ONE));
    }

    #[test]
    fn test_mean_of_large_draws_does_not_overflow() {
        let huge = Decimal::MAX / dec!(2);
        let (stats, _) = summarize(&[huge, huge, huge]);
        assert!(stats.avg_pnl.unwrap() > Decimal::ZERO);
    }

    #[test]
    fn test_constant_pnl_flags_sharpe() {
        let (stats, degenerate) = summarize(&[dec!(300); 5]);
        assert_eq!(stats.std_dev, Some(Decimal::ZERO));
        assert_eq!(stats.sharpe_ratio, None);
        assert_eq!(degenerate, vec![DegenerateStatistic::ZeroStandardDeviation]);
    }

    #[test]
    fn test_empty_set() {
        let (stats, degenerate) = summarize(&[]);
        assert_eq!(stats, PnlStatistics::default());
        assert_eq!(degenerate, vec![DegenerateStatistic::EmptySimulationSet]);
    }

    #[test]
    fn test_std_dev_survives_huge_values() {
        let pnls = [dec!(-10000000000000000), dec!(10000000000000000)];
        let (stats, _) = summarize(&pnls);
        assert_eq!(stats.std_dev, Some(dec!(10000000000000000)));
        assert_eq!(stats.sharpe_ratio, Some(Decimal::ZERO));
    }

    #[test]
    fn test_buckets_floor_and_sort() {
        let pnls = [dec!(4999), dec!(5000), dec!(-1), dec!(-5000), dec!(12000)];
        let buckets = buckets(&pnls, dec!(5000));
        let starts: Vec<_> = buckets.iter().map(|b| b.bucket_start).collect();
        assert_eq!(starts, vec![dec!(-5000), dec!(0), dec!(5000), dec!(10000)]);
        assert_eq!(buckets[0].count, 2);
        assert_eq!(buckets[0].percentage, dec!(40));
        assert_eq!(buckets[0].bucket_label, "-5K");
        assert_eq!(buckets[3].bucket_label, "10K");
    }

    #[test]
    fn test_sqrt_decimal() {
        assert_eq!(sqrt_decimal(dec!(-1)), None);
        let root = sqrt_decimal(dec!(2)).unwrap();
        assert!((root - dec!(1.41421356237)).abs() < dec!(0.0000000001));
        let small = sqrt_decimal(dec!(0.25)).unwrap();
        assert!((small - dec!(0.5)).abs() < dec!(0.0000000001));
    }
}
