//! Theta decay projection.
//!
//! Day-by-day projection of time decay from today (`day = 0`) to the end of
//! a horizon. Daily theta is the portfolio theta scaled by the acceleration
//! tier matching the days left in the horizon.
//!
//! Cumulative decay sums the accelerated daily theta, so it equals `day`
//! times the average effective theta over days `1..=day`, reported per point
//! as `effective_theta`. With a flat schedule that is just `day * theta`.

use std::iter::FusedIterator;

use rust_decimal::Decimal;
use serde::Serialize;
use tracing::debug;

use crate::config::ThetaConfig;
use crate::error::{EngineError, EngineResult};
use crate::options::Strategy;
use crate::risk::aggregate;

/// One day of a [`DecayProjection`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DecayPoint {
    /// Days from today.
    pub day: u32,
    /// `horizon_days - day`.
    pub days_remaining: u32,
    /// Portfolio theta times the acceleration multiplier for this day.
    pub daily_theta: Decimal,
    /// Average `daily_theta` over days `1..=day`; zero on day 0.
    pub effective_theta: Decimal,
    /// `day * effective_theta`: the sum of `daily_theta` over days `1..=day`.
    pub cumulative_decay: Decimal,
    /// `current_pnl + cumulative_decay`.
    pub adjusted_pnl: Decimal,
    /// Linearly amortized extrinsic value left at this day.
    pub time_value_remaining: Decimal,
}

/// Lazy decay projection over `0..=horizon_days`.
///
/// A clone continues from the same position, so clone before iterating to
/// replay it, or call [`project_decay`] again.
#[derive(Debug, Clone)]
pub struct DecayProjection {
    portfolio_theta: Decimal,
    current_pnl: Decimal,
    initial_time_value: Decimal,
    horizon_days: u32,
    schedule: ThetaConfig,
    next_day: Option<u32>,
    cumulative: Decimal,
}

impl DecayProjection {
    /// Portfolio theta before acceleration.
    #[must_use]
    pub const fn portfolio_theta(&self) -> Decimal {
        self.portfolio_theta
    }

    /// Extrinsic value at day 0.
    #[must_use]
    pub const fn initial_time_value(&self) -> Decimal {
        self.initial_time_value
    }

    /// First day whose adjusted P&L is at or below zero, counted from day 0
    /// however far this projection has been iterated.
    #[must_use]
    pub fn breakeven_day(&self) -> Option<DecayPoint> {
        self.restarted().find(|p| p.adjusted_pnl <= Decimal::ZERO)
    }

    /// Days with at most `critical_within_days` left in the horizon.
    #[must_use]
    pub fn critical_days(&self) -> Vec<DecayPoint> {
        let window = self.schedule.critical_within_days;
        self.restarted()
            .filter(|p| p.days_remaining <= window)
            .collect()
    }

    fn restarted(&self) -> Self {
        Self {
            next_day: Some(0),
            cumulative: Decimal::ZERO,
            ..self.clone()
        }
    }

    fn daily_theta(&self, days_remaining: u32) -> Decimal {
        self.portfolio_theta * self.schedule.multiplier(days_remaining)
    }
}

impl Iterator for DecayProjection {
    type Item = DecayPoint;

    fn next(&mut self) -> Option<Self::Item> {
        let day = self.next_day?;
        let days_remaining = self.horizon_days - day;
        let daily_theta = self.daily_theta(days_remaining);
        if day > 0 {
            self.cumulative += daily_theta;
        }
        self.next_day = (day < self.horizon_days).then(|| day + 1);

        let time_value_remaining = (self.initial_time_value * Decimal::from(days_remaining)
            / Decimal::from(self.horizon_days))
        .max(Decimal::ZERO);

        let effective_theta = if day == 0 {
            Decimal::ZERO
        } else {
            self.cumulative / Decimal::from(day)
        };

        Some(DecayPoint {
            day,
            days_remaining,
            daily_theta,
            effective_theta,
            cumulative_decay: self.cumulative,
            adjusted_pnl: self.current_pnl + self.cumulative,
            time_value_remaining,
        })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let left = self
            .next_day
            .map_or(0, |day| (self.horizon_days - day) as usize + 1);
        (left, Some(left))
    }
}

impl ExactSizeIterator for DecayProjection {}

impl FusedIterator for DecayProjection {}

/// Project theta decay for `horizon_days`.
///
/// # Errors
///
/// Returns `InvalidInput` when `horizon_days` is zero or the strategy cannot
/// be priced, `InvalidLeg` for a malformed leg and `Configuration` for an
/// invalid acceleration schedule.
pub fn project_decay(
    strategy: &Strategy,
    horizon_days: u32,
    schedule: &ThetaConfig,
) -> EngineResult<DecayProjection> {
    if horizon_days == 0 {
        return Err(EngineError::invalid_input("horizon_days must be positive"));
    }
    schedule.validate()?;
    strategy.ensure_priceable()?;
    strategy.ensure_valid_legs()?;

    let portfolio_theta = aggregate(&strategy.legs).greeks.theta;
    let initial_time_value = initial_time_value(strategy);

    debug!(
        strategy_id = %strategy.id,
        horizon_days,
        theta = %portfolio_theta,
        time_value = %initial_time_value,
        "Projecting theta decay"
    );

    Ok(DecayProjection {
        portfolio_theta,
        current_pnl: strategy.current_pnl,
        initial_time_value,
        horizon_days,
        schedule: schedule.clone(),
        next_day: Some(0),
        cumulative: Decimal::ZERO,
    })
}

/// Sum of `|quantity| * max(0, premium - intrinsic)` over option legs.
fn initial_time_value(strategy: &Strategy) -> Decimal {
    strategy
        .legs
        .iter()
        .filter_map(|leg| {
            let strike = leg.strike?;
            let intrinsic = leg
                .instrument_type
                .intrinsic(strike, strategy.underlying_price)?;
            Some((leg.premium - intrinsic).max(Decimal::ZERO) * leg.units())
        })
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AccelerationTier;
    use crate::options::{Greeks, Leg};
    use rust_decimal_macros::dec;

    fn short_put() -> Strategy {
        // Short 50 puts at 20000, premium 150, theta -10 per unit long.
        let leg = Leg::put(dec!(20000), -50, dec!(150))
            .with_greeks(Greeks::new(dec!(-0.4), dec!(0.001), dec!(-10), dec!(12)));
        Strategy::new("sp", "NIFTY", dec!(20100), vec![leg]).with_current_pnl(dec!(1000))
    }

    #[test]
    fn test_projection_covers_every_day() {
        let projection = project_decay(&short_put(), 20, &ThetaConfig::default()).unwrap();
        assert_eq!(projection.len(), 21);
        let points: Vec<_> = projection.collect();
        assert_eq!(points[0].day, 0);
        assert_eq!(points[0].cumulative_decay, Decimal::ZERO);
        assert_eq!(points[0].adjusted_pnl, dec!(1000));
        assert_eq!(points[20].days_remaining, 0);
    }

    #[test]
    fn test_acceleration_schedule() {
        let points: Vec<_> = project_decay(&short_put(), 20, &ThetaConfig::default())
            .unwrap()
            .collect();
        // Short 50 at -10 theta: +500 per day before acceleration.
        assert_eq!(points[1].daily_theta, dec!(500)); // 19 days left
        assert_eq!(points[5].daily_theta, dec!(600)); // 15 days left
        assert_eq!(points[13].daily_theta, dec!(750)); // 7 days left
        // Days 1..=5 at 500 (4 days) and 600 (1 day).
        assert_eq!(points[5].cumulative_decay, dec!(2600));
        assert_eq!(points[5].adjusted_pnl, dec!(3600));
        // 4*500 + 8*600 + 8*750
        assert_eq!(points[20].cumulative_decay, dec!(12800));
    }

    #[test]
    fn test_cumulative_is_day_times_effective_theta() {
        let points: Vec<_> = project_decay(&short_put(), 20, &ThetaConfig::default())
            .unwrap()
            .collect();
        assert_eq!(points[0].effective_theta, Decimal::ZERO);
        assert_eq!(points[5].effective_theta, dec!(520));
        assert_eq!(points[5].cumulative_decay, dec!(5) * points[5].effective_theta);
        assert_eq!(points[20].effective_theta, dec!(640));
        assert_eq!(points[20].cumulative_decay, dec!(20) * points[20].effective_theta);
    }

    #[test]
    fn test_breakeven_day_for_long_premium() {
        // Long 50 puts bleed 500 a day against 1000 of open profit.
        let leg = Leg::put(dec!(20000), 50, dec!(150))
            .with_greeks(Greeks::new(dec!(-0.4), dec!(0.001), dec!(-10), dec!(12)));
        let strategy =
            Strategy::new("lp", "NIFTY", dec!(20100), vec![leg]).with_current_pnl(dec!(1000));
        let mut projection = project_decay(&strategy, 20, &ThetaConfig::default()).unwrap();
        let _ = projection.nth(10);

        let breakeven = projection.breakeven_day().unwrap();
        assert_eq!(breakeven.day, 2);
        assert_eq!(breakeven.days_remaining, 18);
        assert_eq!(breakeven.adjusted_pnl, Decimal::ZERO);
    }

    #[test]
    fn test_short_premium_never_breaks_even() {
        let projection = project_decay(&short_put(), 20, &ThetaConfig::default()).unwrap();
        assert_eq!(projection.breakeven_day(), None);
    }

    #[test]
    fn test_critical_days_are_the_last_week() {
        let projection = project_decay(&short_put(), 20, &ThetaConfig::default()).unwrap();
        let critical = projection.critical_days();
        let days: Vec<u32> = critical.iter().map(|p| p.day).collect();
        assert_eq!(days, (13..=20).collect::<Vec<_>>());
        assert_eq!(critical[0].days_remaining, 7);
        assert_eq!(critical[0].daily_theta, dec!(750));
        // Querying does not advance the projection.
        assert_eq!(projection.len(), 21);
    }

    #[test]
    fn test_time_value_amortizes_to_zero() {
        let projection = project_decay(&short_put(), 10, &ThetaConfig::default()).unwrap();
        // OTM put: all premium is time value.
        assert_eq!(projection.initial_time_value(), dec!(7500));
        let points: Vec<_> = projection.collect();
        assert_eq!(points[0].time_value_remaining, dec!(7500));
        assert_eq!(points[4].time_value_remaining, dec!(4500));
        assert_eq!(points[10].time_value_remaining, Decimal::ZERO);
    }

    #[test]
    fn test_time_value_ignores_intrinsic_and_stock() {
        let legs = vec![
            Leg::call(dec!(100), 2, dec!(12)),
            Leg::put(dec!(100), 1, dec!(3)),
            Leg::stock(10),
        ];
        let strategy = Strategy::new("s", "X", dec!(110), legs);
        let projection = project_decay(&strategy, 5, &ThetaConfig::default()).unwrap();
        // Call: 2 * (12 - 10) = 4; put: 1 * 3 = 3.
        assert_eq!(projection.initial_time_value(), dec!(7));
    }

    #[test]
    fn test_projection_is_restartable() {
        let strategy = short_put();
        let schedule = ThetaConfig::default();
        let first: Vec<_> = project_decay(&strategy, 12, &schedule).unwrap().collect();
        let second: Vec<_> = project_decay(&strategy, 12, &schedule).unwrap().collect();
        assert_eq!(first, second);

        let mut projection = project_decay(&strategy, 12, &schedule).unwrap();
        projection.next();
        let rest: Vec<_> = projection.clone().collect();
        assert_eq!(rest, first[1..]);
    }

    #[test]
    fn test_flat_schedule() {
        let schedule = ThetaConfig {
            acceleration: Vec::new(),
            ..ThetaConfig::default()
        };
        let last = project_decay(&short_put(), 30, &schedule)
            .unwrap()
            .last()
            .unwrap();
        assert_eq!(last.cumulative_decay, dec!(15000));
    }

    #[test]
    fn test_zero_horizon_rejected() {
        assert!(matches!(
            project_decay(&short_put(), 0, &ThetaConfig::default()),
            Err(EngineError::InvalidInput { .. })
        ));
    }

    #[test]
    fn test_invalid_schedule_rejected() {
        let schedule = ThetaConfig {
            acceleration: vec![AccelerationTier {
                within_days: 3,
                multiplier: dec!(-1),
            }],
            ..ThetaConfig::default()
        };
        assert!(matches!(
            project_decay(&short_put(), 5, &schedule),
            Err(EngineError::Configuration { .. })
        ));
    }
}
