//! Monte Carlo simulation of terminal P&L.
//!
//! Draws are split into fixed-size batches and run on the rayon pool.
//! Each draw is seeded independently (see [`mix`]), so a seeded run is
//! reproducible no matter how the batches are scheduled. Cancellation is
//! checked between batches and a cancelled run returns no partial report.
//!
//! Reports also carry a few daily price paths from today to expiry, seeded
//! from the same base seed, for charting.
//!
//! # Example
//!
//! ```rust,ignore
//! use risk_engine::simulation::{MonteCarloRequest, MonteCarloSimulator};
//!
//! let simulator = MonteCarloSimulator::new(config.monte_carlo.clone())?;
//! let report = simulator.run(&strategy, 10_000, Some(42))?;
//! println!("win rate: {:?}", report.statistics.win_rate);
//! ```

mod sampler;
mod stats;

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;

use rayon::prelude::*;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::cancellation::{self, Cancellation};
use crate::config::MonteCarloConfig;
use crate::error::{EngineError, EngineResult};
use crate::options::Strategy;
use crate::payoff::StrategyPayoff;
use crate::risk::aggregate;

pub use sampler::mix;
pub use stats::{DegenerateStatistic, PnlBucket, PnlStatistics};

use sampler::SpotSampler;

/// Parameters of one run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonteCarloRequest {
    /// Number of draws.
    pub num_simulations: usize,
    /// Base seed. `None` picks a random one.
    #[serde(default)]
    pub seed: Option<u64>,
    /// Flat IV shift in volatility points, applied through portfolio vega.
    #[serde(default)]
    pub iv_shift_points: Decimal,
    /// Elapsed days, applied through portfolio theta.
    #[serde(default)]
    pub elapsed_days: u32,
}

impl MonteCarloRequest {
    /// Create a request with no IV or time offsets.
    #[must_use]
    pub const fn new(num_simulations: usize, seed: Option<u64>) -> Self {
        Self {
            num_simulations,
            seed,
            iv_shift_points: Decimal::ZERO,
            elapsed_days: 0,
        }
    }

    /// Set the IV shift.
    #[must_use]
    pub const fn with_iv_shift(mut self, points: Decimal) -> Self {
        self.iv_shift_points = points;
        self
    }

    /// Set the elapsed days.
    #[must_use]
    pub const fn with_elapsed_days(mut self, days: u32) -> Self {
        self.elapsed_days = days;
        self
    }
}

/// A single draw.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimulationOutcome {
    /// Simulated terminal spot.
    pub final_spot: Decimal,
    /// P&L at that spot including offsets.
    pub pnl: Decimal,
    /// `pnl > 0`.
    pub profitable: bool,
}

/// One simulated daily price path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SamplePath {
    /// Path number.
    pub path: usize,
    /// Spot on each day; index 0 is today.
    pub spots: Vec<Decimal>,
}

/// Result of a Monte Carlo run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonteCarloReport {
    /// Base seed actually used.
    pub seed: u64,
    /// Draws in index order.
    pub outcomes: Vec<SimulationOutcome>,
    /// Histogram, ascending by bucket.
    pub pnl_distribution: Vec<PnlBucket>,
    /// Summary statistics.
    pub statistics: PnlStatistics,
    /// Statistics that could not be computed.
    pub degenerate: Vec<DegenerateStatistic>,
    /// Daily price paths to expiry.
    pub sample_paths: Vec<SamplePath>,
}

/// Monte Carlo simulator over validated configuration.
#[derive(Debug, Clone)]
pub struct MonteCarloSimulator {
    config: MonteCarloConfig,
}

impl MonteCarloSimulator {
    /// Create a simulator.
    ///
    /// # Errors
    ///
    /// Returns `Configuration` for an invalid draw model, bucket width or
    /// batch size.
    pub fn new(config: MonteCarloConfig) -> EngineResult<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    /// Run `num_simulations` draws with no offsets and no cancellation.
    ///
    /// # Errors
    ///
    /// See [`MonteCarloSimulator::run_request`].
    pub fn run(
        &self,
        strategy: &Strategy,
        num_simulations: usize,
        seed: Option<u64>,
    ) -> EngineResult<MonteCarloReport> {
        self.run_request(strategy, &MonteCarloRequest::new(num_simulations, seed), None)
    }

    /// Run a request.
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput`/`InvalidLeg` when the strategy cannot be priced
    /// or a draw is not representable, and `Cancelled` when `cancel` fires
    /// before the last batch starts.
    pub fn run_request(
        &self,
        strategy: &Strategy,
        request: &MonteCarloRequest,
        cancel: Option<&Cancellation>,
    ) -> EngineResult<MonteCarloReport> {
        let payoff = StrategyPayoff::new(strategy)?;
        let sampler = SpotSampler::new(
            self.config.draw_model,
            strategy.underlying_price,
            strategy.implied_volatility,
            strategy.days_to_expiry,
            self.config.days_per_year,
        )?;
        let seed = request.seed.unwrap_or_else(|| {
            let seed = rand::random::<u64>();
            warn!(
                strategy_id = %strategy.id,
                seed,
                "Monte Carlo run without a seed; results are not reproducible"
            );
            seed
        });

        let greeks = aggregate(&strategy.legs).greeks;
        let offset = greeks
            .vega
            .checked_mul(request.iv_shift_points)
            .zip(greeks.theta.checked_mul(Decimal::from(request.elapsed_days)))
            .and_then(|(vega, theta)| vega.checked_add(theta))
            .ok_or_else(|| EngineError::overflow("IV and time offset"))?;

        let start = Instant::now();
        let outcomes = self.draw_all(
            &payoff,
            &sampler,
            seed,
            offset,
            request.num_simulations,
            cancel,
        )?;

        cancellation::check(cancel)?;
        let sample_paths: Vec<SamplePath> = (0..self.config.sample_paths)
            .into_par_iter()
            .map(|path| -> EngineResult<SamplePath> {
                Ok(SamplePath {
                    path,
                    spots: sampler.path(seed, path as u64)?,
                })
            })
            .collect::<EngineResult<_>>()?;

        let pnls: Vec<Decimal> = outcomes.iter().map(|o| o.pnl).collect();
        let (statistics, degenerate) = stats::summarize(&pnls);
        let pnl_distribution = stats::buckets(&pnls, self.config.bucket_width);

        info!(
            strategy_id = %strategy.id,
            simulations = request.num_simulations,
            seed,
            win_rate = ?statistics.win_rate,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Monte Carlo run complete"
        );

        Ok(MonteCarloReport {
            seed,
            outcomes,
            pnl_distribution,
            statistics,
            degenerate,
            sample_paths,
        })
    }

    fn draw_all(
        &self,
        payoff: &StrategyPayoff<'_>,
        sampler: &SpotSampler,
        seed: u64,
        offset: Decimal,
        num_simulations: usize,
        cancel: Option<&Cancellation>,
    ) -> EngineResult<Vec<SimulationOutcome>> {
        let batch_size = self.config.batch_size;
        let cancelled = AtomicBool::new(false);

        let batches: Vec<Vec<SimulationOutcome>> = (0..num_simulations.div_ceil(batch_size))
            .into_par_iter()
            .map(|batch| -> EngineResult<Vec<SimulationOutcome>> {
                if cancelled.load(Ordering::Relaxed) {
                    return Err(EngineError::Cancelled);
                }
                if let Err(e) = cancellation::check(cancel) {
                    cancelled.store(true, Ordering::Relaxed);
                    return Err(e);
                }
                let first = batch * batch_size;
                let last = (first + batch_size).min(num_simulations);
                (first..last)
                    .map(|index| -> EngineResult<SimulationOutcome> {
                        let final_spot = sampler.sample(seed, index as u64)?;
                        let pnl = payoff
                            .payoff_at(final_spot)?
                            .checked_add(offset)
                            .ok_or_else(|| EngineError::overflow("simulated P&L"))?;
                        Ok(SimulationOutcome {
                            final_spot,
                            pnl,
                            profitable: pnl > Decimal::ZERO,
                        })
                    })
                    .collect()
            })
            .collect::<EngineResult<_>>()?;

        Ok(batches.into_iter().flatten().collect())
    }
}
