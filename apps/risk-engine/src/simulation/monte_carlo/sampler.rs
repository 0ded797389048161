//! Per-draw seeding, terminal spot sampling and daily sample paths.
//!
//! Every draw owns its RNG, seeded from `mix(base_seed, index)`, so the
//! outcome of draw `i` does not depend on which worker ran it or in what
//! order.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, StandardNormal};
use rust_decimal::Decimal;
use rust_decimal::prelude::{FromPrimitive, ToPrimitive};

use crate::config::DrawModel;
use crate::error::{EngineError, EngineResult};

const GOLDEN_GAMMA: u64 = 0x9E37_79B9_7F4A_7C15;

/// SplitMix64 finalizer.
const fn splitmix64(mut z: u64) -> u64 {
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}

/// Seed for draw `index`: the `index`-th output of a SplitMix64 stream
/// started at `seed`.
#[must_use]
pub const fn mix(seed: u64, index: u64) -> u64 {
    splitmix64(seed.wrapping_add(index.wrapping_add(1).wrapping_mul(GOLDEN_GAMMA)))
}

/// Mixed into the base seed so sample paths never share a stream with draws.
const PATH_SALT: u64 = 0xA076_1D64_78BD_642F;

/// Smallest positive decimal; draws that underflow it are clamped here.
const MIN_SPOT: Decimal = Decimal::from_parts(1, 0, 0, false, 28);

/// Samples terminal spots and daily paths for one strategy.
#[derive(Debug, Clone, Copy)]
pub(crate) struct SpotSampler {
    spot: f64,
    terminal: SamplerKind,
    daily: SamplerKind,
    days: u32,
}

#[derive(Debug, Clone, Copy)]
enum SamplerKind {
    /// `exp(drift + vol * Z)` with drift `-vol^2 / 2`.
    LogNormal { drift: f64, vol: f64 },
    Uniform { range: f64 },
}

impl SamplerKind {
    fn log_normal(vol: f64) -> Self {
        Self::LogNormal {
            drift: -0.5 * vol * vol,
            vol,
        }
    }

    fn factor(self, rng: &mut StdRng) -> f64 {
        match self {
            Self::LogNormal { drift, vol } => {
                let z: f64 = StandardNormal.sample(rng);
                (drift + vol * z).exp()
            }
            Self::Uniform { range } => 1.0 + rng.random_range(-range..=range),
        }
    }
}

impl SpotSampler {
    /// Build a sampler.
    ///
    /// `implied_volatility` is in percent; the horizon is
    /// `days_to_expiry / days_per_year` years. Daily steps scale the
    /// terminal spread by `1 / sqrt(days)`.
    pub(crate) fn new(
        model: DrawModel,
        spot: Decimal,
        implied_volatility: Decimal,
        days_to_expiry: u32,
        days_per_year: u32,
    ) -> EngineResult<Self> {
        let spot = to_f64("underlying price", spot)?;
        let (terminal, daily) = match model {
            DrawModel::LogNormal => {
                let sigma = to_f64("implied volatility", implied_volatility)? / 100.0;
                let year = f64::from(days_per_year.max(1));
                let years = f64::from(days_to_expiry) / year;
                (
                    SamplerKind::log_normal(sigma * years.sqrt()),
                    SamplerKind::log_normal(sigma * year.recip().sqrt()),
                )
            }
            DrawModel::Uniform { range } => {
                let range = to_f64("uniform range", range)?;
                (
                    SamplerKind::Uniform { range },
                    SamplerKind::Uniform {
                        range: range / f64::from(days_to_expiry.max(1)).sqrt(),
                    },
                )
            }
        };
        Ok(Self {
            spot,
            terminal,
            daily,
            days: days_to_expiry,
        })
    }

    /// Terminal spot for draw `index`, at full conversion precision.
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` when the draw is not a finite positive number.
    pub(crate) fn sample(&self, base_seed: u64, index: u64) -> EngineResult<Decimal> {
        let mut rng = StdRng::seed_from_u64(mix(base_seed, index));
        to_spot(self.spot * self.terminal.factor(&mut rng))
    }

    /// Daily spots of sample path `path`, from today (day 0) to expiry.
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` when a step is not a finite positive number.
    pub(crate) fn path(&self, base_seed: u64, path: u64) -> EngineResult<Vec<Decimal>> {
        let mut rng = StdRng::seed_from_u64(mix(base_seed ^ PATH_SALT, path));
        let mut spot = self.spot;
        let mut spots = Vec::with_capacity(self.days as usize + 1);
        spots.push(to_spot(spot)?);
        for _ in 0..self.days {
            spot *= self.daily.factor(&mut rng);
            spots.push(to_spot(spot)?);
        }
        Ok(spots)
    }
}

fn to_f64(name: &str, value: Decimal) -> EngineResult<f64> {
    value
        .to_f64()
        .filter(|v| v.is_finite())
        .ok_or_else(|| EngineError::invalid_input(format!("{name} {value} is not representable")))
}

fn to_spot(value: f64) -> EngineResult<Decimal> {
    if !value.is_finite() || value <= 0.0 {
        return Err(EngineError::invalid_input(format!(
            "simulated spot must be finite and positive, got {value}"
        )));
    }
    match Decimal::from_f64(value) {
        Some(spot) if spot > Decimal::ZERO => Ok(spot),
        // Positive but below decimal precision.
        Some(_) => Ok(MIN_SPOT),
        None if value < 1.0 => Ok(MIN_SPOT),
        None => Err(EngineError::invalid_input(format!(
            "simulated spot {value} out of range"
        ))),
    }
}
