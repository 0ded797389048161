//! Expiry payoff analysis.
//!
//! This module provides:
//! - Per-leg and per-strategy expiry payoff
//! - Payoff curves over a price grid
//! - Max profit, max loss and breakevens, with optional exact refinement
//!   at strikes

mod curve;
mod key_levels;
mod leg;

pub use curve::{PayoffCurve, PayoffCurveBuilder, PayoffPoint, build_payoff_curve};
pub use key_levels::{KeyLevels, compute_key_levels, refine_key_levels};
pub use leg::{StrategyPayoff, payoff_at, strategy_payoff_at};
