// Allow unwrap/expect in tests - tests should panic on unexpected errors
// Allow test-specific patterns and pedantic lints in test code
#![cfg_attr(
    test,
    allow(
        clippy::unwrap_used,
        clippy::expect_used,
        clippy::float_cmp,
        clippy::significant_drop_tightening,
        clippy::too_many_lines,
        clippy::needless_pass_by_value,
        clippy::needless_collect,
        clippy::default_trait_access,
        clippy::items_after_statements
    )
)]

//! Risk Engine - Rust Core Library
//!
//! Options risk and simulation engine for multi-leg strategies.
//!
//! # Layout (leaf first)
//!
//! - **Options**: Legs, Greeks, strategies and their market context
//! - **Payoff**: Per-leg payoff, payoff curves, max profit/loss, breakevens
//! - **Risk**: Greeks aggregation and classification, composite risk score,
//!   safety checklist, max-loss limiter and capital at risk
//! - **Simulation**: What-if scenarios, theta decay, Monte Carlo
//! - **Portfolio**: Cross-strategy conflicts and hedge recommendations
//!
//! Supporting modules:
//!
//! - `config`: YAML configuration with environment interpolation
//! - `error`: Error taxonomy with stable reason codes
//! - `telemetry`: `tracing` subscriber setup
//! - `cancellation`: Cooperative cancellation for batch computations
//! - `application` / `infrastructure`: Snapshot repository port and adapter
//!
//! Every computation is a pure function over borrowed inputs. Only Monte
//! Carlo runs in parallel.

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::pedantic)]

// =============================================================================
// Core
// =============================================================================

/// Legs, Greeks and strategies.
pub mod options;

/// Expiry payoff analysis.
pub mod payoff;

/// Greeks exposure and risk scoring.
pub mod risk;

/// What-if, theta decay and Monte Carlo simulations.
pub mod simulation;

/// Cross-strategy conflicts and hedging.
pub mod portfolio;

// =============================================================================
// Supporting Modules
// =============================================================================

/// Cooperative cancellation.
pub mod cancellation;

/// Configuration loading and validation.
pub mod config;

/// Error types.
pub mod error;

/// Logging setup.
pub mod telemetry;

/// Application layer - Port definitions.
pub mod application;

/// Infrastructure layer - Adapters.
pub mod infrastructure;

// =============================================================================
// Re-exports
// =============================================================================

pub use cancellation::Cancellation;
pub use config::{EngineConfig, load_config, load_config_from_string};
pub use error::{EngineError, EngineResult, ErrorCode, LegDefect};
pub use options::{ControlLimit, Greeks, InstrumentType, Leg, RiskControls, Strategy};
pub use payoff::{KeyLevels, PayoffCurve, PayoffPoint, build_payoff_curve, compute_key_levels};
pub use portfolio::{Conflict, HedgeRecommendation, detect_conflicts, recommend};
pub use risk::{
    CapitalAtRisk, GreeksAggregation, MaxLossCheck, RiskBand, RiskScore, RiskScorer,
    SafetyChecklist, aggregate, capital_at_risk, classify, safety_checklist, validate_max_loss,
};
pub use simulation::{
    MonteCarloReport, MonteCarloSimulator, Scenario, SimulationResult, WhatIfEngine,
    project_decay,
};

pub use application::ports::{Snapshot, SnapshotId, SnapshotRepository};
pub use infrastructure::persistence::InMemorySnapshotRepository;
