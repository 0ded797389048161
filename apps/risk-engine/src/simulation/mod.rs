//! Forward-looking simulations over a single strategy.
//!
//! - What-if shocks to spot, IV and time, with named presets
//! - Day-by-day theta decay projection
//! - Parallel, seeded Monte Carlo over terminal spot

mod monte_carlo;
mod presets;
mod theta;
mod what_if;

pub use monte_carlo::{
    DegenerateStatistic, MonteCarloReport, MonteCarloRequest, MonteCarloSimulator, PnlBucket,
    PnlStatistics, SamplePath, SimulationOutcome, mix,
};
pub use presets::{IV_SHOCKS, QUICK_SCENARIOS, ScenarioPreset, all_presets};
pub use theta::{DecayPoint, DecayProjection, project_decay};
pub use what_if::{
    ControlKind, LimitBreach, NamedResult, NamedScenario, Scenario, SimulationResult,
    WhatIfEngine, breached_limits,
};
