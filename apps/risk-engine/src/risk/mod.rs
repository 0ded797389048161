//! Greeks exposure and risk scoring.
//!
//! # Features
//!
//! - Portfolio Greeks aggregation with per-leg rejection reporting
//! - Safe/caution/danger classification against configured limits
//! - Composite 0-100 risk score with configurable weights and bands
//! - Pre-trade safety checklist with acknowledgment tracking
//! - Max-loss limiter and capital-at-risk breakdown
//!
//! # Example
//!
//! ```rust,ignore
//! use risk_engine::risk::{RiskScorer, aggregate, classify};
//!
//! let aggregation = aggregate(&strategy.legs);
//! let exposure = classify(&aggregation.greeks, config.greek_limits()?)?;
//! let scorer = RiskScorer::new(config.risk_scoring()?.clone())?;
//! let score = scorer.score(&strategy, &aggregation.greeks, strategy.margin_used_pct())?;
//! ```

mod capital;
mod exposure;
mod safety;
mod scorer;

pub use capital::{
    CapitalAtRisk, LegRisk, LiquidationRisk, MAX_LOSS_RECOMMENDATIONS, MaxLossCheck,
    capital_at_risk, validate_max_loss,
};

pub use exposure::{
    ExposureLevel, GreekExposure, GreeksAggregation, GreeksExposure, RejectedLeg, aggregate,
    classify,
};
pub use safety::{
    CheckId, CheckKind, CheckSeverity, ChecklistItem, SafetyChecklist, safety_checklist,
};
pub use scorer::{RiskBand, RiskScore, RiskScorer, ScoreComponents, recommendations};
