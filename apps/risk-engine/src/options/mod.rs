//! Strategy data model.
//!
//! This module provides:
//! - Instrument types and intrinsic value rules
//! - Per-unit leg Greeks
//! - Legs with validation
//! - Strategies with market context and stop-loss/take-profit controls

mod greeks;
mod leg;
mod strategy;
mod types;

pub use greeks::Greeks;
pub use leg::Leg;
pub use strategy::{ControlLimit, RiskControls, Strategy};
pub use types::InstrumentType;
