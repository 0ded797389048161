//! Cross-strategy analysis: conflict detection and hedge recommendations.

mod conflicts;
mod hedger;

pub use conflicts::{Conflict, ConflictKind, Severity, detect_conflicts};
pub use hedger::{HedgeInstrument, HedgeRecommendation, PORTFOLIO, recommend};
