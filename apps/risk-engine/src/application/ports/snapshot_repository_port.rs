//! Snapshot Repository Port (Driven Port)
//!
//! Durable record of risk assessments taken over time.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::EngineResult;
use crate::risk::RiskScore;
use crate::simulation::SimulationResult;

/// Snapshot identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SnapshotId(Uuid);

impl SnapshotId {
    /// Generate a new random identifier.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// The underlying UUID.
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for SnapshotId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for SnapshotId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A point-in-time risk assessment of one strategy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    /// Identifier.
    pub id: SnapshotId,
    /// Strategy assessed.
    pub strategy_id: String,
    /// When the snapshot was taken.
    pub created_at: DateTime<Utc>,
    /// Caller-supplied label.
    pub label: String,
    /// Risk score at the time.
    pub risk_score: RiskScore,
    /// What-if outcome, if one was run.
    pub what_if: Option<SimulationResult>,
}

impl Snapshot {
    /// Create a snapshot taken now.
    #[must_use]
    pub fn new(
        strategy_id: impl Into<String>,
        label: impl Into<String>,
        risk_score: RiskScore,
    ) -> Self {
        Self {
            id: SnapshotId::new(),
            strategy_id: strategy_id.into(),
            created_at: Utc::now(),
            label: label.into(),
            risk_score,
            what_if: None,
        }
    }

    /// Attach a what-if outcome.
    #[must_use]
    pub fn with_what_if(mut self, result: SimulationResult) -> Self {
        self.what_if = Some(result);
        self
    }
}

/// Port for snapshot persistence.
pub trait SnapshotRepository: Send + Sync {
    /// Store a snapshot.
    ///
    /// # Errors
    ///
    /// Returns `Repository` when a snapshot with the same id already exists
    /// or the store fails.
    fn save(&self, snapshot: Snapshot) -> EngineResult<SnapshotId>;

    /// Find a snapshot by id.
    fn find(&self, id: &SnapshotId) -> EngineResult<Option<Snapshot>>;

    /// All snapshots, oldest first.
    fn list(&self) -> EngineResult<Vec<Snapshot>>;

    /// Snapshots of one strategy, oldest first.
    fn list_for_strategy(&self, strategy_id: &str) -> EngineResult<Vec<Snapshot>> {
        Ok(self
            .list()?
            .into_iter()
            .filter(|s| s.strategy_id == strategy_id)
            .collect())
    }
}
