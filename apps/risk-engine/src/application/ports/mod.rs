//! Application Ports (Driven)
//!
//! Interfaces the engine uses to reach external systems.

mod snapshot_repository_port;

pub use snapshot_repository_port::{Snapshot, SnapshotId, SnapshotRepository};
