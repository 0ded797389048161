//! Infrastructure Layer
//!
//! Adapters implementing the ports defined in the application layer.
//!
//! - `persistence/`: Snapshot storage

pub mod persistence;
