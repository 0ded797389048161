//! Persistence Adapters
//!
//! Implementations of repository ports.

pub mod in_memory;

pub use in_memory::InMemorySnapshotRepository;
