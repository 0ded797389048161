//! Application Layer
//!
//! Ports the engine expects its host to provide. Adapters live in
//! `infrastructure`.

pub mod ports;

pub use ports::*;
