//! Domain layer - Port definitions
//!
//! This module defines the core traits (ports) that cloud adapters implement,
//! following hexagonal architecture principles.

pub mod ports;

#[cfg(test)]
pub(crate) mod mock;

pub use ports::*;
