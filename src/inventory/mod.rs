//! Inventory Module
//!
//! Cluster resolution, metric aggregation, the region scan and report
//! output.

pub mod aggregation;
pub mod descriptor;
pub mod orchestrator;
pub mod policy;
pub mod report;

pub use aggregation::*;
pub use descriptor::*;
pub use orchestrator::*;
pub use policy::*;
pub use report::*;
