//! MSK Inventory - Cross-Region Cluster Report
//!
//! Enumerates managed Kafka clusters in every selected region of one
//! account, normalizes their configuration, aggregates utilization metrics
//! over a look-back window, and writes one flat report.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────────┐
//! │                         Scan Orchestrator                                    │
//! │              (region selection, per-region cluster loop)                     │
//! ├─────────────────────────────────────────────────────────────────────────────┤
//! │  ┌─────────────────┐  ┌─────────────────┐  ┌─────────────────────────────┐  │
//! │  │   Descriptor    │  │  Metric Policy  │  │     Aggregation             │  │
//! │  │   Resolver      │  │  Tables         │  │     Engine                  │  │
//! │  └────────┬────────┘  └────────┬────────┘  └─────────────┬───────────────┘  │
//! │           │                    │                         │                   │
//! │           └────────────────────┼─────────────────────────┘                   │
//! │                                │                                             │
//! │                    ┌───────────┴───────────┐                                │
//! │                    │    Report Writer      │                                │
//! │                    │    (CSV / JSON)       │                                │
//! │                    └───────────────────────┘                                │
//! ├─────────────────────────────────────────────────────────────────────────────┤
//! │                          Domain Ports                                        │
//! │   ClusterCatalog     SubnetDirectory     MetricsSource     CloudProvider     │
//! ├─────────────────────────────────────────────────────────────────────────────┤
//! │                          AWS Adapters                                        │
//! │      MSK (Kafka)          EC2              CloudWatch           STS          │
//! └─────────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Modules
//!
//! - [`inventory`]: Descriptor resolution, metric policies, aggregation, scan and report
//! - [`aws`]: SDK-backed port implementations
//! - [`domain`]: Core domain types and traits
//! - [`error`]: Error types and handling

pub mod aws;
pub mod domain;
pub mod error;
pub mod inventory;

// Re-export commonly used types
pub use aws::AwsProvider;

pub use domain::ports::{
    CloudProvider, CloudProviderRef, ClusterCatalog, MetricsSource, RegionClients,
    SubnetDirectory,
};

pub use error::{Error, ErrorScope, Result};

pub use inventory::{
    resolve_regions, CapacityShape, ClusterDescriptor, DescriptorResolver, MetricEngine,
    MetricResult, ReportConfig, ReportFormat, ReportRow, ReportWriter, ScanConfig,
    ScanOrchestrator, ScanReport, ScanStats,
};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");
