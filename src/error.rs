//! Error types for the MSK inventory scanner
//!
//! Every failure carries enough context (region, cluster, metric) to be
//! diagnosed from the log alone. [`Error::scope`] maps each variant onto the
//! level at which the scan catches it and moves on.

use thiserror::Error;

/// Unified error type for the scanner
#[derive(Error, Debug)]
pub enum Error {
    // =========================================================================
    // Internal Errors
    // =========================================================================
    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    // =========================================================================
    // Session Errors
    // =========================================================================
    #[error("Could not initialize AWS session: {0}")]
    Session(String),

    #[error("Could not validate regions: {0}")]
    RegionValidation(String),

    #[error("No valid regions were provided to scan (requested: {requested:?})")]
    NoValidRegions { requested: Vec<String> },

    // =========================================================================
    // Region Errors
    // =========================================================================
    #[error("Could not create service clients for region {region}: {reason}")]
    ClientConstruction { region: String, reason: String },

    #[error("Could not list clusters in region {region}: {reason}")]
    ClusterListing { region: String, reason: String },

    // =========================================================================
    // Cluster Errors
    // =========================================================================
    #[error("Could not describe cluster {cluster_id}: {reason}")]
    DescribeCluster { cluster_id: String, reason: String },

    #[error("Cluster {cluster_id} has no recognizable capacity model")]
    UnknownCapacity { cluster_id: String },

    #[error("Cluster {cluster_id} reports both provisioned and serverless capacity")]
    AmbiguousCapacity { cluster_id: String },

    #[error("Cluster {cluster_id} has no cluster name")]
    MissingClusterName { cluster_id: String },

    #[error("Subnet lookup failed: {0}")]
    SubnetLookup(String),

    // =========================================================================
    // Metric Errors
    // =========================================================================
    #[error("Metric query failed for {metric}: {reason}")]
    MetricQuery { metric: String, reason: String },

    // =========================================================================
    // AWS API Errors
    // =========================================================================
    #[error("AWS API error: {service} {operation} - {reason}")]
    Aws {
        service: String,
        operation: String,
        reason: String,
    },

    // =========================================================================
    // Report Errors
    // =========================================================================
    #[error("Report write failed: {0}")]
    ReportWrite(String),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    // =========================================================================
    // IO Errors
    // =========================================================================
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// The level at which an error is contained during a scan
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorScope {
    /// A single metric or per-broker query; the value becomes null
    Metric,
    /// One cluster; it produces no row
    Cluster,
    /// One region; its clusters are not scanned
    Region,
    /// The whole run
    Fatal,
}

impl Error {
    /// Build an [`Error::Aws`] from any displayable SDK error
    pub fn aws(service: &str, operation: &str, reason: impl std::fmt::Display) -> Self {
        Error::Aws {
            service: service.to_string(),
            operation: operation.to_string(),
            reason: reason.to_string(),
        }
    }

    /// Determine where this error is caught
    pub fn scope(&self) -> ErrorScope {
        match self {
            Error::MetricQuery { .. } => ErrorScope::Metric,

            Error::DescribeCluster { .. }
            | Error::UnknownCapacity { .. }
            | Error::AmbiguousCapacity { .. }
            | Error::MissingClusterName { .. }
            | Error::SubnetLookup(_) => ErrorScope::Cluster,

            Error::ClientConstruction { .. } | Error::ClusterListing { .. } => ErrorScope::Region,

            // Raw API failures are contained by whichever call site issued them
            Error::Aws { .. } => ErrorScope::Metric,

            Error::Internal(_)
            | Error::Configuration(_)
            | Error::Session(_)
            | Error::RegionValidation(_)
            | Error::NoValidRegions { .. }
            | Error::ReportWrite(_)
            | Error::Csv(_)
            | Error::Json(_)
            | Error::Io(_) => ErrorScope::Fatal,
        }
    }

    /// Check if this error aborts the run
    pub fn is_fatal(&self) -> bool {
        self.scope() == ErrorScope::Fatal
    }
}

/// Result type alias for the scanner
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_scopes() {
        let err = Error::MetricQuery {
            metric: "BytesInPerSec".into(),
            reason: "throttled".into(),
        };
        assert_eq!(err.scope(), ErrorScope::Metric);

        let err = Error::UnknownCapacity {
            cluster_id: "arn:aws:kafka:us-east-1:1:cluster/a/b".into(),
        };
        assert_eq!(err.scope(), ErrorScope::Cluster);

        let err = Error::ClusterListing {
            region: "eu-west-1".into(),
            reason: "denied".into(),
        };
        assert_eq!(err.scope(), ErrorScope::Region);
    }

    #[test]
    fn test_fatal_errors() {
        assert!(Error::Session("no credentials".into()).is_fatal());
        assert!(Error::NoValidRegions {
            requested: vec!["mars-1".into()]
        }
        .is_fatal());
        assert!(!Error::SubnetLookup("denied".into()).is_fatal());
        assert!(ErrorScope::Fatal > ErrorScope::Region);
    }

    #[test]
    fn test_error_display() {
        let err = Error::aws("kafka", "DescribeClusterV2", "AccessDenied");
        assert_eq!(
            err.to_string(),
            "AWS API error: kafka DescribeClusterV2 - AccessDenied"
        );
    }
}
