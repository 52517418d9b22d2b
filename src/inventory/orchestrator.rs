//! Region Scan Orchestrator
//!
//! Walks regions and clusters strictly in sequence, resolving each cluster
//! and computing its metrics. Failures are contained at the narrowest scope
//! that still makes sense: a bad region is skipped, a bad cluster is
//! skipped, a bad metric becomes null.

use crate::domain::ports::{CloudProviderRef, ClusterCatalog, ClusterSummary, RegionClients};
use crate::error::{Error, Result};
use crate::inventory::aggregation::{EngineConfig, MetricEngine};
use crate::inventory::descriptor::DescriptorResolver;
use crate::inventory::policy::policies_for;
use crate::inventory::report::ReportRow;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeSet;
use tracing::{debug, info, warn};

/// Regions scanned when discovery fails
pub const FALLBACK_REGIONS: &[&str] = &[
    "us-east-1",
    "us-west-2",
    "eu-west-1",
    "ap-southeast-1",
    "ap-northeast-1",
    "ap-south-1",
];

// =============================================================================
// Configuration
// =============================================================================

/// Configuration for a scan
#[derive(Debug, Clone)]
pub struct ScanConfig {
    /// Length of the metrics window in days
    pub metrics_period_days: u32,
    /// Engine settings
    pub engine: EngineConfig,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            metrics_period_days: 7,
            engine: EngineConfig::default(),
        }
    }
}

// =============================================================================
// Scan Result
// =============================================================================

/// Counters for one scan
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ScanStats {
    pub regions_scanned: usize,
    pub regions_skipped: usize,
    pub clusters_found: usize,
    pub clusters_reported: usize,
    pub clusters_skipped: usize,
}

/// Output of a scan
#[derive(Debug, Clone, Default)]
pub struct ScanReport {
    pub rows: Vec<ReportRow>,
    pub stats: ScanStats,
}

// =============================================================================
// Region Selection
// =============================================================================

/// Decide which regions to scan.
///
/// A non-empty `requested` list is validated against every known region;
/// unknown entries are dropped with a warning, and an empty result or a
/// failed validation lookup is fatal. Otherwise enabled regions are
/// discovered, falling back to [`FALLBACK_REGIONS`] if discovery fails.
pub async fn resolve_regions(
    provider: &CloudProviderRef,
    requested: &[String],
) -> Result<Vec<String>> {
    let requested: Vec<String> = requested
        .iter()
        .map(|r| r.trim().to_string())
        .filter(|r| !r.is_empty())
        .collect();

    if requested.is_empty() {
        info!("No regions specified, discovering enabled regions");
        return match provider.enabled_regions().await {
            Ok(regions) => {
                if regions.is_empty() {
                    warn!("No enabled regions discovered");
                } else {
                    info!("Discovered regions: {:?}", regions);
                }
                Ok(regions)
            }
            Err(e) => {
                warn!("Error discovering regions, using default list: {}", e);
                Ok(FALLBACK_REGIONS.iter().map(|r| r.to_string()).collect())
            }
        };
    }

    info!("Validating requested regions");
    let known: BTreeSet<String> = provider
        .known_regions()
        .await
        .map_err(|e| Error::RegionValidation(e.to_string()))?
        .into_iter()
        .collect();

    let (valid, invalid): (Vec<String>, Vec<String>) =
        requested.iter().cloned().partition(|r| known.contains(r));

    if !invalid.is_empty() {
        warn!("Skipping invalid region ids: {:?}", invalid);
    }
    if valid.is_empty() {
        return Err(Error::NoValidRegions { requested });
    }

    info!("Will scan regions: {:?}", valid);
    Ok(valid)
}

// =============================================================================
// Orchestrator
// =============================================================================

/// Scans regions for clusters and assembles report rows
pub struct ScanOrchestrator {
    provider: CloudProviderRef,
    config: ScanConfig,
}

impl ScanOrchestrator {
    pub fn new(provider: CloudProviderRef, config: ScanConfig) -> Self {
        Self { provider, config }
    }

    /// Scan every region with the metrics window ending now
    pub async fn run(&self, account_id: &str, regions: &[String]) -> ScanReport {
        self.run_at(account_id, regions, Utc::now()).await
    }

    /// Scan every region with the metrics window ending at `window_end`
    pub async fn run_at(
        &self,
        account_id: &str,
        regions: &[String],
        window_end: DateTime<Utc>,
    ) -> ScanReport {
        let mut report = ScanReport::default();

        for region in regions {
            info!("Scanning region: {}", region);
            match self.scan_region(account_id, region, window_end, &mut report).await {
                Ok(()) => report.stats.regions_scanned += 1,
                Err(e) => {
                    warn!("Skipping region {}: {}", region, e);
                    report.stats.regions_skipped += 1;
                }
            }
        }

        report
    }

    async fn scan_region(
        &self,
        account_id: &str,
        region: &str,
        window_end: DateTime<Utc>,
        report: &mut ScanReport,
    ) -> Result<()> {
        let clients = self
            .provider
            .region_clients(region)
            .await
            .map_err(|e| match e {
                Error::ClientConstruction { .. } => e,
                other => Error::ClientConstruction {
                    region: region.to_string(),
                    reason: other.to_string(),
                },
            })?;

        let clusters = list_clusters(clients.clusters.as_ref(), region).await?;
        if clusters.is_empty() {
            info!("No clusters found in region {}", region);
            return Ok(());
        }
        report.stats.clusters_found += clusters.len();

        let resolver = DescriptorResolver::new(clients.clusters.clone(), clients.subnets.clone());
        let engine = MetricEngine::new(clients.metrics.clone(), self.config.engine.clone());

        for summary in &clusters {
            match self
                .scan_cluster(account_id, &clients, &resolver, &engine, summary, window_end)
                .await
            {
                Some(row) => {
                    report.rows.push(row);
                    report.stats.clusters_reported += 1;
                }
                None => report.stats.clusters_skipped += 1,
            }
        }

        Ok(())
    }

    async fn scan_cluster(
        &self,
        account_id: &str,
        clients: &RegionClients,
        resolver: &DescriptorResolver,
        engine: &MetricEngine,
        summary: &ClusterSummary,
        window_end: DateTime<Utc>,
    ) -> Option<ReportRow> {
        let arn = &summary.cluster_arn;
        info!("Processing cluster: {}", arn);

        let descriptor = resolver.resolve(arn).await?;
        if descriptor.display_name.is_none() {
            warn!(
                "{}",
                Error::MissingClusterName {
                    cluster_id: arn.clone()
                }
            );
            return None;
        }

        let mut metrics = engine
            .aggregate(&descriptor, window_end, self.config.metrics_period_days)
            .await;
        let (_, policies) = policies_for(&descriptor.capacity);
        metrics.backfill(policies);

        Some(ReportRow::assemble(
            account_id,
            &clients.region,
            &descriptor,
            &metrics,
        ))
    }
}

/// List clusters, preferring the richer listing API
async fn list_clusters(catalog: &dyn ClusterCatalog, region: &str) -> Result<Vec<ClusterSummary>> {
    match catalog.list_clusters_v2().await {
        Ok(clusters) => Ok(clusters),
        Err(v2_err) => {
            debug!(
                "ListClustersV2 failed in {}, falling back to legacy API: {}",
                region, v2_err
            );
            catalog
                .list_clusters()
                .await
                .map_err(|e| Error::ClusterListing {
                    region: region.to_string(),
                    reason: format!("both listing APIs failed: {}", e),
                })
        }
    }
}
