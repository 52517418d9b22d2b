//! MSK Inventory
//!
//! Scans managed Kafka clusters across regions and writes a timestamped
//! inventory and utilization report.

use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, info, warn, Level};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use msk_inventory::{
    resolve_regions, AwsProvider, CloudProvider, CloudProviderRef, ReportConfig, ReportFormat,
    ReportWriter, Result, ScanConfig, ScanOrchestrator,
};

// =============================================================================
// CLI Arguments
// =============================================================================

/// MSK Inventory - cluster configuration and utilization across regions
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Named AWS credentials profile
    #[arg(long, env = "AWS_PROFILE")]
    profile: Option<String>,

    /// Regions to scan, comma separated (default: every enabled region)
    #[arg(long, env = "MSK_REGIONS", value_delimiter = ',')]
    regions: Vec<String>,

    /// Metrics look-back window in days
    #[arg(
        long,
        env = "METRICS_PERIOD_DAYS",
        default_value = "7",
        value_parser = clap::value_parser!(u32).range(1..=455)
    )]
    metrics_days: u32,

    /// Report file name prefix
    #[arg(long, env = "OUTPUT_BASE", default_value = "msk_cluster_report")]
    output_base: String,

    /// Directory the report is written to
    #[arg(long, env = "OUTPUT_DIR", default_value = ".")]
    output_dir: PathBuf,

    /// Report format
    #[arg(long, env = "OUTPUT_FORMAT", value_enum, default_value = "csv")]
    format: ReportFormat,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    log_level: String,

    /// Output logs as JSON
    #[arg(long, env = "LOG_JSON")]
    log_json: bool,
}

// =============================================================================
// Main
// =============================================================================

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    init_logging(&args);

    info!("Starting MSK inventory");
    info!("  Version: {}", msk_inventory::VERSION);
    info!("  Metrics window: {} days", args.metrics_days);
    info!("  Format: {:?}", args.format);

    if let Err(e) = run(args).await {
        error!("Inventory failed: {}", e);
        return Err(e);
    }
    Ok(())
}

async fn run(args: Args) -> Result<()> {
    let started = Instant::now();

    let provider: CloudProviderRef = Arc::new(AwsProvider::connect(args.profile.clone()).await?);
    let account_id = provider.account_id().await?;
    info!("Account: {}", account_id);

    let regions = resolve_regions(&provider, &args.regions).await?;
    info!("Scanning {} regions: {}", regions.len(), regions.join(", "));

    let config = ScanConfig {
        metrics_period_days: args.metrics_days,
        ..Default::default()
    };
    let orchestrator = ScanOrchestrator::new(provider, config);
    let report = orchestrator.run(&account_id, &regions).await;

    let stats = &report.stats;
    info!(
        "Scan complete: {} regions scanned, {} skipped; {} clusters found, {} reported, {} skipped",
        stats.regions_scanned,
        stats.regions_skipped,
        stats.clusters_found,
        stats.clusters_reported,
        stats.clusters_skipped
    );

    if report.rows.is_empty() {
        warn!("No MSK cluster data was found; no report written");
    } else {
        let writer = ReportWriter::new(ReportConfig {
            base_name: args.output_base,
            output_dir: args.output_dir,
            format: args.format,
        });
        writer.write(&report.rows, chrono::Local::now())?;
    }

    info!("Finished in {:.1}s", started.elapsed().as_secs_f64());
    Ok(())
}

// =============================================================================
// Logging Setup
// =============================================================================

fn init_logging(args: &Args) {
    let level = match args.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let mut filter = EnvFilter::from_default_env().add_directive(level.into());
    for directive in ["aws_config=warn", "aws_smithy_runtime=warn", "hyper=warn"] {
        if let Ok(d) = directive.parse() {
            filter = filter.add_directive(d);
        }
    }

    if args.log_json {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_target(true))
            .init();
    }
}
