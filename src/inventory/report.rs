//! Report rows and the report writer
//!
//! A [`ReportRow`] is a flat, ordered map of column name to cell. The writer
//! lays every row out on one fixed column order, filling absent columns with
//! null, and serializes to a timestamped CSV or JSON file.

use crate::error::{Error, Result};
use crate::inventory::aggregation::MetricResult;
use crate::inventory::descriptor::ClusterDescriptor;
use crate::inventory::policy::metric_columns;
use chrono::{DateTime, Local};
use indexmap::IndexMap;
use serde::{Serialize, Serializer};
use std::fs::File;
use std::io::Write;
use std::path::PathBuf;
use tracing::info;

/// Identifier and descriptive columns, in report order
pub const DESCRIPTOR_COLUMNS: &[&str] = &[
    "AccountID",
    "Region",
    "ClusterName",
    "ClusterArn",
    "ClusterType",
    "CreationTime",
    "KafkaVersion",
    "NumberOfBrokerNodes",
    "BrokerInstanceType",
    "NumberOfAvailabilityZones",
    "StoragePerBrokerGB",
    "Authentication",
];

/// Placeholder for descriptive fields that do not apply to a cluster
pub const NOT_APPLICABLE: &str = "N/A";

// =============================================================================
// Cells and Rows
// =============================================================================

/// One report cell
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Null,
    Text(String),
    Integer(i64),
    Number(f64),
}

impl Cell {
    fn text(value: Option<&str>) -> Self {
        value.map_or(Cell::Null, |v| Cell::Text(v.to_string()))
    }

    fn integer<T: Into<i64>>(value: Option<T>) -> Self {
        value.map_or(Cell::Null, |v| Cell::Integer(v.into()))
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Cell::Null)
    }
}

impl From<Option<f64>> for Cell {
    fn from(value: Option<f64>) -> Self {
        value.map_or(Cell::Null, Cell::Number)
    }
}

impl std::fmt::Display for Cell {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Cell::Null => Ok(()),
            Cell::Text(s) => f.write_str(s),
            Cell::Integer(n) => write!(f, "{}", n),
            Cell::Number(n) => write!(f, "{}", n),
        }
    }
}

impl Serialize for Cell {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            Cell::Null => serializer.serialize_none(),
            Cell::Text(s) => serializer.serialize_str(s),
            Cell::Integer(n) => serializer.serialize_i64(*n),
            Cell::Number(n) => serializer.serialize_f64(*n),
        }
    }
}

/// One cluster's report line
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct ReportRow {
    cells: IndexMap<String, Cell>,
}

impl ReportRow {
    /// Merge identifiers, descriptor attributes and metric values
    pub fn assemble(
        account_id: &str,
        region: &str,
        descriptor: &ClusterDescriptor,
        metrics: &MetricResult,
    ) -> Self {
        let mut cells = IndexMap::new();
        let fixed = descriptor.capacity.fixed();
        let not_applicable = || Cell::Text(NOT_APPLICABLE.to_string());

        cells.insert("AccountID".to_string(), Cell::Text(account_id.to_string()));
        cells.insert("Region".to_string(), Cell::Text(region.to_string()));
        cells.insert(
            "ClusterName".to_string(),
            Cell::text(descriptor.display_name.as_deref()),
        );
        cells.insert(
            "ClusterArn".to_string(),
            Cell::Text(descriptor.cluster_id.clone()),
        );
        cells.insert(
            "ClusterType".to_string(),
            Cell::Text(descriptor.capacity.label().to_string()),
        );
        cells.insert(
            "CreationTime".to_string(),
            Cell::text(
                descriptor
                    .creation_time
                    .map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string())
                    .as_deref(),
            ),
        );
        cells.insert(
            "KafkaVersion".to_string(),
            Cell::text(descriptor.software_version.as_deref()),
        );

        match fixed {
            Some(fixed) => {
                cells.insert(
                    "NumberOfBrokerNodes".to_string(),
                    Cell::integer(fixed.broker_count),
                );
                cells.insert(
                    "BrokerInstanceType".to_string(),
                    Cell::text(fixed.instance_type.as_deref()),
                );
                cells.insert(
                    "NumberOfAvailabilityZones".to_string(),
                    Cell::integer(
                        fixed
                            .availability_zone_count
                            .and_then(|n| i64::try_from(n).ok()),
                    ),
                );
                cells.insert(
                    "StoragePerBrokerGB".to_string(),
                    Cell::integer(fixed.storage_per_broker_gb),
                );
            }
            None => {
                cells.insert("NumberOfBrokerNodes".to_string(), not_applicable());
                cells.insert("BrokerInstanceType".to_string(), not_applicable());
                cells.insert("NumberOfAvailabilityZones".to_string(), Cell::Integer(0));
                cells.insert("StoragePerBrokerGB".to_string(), not_applicable());
            }
        }

        cells.insert(
            "Authentication".to_string(),
            Cell::Text(descriptor.authentication.to_string()),
        );

        for (key, value) in metrics.iter() {
            cells.insert(key.to_string(), Cell::from(value));
        }

        Self { cells }
    }

    pub fn get(&self, column: &str) -> Option<&Cell> {
        self.cells.get(column)
    }

    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.cells.keys().map(String::as_str)
    }
}

// =============================================================================
// Writer
// =============================================================================

/// Serialization format of the report file
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum ReportFormat {
    #[default]
    Csv,
    Json,
}

impl ReportFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            ReportFormat::Csv => "csv",
            ReportFormat::Json => "json",
        }
    }
}

/// Configuration for the report writer
#[derive(Debug, Clone)]
pub struct ReportConfig {
    /// File name prefix
    pub base_name: String,
    /// Directory the report is written to
    pub output_dir: PathBuf,
    pub format: ReportFormat,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            base_name: "msk_cluster_report".to_string(),
            output_dir: PathBuf::from("."),
            format: ReportFormat::Csv,
        }
    }
}

/// Writes rows to one report file per run
pub struct ReportWriter {
    config: ReportConfig,
    columns: Vec<String>,
}

impl ReportWriter {
    pub fn new(config: ReportConfig) -> Self {
        let columns = DESCRIPTOR_COLUMNS
            .iter()
            .map(|c| c.to_string())
            .chain(metric_columns())
            .collect();
        Self { config, columns }
    }

    /// Fixed column order of every report
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// File name for a run started at `at`, e.g. `base_2024-MAR-05_14-03-09.csv`
    pub fn file_name(&self, at: DateTime<Local>) -> String {
        let month = at.format("%b").to_string().to_uppercase();
        format!(
            "{}_{}-{}-{}.{}",
            self.config.base_name,
            at.format("%Y"),
            month,
            at.format("%d_%H-%M-%S"),
            self.config.format.extension()
        )
    }

    /// Lay rows out on the fixed columns, back-filling absent cells as null
    pub fn table(&self, rows: &[ReportRow]) -> Vec<Vec<Cell>> {
        rows.iter()
            .map(|row| {
                self.columns
                    .iter()
                    .map(|c| row.get(c).cloned().unwrap_or(Cell::Null))
                    .collect()
            })
            .collect()
    }

    /// Write the report, returning its path
    pub fn write(&self, rows: &[ReportRow], at: DateTime<Local>) -> Result<PathBuf> {
        if rows.is_empty() {
            return Err(Error::ReportWrite("no rows to write".to_string()));
        }

        let path = self.config.output_dir.join(self.file_name(at));
        let file = File::create(&path).map_err(|e| {
            Error::ReportWrite(format!("could not create {}: {}", path.display(), e))
        })?;

        match self.config.format {
            ReportFormat::Csv => self.write_csv(file, rows)?,
            ReportFormat::Json => self.write_json(file, rows)?,
        }

        info!("Report written: {} ({} rows)", path.display(), rows.len());
        Ok(path)
    }

    fn write_csv<W: Write>(&self, out: W, rows: &[ReportRow]) -> Result<()> {
        let mut writer = csv::Writer::from_writer(out);
        writer.write_record(&self.columns)?;
        for cells in self.table(rows) {
            writer.write_record(cells.iter().map(|c| c.to_string()))?;
        }
        writer.flush()?;
        Ok(())
    }

    fn write_json<W: Write>(&self, mut out: W, rows: &[ReportRow]) -> Result<()> {
        let records: Vec<IndexMap<&str, Cell>> = self
            .table(rows)
            .into_iter()
            .map(|cells| {
                self.columns
                    .iter()
                    .map(String::as_str)
                    .zip(cells)
                    .collect()
            })
            .collect();
        serde_json::to_writer_pretty(&mut out, &records)?;
        writeln!(out)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inventory::descriptor::{
        AuthMethod, Authentication, CapacityShape, FixedCapacity, MANAGED_SOFTWARE_VERSION,
    };
    use crate::inventory::policy::{FIXED_CAPACITY_POLICIES, ON_DEMAND_POLICIES};
    use chrono::{TimeZone, Utc};
    use std::path::Path;

    fn provisioned() -> ClusterDescriptor {
        ClusterDescriptor {
            cluster_id: "arn:aws:kafka:eu-west-1:1:cluster/orders/x".into(),
            display_name: Some("orders".into()),
            creation_time: Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).single(),
            capacity: CapacityShape::FixedCapacity(FixedCapacity {
                instance_type: Some("kafka.m5.large".into()),
                broker_count: Some(3),
                storage_per_broker_gb: Some(500),
                availability_zone_count: Some(3),
            }),
            software_version: Some("3.5.1".into()),
            authentication: Authentication::Enabled(vec![AuthMethod::Iam, AuthMethod::Scram]),
        }
    }

    fn serverless() -> ClusterDescriptor {
        ClusterDescriptor {
            cluster_id: "arn:aws:kafka:eu-west-1:1:cluster/events/y".into(),
            display_name: Some("events".into()),
            creation_time: None,
            capacity: CapacityShape::OnDemand,
            software_version: Some(MANAGED_SOFTWARE_VERSION.into()),
            authentication: Authentication::NoneEnabled,
        }
    }

    fn writer(dir: &Path, format: ReportFormat) -> ReportWriter {
        ReportWriter::new(ReportConfig {
            base_name: "msk_cluster_report".into(),
            output_dir: dir.to_path_buf(),
            format,
        })
    }

    #[test]
    fn test_assemble_provisioned_row() {
        let mut metrics = MetricResult::new();
        metrics.insert("BytesInPerSec_Avg", Some(60.0));
        metrics.backfill(FIXED_CAPACITY_POLICIES);

        let row = ReportRow::assemble("123456789012", "eu-west-1", &provisioned(), &metrics);

        assert_eq!(row.get("ClusterType"), Some(&Cell::Text("Provisioned".into())));
        assert_eq!(
            row.get("CreationTime"),
            Some(&Cell::Text("2024-01-02 03:04:05".into()))
        );
        assert_eq!(row.get("NumberOfBrokerNodes"), Some(&Cell::Integer(3)));
        assert_eq!(row.get("Authentication"), Some(&Cell::Text("IAM, SCRAM".into())));
        assert_eq!(row.get("BytesInPerSec_Avg"), Some(&Cell::Number(60.0)));
        assert_eq!(row.get("BytesInPerSec_Peak"), Some(&Cell::Null));
    }

    #[test]
    fn test_assemble_serverless_row() {
        let mut metrics = MetricResult::new();
        metrics.backfill(ON_DEMAND_POLICIES);

        let row = ReportRow::assemble("123456789012", "eu-west-1", &serverless(), &metrics);

        assert_eq!(row.get("BrokerInstanceType"), Some(&Cell::Text("N/A".into())));
        assert_eq!(row.get("Authentication"), Some(&Cell::Text("None Enabled".into())));
        assert_eq!(row.get("GlobalTopicCount"), None);
    }

    #[test]
    fn test_table_backfills_absent_columns() {
        let dir = tempfile::tempdir().unwrap();
        let writer = writer(dir.path(), ReportFormat::Csv);
        let row = ReportRow::assemble("1", "eu-west-1", &serverless(), &MetricResult::new());

        let table = writer.table(&[row]);
        assert_eq!(table[0].len(), writer.columns().len());
        let idx = writer
            .columns()
            .iter()
            .position(|c| c == "GlobalPartitionCount")
            .unwrap();
        assert!(table[0][idx].is_null());
    }

    #[test]
    fn test_column_order() {
        let dir = tempfile::tempdir().unwrap();
        let writer = writer(dir.path(), ReportFormat::Csv);
        let columns = writer.columns();

        assert_eq!(columns[0], "AccountID");
        assert_eq!(columns[11], "Authentication");
        assert_eq!(columns[12], "GlobalPartitionCount");
        assert_eq!(columns[14], "StorageUsedPercent_Avg");
        assert_eq!(columns.last().map(String::as_str), Some("RequestBytesMean_Peak"));
    }

    #[test]
    fn test_file_name() {
        let dir = tempfile::tempdir().unwrap();
        let writer = writer(dir.path(), ReportFormat::Csv);
        let at = Local.with_ymd_and_hms(2024, 3, 5, 14, 3, 9).unwrap();

        assert_eq!(
            writer.file_name(at),
            "msk_cluster_report_2024-MAR-05_14-03-09.csv"
        );
    }

    #[test]
    fn test_write_csv() {
        let dir = tempfile::tempdir().unwrap();
        let writer = writer(dir.path(), ReportFormat::Csv);
        let rows = vec![
            ReportRow::assemble("1", "eu-west-1", &provisioned(), &MetricResult::new()),
            ReportRow::assemble("1", "eu-west-1", &serverless(), &MetricResult::new()),
        ];
        let at = Local.with_ymd_and_hms(2024, 3, 5, 14, 3, 9).unwrap();

        let path = writer.write(&rows, at).unwrap();
        assert!(path.is_file());

        let content = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("AccountID,Region,ClusterName,ClusterArn"));
        assert!(lines[1].contains("\"IAM, SCRAM\""));
        assert!(lines[2].contains("Serverless"));
    }

    #[test]
    fn test_write_json() {
        let dir = tempfile::tempdir().unwrap();
        let writer = writer(dir.path(), ReportFormat::Json);
        let mut metrics = MetricResult::new();
        metrics.insert("GlobalTopicCount", Some(4.0));
        let rows = vec![ReportRow::assemble("1", "eu-west-1", &provisioned(), &metrics)];
        let at = Local.with_ymd_and_hms(2024, 3, 5, 14, 3, 9).unwrap();

        let path = writer.write(&rows, at).unwrap();
        assert_eq!(path.extension().and_then(|e| e.to_str()), Some("json"));

        let parsed: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(parsed[0]["GlobalTopicCount"], serde_json::json!(4.0));
        assert!(parsed[0]["BytesInPerSec_Avg"].is_null());
        assert_eq!(parsed[0]["ClusterName"], "orders");
    }

    #[test]
    fn test_write_nothing_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let writer = writer(dir.path(), ReportFormat::Csv);
        let at = Local.with_ymd_and_hms(2024, 3, 5, 14, 3, 9).unwrap();

        assert!(writer.write(&[], at).is_err());
    }
}
