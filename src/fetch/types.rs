// src/fetch/types.rs

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// Namespace prefix the Reporting API requires on dimension and metric names.
pub const GA_PREFIX: &str = "ga:";

/// Provider-side sampling trade-off between precision and speed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, ValueEnum)]
#[serde(rename_all = "UPPERCASE")]
pub enum SamplingLevel {
    Small,
    #[default]
    Large,
}

// ---------- request body ----------

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchGetRequest {
    pub report_requests: Vec<ReportRequest>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportRequest {
    pub view_id: String,
    pub date_ranges: Vec<DateRange>,
    pub metrics: Vec<Metric>,
    pub dimensions: Vec<Dimension>,
    pub sampling_level: SamplingLevel,
    pub page_size: u32,
}

/// Inclusive date range; a daily query always has `start_date == end_date`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DateRange {
    pub start_date: String,
    pub end_date: String,
}

#[derive(Debug, Serialize)]
pub struct Dimension {
    pub name: String,
}

#[derive(Debug, Serialize)]
pub struct Metric {
    pub expression: String,
}

// ---------- response body ----------
//
// Mirrors reports[0].columnHeader.{dimensions, metricHeader.metricHeaderEntries}
// and reports[0].data.rows[].{dimensions, metrics[0].values}. The API omits
// empty collections, so every container defaults.

#[derive(Debug, Deserialize)]
pub struct RawReportResponse {
    #[serde(default)]
    pub reports: Vec<Report>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Report {
    #[serde(default)]
    pub column_header: ColumnHeader,
    #[serde(default)]
    pub data: ReportData,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnHeader {
    #[serde(default)]
    pub dimensions: Vec<String>,
    #[serde(default)]
    pub metric_header: MetricHeader,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricHeader {
    #[serde(default)]
    pub metric_header_entries: Vec<MetricHeaderEntry>,
}

#[derive(Debug, Deserialize)]
pub struct MetricHeaderEntry {
    pub name: String,
    #[serde(rename = "type", default)]
    pub ty: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ReportData {
    #[serde(default)]
    pub rows: Vec<ReportRow>,
}

#[derive(Debug, Deserialize)]
pub struct ReportRow {
    #[serde(default)]
    pub dimensions: Vec<String>,
    #[serde(default)]
    pub metrics: Vec<DateRangeValues>,
}

/// One set of metric values per requested date range; daily queries have one.
#[derive(Debug, Deserialize)]
pub struct DateRangeValues {
    #[serde(default)]
    pub values: Vec<String>,
}
