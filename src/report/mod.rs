// src/report/mod.rs

use tracing::debug;

use crate::error::{Error, Result};
use crate::fetch::types::{RawReportResponse, GA_PREFIX};

/// Literal name of the appended view identifier column.
pub const VIEW_ID_COLUMN: &str = "view_id";

/// A rectangular table: one header row plus zero or more data rows, every
/// row exactly `headers.len()` fields wide.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Table {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl Table {
    pub fn width(&self) -> usize {
        self.headers.len()
    }
}

/// Strip the provider namespace prefix from a header name. Unprefixed names
/// pass through, so stripping is idempotent.
fn strip_ga_prefix(name: &str) -> String {
    name.strip_prefix(GA_PREFIX).unwrap_or(name).to_string()
}

/// Flatten the single report in `response` into a rectangular table.
///
/// Header row = stripped dimension names, stripped metric names, then
/// `view_id`. Each data row = dimension values, the first metric value set,
/// then the queried view identifier. Row order is the provider's; metric
/// values stay in string form. Zero data rows is valid and yields a
/// header-only table; zero reports is a contract violation.
pub fn normalize(response: &RawReportResponse, view_id: &str) -> Result<Table> {
    let report = response
        .reports
        .first()
        .ok_or_else(|| Error::MalformedResponse {
            reason: "response contained no reports".to_string(),
        })?;
    debug!(view_id, rows = report.data.rows.len(), "normalizing report");

    let mut headers: Vec<String> = report
        .column_header
        .dimensions
        .iter()
        .map(|d| strip_ga_prefix(d))
        .collect();
    headers.extend(
        report
            .column_header
            .metric_header
            .metric_header_entries
            .iter()
            .map(|m| strip_ga_prefix(&m.name)),
    );
    headers.push(VIEW_ID_COLUMN.to_string());

    let width = headers.len();
    let mut rows = Vec::with_capacity(report.data.rows.len());
    for row in &report.data.rows {
        let mut out = row.dimensions.clone();
        if let Some(first_range) = row.metrics.first() {
            out.extend(first_range.values.iter().cloned());
        }
        out.push(view_id.to_string());

        if out.len() != width {
            return Err(Error::MalformedResponse {
                reason: format!("row has {} fields, header has {}", out.len(), width),
            });
        }
        rows.push(out);
    }

    Ok(Table { headers, rows })
}
