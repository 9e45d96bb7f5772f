// src/batch/mod.rs

use std::path::PathBuf;

use chrono::{Days, NaiveDate};
use tracing::{debug, error};

use crate::error::Result;
use crate::fetch::types::{RawReportResponse, SamplingLevel};
use crate::fetch::ReportClient;
use crate::report;
use crate::sink;

/// Lazy iterator over calendar days, inclusive on both ends. Empty when
/// `start > end`.
pub fn date_range(start: NaiveDate, end: NaiveDate) -> DateRange {
    DateRange {
        next: (start <= end).then_some(start),
        end,
    }
}

pub struct DateRange {
    next: Option<NaiveDate>,
    end: NaiveDate,
}

impl Iterator for DateRange {
    type Item = NaiveDate;

    fn next(&mut self) -> Option<NaiveDate> {
        let current = self.next?;
        self.next = current
            .checked_add_days(Days::new(1))
            .filter(|d| *d <= self.end);
        Some(current)
    }
}

/// Where a day's raw report comes from. `ReportClient` is the real source;
/// tests substitute canned responses.
#[allow(async_fn_in_trait)]
pub trait DailyReportSource {
    async fn fetch_daily_report(
        &self,
        view_id: &str,
        date: NaiveDate,
        dimensions: &[String],
        metrics: &[String],
        sampling: SamplingLevel,
    ) -> Result<RawReportResponse>;
}

impl DailyReportSource for ReportClient {
    async fn fetch_daily_report(
        &self,
        view_id: &str,
        date: NaiveDate,
        dimensions: &[String],
        metrics: &[String],
        sampling: SamplingLevel,
    ) -> Result<RawReportResponse> {
        ReportClient::fetch_daily_report(self, view_id, date, dimensions, metrics, sampling).await
    }
}

/// Everything one batch run needs. One output file per day in the range.
#[derive(Debug, Clone)]
pub struct BatchSpec {
    pub view_id: String,
    pub report_name: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub dimensions: Vec<String>,
    pub metrics: Vec<String>,
    pub sampling: SamplingLevel,
    pub delimiter: u8,
    pub extraction_date: Option<String>,
    pub output_dir: PathBuf,
}

impl BatchSpec {
    /// `{output_dir}/{report_name}_{YYYYMMDD}.csv`
    pub fn output_path(&self, date: NaiveDate) -> PathBuf {
        self.output_dir
            .join(format!("{}_{}.csv", self.report_name, date.format("%Y%m%d")))
    }
}

/// Run one extraction per day, strictly sequentially: fetch → normalize →
/// write. Fetch and normalize errors abort the batch; a failed file write is
/// logged and the remaining days still run. Returns the paths that were
/// actually written, in date order.
pub async fn run_batch<S: DailyReportSource>(source: &S, spec: &BatchSpec) -> Result<Vec<PathBuf>> {
    let mut written = Vec::new();

    for day in date_range(spec.start_date, spec.end_date) {
        debug!(view_id = %spec.view_id, date = %day, "downloading daily report");

        let response = source
            .fetch_daily_report(
                &spec.view_id,
                day,
                &spec.dimensions,
                &spec.metrics,
                spec.sampling,
            )
            .await?;
        let table = report::normalize(&response, &spec.view_id)?;

        let path = spec.output_path(day);
        match sink::write_table(&path, &table, spec.delimiter, spec.extraction_date.as_deref()) {
            Ok(path) => written.push(path),
            Err(e) => error!(error = %e, path = %path.display(), "daily report not written"),
        }
    }

    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tempfile::tempdir;

    fn day(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    #[test]
    fn date_range_is_inclusive_and_ordered() {
        let days: Vec<String> = date_range(day("2024-01-01"), day("2024-01-03"))
            .map(|d| d.format("%Y%m%d").to_string())
            .collect();
        assert_eq!(days, vec!["20240101", "20240102", "20240103"]);
    }

    #[test]
    fn single_day_range_yields_one_day() {
        let days: Vec<NaiveDate> = date_range(day("2024-02-29"), day("2024-02-29")).collect();
        assert_eq!(days, vec![day("2024-02-29")]);
    }

    #[test]
    fn inverted_range_is_empty() {
        assert_eq!(date_range(day("2024-01-02"), day("2024-01-01")).count(), 0);
    }

    #[test]
    fn date_range_crosses_month_boundaries() {
        let days: Vec<NaiveDate> = date_range(day("2024-01-31"), day("2024-02-01")).collect();
        assert_eq!(days, vec![day("2024-01-31"), day("2024-02-01")]);
    }

    #[test]
    fn output_path_embeds_report_name_and_compact_date() {
        let spec = spec_for(day("2024-01-01"), day("2024-01-01"), "files".into());
        assert_eq!(
            spec.output_path(day("2024-01-02")),
            PathBuf::from("files").join("daily_traffic_20240102.csv")
        );
    }

    fn spec_for(start: NaiveDate, end: NaiveDate, output_dir: PathBuf) -> BatchSpec {
        BatchSpec {
            view_id: "987".into(),
            report_name: "daily_traffic".into(),
            start_date: start,
            end_date: end,
            dimensions: vec!["country".into()],
            metrics: vec!["sessions".into()],
            sampling: SamplingLevel::Large,
            delimiter: b',',
            extraction_date: None,
            output_dir,
        }
    }

    /// Hands out one canned single-row report per requested date.
    struct StubSource;

    impl DailyReportSource for StubSource {
        async fn fetch_daily_report(
            &self,
            _view_id: &str,
            date: NaiveDate,
            _dimensions: &[String],
            _metrics: &[String],
            _sampling: SamplingLevel,
        ) -> Result<RawReportResponse> {
            let raw = json!({
                "reports": [{
                    "columnHeader": {
                        "dimensions": ["ga:country"],
                        "metricHeader": {
                            "metricHeaderEntries": [{"name": "ga:sessions"}]
                        }
                    },
                    "data": {"rows": [
                        {"dimensions": [date.to_string()], "metrics": [{"values": ["42"]}]}
                    ]}
                }]
            });
            Ok(serde_json::from_value(raw).unwrap())
        }
    }

    /// Always reports an empty batchGet response.
    struct EmptySource;

    impl DailyReportSource for EmptySource {
        async fn fetch_daily_report(
            &self,
            _view_id: &str,
            _date: NaiveDate,
            _dimensions: &[String],
            _metrics: &[String],
            _sampling: SamplingLevel,
        ) -> Result<RawReportResponse> {
            Ok(serde_json::from_value(json!({"reports": []})).unwrap())
        }
    }

    #[tokio::test]
    async fn batch_writes_one_file_per_day_in_order() {
        let dir = tempdir().unwrap();
        let spec = spec_for(day("2024-01-01"), day("2024-01-03"), dir.path().into());

        let written = run_batch(&StubSource, &spec).await.unwrap();

        let expected: Vec<PathBuf> = ["20240101", "20240102", "20240103"]
            .iter()
            .map(|d| dir.path().join(format!("daily_traffic_{d}.csv")))
            .collect();
        assert_eq!(written, expected);
        for path in &expected {
            assert!(path.is_file(), "missing {}", path.display());
        }
    }

    #[tokio::test]
    async fn each_file_holds_that_days_rows() {
        let dir = tempdir().unwrap();
        let spec = spec_for(day("2024-01-01"), day("2024-01-02"), dir.path().into());

        run_batch(&StubSource, &spec).await.unwrap();

        let second = std::fs::read_to_string(dir.path().join("daily_traffic_20240102.csv")).unwrap();
        assert!(second.contains("\"2024-01-02\",\"42\",\"987\""));
        assert!(!second.contains("2024-01-01"));
    }

    /// Delegates to `StubSource` but counts how many days were fetched.
    struct CountingSource {
        calls: AtomicUsize,
    }

    impl DailyReportSource for CountingSource {
        async fn fetch_daily_report(
            &self,
            view_id: &str,
            date: NaiveDate,
            dimensions: &[String],
            metrics: &[String],
            sampling: SamplingLevel,
        ) -> Result<RawReportResponse> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            StubSource
                .fetch_daily_report(view_id, date, dimensions, metrics, sampling)
                .await
        }
    }

    #[tokio::test]
    async fn failed_writes_are_logged_and_the_batch_continues() {
        let dir = tempdir().unwrap();
        // the output "directory" is an existing plain file, so every write fails
        let blocker = dir.path().join("files");
        std::fs::write(&blocker, b"x").unwrap();
        let source = CountingSource {
            calls: AtomicUsize::new(0),
        };
        let spec = spec_for(day("2024-01-01"), day("2024-01-03"), blocker);

        let written = run_batch(&source, &spec).await.unwrap();

        assert!(written.is_empty());
        assert_eq!(source.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn malformed_response_aborts_the_batch() {
        let dir = tempdir().unwrap();
        let spec = spec_for(day("2024-01-01"), day("2024-01-03"), dir.path().into());

        let err = run_batch(&EmptySource, &spec).await.unwrap_err();
        assert!(matches!(err, Error::MalformedResponse { .. }));
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }
}
