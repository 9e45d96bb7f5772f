// src/fetch/mod.rs

pub mod types;

use chrono::NaiveDate;
use reqwest::{Client, StatusCode};
use tracing::info;
use yup_oauth2::authenticator::DefaultAuthenticator;

use crate::auth::SCOPES;
use crate::error::{Error, Result};
use types::{
    BatchGetRequest, DateRange, Dimension, Metric, RawReportResponse, ReportRequest, SamplingLevel,
    GA_PREFIX,
};

const REPORTING_ENDPOINT: &str = "https://analyticsreporting.googleapis.com/v4/reports:batchGet";

/// Fixed page size; a daily report never exceeds this.
const PAGE_SIZE: u32 = 100_000;

/// Qualify a bare identifier with the provider namespace. Already-qualified
/// names pass through unchanged.
pub fn qualify(name: &str) -> String {
    if name.starts_with(GA_PREFIX) {
        name.to_string()
    } else {
        format!("{GA_PREFIX}{name}")
    }
}

/// Thin client over the Reporting API v4 `batchGet` endpoint. Issues exactly
/// one request per call; no retries, no paging beyond the fixed page size.
pub struct ReportClient {
    http: Client,
    auth: DefaultAuthenticator,
}

impl ReportClient {
    pub fn new(http: Client, auth: DefaultAuthenticator) -> Self {
        Self { http, auth }
    }

    /// Fetch one day's report for `view_id` and return the raw response
    /// unmodified. The date range sent upstream is always [date, date].
    pub async fn fetch_daily_report(
        &self,
        view_id: &str,
        date: NaiveDate,
        dimensions: &[String],
        metrics: &[String],
        sampling: SamplingLevel,
    ) -> Result<RawReportResponse> {
        let day = date.format("%Y-%m-%d").to_string();
        info!(view_id, date = %day, "requesting daily report");

        let body = BatchGetRequest {
            report_requests: vec![ReportRequest {
                view_id: view_id.to_string(),
                date_ranges: vec![DateRange {
                    start_date: day.clone(),
                    end_date: day,
                }],
                metrics: metrics
                    .iter()
                    .map(|m| Metric {
                        expression: qualify(m),
                    })
                    .collect(),
                dimensions: dimensions
                    .iter()
                    .map(|d| Dimension { name: qualify(d) })
                    .collect(),
                sampling_level: sampling,
                page_size: PAGE_SIZE,
            }],
        };

        let token = self.token().await?;
        let resp = self
            .http
            .post(REPORTING_ENDPOINT)
            .bearer_auth(token)
            .json(&body)
            .send()
            .await?;

        let status = resp.status();
        match status {
            StatusCode::TOO_MANY_REQUESTS => {
                return Err(Error::Quota {
                    view_id: view_id.to_string(),
                })
            }
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                let detail = resp.text().await.unwrap_or_default();
                return Err(Error::Auth {
                    reason: format!("{status}: {detail}"),
                });
            }
            _ => {}
        }
        let resp = resp.error_for_status()?;

        let text = resp.text().await?;
        serde_json::from_str(&text).map_err(|e| Error::MalformedResponse {
            reason: e.to_string(),
        })
    }

    async fn token(&self) -> Result<String> {
        let token = self.auth.token(SCOPES).await.map_err(|e| Error::Auth {
            reason: e.to_string(),
        })?;
        token
            .token()
            .map(str::to_owned)
            .ok_or_else(|| Error::Auth {
                reason: "authenticator returned no access token".to_string(),
            })
    }
}
