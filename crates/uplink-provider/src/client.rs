//! Usage-query client for the provider's enterprise API.

use crate::auth::{AuthConfig, TokenManager};
use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;
use tracing::debug;
use uplink_core::cycle::CycleBounds;
use uplink_core::ids::{AccountId, TerminalId};
use uplink_core::ports::UsageProvider;
use uplink_core::usage::FetchedDay;
use uplink_core::{Error, Result};

/// Nominal cycle length used to size the backwards-looking query.
const NOMINAL_CYCLE_DAYS: i64 = 30;

const USAGE_QUERY_PAGE_LIMIT: u32 = 50;

/// Provider API endpoint and client behaviour.
#[derive(Debug, Clone)]
pub struct ProviderConfig {
    pub base_url: String,
    pub auth: AuthConfig,
    /// Hard timeout per request, distinct from retry/backoff delays.
    pub request_timeout_secs: u64,
    /// Largest date range a single fetch may cover. Wider requests are a
    /// planner bug and are rejected before any network traffic.
    pub max_window_days: u32,
}

impl ProviderConfig {
    pub fn new(base_url: impl Into<String>, auth: AuthConfig) -> Self {
        Self {
            base_url: base_url.into(),
            auth,
            request_timeout_secs: 30,
            max_window_days: 31,
        }
    }
}

/// HTTP client for the provider's usage-query endpoint.
///
/// Fetch-only: this client never writes to storage.
pub struct ProviderClient {
    http: reqwest::Client,
    tokens: TokenManager,
    config: ProviderConfig,
}

impl ProviderClient {
    pub fn new(config: ProviderConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|e| Error::Config(format!("failed to build HTTP client: {e}")))?;

        let tokens = TokenManager::new(http.clone(), config.auth.clone());

        Ok(Self {
            http,
            tokens,
            config,
        })
    }

    fn validate_range(&self, start: NaiveDate, end: NaiveDate) -> Result<()> {
        if end < start {
            return Err(Error::InvalidRange {
                start,
                end,
                reason: "end date precedes start date".to_string(),
            });
        }
        let span_days = (end - start).num_days() + 1;
        if span_days > self.config.max_window_days as i64 {
            return Err(Error::InvalidRange {
                start,
                end,
                reason: format!(
                    "range of {span_days} days exceeds provider maximum window of {} days",
                    self.config.max_window_days
                ),
            });
        }
        Ok(())
    }

    /// How many cycles back the query must reach to cover `start`.
    fn previous_cycles(start: NaiveDate) -> u32 {
        let days_back = (Utc::now().date_naive() - start).num_days().max(0);
        (days_back / NOMINAL_CYCLE_DAYS) as u32 + 1
    }

    async fn send_query(&self, account: &AccountId, payload: &UsageQuery) -> Result<QueryResponse> {
        let token = self.tokens.token().await?;
        let url = format!(
            "{}/enterprise/v1/accounts/{}/billing-cycles/query",
            self.config.base_url.trim_end_matches('/'),
            account
        );

        let response = self
            .http
            .post(&url)
            .bearer_auth(token)
            .json(payload)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    Error::Transient(format!("request timed out: {e}"))
                } else {
                    Error::Transient(format!("request failed: {e}"))
                }
            })?;

        let status = response.status();
        match status {
            s if s.is_success() => response
                .json()
                .await
                .map_err(|e| Error::Serialization(format!("usage response parse error: {e}"))),
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                Err(Error::Auth(format!("usage query returned {status}")))
            }
            StatusCode::TOO_MANY_REQUESTS => {
                let retry_after_secs = response
                    .headers()
                    .get(reqwest::header::RETRY_AFTER)
                    .and_then(|v| v.to_str().ok())
                    .and_then(|v| v.parse().ok());
                Err(Error::RateLimited { retry_after_secs })
            }
            s if s.is_server_error() => Err(Error::Transient(format!(
                "usage query returned {status}"
            ))),
            _ => Err(Error::Internal(format!(
                "usage query returned unexpected status {status}"
            ))),
        }
    }
}

#[async_trait]
impl UsageProvider for ProviderClient {
    async fn fetch_usage(
        &self,
        account: &AccountId,
        terminal: &TerminalId,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<FetchedDay>> {
        self.validate_range(start, end)?;

        let payload = UsageQuery {
            service_lines_filter: vec![terminal.as_str().to_string()],
            previous_billing_cycles: Self::previous_cycles(start).saturating_sub(1),
            page_limit: USAGE_QUERY_PAGE_LIMIT,
            page_index: 0,
        };

        debug!(
            terminal_id = %terminal,
            start = %start,
            end = %end,
            "Querying provider usage"
        );

        let mut result = self.send_query(account, &payload).await;
        if matches!(result, Err(Error::Auth(_))) {
            // One transparent re-authentication before surfacing the error.
            self.tokens.invalidate().await;
            result = self.send_query(account, &payload).await;
        }

        Ok(flatten_response(result?, terminal, start, end))
    }
}

/// Flatten a cycle-structured response into daily rows within the requested
/// range, deduplicated by date. Later cycles win on duplicate dates.
fn flatten_response(
    response: QueryResponse,
    terminal: &TerminalId,
    start: NaiveDate,
    end: NaiveDate,
) -> Vec<FetchedDay> {
    let results = response
        .content
        .map(|c| c.results)
        .unwrap_or_default();

    let mut by_date: BTreeMap<NaiveDate, FetchedDay> = BTreeMap::new();

    for line in results {
        if line.service_line_number.as_deref() != Some(terminal.as_str()) {
            continue;
        }
        for cycle in line.billing_cycles {
            let bounds = match (
                cycle.start_date.as_deref().and_then(parse_date_prefix),
                cycle.end_date.as_deref().and_then(parse_date_prefix),
            ) {
                (Some(s), Some(e)) => Some(CycleBounds::new(s, e)),
                _ => None,
            };

            for daily in cycle.daily_data_usage {
                let Some(date) = daily.date.as_deref().and_then(parse_date_prefix) else {
                    continue;
                };
                if date < start || date > end {
                    continue;
                }

                // The provider can report the same bytes under both the
                // priority and opt-in priority fields; taking the max avoids
                // double counting when they duplicate each other.
                let priority_gb = daily.priority_gb.max(daily.opt_in_priority_gb);
                let standard_gb = daily.standard_gb + daily.non_billable_gb;

                by_date.insert(
                    date,
                    FetchedDay {
                        date,
                        priority_gb,
                        standard_gb,
                        cycle: bounds,
                    },
                );
            }
        }
    }

    by_date.into_values().collect()
}

/// Parse the `YYYY-MM-DD` prefix of a provider timestamp.
fn parse_date_prefix(raw: &str) -> Option<NaiveDate> {
    raw.get(..10)
        .and_then(|s| NaiveDate::parse_from_str(s, "%Y-%m-%d").ok())
}

// === Wire types ===

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct UsageQuery {
    service_lines_filter: Vec<String>,
    previous_billing_cycles: u32,
    page_limit: u32,
    page_index: u32,
}

#[derive(Debug, Deserialize)]
struct QueryResponse {
    content: Option<QueryContent>,
}

#[derive(Debug, Deserialize)]
struct QueryContent {
    #[serde(default)]
    results: Vec<ServiceLineUsage>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ServiceLineUsage {
    service_line_number: Option<String>,
    #[serde(default)]
    billing_cycles: Vec<WireBillingCycle>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireBillingCycle {
    start_date: Option<String>,
    end_date: Option<String>,
    #[serde(default)]
    daily_data_usage: Vec<WireDailyUsage>,
}

#[derive(Debug, Deserialize)]
struct WireDailyUsage {
    date: Option<String>,
    #[serde(rename = "priorityGB", default)]
    priority_gb: f64,
    #[serde(rename = "optInPriorityGB", default)]
    opt_in_priority_gb: f64,
    #[serde(rename = "standardGB", default)]
    standard_gb: f64,
    #[serde(rename = "nonBillableGB", default)]
    non_billable_gb: f64,
}
