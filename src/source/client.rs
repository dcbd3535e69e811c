//! Listing source client
//!
//! Fetches residency records from every configured endpoint. Failures are
//! isolated: a failing endpoint is logged and skipped, a failing detail
//! lookup leaves the record without its long-form description.

use std::time::Duration;

use futures::{future::join_all, stream, StreamExt};
use reqwest::{header, Client};
use serde::de::DeserializeOwned;
use serde_json::json;
use tracing::{debug, error, info, warn};
use url::Url;

use super::types::*;
use crate::config::{EndpointConfig, SourceConfig};
use crate::error::SourceError;

/// Everything one pass over the endpoints produced
#[derive(Debug, Default)]
pub struct FetchOutcome {
    /// Records of all successful endpoints, in endpoint order
    pub records: Vec<RawRecord>,
    pub endpoints_ok: usize,
    pub endpoints_failed: usize,
    /// Records whose detail lookup failed (kept, description absent)
    pub detail_failures: usize,
}

/// Records of a single endpoint plus its detail failure count
#[derive(Debug, Default)]
pub struct EndpointFetch {
    pub records: Vec<RawRecord>,
    pub detail_failures: usize,
}

pub struct SourceClient {
    client: Client,
    jwt_token: String,
    detail_concurrency: usize,
    max_pages: usize,
}

impl SourceClient {
    pub fn new(
        jwt_token: impl Into<String>,
        timeout: Duration,
        detail_concurrency: usize,
        max_pages: usize,
    ) -> Result<Self, SourceError> {
        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            jwt_token: jwt_token.into(),
            detail_concurrency: detail_concurrency.max(1),
            max_pages: max_pages.max(1),
        })
    }

    pub fn from_config(config: &SourceConfig, jwt_token: &str) -> Result<Self, SourceError> {
        Self::new(
            jwt_token,
            config.timeout,
            config.detail_concurrency,
            config.max_pages,
        )
    }

    /// Fetch every endpoint concurrently.
    ///
    /// Never fails as a whole: endpoint errors are logged and counted.
    pub async fn fetch_all(&self, endpoints: &[EndpointConfig]) -> FetchOutcome {
        let results = join_all(endpoints.iter().map(|e| self.fetch_endpoint(e))).await;

        let mut outcome = FetchOutcome::default();
        for (endpoint, result) in endpoints.iter().zip(results) {
            match result {
                Ok(fetched) => {
                    info!(
                        endpoint = %endpoint.residency_type,
                        records = fetched.records.len(),
                        "Fetched endpoint"
                    );
                    outcome.endpoints_ok += 1;
                    outcome.detail_failures += fetched.detail_failures;
                    outcome.records.extend(fetched.records);
                }
                Err(e) => {
                    error!(
                        endpoint = %endpoint.residency_type,
                        error = %e,
                        "Failed to fetch endpoint, skipping"
                    );
                    outcome.endpoints_failed += 1;
                }
            }
        }

        outcome
    }

    /// Fetch all pages of one endpoint, then its per-record details
    pub async fn fetch_endpoint(
        &self,
        endpoint: &EndpointConfig,
    ) -> Result<EndpointFetch, SourceError> {
        let records = self.fetch_all_pages(&endpoint.list_url).await?;

        let mut fetched = EndpointFetch::default();
        let records = match &endpoint.detail_url {
            Some(detail_url) => {
                let (enriched, failures) = self.attach_descriptions(detail_url, records).await;
                fetched.detail_failures = failures;
                enriched
            }
            None => records,
        };

        fetched.records = records
            .into_iter()
            .map(|record| RawRecord {
                residency_type: endpoint.residency_type,
                record,
            })
            .collect();

        Ok(fetched)
    }

    /// Follow `offset` cursors until the last page
    async fn fetch_all_pages(&self, list_url: &Url) -> Result<Vec<SourceRecord>, SourceError> {
        let mut records = Vec::new();
        let mut offset: Option<String> = None;

        for page in 0..self.max_pages {
            let body = match &offset {
                Some(cursor) => json!({ "offset": cursor }),
                None => json!({}),
            };

            let response: ListResponse = self.post_json(list_url, &body).await?;
            debug!(url = %list_url, page, records = response.records.len(), "Fetched list page");

            offset = response.next_offset();
            records.extend(response.records);

            if offset.is_none() {
                return Ok(records);
            }
        }

        Err(SourceError::TooManyPages {
            max_pages: self.max_pages,
        })
    }

    /// Fill in `Job Description` from the detail endpoint.
    ///
    /// Returns the records in their original order and the number of
    /// failed lookups.
    async fn attach_descriptions(
        &self,
        detail_url: &Url,
        records: Vec<SourceRecord>,
    ) -> (Vec<SourceRecord>, usize) {
        let results: Vec<(SourceRecord, bool)> = stream::iter(records)
            .map(|mut record| async move {
                match self.fetch_description(detail_url, &record.id).await {
                    Ok(Some(description)) => {
                        record.fields.insert(FIELD_JOB_DESCRIPTION, description);
                        (record, true)
                    }
                    Ok(None) => (record, true),
                    Err(e) => {
                        warn!(
                            record_id = %record.id,
                            error = %e,
                            "Detail lookup failed, keeping record without description"
                        );
                        (record, false)
                    }
                }
            })
            .buffered(self.detail_concurrency)
            .collect()
            .await;

        let failures = results.iter().filter(|(_, ok)| !ok).count();
        (results.into_iter().map(|(r, _)| r).collect(), failures)
    }

    /// Long-form description of one record
    pub async fn fetch_description(
        &self,
        detail_url: &Url,
        record_id: &str,
    ) -> Result<Option<String>, SourceError> {
        let response: DetailResponse = self
            .post_json(detail_url, &json!({ "recordId": record_id }))
            .await?;

        let record = response
            .records
            .into_iter()
            .next()
            .ok_or(SourceError::EmptyDetail)?;

        Ok(record.fields.text(FIELD_JOB_DESCRIPTION))
    }

    /// Authenticated JSON POST
    async fn post_json<T: DeserializeOwned>(
        &self,
        url: &Url,
        body: &serde_json::Value,
    ) -> Result<T, SourceError> {
        let response = self
            .client
            .post(url.clone())
            .header(header::COOKIE, format!("jwtToken={}", self.jwt_token))
            .json(body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SourceError::Status {
                status: status.as_u16(),
                body: body.chars().take(200).collect(),
            });
        }

        let text = response.text().await?;
        Ok(serde_json::from_str(&text)?)
    }
}
