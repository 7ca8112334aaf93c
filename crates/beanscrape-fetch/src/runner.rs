//! Fetch-and-persist over every configured endpoint

use std::path::PathBuf;

use tracing::{error, info, instrument, warn};

use crate::config::{Endpoint, FetchConfig};
use crate::error::FetchResult;
use crate::pager::{fetch_paged, StopReason};
use crate::persist::{write_csv, write_raw_capture};
use crate::source::PageSource;

/// Outcome of one endpoint that ran to the end of its pipeline
#[derive(Debug, Clone)]
pub struct EndpointReport {
    /// Endpoint name
    pub endpoint: String,
    /// Records fetched
    pub records: usize,
    /// Requests issued
    pub requests: u32,
    /// Why paging stopped
    pub stop_reason: StopReason,
    /// CSV written, if there were records
    pub csv_path: Option<PathBuf>,
    /// Raw capture written, if enabled
    pub raw_path: Option<PathBuf>,
}

/// Endpoint that failed before its output was written
#[derive(Debug, Clone)]
pub struct EndpointFailure {
    /// Endpoint name
    pub endpoint: String,
    /// Rendered error
    pub error: String,
}

/// Result of a full run
#[derive(Debug, Default)]
pub struct RunSummary {
    /// Endpoints that completed
    pub succeeded: Vec<EndpointReport>,
    /// Endpoints that failed
    pub failed: Vec<EndpointFailure>,
}

impl RunSummary {
    /// Total records fetched across all completed endpoints
    pub fn total_records(&self) -> usize {
        self.succeeded.iter().map(|r| r.records).sum()
    }
}

/// Mirrors the configured endpoints into the output directory
pub struct Fetcher<S> {
    config: FetchConfig,
    source: S,
}

impl<S: PageSource> Fetcher<S> {
    /// Create a new fetcher over `source`
    pub fn new(config: FetchConfig, source: S) -> Self {
        Self { config, source }
    }

    /// The configuration this fetcher runs with
    pub fn config(&self) -> &FetchConfig {
        &self.config
    }

    /// Fetch and persist every endpoint.
    ///
    /// A failing endpoint is logged and recorded; the remaining endpoints are
    /// still attempted.
    pub async fn run(&self) -> RunSummary {
        let mut summary = RunSummary::default();

        for endpoint in &self.config.endpoints {
            match self.fetch_endpoint(endpoint).await {
                Ok(report) => summary.succeeded.push(report),
                Err(e) => {
                    error!("Error fetching {}: {}", endpoint.name, e);
                    summary.failed.push(EndpointFailure {
                        endpoint: endpoint.name.clone(),
                        error: e.to_string(),
                    });
                }
            }
        }

        info!(
            succeeded = summary.succeeded.len(),
            failed = summary.failed.len(),
            records = summary.total_records(),
            "Fetch run finished"
        );
        summary
    }

    /// Fetch one endpoint, then write its raw capture and CSV
    #[instrument(skip(self, endpoint), fields(endpoint = %endpoint.name))]
    pub async fn fetch_endpoint(&self, endpoint: &Endpoint) -> FetchResult<EndpointReport> {
        let fetched = fetch_paged(
            &self.source,
            &endpoint.name,
            self.config.page_size,
            self.config.max_pages,
        )
        .await?;

        if !fetched.stop_reason.is_complete() {
            warn!(
                records = fetched.records.len(),
                "Stopped early ({}), keeping partial results",
                fetched.stop_reason
            );
        }

        let raw_path = if self.config.capture_raw {
            let path = self.config.raw_capture_path(endpoint);
            write_raw_capture(&path, &fetched.raw_pages)?;
            Some(path)
        } else {
            None
        };

        let csv_path = self.config.csv_path(endpoint);
        let csv_path = write_csv(&csv_path, &fetched.records)?.then_some(csv_path);

        Ok(EndpointReport {
            endpoint: endpoint.name.clone(),
            records: fetched.records.len(),
            requests: fetched.requests,
            stop_reason: fetched.stop_reason,
            csv_path,
            raw_path,
        })
    }
}
