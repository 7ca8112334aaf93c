//! Page sources
//!
//! The pager only needs "give me page N of endpoint E". [`HttpPageSource`]
//! answers that over HTTP; tests substitute their own implementation.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use tracing::debug;

use crate::config::FetchConfig;
use crate::error::FetchResult;

/// One raw page as received from the API
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageResponse {
    /// Fully-qualified URL that was requested
    pub url: String,
    /// HTTP status code
    pub status: u16,
    /// Unparsed response body
    pub body: String,
}

impl PageResponse {
    /// Whether the status is 200 OK
    pub fn is_ok(&self) -> bool {
        self.status == 200
    }
}

/// Something that can serve pages of an endpoint
#[async_trait]
pub trait PageSource: Send + Sync {
    /// Request page `page_index` (1-based) of `endpoint` with `page_size` records.
    ///
    /// Any HTTP status is a successful return; only a missing response is an error.
    async fn fetch_page(
        &self,
        endpoint: &str,
        page_index: u32,
        page_size: u32,
    ) -> FetchResult<PageResponse>;
}

/// [`PageSource`] backed by a `reqwest` client
#[derive(Debug, Clone)]
pub struct HttpPageSource {
    base_url: String,
    client: Client,
}

impl HttpPageSource {
    /// Creates a new HttpPageSource from the fetch configuration
    pub fn new(config: &FetchConfig) -> FetchResult<Self> {
        let mut builder = Client::builder();
        if let Some(secs) = config.timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }

        Ok(Self {
            base_url: config.base_url.clone(),
            client: builder.build()?,
        })
    }

    /// URL of one page of `endpoint`
    pub fn page_url(&self, endpoint: &str, page_index: u32, page_size: u32) -> String {
        format!(
            "{}/{}?pageIndex={}&pageSize={}",
            self.base_url, endpoint, page_index, page_size
        )
    }
}

#[async_trait]
impl PageSource for HttpPageSource {
    async fn fetch_page(
        &self,
        endpoint: &str,
        page_index: u32,
        page_size: u32,
    ) -> FetchResult<PageResponse> {
        let url = self.page_url(endpoint, page_index, page_size);
        let response = self.client.get(&url).send().await?;
        let status = response.status().as_u16();
        let body = response.text().await?;

        debug!(%url, status, bytes = body.len(), "Received page");

        Ok(PageResponse { url, status, body })
    }
}
