//! The page loop.
//!
//! Pages are requested strictly one after another, starting at index 1,
//! until the API hands back a page shorter than requested or something
//! tells the loop to give up. Whatever was accumulated before an early
//! stop is kept.

use std::fmt;

use serde_json::Value;
use tracing::{debug, info, warn};

use crate::error::FetchResult;
use crate::source::PageSource;
use crate::Record;

/// Why the page loop ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// Last page held fewer records than requested
    ShortPage,
    /// A page held no records at all
    EmptyPage,
    /// The API answered with a non-200 status
    HttpStatus(u16),
    /// The body was not valid JSON
    InvalidBody,
    /// The body was JSON, but neither an array nor an `items` mapping
    UnexpectedFormat,
    /// The configured page limit was reached
    PageLimit,
}

impl StopReason {
    /// Whether the endpoint was read to its end
    pub fn is_complete(&self) -> bool {
        matches!(self, StopReason::ShortPage | StopReason::EmptyPage)
    }
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StopReason::ShortPage => write!(f, "short page"),
            StopReason::EmptyPage => write!(f, "empty page"),
            StopReason::HttpStatus(status) => write!(f, "got {}", status),
            StopReason::InvalidBody => write!(f, "invalid JSON body"),
            StopReason::UnexpectedFormat => write!(f, "unexpected format"),
            StopReason::PageLimit => write!(f, "page limit reached"),
        }
    }
}

/// Everything collected for one endpoint
#[derive(Debug, Clone)]
pub struct PagedFetch {
    /// Records of all pages, in arrival order
    pub records: Vec<Record>,
    /// Parsed body of every non-empty page, in arrival order
    pub raw_pages: Vec<Value>,
    /// Number of requests issued
    pub requests: u32,
    /// Why the loop ended
    pub stop_reason: StopReason,
}

/// Pull the record array out of a page body.
///
/// Accepts `{"items": [...], ...}` or a bare array; anything else is `None`.
pub fn page_items(body: &Value) -> Option<&Vec<Value>> {
    match body {
        Value::Object(map) => map.get("items").and_then(Value::as_array),
        Value::Array(items) => Some(items),
        _ => None,
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Fetch every page of `endpoint`.
///
/// Errors only when a request gets no response at all; status, parse and
/// shape problems end the loop with the matching [`StopReason`].
pub async fn fetch_paged(
    source: &dyn PageSource,
    endpoint: &str,
    page_size: u32,
    max_pages: u32,
) -> FetchResult<PagedFetch> {
    let mut records = Vec::new();
    let mut raw_pages = Vec::new();
    let mut requests = 0;
    let mut page_index = 1;

    let stop_reason = loop {
        if requests >= max_pages {
            warn!(endpoint, max_pages, "Stop: page limit reached");
            break StopReason::PageLimit;
        }

        info!(endpoint, page_index, page_size, "Fetching page");
        let page = source.fetch_page(endpoint, page_index, page_size).await?;
        requests += 1;
        debug!("Fetched {} ({})", page.url, page.status);

        if !page.is_ok() {
            warn!("Stop: got {}", page.status);
            break StopReason::HttpStatus(page.status);
        }

        let body: Value = match serde_json::from_str(&page.body) {
            Ok(body) => body,
            Err(e) => {
                warn!(endpoint, page_index, "Stop: response is not valid JSON: {}", e);
                break StopReason::InvalidBody;
            }
        };

        let Some(items) = page_items(&body) else {
            warn!("Unexpected format for {}: {}", endpoint, json_kind(&body));
            break StopReason::UnexpectedFormat;
        };

        if items.is_empty() {
            break StopReason::EmptyPage;
        }

        let page_len = items.len();
        for item in items {
            match item {
                Value::Object(record) => records.push(record.clone()),
                other => warn!(
                    endpoint,
                    page_index,
                    "Skipping non-object record: {}",
                    json_kind(other)
                ),
            }
        }
        raw_pages.push(body);

        debug!(endpoint, page_index, page_len, total = records.len(), "Page accumulated");

        if page_len < page_size as usize {
            break StopReason::ShortPage;
        }

        page_index += 1;
    };

    Ok(PagedFetch {
        records,
        raw_pages,
        requests,
        stop_reason,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FetchError;
    use crate::source::PageResponse;
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::Mutex;

    /// Serves a fixed script of responses, one per call
    struct ScriptedSource {
        pages: Vec<(u16, String)>,
        calls: Mutex<Vec<u32>>,
    }

    impl ScriptedSource {
        fn new(pages: Vec<(u16, String)>) -> Self {
            Self {
                pages,
                calls: Mutex::new(Vec::new()),
            }
        }

        fn json_pages(pages: Vec<Value>) -> Self {
            Self::new(pages.into_iter().map(|p| (200, p.to_string())).collect())
        }

        fn calls(&self) -> Vec<u32> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl PageSource for ScriptedSource {
        async fn fetch_page(
            &self,
            endpoint: &str,
            page_index: u32,
            page_size: u32,
        ) -> FetchResult<PageResponse> {
            self.calls.lock().unwrap().push(page_index);
            let (status, body) = self
                .pages
                .get(page_index as usize - 1)
                .cloned()
                .unwrap_or((200, "[]".to_string()));
            Ok(PageResponse {
                url: format!("mock://{}?pageIndex={}&pageSize={}", endpoint, page_index, page_size),
                status,
                body,
            })
        }
    }

    /// A source whose every request fails before a response exists
    struct OfflineSource;

    #[async_trait]
    impl PageSource for OfflineSource {
        async fn fetch_page(&self, _: &str, _: u32, _: u32) -> FetchResult<PageResponse> {
            Err(FetchError::ConfigError("offline".to_string()))
        }
    }

    fn records(start: usize, count: usize) -> Vec<Value> {
        (start..start + count).map(|i| json!({ "beanId": i })).collect()
    }

    #[tokio::test]
    async fn test_items_mapping_pages() {
        let source = ScriptedSource::json_pages(vec![
            json!({ "items": records(0, 3), "pageIndex": 1, "pageSize": 3, "count": 5 }),
            json!({ "items": records(3, 2), "pageIndex": 2, "pageSize": 3, "count": 5 }),
        ]);

        let fetched = fetch_paged(&source, "beans", 3, 100).await.unwrap();

        assert_eq!(fetched.records.len(), 5);
        assert_eq!(fetched.records[4]["beanId"], json!(4));
        assert_eq!(fetched.raw_pages.len(), 2);
        assert_eq!(fetched.requests, 2);
        assert_eq!(fetched.stop_reason, StopReason::ShortPage);
        assert_eq!(source.calls(), vec![1, 2]);
    }

    #[tokio::test]
    async fn test_bare_array_pages() {
        let source = ScriptedSource::json_pages(vec![Value::Array(records(0, 2))]);

        let fetched = fetch_paged(&source, "facts", 10, 100).await.unwrap();

        assert_eq!(fetched.records.len(), 2);
        assert_eq!(fetched.stop_reason, StopReason::ShortPage);
    }

    #[tokio::test]
    async fn test_full_last_page_needs_an_empty_page_to_stop() {
        let source = ScriptedSource::json_pages(vec![
            Value::Array(records(0, 2)),
            Value::Array(records(2, 2)),
            Value::Array(Vec::new()),
        ]);

        let fetched = fetch_paged(&source, "facts", 2, 100).await.unwrap();

        assert_eq!(fetched.records.len(), 4);
        assert_eq!(fetched.raw_pages.len(), 2);
        assert_eq!(fetched.requests, 3);
        assert_eq!(fetched.stop_reason, StopReason::EmptyPage);
    }

    #[tokio::test]
    async fn test_error_status_keeps_partial_results() {
        let source = ScriptedSource::new(vec![
            (200, Value::Array(records(0, 2)).to_string()),
            (500, "oops".to_string()),
        ]);

        let fetched = fetch_paged(&source, "recipes", 2, 100).await.unwrap();

        assert_eq!(fetched.records.len(), 2);
        assert_eq!(fetched.stop_reason, StopReason::HttpStatus(500));
        assert!(!fetched.stop_reason.is_complete());
    }

    #[tokio::test]
    async fn test_invalid_json_stops() {
        let source = ScriptedSource::new(vec![(200, "<html>".to_string())]);

        let fetched = fetch_paged(&source, "recipes", 2, 100).await.unwrap();

        assert!(fetched.records.is_empty());
        assert_eq!(fetched.stop_reason, StopReason::InvalidBody);
    }

    #[tokio::test]
    async fn test_unexpected_shape_stops() {
        let source = ScriptedSource::json_pages(vec![json!({ "message": "maintenance" })]);

        let fetched = fetch_paged(&source, "recipes", 2, 100).await.unwrap();

        assert!(fetched.records.is_empty());
        assert!(fetched.raw_pages.is_empty());
        assert_eq!(fetched.stop_reason, StopReason::UnexpectedFormat);
    }

    #[tokio::test]
    async fn test_page_limit_bounds_a_server_that_never_ends() {
        let pages = (0..10).map(|i| Value::Array(records(i * 2, 2))).collect();
        let source = ScriptedSource::json_pages(pages);

        let fetched = fetch_paged(&source, "beans", 2, 3).await.unwrap();

        assert_eq!(fetched.requests, 3);
        assert_eq!(fetched.records.len(), 6);
        assert_eq!(fetched.stop_reason, StopReason::PageLimit);
    }

    #[tokio::test]
    async fn test_non_object_items_are_skipped_but_counted() {
        let source = ScriptedSource::json_pages(vec![json!([{ "a": 1 }, 42, "x"])]);

        let fetched = fetch_paged(&source, "beans", 3, 100).await.unwrap();

        assert_eq!(fetched.records.len(), 1);
        assert_eq!(fetched.requests, 2);
        assert_eq!(fetched.stop_reason, StopReason::EmptyPage);
    }

    #[tokio::test]
    async fn test_transport_failure_is_an_error() {
        let result = fetch_paged(&OfflineSource, "beans", 2, 100).await;
        assert!(result.is_err());
    }

    #[test]
    fn test_page_items_shapes() {
        assert_eq!(page_items(&json!({ "items": [1, 2] })).map(Vec::len), Some(2));
        assert_eq!(page_items(&json!([1])).map(Vec::len), Some(1));
        assert!(page_items(&json!({ "items": "nope" })).is_none());
        assert!(page_items(&json!({ "count": 3 })).is_none());
        assert!(page_items(&json!("text")).is_none());
    }
}
