//! Mirrors the paged collections of the Jelly Belly wiki API to disk.
//!
//! For each configured [`Endpoint`] the [`Fetcher`] walks the pages of the
//! collection, writes the records to a CSV whose columns are the union of all
//! record keys, and optionally keeps every raw page body as JSON.

pub mod config;
pub mod error;
pub mod pager;
pub mod persist;
pub mod runner;
pub mod source;

/// One API record; the shape is whatever the API returns
pub type Record = serde_json::Map<String, serde_json::Value>;

pub use config::{Endpoint, FetchConfig};
pub use error::{FetchError, FetchResult};
pub use pager::{fetch_paged, PagedFetch, StopReason};
pub use persist::{write_csv, write_raw_capture};
pub use runner::{EndpointFailure, EndpointReport, Fetcher, RunSummary};
pub use source::{HttpPageSource, PageResponse, PageSource};
