//! Configuration for the fetcher
//!
//! Defaults reproduce the public Jelly Belly wiki API setup. Every value can
//! be overridden through `BEANSCRAPE_*` environment variables.

use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;
use tracing::{info, warn};

use crate::error::{FetchError, FetchResult};

/// A remote collection and the CSV file it is flattened into
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Endpoint {
    /// Path segment appended to the base URL
    pub name: String,
    /// File name of the CSV written under the output directory
    pub csv_name: String,
}

impl Endpoint {
    /// Create a new endpoint descriptor
    pub fn new(name: impl Into<String>, csv_name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            csv_name: csv_name.into(),
        }
    }

    /// File name of the raw page capture for this endpoint
    pub fn raw_capture_name(&self) -> String {
        format!("{}_api_response.json", self.name)
    }
}

/// Fetcher configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetchConfig {
    /// API root, without trailing slash
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Endpoints fetched in order
    #[serde(default = "default_endpoints")]
    pub endpoints: Vec<Endpoint>,

    /// Records requested per page
    #[serde(default = "default_page_size")]
    pub page_size: u32,

    /// Upper bound on requests per endpoint
    #[serde(default = "default_max_pages")]
    pub max_pages: u32,

    /// Also write every raw page body to `{endpoint}_api_response.json`
    #[serde(default = "default_capture_raw")]
    pub capture_raw: bool,

    /// Directory receiving CSV and JSON output
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,

    /// HTTP timeout; `None` keeps the client default
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

fn default_base_url() -> String {
    "https://jellybellywikiapi.onrender.com/api".to_string()
}

fn default_endpoints() -> Vec<Endpoint> {
    vec![
        Endpoint::new("beans", "beans.csv"),
        Endpoint::new("recipes", "recipes.csv"),
        Endpoint::new("combinations", "combinations.csv"),
        Endpoint::new("facts", "facts.csv"),
        Endpoint::new("mileStones", "milestones.csv"),
    ]
}

fn default_page_size() -> u32 {
    2000
}

fn default_max_pages() -> u32 {
    10_000
}

fn default_capture_raw() -> bool {
    true
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("output")
}

impl FetchConfig {
    /// Load configuration from environment variables
    pub fn load() -> FetchResult<Self> {
        let config = Self::from_lookup(|key| env::var(key).ok())?;
        info!(
            base_url = %config.base_url,
            endpoints = config.endpoints.len(),
            page_size = config.page_size,
            capture_raw = config.capture_raw,
            "Loaded fetch configuration"
        );
        Ok(config)
    }

    /// Build a configuration from defaults plus the overrides `lookup` yields
    pub fn from_lookup<F>(lookup: F) -> FetchResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(base_url) = lookup("BEANSCRAPE_BASE_URL") {
            config.base_url = base_url;
        }

        if let Some(page_size) = lookup("BEANSCRAPE_PAGE_SIZE") {
            match page_size.parse::<u32>() {
                Ok(size) => config.page_size = size,
                Err(_) => warn!("Invalid BEANSCRAPE_PAGE_SIZE value: {}", page_size),
            }
        }

        if let Some(max_pages) = lookup("BEANSCRAPE_MAX_PAGES") {
            match max_pages.parse::<u32>() {
                Ok(max) => config.max_pages = max,
                Err(_) => warn!("Invalid BEANSCRAPE_MAX_PAGES value: {}", max_pages),
            }
        }

        if let Some(capture_raw) = lookup("BEANSCRAPE_CAPTURE_RAW") {
            config.capture_raw = capture_raw.eq_ignore_ascii_case("true") || capture_raw == "1";
        }

        if let Some(output_dir) = lookup("BEANSCRAPE_OUTPUT_DIR") {
            config.output_dir = PathBuf::from(output_dir);
        }

        if let Some(timeout) = lookup("BEANSCRAPE_TIMEOUT_SECS") {
            match timeout.parse::<u64>() {
                Ok(secs) => config.timeout_secs = Some(secs),
                Err(_) => warn!("Invalid BEANSCRAPE_TIMEOUT_SECS value: {}", timeout),
            }
        }

        config.base_url = config.base_url.trim_end_matches('/').to_string();
        config.validate()?;
        Ok(config)
    }

    /// Reject values the page loop cannot work with
    pub fn validate(&self) -> FetchResult<()> {
        if self.base_url.is_empty() {
            return Err(FetchError::ConfigError("Base URL is required".to_string()));
        }

        if self.page_size == 0 {
            return Err(FetchError::ConfigError(
                "Page size must be greater than zero".to_string(),
            ));
        }

        if self.max_pages == 0 {
            return Err(FetchError::ConfigError(
                "Max pages must be greater than zero".to_string(),
            ));
        }

        Ok(())
    }

    /// Path of the CSV written for `endpoint`
    pub fn csv_path(&self, endpoint: &Endpoint) -> PathBuf {
        self.output_dir.join(&endpoint.csv_name)
    }

    /// Path of the raw capture written for `endpoint`
    pub fn raw_capture_path(&self, endpoint: &Endpoint) -> PathBuf {
        self.output_dir.join(endpoint.raw_capture_name())
    }
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            endpoints: default_endpoints(),
            page_size: default_page_size(),
            max_pages: default_max_pages(),
            capture_raw: default_capture_raw(),
            output_dir: default_output_dir(),
            timeout_secs: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = FetchConfig::from_lookup(|_| None).unwrap();
        assert_eq!(config.base_url, "https://jellybellywikiapi.onrender.com/api");
        assert_eq!(config.page_size, 2000);
        assert!(config.capture_raw);
        assert_eq!(config.output_dir, PathBuf::from("output"));

        let names: Vec<_> = config.endpoints.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, ["beans", "recipes", "combinations", "facts", "mileStones"]);
        assert_eq!(config.endpoints[4].csv_name, "milestones.csv");
    }

    #[test]
    fn test_env_overrides() {
        let config = FetchConfig::from_lookup(lookup_from(&[
            ("BEANSCRAPE_BASE_URL", "http://localhost:9000/api/"),
            ("BEANSCRAPE_PAGE_SIZE", "50"),
            ("BEANSCRAPE_CAPTURE_RAW", "false"),
            ("BEANSCRAPE_OUTPUT_DIR", "/tmp/beans"),
            ("BEANSCRAPE_TIMEOUT_SECS", "5"),
        ]))
        .unwrap();

        assert_eq!(config.base_url, "http://localhost:9000/api");
        assert_eq!(config.page_size, 50);
        assert!(!config.capture_raw);
        assert_eq!(config.output_dir, PathBuf::from("/tmp/beans"));
        assert_eq!(config.timeout_secs, Some(5));
    }

    #[test]
    fn test_invalid_numbers_are_ignored() {
        let config = FetchConfig::from_lookup(lookup_from(&[
            ("BEANSCRAPE_PAGE_SIZE", "lots"),
            ("BEANSCRAPE_MAX_PAGES", "-1"),
        ]))
        .unwrap();

        assert_eq!(config.page_size, 2000);
        assert_eq!(config.max_pages, 10_000);
    }

    #[test]
    fn test_zero_page_size_is_rejected() {
        let result = FetchConfig::from_lookup(lookup_from(&[("BEANSCRAPE_PAGE_SIZE", "0")]));
        assert!(matches!(result, Err(FetchError::ConfigError(_))));
    }

    #[test]
    fn test_output_paths() {
        let config = FetchConfig::default();
        let endpoint = Endpoint::new("mileStones", "milestones.csv");
        assert_eq!(config.csv_path(&endpoint), PathBuf::from("output/milestones.csv"));
        assert_eq!(
            config.raw_capture_path(&endpoint),
            PathBuf::from("output/mileStones_api_response.json")
        );
    }
}
