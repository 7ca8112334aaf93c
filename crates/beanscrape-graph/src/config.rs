//! Configuration for the graph builder

use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;
use tracing::{info, warn};

use crate::error::{GraphError, GraphResult};
use crate::tags::TagFormat;

/// Color given to beans whose CSV row has none
pub const DEFAULT_COLOR: &str = "#CCCCCC";

/// Graph builder configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphConfig {
    /// Directory holding the fetched CSVs; the SVG is written here too
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// Bean lookup file name
    #[serde(default = "default_beans_file")]
    pub beans_file: String,

    /// Combinations file name
    #[serde(default = "default_combinations_file")]
    pub combinations_file: String,

    /// Rendered graph file name
    #[serde(default = "default_svg_file")]
    pub svg_file: String,

    /// Fallback node color
    #[serde(default = "default_color")]
    pub default_color: String,

    /// Encoding of the `tag` column
    #[serde(default)]
    pub tag_format: TagFormat,

    /// Force simulation steps
    #[serde(default = "default_layout_iterations")]
    pub layout_iterations: u32,

    /// Title drawn above the graph
    #[serde(default = "default_title")]
    pub title: String,
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("output")
}

fn default_beans_file() -> String {
    "beans.csv".to_string()
}

fn default_combinations_file() -> String {
    "combinations.csv".to_string()
}

fn default_svg_file() -> String {
    "flavor_graph.svg".to_string()
}

fn default_color() -> String {
    DEFAULT_COLOR.to_string()
}

fn default_layout_iterations() -> u32 {
    400
}

fn default_title() -> String {
    "Flavor Combination Network".to_string()
}

impl GraphConfig {
    /// Load configuration from environment variables
    pub fn load() -> GraphResult<Self> {
        let config = Self::from_lookup(|key| env::var(key).ok())?;
        info!(
            data_dir = %config.data_dir.display(),
            tag_format = %config.tag_format,
            "Loaded graph configuration"
        );
        Ok(config)
    }

    /// Build a configuration from defaults plus the overrides `lookup` yields
    pub fn from_lookup<F>(lookup: F) -> GraphResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(dir) = lookup("BEANSCRAPE_OUTPUT_DIR") {
            config.data_dir = PathBuf::from(dir);
        }

        if let Some(color) = lookup("BEANSCRAPE_DEFAULT_COLOR") {
            config.default_color = color;
        }

        if let Some(format) = lookup("BEANSCRAPE_TAG_FORMAT") {
            match format.parse::<TagFormat>() {
                Ok(format) => config.tag_format = format,
                Err(e) => warn!("Invalid BEANSCRAPE_TAG_FORMAT value: {}", e),
            }
        }

        if let Some(iterations) = lookup("BEANSCRAPE_LAYOUT_ITERATIONS") {
            match iterations.parse::<u32>() {
                Ok(n) => config.layout_iterations = n,
                Err(_) => warn!("Invalid BEANSCRAPE_LAYOUT_ITERATIONS value: {}", iterations),
            }
        }

        if config.default_color.trim().is_empty() {
            return Err(GraphError::ConfigError(
                "Default color must not be empty".to_string(),
            ));
        }

        Ok(config)
    }

    /// Path of the bean lookup CSV
    pub fn beans_path(&self) -> PathBuf {
        self.data_dir.join(&self.beans_file)
    }

    /// Path of the combinations CSV
    pub fn combinations_path(&self) -> PathBuf {
        self.data_dir.join(&self.combinations_file)
    }

    /// Path the SVG is written to
    pub fn svg_path(&self) -> PathBuf {
        self.data_dir.join(&self.svg_file)
    }
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            beans_file: default_beans_file(),
            combinations_file: default_combinations_file(),
            svg_file: default_svg_file(),
            default_color: default_color(),
            tag_format: TagFormat::default(),
            layout_iterations: default_layout_iterations(),
            title: default_title(),
        }
    }
}
