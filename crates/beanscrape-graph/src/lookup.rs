//! Bean lookup: lowercased flavor name → display color

use std::collections::HashMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use tracing::{debug, info, warn};

use crate::error::{GraphError, GraphResult};

const FLAVOR_COLUMN: &str = "flavorName";
const COLOR_COLUMN: &str = "backgroundColor";

/// Flavors known to the bean catalogue, with their colors
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BeanLookup {
    colors: HashMap<String, String>,
}

impl BeanLookup {
    /// Load the lookup from a beans CSV
    pub fn load(path: &Path, default_color: &str) -> GraphResult<Self> {
        let file = File::open(path)?;
        let lookup = Self::from_reader(file, path, default_color)?;
        info!("Loaded {} beans from {}", lookup.len(), path.display());
        Ok(lookup)
    }

    /// Load the lookup from any CSV source; `source` names it in errors.
    ///
    /// Flavor names are lowercased and otherwise kept as written. Rows
    /// without a flavor name, or with the wrong number of fields, are
    /// skipped. Rows without a color, or a file without the color column, get
    /// `default_color`. A later row for the same flavor replaces an earlier
    /// one.
    pub fn from_reader<R: Read>(
        reader: R,
        source: &Path,
        default_color: &str,
    ) -> GraphResult<Self> {
        let mut reader = csv::Reader::from_reader(reader);
        let headers = reader.headers()?.clone();

        let flavor_idx = headers
            .iter()
            .position(|h| h == FLAVOR_COLUMN)
            .ok_or_else(|| GraphError::MissingColumn {
                file: source.to_path_buf(),
                column: FLAVOR_COLUMN.to_string(),
            })?;
        let color_idx = headers.iter().position(|h| h == COLOR_COLUMN);
        if color_idx.is_none() {
            warn!(
                "{} has no {} column, using {}",
                source.display(),
                COLOR_COLUMN,
                default_color
            );
        }

        let mut colors = HashMap::new();
        for (line, record) in reader.records().enumerate() {
            let record = match record {
                Ok(record) => record,
                Err(e) => {
                    warn!("Skipping malformed bean row {}: {}", line + 1, e);
                    continue;
                }
            };

            // Names are matched against tag tokens, which are only lowercased
            let flavor = match record.get(flavor_idx) {
                Some(flavor) if !flavor.is_empty() => flavor.to_lowercase(),
                _ => continue,
            };

            let color = color_idx
                .and_then(|idx| record.get(idx))
                .map(str::trim)
                .filter(|color| !color.is_empty())
                .unwrap_or(default_color);

            debug!(%flavor, %color, "Loaded bean");
            colors.insert(flavor, color.to_string());
        }

        Ok(Self { colors })
    }

    /// Color of `flavor`; the name must already be lowercased
    pub fn color(&self, flavor: &str) -> Option<&str> {
        self.colors.get(flavor).map(String::as_str)
    }

    /// Whether `flavor` is a known bean
    pub fn contains(&self, flavor: &str) -> bool {
        self.colors.contains_key(flavor)
    }

    /// Number of beans
    pub fn len(&self) -> usize {
        self.colors.len()
    }

    /// Whether the lookup is empty
    pub fn is_empty(&self) -> bool {
        self.colors.is_empty()
    }

    /// Flavor names in sorted order
    pub fn flavors(&self) -> Vec<&str> {
        let mut names: Vec<_> = self.colors.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for BeanLookup {
    /// Build a lookup directly; flavor names are lowercased
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            colors: iter
                .into_iter()
                .map(|(k, v)| (k.into().to_lowercase(), v.into()))
                .collect(),
        }
    }
}
