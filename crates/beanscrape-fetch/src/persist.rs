//! Writing fetched data to disk
//!
//! Records become one CSV per endpoint, raw page bodies one JSON document.
//! All writes are blocking and finish before the functions return.

use std::borrow::Cow;
use std::collections::BTreeSet;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;

use serde::Serialize;
use serde_json::ser::PrettyFormatter;
use serde_json::Value;
use tracing::{info, warn};

use crate::error::FetchResult;
use crate::Record;

/// Sorted union of the keys of every record
pub fn csv_header(records: &[Record]) -> Vec<String> {
    records
        .iter()
        .flat_map(|record| record.keys())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .cloned()
        .collect()
}

/// Text written to a CSV cell for `value`.
///
/// Nested arrays and objects are written as compact JSON.
pub fn cell_value(value: &Value) -> Cow<'_, str> {
    match value {
        Value::Null => Cow::Borrowed(""),
        Value::String(s) => Cow::Borrowed(s),
        Value::Bool(b) => Cow::Owned(b.to_string()),
        Value::Number(n) => Cow::Owned(n.to_string()),
        Value::Array(_) | Value::Object(_) => Cow::Owned(value.to_string()),
    }
}

fn ensure_parent(path: &Path) -> FetchResult<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    Ok(())
}

/// Write `records` to `path` with a header derived from their keys.
///
/// Returns `false` without touching the filesystem when there is nothing to
/// write.
pub fn write_csv(path: &Path, records: &[Record]) -> FetchResult<bool> {
    if records.is_empty() {
        warn!("No records for {}", path.display());
        return Ok(false);
    }

    ensure_parent(path)?;

    let header = csv_header(records);
    let mut writer = csv::Writer::from_path(path)?;
    writer.write_record(&header)?;

    for record in records {
        let row = header.iter().map(|key| match record.get(key) {
            Some(value) => cell_value(value),
            None => Cow::Borrowed(""),
        });
        writer.write_record(row.map(|cell| cell.into_owned()))?;
    }

    writer.flush()?;
    info!("Saved {} records → {}", records.len(), path.display());
    Ok(true)
}

/// Write every raw page body to `path` as one pretty-printed JSON array
pub fn write_raw_capture(path: &Path, pages: &[Value]) -> FetchResult<()> {
    ensure_parent(path)?;

    let mut writer = BufWriter::new(File::create(path)?);
    let mut serializer =
        serde_json::Serializer::with_formatter(&mut writer, PrettyFormatter::with_indent(b"    "));
    pages.serialize(&mut serializer)?;
    writer.flush()?;

    info!("Saved {} raw pages → {}", pages.len(), path.display());
    Ok(())
}
