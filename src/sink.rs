//! Delimited-file output for flat records. The header row comes from the record's field names.
use serde::Serialize;
use std::fs;
use std::path::Path;
use tracing::info;

use crate::error::SinkError;

/// Write `records` as CSV to `path`, replacing any existing file.
/// An empty slice is rejected before anything is created on disk.
pub fn write_table<R: Serialize>(path: &Path, records: &[R]) -> Result<(), SinkError> {
    if records.is_empty() {
        return Err(SinkError::EmptyInput);
    }
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }

    let mut writer = csv::Writer::from_path(path)?;
    for record in records {
        writer.serialize(record)?;
    }
    writer.flush()?;
    info!(path=%path.display(), rows = records.len(), "wrote table");
    Ok(())
}
