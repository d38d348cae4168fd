//! Turn saved API pages into flat, uniformly keyed records.
//!
//! Pages are read in ascending page order and items keep their order within a
//! page, so re-running against the same files always yields the same output.

use serde_json::Value;
use std::fs;
use std::path::Path;

use crate::error::ExportError;
use crate::fetch::page_path;
use crate::model::{scalar_text, Resource};

pub mod players;
pub mod products;

pub use players::{flatten_player, flatten_players};
pub use products::{flatten_product, flatten_products};

/// Read one saved page and return its `result` items.
pub(crate) fn read_page_items(
    data_dir: &Path,
    resource: Resource,
    page: u32,
) -> Result<Vec<Value>, ExportError> {
    let path = page_path(data_dir, resource, page);
    let raw = fs::read_to_string(&path).map_err(|source| ExportError::PageRead {
        path: path.clone(),
        source,
    })?;
    let mut doc: Value = serde_json::from_str(&raw).map_err(|e| ExportError::MalformedPage {
        resource,
        page,
        reason: format!("invalid JSON: {}", e),
    })?;
    match doc.get_mut("result").map(Value::take) {
        Some(Value::Array(items)) => Ok(items),
        Some(_) => Err(ExportError::MalformedPage {
            resource,
            page,
            reason: "`result` is not an array".to_string(),
        }),
        None => Err(ExportError::MalformedPage {
            resource,
            page,
            reason: "no `result` field".to_string(),
        }),
    }
}

/// Position of an item within a resource's saved pages, for error reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ItemRef {
    pub resource: Resource,
    pub page: u32,
    pub index: usize,
}

impl ItemRef {
    pub(crate) fn malformed(&self, field: &'static str) -> ExportError {
        ExportError::MalformedRecord {
            resource: self.resource,
            page: self.page,
            index: self.index,
            field,
        }
    }

    /// A field with no sentinel fallback: absent, null or non-scalar is an error.
    pub(crate) fn required(&self, item: &Value, field: &'static str) -> Result<String, ExportError> {
        item.get(field)
            .and_then(scalar_text)
            .ok_or_else(|| self.malformed(field))
    }
}
