use serde_json::Value;
use std::path::Path;
use tracing::debug;

use super::{read_page_items, ItemRef};
use crate::error::ExportError;
use crate::model::{optional_text, FlatPlayerRecord, Resource};

pub fn flatten_players(
    data_dir: &Path,
    page_count: u32,
) -> Result<Vec<FlatPlayerRecord>, ExportError> {
    let mut records = Vec::new();
    for page in 1..=page_count {
        let items = read_page_items(data_dir, Resource::Persons, page)?;
        debug!(page, items = items.len(), "flattening persons page");
        for (index, item) in items.iter().enumerate() {
            let at = ItemRef {
                resource: Resource::Persons,
                page,
                index,
            };
            records.push(flatten_player(item, at)?);
        }
    }
    Ok(records)
}

/// Identity fields are required. Email, birth date and zip fall back to `"unknown"`.
pub fn flatten_player(item: &Value, at: ItemRef) -> Result<FlatPlayerRecord, ExportError> {
    let player_id = at.required(item, "id")?;
    let first_name = at.required(item, "first_name")?;
    let last_name = at.required(item, "last_name")?;
    let full_name = at.required(item, "full_name")?;
    let gender = at.required(item, "gender")?;

    let email = optional_text(item, &["email_address"]);
    let birth_date = optional_text(item, &["birth_date"]);
    let zip = optional_text(item, &["Location", "postal_code"]);

    Ok(FlatPlayerRecord {
        player_id,
        email: email.or_unknown(),
        first_name,
        last_name,
        full_name,
        gender,
        birth_date: birth_date.or_unknown(),
        zip: zip.or_unknown(),
    })
}
