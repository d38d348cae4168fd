use serde_json::Value;
use std::path::Path;
use tracing::{debug, warn};

use super::{read_page_items, ItemRef};
use crate::error::ExportError;
use crate::model::{scalar_text, FlatProductRecord, Resource};

/// One flat record per product item across pages `1..=page_count`.
pub fn flatten_products(
    data_dir: &Path,
    page_count: u32,
) -> Result<Vec<FlatProductRecord>, ExportError> {
    let mut records = Vec::new();
    for page in 1..=page_count {
        let items = read_page_items(data_dir, Resource::Products, page)?;
        debug!(page, items = items.len(), "flattening products page");
        for (index, item) in items.iter().enumerate() {
            let at = ItemRef {
                resource: Resource::Products,
                page,
                index,
            };
            records.push(flatten_product(item, at)?);
        }
    }
    Ok(records)
}

/// Standalone products are their own family root; variation family members take
/// the family id of their first variation entry. The item's own id, name and cost
/// are always emitted.
pub fn flatten_product(item: &Value, at: ItemRef) -> Result<FlatProductRecord, ExportError> {
    let product_id = at.required(item, "id")?;
    let product = at.required(item, "name")?;
    let cost = at.required(item, "cost")?;

    let variations = item
        .get("ProductVariations")
        .and_then(Value::as_array)
        .ok_or_else(|| at.malformed("ProductVariations"))?;

    let parent_product_id = match variations.first() {
        None => product_id.clone(),
        Some(first) => {
            let family = first
                .get("family_product_id")
                .and_then(scalar_text)
                .ok_or_else(|| at.malformed("ProductVariations[0].family_product_id"))?;
            check_family(variations, &family, &product_id, at);
            family
        }
    };

    Ok(FlatProductRecord {
        product_id,
        parent_product_id,
        product,
        cost,
    })
}

/// Every variation entry is expected to share the first entry's family id.
/// A disagreement is reported but the first entry still wins.
fn check_family(variations: &[Value], family: &str, product_id: &str, at: ItemRef) {
    for (position, variation) in variations.iter().enumerate().skip(1) {
        let other = variation.get("family_product_id").and_then(scalar_text);
        if other.as_deref() != Some(family) {
            warn!(
                product_id,
                page = at.page,
                index = at.index,
                position,
                expected = family,
                found = other.as_deref().unwrap_or("<missing>"),
                "variation family id disagrees with first entry"
            );
        }
    }
}
