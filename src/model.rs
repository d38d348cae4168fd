use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Substituted for optional person fields that are absent or malformed.
pub const UNKNOWN: &str = "unknown";

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Resource {
    Products,
    Persons,
}

impl Resource {
    pub fn as_str(&self) -> &'static str {
        match self {
            Resource::Products => "products",
            Resource::Persons => "persons",
        }
    }

    /// Stem used for page files and the output table.
    pub fn file_stem(&self) -> &'static str {
        match self {
            Resource::Products => "products",
            Resource::Persons => "players",
        }
    }

    /// Minimal query used only to read the total `count`.
    pub fn probe_query(&self) -> String {
        match self {
            Resource::Products => "products?site_list_scope=network&per_page=1".to_string(),
            Resource::Persons => "persons?per_page=1".to_string(),
        }
    }

    pub fn page_query(&self, page_size: u32, page: u32) -> String {
        match self {
            Resource::Products => format!(
                "products?site_list_scope=network&fields=ProductVariations&per_page={}&page={}",
                page_size, page
            ),
            Resource::Persons => {
                format!("persons?fields=Location&per_page={}&page={}", page_size, page)
            }
        }
    }

    pub fn output_file_name(&self) -> String {
        format!("{}.csv", self.file_stem())
    }
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An optional source field, resolved to [`UNKNOWN`] only when a flat record is built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Field<T> {
    Present(T),
    Absent,
}

impl Field<String> {
    pub fn or_unknown(self) -> String {
        match self {
            Field::Present(v) => v,
            Field::Absent => UNKNOWN.to_string(),
        }
    }
}

/// Render a JSON scalar the way it should appear in a table cell.
/// Nulls, arrays and objects have no cell form.
pub fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}

/// Walk `path` through nested objects; anything missing or of the wrong shape is `Absent`.
pub fn optional_text(item: &Value, path: &[&str]) -> Field<String> {
    let mut cur = item;
    for key in path {
        match cur.as_object().and_then(|obj| obj.get(*key)) {
            Some(next) => cur = next,
            None => return Field::Absent,
        }
    }
    match scalar_text(cur) {
        Some(text) => Field::Present(text),
        None => Field::Absent,
    }
}

/// Column order of this struct is the products table header.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlatProductRecord {
    pub product_id: String,
    pub parent_product_id: String,
    pub product: String,
    pub cost: String,
}

/// Column order of this struct is the players table header.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlatPlayerRecord {
    pub player_id: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub full_name: String,
    pub gender: String,
    pub birth_date: String,
    pub zip: String,
}
