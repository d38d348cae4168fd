//! Paginated download of a resource: probe the total count, then save every page to disk.
use anyhow::anyhow;
use serde_json::Value;
use std::num::NonZeroU32;
use std::path::{Path, PathBuf};
use tracing::{debug, info, instrument};

use crate::config::ExportSettings;
use crate::error::ExportError;
use crate::model::Resource;
use crate::topscore::QueryExecutor;

/// Digits in the zero-padded page number of a page file name.
pub const PAGE_NUMBER_WIDTH: usize = 5;
pub const MAX_PAGES: u64 = 99_999;

/// Result of a completed fetch. Pages `1..=page_count` exist under the data dir.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchedPages {
    pub resource: Resource,
    pub declared_count: u64,
    pub page_count: u32,
}

impl FetchedPages {
    pub fn is_empty(&self) -> bool {
        self.page_count == 0
    }
}

pub fn page_count(count: u64, page_size: NonZeroU32) -> u64 {
    count.div_ceil(u64::from(page_size.get()))
}

/// `productsPage00001.json`; lexicographic and numeric order coincide.
pub fn page_file_name(resource: Resource, page: u32) -> String {
    format!(
        "{}Page{:0width$}.json",
        resource.file_stem(),
        page,
        width = PAGE_NUMBER_WIDTH
    )
}

pub fn page_path(data_dir: &Path, resource: Resource, page: u32) -> PathBuf {
    data_dir.join(page_file_name(resource, page))
}

fn read_count(response: &Value) -> anyhow::Result<u64> {
    let count = response
        .get("count")
        .ok_or_else(|| anyhow!("response has no `count` field"))?;
    count
        .as_u64()
        .ok_or_else(|| anyhow!("`count` is not a non-negative integer: {}", count))
}

/// Issue the `per_page=1` probe and return the declared total item count.
pub async fn probe_count(
    executor: &dyn QueryExecutor,
    resource: Resource,
) -> Result<u64, ExportError> {
    let response = executor
        .run_query(&resource.probe_query())
        .await
        .map_err(|source| ExportError::Probe { resource, source })?;
    read_count(&response).map_err(|source| ExportError::Probe { resource, source })
}

#[instrument(skip_all, fields(resource = %resource))]
pub async fn fetch_all_pages(
    executor: &dyn QueryExecutor,
    resource: Resource,
    settings: &ExportSettings,
) -> Result<FetchedPages, ExportError> {
    let declared_count = probe_count(executor, resource).await?;
    let pages = page_count(declared_count, settings.page_size);
    if pages > MAX_PAGES {
        return Err(ExportError::TooManyPages {
            resource,
            page_count: pages,
        });
    }
    // Bounded by MAX_PAGES above.
    let page_count = pages as u32;
    info!(count = declared_count, page_count, "probed resource");

    for page in 1..=page_count {
        let query = resource.page_query(settings.page_size.get(), page);
        let destination = page_path(&settings.data_dir, resource, page);
        executor
            .save_query(&query, &destination)
            .await
            .map_err(|source| ExportError::QueryFailure {
                resource,
                page,
                source,
            })?;
        debug!(page, path=%destination.display(), "saved page");
    }

    Ok(FetchedPages {
        resource,
        declared_count,
        page_count,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn size(n: u32) -> NonZeroU32 {
        NonZeroU32::new(n).unwrap()
    }

    #[test]
    fn page_count_is_ceiling_division() {
        assert_eq!(page_count(0, size(100)), 0);
        assert_eq!(page_count(1, size(100)), 1);
        assert_eq!(page_count(100, size(100)), 1);
        assert_eq!(page_count(101, size(100)), 2);
        assert_eq!(page_count(250, size(100)), 3);
        assert_eq!(page_count(7, size(1)), 7);
    }

    #[test]
    fn page_count_zero_only_for_zero_count() {
        for page_size in [1u32, 2, 3, 7, 100, 1000] {
            for count in 0u64..500 {
                let pages = page_count(count, size(page_size));
                let expected = (count + u64::from(page_size) - 1) / u64::from(page_size);
                assert_eq!(pages, expected, "count={} page_size={}", count, page_size);
                assert_eq!(pages == 0, count == 0);
                assert!(pages * u64::from(page_size) >= count);
            }
        }
    }

    #[test]
    fn page_file_names_sort_numerically() {
        assert_eq!(page_file_name(Resource::Products, 1), "productsPage00001.json");
        assert_eq!(page_file_name(Resource::Persons, 42), "playersPage00042.json");

        let mut names: Vec<String> = [10u32, 2, 100, 1, 9]
            .iter()
            .map(|p| page_file_name(Resource::Products, *p))
            .collect();
        names.sort();
        assert_eq!(names[0], "productsPage00001.json");
        assert_eq!(names[4], "productsPage00100.json");
    }

    #[test]
    fn read_count_requires_integer() {
        assert_eq!(read_count(&json!({ "count": 250, "result": [] })).unwrap(), 250);
        assert!(read_count(&json!({ "result": [] })).is_err());
        assert!(read_count(&json!({ "count": -1 })).is_err());
        assert!(read_count(&json!({ "count": "12" })).is_err());
    }
}
