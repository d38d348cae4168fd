//! Error taxonomy for a single resource's export run. Every variant is fatal to that run.
use std::path::PathBuf;
use thiserror::Error;

use crate::model::Resource;

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("could not determine total count for {resource}")]
    Probe {
        resource: Resource,
        #[source]
        source: anyhow::Error,
    },
    #[error("query for {resource} page {page} failed")]
    QueryFailure {
        resource: Resource,
        page: u32,
        #[source]
        source: anyhow::Error,
    },
    #[error("{resource} count needs {page_count} pages, more than the page file name can encode")]
    TooManyPages { resource: Resource, page_count: u64 },
    #[error("failed to read page file {}: {source}", path.display())]
    PageRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("{resource} page {page} is malformed: {reason}")]
    MalformedPage {
        resource: Resource,
        page: u32,
        reason: String,
    },
    #[error("{resource} page {page} item {index}: missing or invalid `{field}`")]
    MalformedRecord {
        resource: Resource,
        page: u32,
        index: usize,
        field: &'static str,
    },
    #[error(transparent)]
    Sink(#[from] SinkError),
}

#[derive(Debug, Error)]
pub enum SinkError {
    #[error("refusing to write a table with no records: the header cannot be derived")]
    EmptyInput,
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}
