//! Export TopScore products and persons into flat CSV tables.
//!
//! A run probes the declared item count, saves every page of the resource to
//! the data directory, flattens the saved pages into uniformly keyed records
//! and writes them out as a single table.

pub mod config;
pub mod error;
pub mod fetch;
pub mod flatten;
pub mod model;
pub mod pipeline;
pub mod sink;
pub mod topscore;

pub use error::{ExportError, SinkError};
pub use model::Resource;
pub use pipeline::{export_resource, export_resource_to, ExportOutcome};
