//! Area fetch orchestration
//!
//! The operation entry point: validates the area, consults the manifest
//! cache, plans, downloads and imports, and reports every decision as a
//! diagnostic line.

mod error;
mod fetch;
mod types;

pub use error::FetchError;
pub use fetch::AreaFetcher;
pub use types::{
    FetchOutcome, FetchRequest, OutcomeSource, DEFAULT_MAX_DEPTH, DEFAULT_MODEL_PRECISION,
};
