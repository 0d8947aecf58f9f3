//! # Storage
//!
//! Two file-backed collaborators:
//!
//! - `PageArchive`: XML snapshots of fetched pages, one file per URL under a
//!   per-host directory. It is also a `PageFetcher`, so a scrape can be
//!   replayed offline from the archive.
//! - `AnalysisStore`: the latest `ProgrammeData` and an append-only series
//!   of `GapAnalysisResult` JSON documents per programme.
//!
//! Nothing in the analysis pipeline depends on storage succeeding.

mod history;
mod pages;

pub use history::{AnalysisStore, DEFAULT_STORE_PATH, programme_id};
pub use pages::{Archiving, DEFAULT_ARCHIVE_PATH, PageArchive, PageEntry, Pages};

use std::io;

use crate::error::Error as CrateError;

/// Error type for storage operations
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("XML serialization error: {0}")]
    SerializeError(#[from] quick_xml::errors::serialize::SeError),

    #[error("XML deserialization error: {0}")]
    DeserializeError(#[from] quick_xml::errors::serialize::DeError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("URL parsing error: {0}")]
    UrlParse(#[from] url::ParseError),

    #[error("Invalid URL for storage: {0}")]
    InvalidUrl(String),

    #[error("Not found: {0}")]
    NotFound(String),
}

pub type Result<T> = std::result::Result<T, StorageError>;

impl From<StorageError> for CrateError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::Io(e) => CrateError::Io(e),
            StorageError::Json(e) => CrateError::Json(e),
            _ => CrateError::Storage(err.to_string()),
        }
    }
}
