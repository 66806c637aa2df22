//! Crate-level error type

use crate::layout::{MeasureError, PaginationError};
use crate::variant::RemapError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("measurement failed: {0}")]
    Measure(#[from] MeasureError),
    #[error("pagination failed: {0}")]
    Pagination(#[from] PaginationError),
    #[error("answer key remap failed: {0}")]
    Remap(#[from] RemapError),
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("no variant {0}")]
    UnknownVariant(u32),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
