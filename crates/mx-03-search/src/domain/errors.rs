//! Resolution errors.

use mx_01_entity_store::StoreError;
use shared_types::{Classify, ErrorClass};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ResolveError {
    /// No category matches (including malformed ids).
    #[error("not found")]
    NotFound,

    /// A probe failed; the client may retry.
    #[error("store unavailable: {0}")]
    Store(#[from] StoreError),
}

impl Classify for ResolveError {
    fn class(&self) -> ErrorClass {
        match self {
            ResolveError::NotFound => ErrorClass::NotFound,
            ResolveError::Store(e) => e.class(),
        }
    }
}
