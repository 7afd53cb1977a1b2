//! # Domain Layer
//!
//! Collections, key encoding, document mapping and error types.

pub mod collections;
pub mod contents;
pub mod document;
pub mod errors;

pub use collections::{Collection, IndexKind};
pub use contents::RangeContents;
pub use document::Document;
pub use errors::StoreError;
