//! # Domain Layer
//!
//! Shape rules, probe order, the numeric layer/epoch rule and redirect
//! targets. No I/O.

pub mod classify;
pub mod errors;
pub mod target;

pub use classify::{
    classify_number, classify_shape, probes_for, Category, IdShape, ADDRESS_PROBES, HASH_PROBES,
    SHAPE_RULES,
};
pub use errors::ResolveError;
pub use target::SearchTarget;
