//! # Error Taxonomy
//!
//! Every component error maps onto one of three classes. Components only
//! report the class; the supervising loop or `main` decides what to do.

use std::fmt;

use serde::{Deserialize, Serialize};

/// How a failure should be treated by whoever owns the retry decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorClass {
    /// Node unreachable, store timeout. Retry after backoff.
    Transient,
    /// Nothing matches. Surface to the client, never retry.
    NotFound,
    /// Configuration or environment problem. Abort.
    Fatal,
}

impl ErrorClass {
    pub fn is_retryable(self) -> bool {
        matches!(self, ErrorClass::Transient)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ErrorClass::Transient => "transient",
            ErrorClass::NotFound => "not_found",
            ErrorClass::Fatal => "fatal",
        }
    }
}

impl fmt::Display for ErrorClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Implemented by every component error type.
pub trait Classify {
    fn class(&self) -> ErrorClass;
}
