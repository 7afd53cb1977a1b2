//! # MX-03 Search
//!
//! Resolves an opaque identifier (address, hash, object id, layer or epoch
//! number) to the explorer page it belongs to.
//!
//! **Subsystem ID:** 3
//!
//! ## Resolution Order
//!
//! 1. 42 characters: account, then block.
//! 2. 66 characters: transaction, then activation, then smesher.
//! 3. Otherwise a reward object id, else a decimal number: an epoch when it
//!    is at most the current epoch, a layer when it is at most the watermark.
//!
//! The first hit wins. Anything else is not found.
//!
//! ## Module Structure
//!
//! ```text
//! mx-03-search/
//! ├── domain/     # Shape rules, probe order, numeric rule, targets
//! ├── service.rs  # IdentifierResolver (read-only store probes)
//! ├── http.rs     # axum router: /search/:id, /health
//! └── config.rs   # SearchConfig
//! ```

pub mod config;
pub mod domain;
pub mod http;
pub mod service;

pub use config::SearchConfig;
pub use domain::{Category, IdShape, ResolveError, SearchTarget};
pub use http::{router, serve, ErrorResponse, SearchResponse};
pub use service::IdentifierResolver;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
