//! # Mesh Explorer Test Suite
//!
//! Cross-crate tests: the node port feeds layer sync, layer sync fills the
//! entity store, and search reads it back.
//!
//! ## Structure
//!
//! ```text
//! tests/
//! ├── src/
//! │   ├── fixtures.rs    # Pipeline harness shared by tests and benches
//! │   └── integration/   # End-to-end flows
//! └── benches/           # criterion benchmarks
//! ```
//!
//! ## Running Tests
//!
//! ```bash
//! cargo test -p mx-tests
//! cargo bench -p mx-tests
//! ```

pub mod fixtures;
pub mod integration;

pub use fixtures::Pipeline;
