//! # Integration Flows
//!
//! - `sync_to_search` - synced entities become searchable
//! - `backfill` - gaps are found and closed while live sync runs
//! - `persistence` - a restarted collector resumes from the stored watermark

pub mod backfill;
pub mod persistence;
pub mod sync_to_search;
