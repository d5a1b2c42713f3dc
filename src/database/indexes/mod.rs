//! Index Operations Module
//!
//! - spatial: geometry index create/drop/info with backfill

pub mod spatial;

pub use spatial::IndexInfo;
