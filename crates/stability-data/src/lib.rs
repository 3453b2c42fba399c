//! Data layer for the stability analysis.
//!
//! Reads World Bank snapshots and GDELT event logs from disk, partitions raw
//! event blobs by country and year, aggregates events in two stages and keeps
//! normalized indicator records in SQLite.

pub mod aggregator;
pub mod frame;
pub mod normalizer;
pub mod partitioner;
pub mod reader;
pub mod store;

pub use stability_core as core;
