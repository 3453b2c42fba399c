//! Runtime layer: remote sources, logging bootstrap and the batch pipeline.
//!
//! Talks to the World Bank indicator API and to public GCS buckets, and
//! wires [`PipelineSettings`](stability_core::settings::PipelineSettings)
//! through the data and scoring layers.

pub mod blobs;
pub mod bootstrap;
pub mod collector;
pub mod error;
pub mod pipeline;
pub mod worldbank;

pub use error::{FetchError, Result};
pub use stability_core as core;
pub use stability_data as data;
