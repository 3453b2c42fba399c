//! Domain types and pure scoring logic for the GDELT / World Bank stability
//! analysis.
//!
//! Apart from settings persistence, everything here is free of file-system
//! and network access: event-code classification, the nine-indicator
//! stability score, the quantile index and the static lookup tables used for
//! presentation.

pub mod classifier;
pub mod countries;
pub mod error;
pub mod index;
pub mod models;
pub mod scoring;
pub mod settings;
pub mod tables;

pub use error::{Result, StabilityError};
