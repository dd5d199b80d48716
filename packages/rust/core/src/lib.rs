//! Core pipeline and domain logic for ecfr-digest.
//!
//! Stages, in order:
//! - [`loader`]: read a folder of per-title JSON documents, skipping bad files
//! - [`aggregator`]: wrap the loaded titles into a single corpus
//! - [`flattener`]: walk each title tree into flat summary entries
//! - [`writer`]: persist corpus and summary artifacts
//!
//! [`pipeline`] ties the stages into the `combine`, `summarize` and `download`
//! workflows; [`stats`] rolls a summary up per title.

pub mod aggregator;
pub mod flattener;
pub mod loader;
pub mod pipeline;
pub mod progress;
pub mod stats;
pub mod writer;

pub use progress::{ProgressReporter, SilentProgress};
