//! Shared types, error model, and configuration for ecfr-digest.
//!
//! This crate is the foundation depended on by all other ecfr-digest crates.
//! It provides:
//! - [`EcfrError`] — the unified error type
//! - Domain types ([`Node`], [`TitleDocument`], [`Corpus`], [`SummaryEntry`])
//! - Configuration ([`AppConfig`], config loading)

pub mod config;
pub mod error;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    AppConfig, FetchConfig, PathsConfig, config_dir, config_file_path, init_config, load_config,
    load_config_from,
};
pub use error::{EcfrError, Result};
pub use types::{
    Corpus, Node, SummaryEntry, TitleDocument, derive_title_number, from_json_str, word_count,
};
