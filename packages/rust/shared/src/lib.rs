//! Shared types, error model, and configuration for Notebase.
//!
//! This crate is the foundation depended on by all other Notebase crates.
//! It provides:
//! - [`NotebaseError`] — the unified error type
//! - Domain types ([`TopicPath`], [`NoteEntry`], [`CodeExample`])
//! - Configuration ([`AppConfig`], config loading)

pub mod config;
pub mod error;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    AppConfig, DedupConfig, IngestConfig, config_dir, config_file_path, init_config, load_config,
    load_config_from, validate_threshold,
};
pub use error::{NotebaseError, Result};
pub use types::{
    CURRENT_SCHEMA_VERSION, CodeExample, DEFAULT_LANGUAGE, NoteEntry, TOPIC_SEPARATOR, TopicPath,
    document_revision,
};
