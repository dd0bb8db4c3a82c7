//! Core pipeline orchestration and domain logic for Notebase.
//!
//! This crate ties together Markdown ingestion, duplicate detection and the
//! note store into the end-to-end `ingest_documents` workflow, plus the
//! renderers and search used to read the store back.

pub mod dedup;
pub mod pipeline;
pub mod render;
pub mod search;
