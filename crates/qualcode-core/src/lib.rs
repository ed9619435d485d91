//! # qualcode core
//!
//! Shared, I/O-free logic for qualcode: document models, the coding
//! (tagging) engine, and the coded table produced for display and export.
//!
//! This crate contains no tokio, filesystem, or network dependencies. All
//! operations are synchronous and act on an owned [`TaggingEngine`] value;
//! callers that share an engine across tasks wrap it in a single lock.

pub mod engine;
pub mod error;
pub mod models;
pub mod table;

pub use engine::TaggingEngine;
pub use error::{ErrorKind, TagError};
pub use models::{DisplayRow, DocumentRecord};
pub use table::CodedTable;
