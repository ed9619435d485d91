//! # qualcode
//!
//! Exploratory qualitative text analysis: load a document collection, code
//! documents with labels, look at word frequencies, keyword themes and
//! sentiment, and export the coded table.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐   ┌──────────────────┐   ┌──────────────┐
//! │   Ingest    │──▶│  TaggingEngine   │──▶│  CSV export  │
//! │ CSV/Text/Dir│   │ (qualcode-core)  │   │ coded_data_* │
//! └─────────────┘   └────────┬─────────┘   └──────────────┘
//!                            │
//!                 ┌──────────┼──────────┐
//!                 ▼          ▼          ▼
//!            ┌─────────┐ ┌───────┐ ┌──────────┐
//!            │ Session │ │ HTTP  │ │ Analysis │
//!            │ (qcode) │ │ (API) │ │ freq/sent│
//!            └─────────┘ └───────┘ └──────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```bash
//! qcode stats responses.csv
//! qcode freq responses.csv --top 15
//! qcode code responses.csv --label urgent --apply 2=urgent
//! qcode session --load responses.csv
//! qcode serve --load responses.csv
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`ingest`] | CSV, text, and directory ingestion |
//! | [`analysis`] | Tokenizer, frequencies, sentiment, themes |
//! | [`export`] | `coded_data_<date>.csv` export |
//! | [`report`] | Plain-text tables |
//! | [`session`] | Interactive command session |
//! | [`server`] | HTTP JSON API |

pub mod analysis;
pub mod config;
pub mod export;
pub mod ingest;
pub mod report;
pub mod server;
pub mod session;

pub use qualcode_core::{DocumentRecord, TagError, TaggingEngine};
