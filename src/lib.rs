//! Ad-hoc traffic analysis over Combined Log Format access logs.
//!
//! [`ingest`](ingest::ingest) turns a log file into [`LogEntry`] values plus
//! per-line [`Rejection`] diagnostics; the [`analysis`] functions answer
//! queries over the entries; [`export::export_csv`] writes them back out.
//! The whole pipeline is synchronous and holds no state between calls.

pub mod analysis;
pub mod export;
pub mod ingest;
pub mod models;
pub mod parser;

pub use ingest::IngestReport;
pub use models::{FilterSpec, LogEntry, RejectCause, Rejection};

use std::path::PathBuf;

/// Fatal conditions. Per-line parse failures are not errors, they are
/// collected as [`Rejection`] values during ingestion.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("cannot read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("cannot write {path}: {source}")]
    Export {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
    #[error("invalid date bound {0:?}, expected e.g. 10/Oct/2023:13:55:36 -0700")]
    InvalidBound(String),
}
