//! Structured logging setup and ndjson alert records.

mod format;

pub use format::{AlertRecord, StructuredLogger};
