//! Insider threat detection over per-user activity logs.
//!
//! Modular structure:
//! - [`ingest`]: Tolerant CSV loading of auth and device events
//! - [`features`]: Daily per-user counts and the merged feature table
//! - [`threat`]: Threat levels and deterministic rule labels
//! - [`model`]: Random forest classifier with durable artifacts
//! - [`monitor`]: Live monitoring loop (historical replay and simulation)
//! - [`stages`]: Preprocess / train / monitor startup as the binary runs them
//! - [`logging`]: Structured logging

pub mod config;
pub mod error;
pub mod ingest;
pub mod features;
pub mod threat;
pub mod model;
pub mod monitor;
pub mod stages;
pub mod logging;

pub use config::AppConfig;
pub use error::{Result, ThreatError};
pub use ingest::{EventLoader, RawEvent, Activity, EventSource};
pub use features::{DailyUserFeature, FeatureAggregator, FeaturePipeline, MergePolicy};
pub use threat::{AlertFloor, LabeledSample, ThreatLevel};
pub use model::ThreatClassifier;
pub use monitor::{Alert, AlertBatch, HistoricalMonitor, SimulationMonitor, StopSignal, TickSource};
pub use logging::StructuredLogger;
