//! Error taxonomy shared by every stage.

use crate::threat::AlertFloor;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ThreatError {
    #[error("missing artifact {}: {hint}", path.display())]
    MissingArtifact { path: PathBuf, hint: &'static str },

    #[error("malformed source {source_name}: missing required column(s) {}", missing.join(", "))]
    MalformedSource {
        source_name: String,
        missing: Vec<String>,
    },

    /// Soft: recovered by the monitor with an unfiltered sample.
    #[error("no samples at or above {floor:?}")]
    EmptySampleSet { floor: AlertFloor },

    #[error("model error: {0}")]
    Model(String),

    #[error("model artifact rejected: {0}")]
    ModelFormat(String),

    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] bincode::Error),
}

pub type Result<T> = std::result::Result<T, ThreatError>;

impl ThreatError {
    /// `MissingArtifact` when `path` does not exist.
    pub fn require(path: &std::path::Path, hint: &'static str) -> Result<()> {
        if path.exists() {
            Ok(())
        } else {
            Err(ThreatError::MissingArtifact {
                path: path.to_path_buf(),
                hint,
            })
        }
    }
}
