//! Random forest over (logins_per_day, device_connections) → threat level.
//! Persisted as a versioned, checksummed bincode envelope. A table holding a
//! single threat level fits a constant model instead of a forest.

use crate::config::ModelConfig;
use crate::error::{Result, ThreatError};
use crate::threat::{LabeledSample, ThreatLevel};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use smartcore::ensemble::random_forest_classifier::{
    RandomForestClassifier, RandomForestClassifierParameters,
};
use smartcore::linalg::basic::matrix::DenseMatrix;
use std::path::Path;
use tracing::{debug, info};

pub const MODEL_FORMAT_VERSION: u32 = 2;

type Forest = RandomForestClassifier<f64, u32, DenseMatrix<f64>, Vec<u32>>;

#[derive(Serialize, Deserialize)]
enum Inner {
    Forest(Forest),
    Constant(ThreatLevel),
}

#[derive(Serialize, Deserialize)]
struct ModelArtifact {
    format_version: u32,
    trained_at: DateTime<Utc>,
    n_samples: usize,
    sha256: String,
    payload: Vec<u8>,
}

fn digest_hex(data: &[u8]) -> String {
    let mut h = Sha256::new();
    h.update(data);
    format!("{:x}", h.finalize())
}

fn to_matrix(rows: &[(u32, u32)]) -> DenseMatrix<f64> {
    let values: Vec<Vec<f64>> = rows
        .iter()
        .map(|&(logins, devices)| vec![logins as f64, devices as f64])
        .collect();
    DenseMatrix::from_2d_vec(&values)
}

fn to_level(class: u32) -> Result<ThreatLevel> {
    u8::try_from(class)
        .map_err(|_| ThreatError::Model(format!("class out of range: {class}")))
        .and_then(|c| ThreatLevel::try_from(c).map_err(ThreatError::Model))
}

/// Caller-owned classifier handle; read-only once fitted.
pub struct ThreatClassifier {
    inner: Inner,
    trained_at: DateTime<Utc>,
    n_samples: usize,
}

impl ThreatClassifier {
    pub fn fit(samples: &[LabeledSample], config: &ModelConfig) -> Result<Self> {
        if samples.is_empty() {
            return Err(ThreatError::Model("no labeled samples to fit".into()));
        }
        let first = samples[0].threat_level;
        if samples.iter().all(|s| s.threat_level == first) {
            debug!(samples = samples.len(), level = %first, "single threat level, fitting constant model");
            return Ok(Self {
                inner: Inner::Constant(first),
                trained_at: Utc::now(),
                n_samples: samples.len(),
            });
        }

        let rows: Vec<(u32, u32)> = samples.iter().map(LabeledSample::features).collect();
        let x = to_matrix(&rows);
        let y: Vec<u32> = samples
            .iter()
            .map(|s| u32::from(s.threat_level.as_u8()))
            .collect();

        let mut params = RandomForestClassifierParameters::default()
            .with_n_trees(config.n_trees)
            .with_seed(config.seed);
        if let Some(depth) = config.max_depth {
            params = params.with_max_depth(depth);
        }

        let forest = Forest::fit(&x, &y, params).map_err(|e| ThreatError::Model(e.to_string()))?;
        debug!(samples = samples.len(), n_trees = config.n_trees, "fitted forest");
        Ok(Self {
            inner: Inner::Forest(forest),
            trained_at: Utc::now(),
            n_samples: samples.len(),
        })
    }

    pub fn predict(&self, logins_per_day: u32, device_connections: u32) -> Result<ThreatLevel> {
        self.predict_batch(&[(logins_per_day, device_connections)])?
            .into_iter()
            .next()
            .ok_or_else(|| ThreatError::Model("empty prediction".into()))
    }

    pub fn predict_batch(&self, rows: &[(u32, u32)]) -> Result<Vec<ThreatLevel>> {
        if rows.is_empty() {
            return Ok(Vec::new());
        }
        let forest = match &self.inner {
            Inner::Forest(forest) => forest,
            Inner::Constant(level) => return Ok(vec![*level; rows.len()]),
        };
        let x = to_matrix(rows);
        let classes: Vec<u32> = forest
            .predict(&x)
            .map_err(|e| ThreatError::Model(e.to_string()))?;
        classes.into_iter().map(to_level).collect()
    }

    pub fn trained_at(&self) -> DateTime<Utc> {
        self.trained_at
    }

    pub fn n_samples(&self) -> usize {
        self.n_samples
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let payload = bincode::serialize(&self.inner)?;
        let artifact = ModelArtifact {
            format_version: MODEL_FORMAT_VERSION,
            trained_at: self.trained_at,
            n_samples: self.n_samples,
            sha256: digest_hex(&payload),
            payload,
        };
        Ok(bincode::serialize(&artifact)?)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let artifact: ModelArtifact = bincode::deserialize(bytes)
            .map_err(|e| ThreatError::ModelFormat(format!("not a model artifact: {e}")))?;
        if artifact.format_version != MODEL_FORMAT_VERSION {
            return Err(ThreatError::ModelFormat(format!(
                "format version {} (expected {})",
                artifact.format_version, MODEL_FORMAT_VERSION
            )));
        }
        if digest_hex(&artifact.payload) != artifact.sha256 {
            return Err(ThreatError::ModelFormat("checksum mismatch".into()));
        }
        let inner: Inner = bincode::deserialize(&artifact.payload)?;
        Ok(Self {
            inner,
            trained_at: artifact.trained_at,
            n_samples: artifact.n_samples,
        })
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let bytes = self.to_bytes()?;
        std::fs::write(path, &bytes)?;
        info!(path = %path.display(), bytes = bytes.len(), "saved model");
        Ok(())
    }

    pub fn load(path: &Path) -> Result<Self> {
        ThreatError::require(path, "run `train` first")?;
        let bytes = std::fs::read(path)?;
        let model = Self::from_bytes(&bytes)?;
        info!(
            path = %path.display(),
            trained_at = %model.trained_at,
            samples = model.n_samples,
            "loaded model"
        );
        Ok(model)
    }
}
