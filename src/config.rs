//! Pipeline and monitor configuration. JSON on disk, defaults for anything missing.

use crate::features::MergePolicy;
use crate::threat::{AlertFloor, LabelRules};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Bounds for the operator-selectable refresh interval (seconds).
pub const MIN_REFRESH_SECS: u64 = 1;
pub const MAX_REFRESH_SECS: u64 = 10;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Input and artifact locations
    pub data: DataConfig,
    /// Aggregation parameters
    pub features: FeaturesConfig,
    /// Rule thresholds for ground-truth labels
    pub labeling: LabelRules,
    /// Classifier training parameters
    pub model: ModelConfig,
    /// Historical monitoring loop
    pub monitor: MonitorConfig,
    /// Synthetic simulation loop
    pub simulation: SimulationConfig,
    /// Logging
    pub log: LogConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DataConfig {
    pub raw_dir: PathBuf,
    pub logon_file: String,
    pub device_file: String,
    pub processed_dir: PathBuf,
    pub results_dir: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FeaturesConfig {
    /// Activity value counted in the auth source
    pub logon_activity: String,
    /// Activity value counted in the device source
    pub device_activity: String,
    /// What to do with days seen only in the device source
    pub merge_policy: MergePolicy,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    pub n_trees: u16,
    /// None grows trees until leaves are pure
    pub max_depth: Option<u16>,
    pub seed: u64,
    /// Fraction of labeled rows held out for evaluation (0.0 = train on everything)
    pub holdout_fraction: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitorConfig {
    /// Seconds between ticks, clamped to [MIN_REFRESH_SECS, MAX_REFRESH_SECS]
    pub refresh_interval_secs: u64,
    pub min_alert_level: AlertFloor,
    /// Rows drawn per tick
    pub batch_size: usize,
    /// Fixed seed for reproducible sampling; None draws from entropy
    pub seed: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    pub interval_secs: u64,
    pub logins_min: u32,
    pub logins_max: u32,
    pub devices_min: u32,
    pub devices_max: u32,
    pub seed: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    pub level: String,
    pub json: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            data: DataConfig::default(),
            features: FeaturesConfig::default(),
            labeling: LabelRules::default(),
            model: ModelConfig::default(),
            monitor: MonitorConfig::default(),
            simulation: SimulationConfig::default(),
            log: LogConfig::default(),
        }
    }
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            raw_dir: PathBuf::from("data/raw/r1"),
            logon_file: "logon.csv".to_string(),
            device_file: "device.csv".to_string(),
            processed_dir: PathBuf::from("data/processed"),
            results_dir: PathBuf::from("data/results"),
        }
    }
}

impl Default for FeaturesConfig {
    fn default() -> Self {
        Self {
            logon_activity: "Logon".to_string(),
            device_activity: "Connect".to_string(),
            merge_policy: MergePolicy::LogonLeft,
        }
    }
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            n_trees: 100,
            max_depth: None,
            seed: 42,
            holdout_fraction: 0.0,
        }
    }
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            refresh_interval_secs: 3,
            min_alert_level: AlertFloor::Warning,
            batch_size: 3,
            seed: None,
        }
    }
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            interval_secs: 2,
            logins_min: 1,
            logins_max: 15,
            devices_min: 0,
            devices_max: 7,
            seed: None,
        }
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

impl DataConfig {
    pub fn logon_path(&self) -> PathBuf {
        self.raw_dir.join(&self.logon_file)
    }

    pub fn device_path(&self) -> PathBuf {
        self.raw_dir.join(&self.device_file)
    }

    pub fn logon_features_path(&self) -> PathBuf {
        self.processed_dir.join("logon_features.csv")
    }

    pub fn device_features_path(&self) -> PathBuf {
        self.processed_dir.join("device_features.csv")
    }

    pub fn merged_features_path(&self) -> PathBuf {
        self.processed_dir.join("final_features.csv")
    }

    pub fn labeled_features_path(&self) -> PathBuf {
        self.processed_dir.join("final_features_labeled.csv")
    }

    pub fn model_path(&self) -> PathBuf {
        self.results_dir.join("threat_model.bin")
    }
}

impl AppConfig {
    /// Load from JSON file if present; otherwise return default
    pub fn load(path: &std::path::Path) -> Self {
        if path.exists() {
            if let Ok(data) = std::fs::read_to_string(path) {
                if let Ok(c) = serde_json::from_str::<AppConfig>(&data) {
                    return c;
                }
            }
        }
        Self::default()
    }

    /// Clamp operator-supplied values into their supported ranges.
    pub fn validated(mut self) -> Self {
        self.monitor.refresh_interval_secs = self
            .monitor
            .refresh_interval_secs
            .clamp(MIN_REFRESH_SECS, MAX_REFRESH_SECS);
        self.monitor.batch_size = self.monitor.batch_size.max(1);
        self.simulation.interval_secs = self.simulation.interval_secs.max(MIN_REFRESH_SECS);
        if self.simulation.logins_max < self.simulation.logins_min {
            self.simulation.logins_max = self.simulation.logins_min;
        }
        if self.simulation.devices_max < self.simulation.devices_min {
            self.simulation.devices_max = self.simulation.devices_min;
        }
        self.model.n_trees = self.model.n_trees.max(1);
        self.model.holdout_fraction = self.model.holdout_fraction.clamp(0.0, 0.9);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_json_keeps_defaults() {
        let c: AppConfig =
            serde_json::from_str(r#"{"monitor":{"min_alert_level":"critical"}}"#).unwrap();
        assert_eq!(c.monitor.min_alert_level, AlertFloor::Critical);
        assert_eq!(c.monitor.refresh_interval_secs, 3);
        assert_eq!(c.features.logon_activity, "Logon");
    }

    #[test]
    fn refresh_interval_is_clamped() {
        let mut c = AppConfig::default();
        c.monitor.refresh_interval_secs = 60;
        assert_eq!(c.validated().monitor.refresh_interval_secs, MAX_REFRESH_SECS);

        let mut c = AppConfig::default();
        c.monitor.refresh_interval_secs = 0;
        assert_eq!(c.validated().monitor.refresh_interval_secs, MIN_REFRESH_SECS);
    }
}
