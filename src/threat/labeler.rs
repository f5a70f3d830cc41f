//! Deterministic threshold rules: counts → threat level.

use super::{LabeledSample, ThreatLevel};
use crate::features::DailyUserFeature;
use serde::{Deserialize, Serialize};

/// Warning fires when either count exceeds its warning threshold;
/// Critical needs both counts above their critical thresholds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LabelRules {
    pub warning_logins: u32,
    pub warning_devices: u32,
    pub critical_logins: u32,
    pub critical_devices: u32,
}

impl LabelRules {
    pub const STANDARD: LabelRules = LabelRules {
        warning_logins: 5,
        warning_devices: 2,
        critical_logins: 10,
        critical_devices: 5,
    };

    pub fn level(&self, logins_per_day: u32, device_connections: u32) -> ThreatLevel {
        let mut level = ThreatLevel::Normal;
        if logins_per_day > self.warning_logins || device_connections > self.warning_devices {
            level = ThreatLevel::Warning;
        }
        // Applied last so Critical is never downgraded.
        if logins_per_day > self.critical_logins && device_connections > self.critical_devices {
            level = ThreatLevel::Critical;
        }
        level
    }
}

impl Default for LabelRules {
    fn default() -> Self {
        Self::STANDARD
    }
}

/// Standard rules.
pub fn label(logins_per_day: u32, device_connections: u32) -> ThreatLevel {
    LabelRules::STANDARD.level(logins_per_day, device_connections)
}

pub fn label_all(features: Vec<DailyUserFeature>, rules: &LabelRules) -> Vec<LabeledSample> {
    features
        .into_iter()
        .map(|f| {
            let level = rules.level(f.logins_per_day, f.device_connections);
            LabeledSample::new(f, level)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reference_points() {
        assert_eq!(label(5, 2), ThreatLevel::Normal);
        assert_eq!(label(6, 1), ThreatLevel::Warning);
        assert_eq!(label(6, 3), ThreatLevel::Warning);
        assert_eq!(label(11, 6), ThreatLevel::Critical);
        assert_eq!(label(11, 1), ThreatLevel::Warning);
        assert_eq!(label(0, 3), ThreatLevel::Warning);
        assert_eq!(label(10, 6), ThreatLevel::Warning);
    }

    #[test]
    fn custom_thresholds() {
        let rules = LabelRules {
            warning_logins: 1,
            ..LabelRules::STANDARD
        };
        assert_eq!(rules.level(2, 0), ThreatLevel::Warning);
        assert_eq!(label(2, 0), ThreatLevel::Normal);
    }
}
