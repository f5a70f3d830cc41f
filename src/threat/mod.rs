//! Threat severity: ordinal levels, rule-based labels, labeled samples.

mod labeler;

pub use labeler::{label, label_all, LabelRules};

use crate::features::DailyUserFeature;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Ordinal severity of a user-day. Serialized as 0/1/2.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
pub enum ThreatLevel {
    Normal = 0,
    Warning = 1,
    Critical = 2,
}

impl ThreatLevel {
    pub const ALL: [ThreatLevel; 3] = [ThreatLevel::Normal, ThreatLevel::Warning, ThreatLevel::Critical];

    pub fn as_u8(self) -> u8 {
        self as u8
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ThreatLevel::Normal => "Normal",
            ThreatLevel::Warning => "Warning",
            ThreatLevel::Critical => "Critical",
        }
    }
}

impl fmt::Display for ThreatLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<ThreatLevel> for u8 {
    fn from(level: ThreatLevel) -> u8 {
        level.as_u8()
    }
}

impl TryFrom<u8> for ThreatLevel {
    type Error = String;

    fn try_from(v: u8) -> Result<Self, Self::Error> {
        match v {
            0 => Ok(ThreatLevel::Normal),
            1 => Ok(ThreatLevel::Warning),
            2 => Ok(ThreatLevel::Critical),
            other => Err(format!("threat level out of range: {other}")),
        }
    }
}

/// Minimum level a stored sample needs to be shown by the monitor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertFloor {
    /// Warning (1+)
    #[default]
    Warning,
    /// Critical (2)
    Critical,
}

impl AlertFloor {
    pub fn min_level(self) -> ThreatLevel {
        match self {
            AlertFloor::Warning => ThreatLevel::Warning,
            AlertFloor::Critical => ThreatLevel::Critical,
        }
    }

    pub fn admits(self, level: ThreatLevel) -> bool {
        level >= self.min_level()
    }
}

/// Merged feature row plus its rule-based level. Flat so it maps 1:1 onto CSV columns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabeledSample {
    pub user: String,
    pub date: NaiveDate,
    pub logins_per_day: u32,
    pub device_connections: u32,
    pub threat_level: ThreatLevel,
}

impl LabeledSample {
    pub fn new(feature: DailyUserFeature, threat_level: ThreatLevel) -> Self {
        Self {
            user: feature.user,
            date: feature.date,
            logins_per_day: feature.logins_per_day,
            device_connections: feature.device_connections,
            threat_level,
        }
    }

    pub fn features(&self) -> (u32, u32) {
        (self.logins_per_day, self.device_connections)
    }
}
