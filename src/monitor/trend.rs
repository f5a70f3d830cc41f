//! Mean threat level per day over the whole history, plus the latest change.

use crate::threat::LabeledSample;
use chrono::NaiveDate;
use serde::Serialize;
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TrendPoint {
    pub date: NaiveDate,
    pub mean_level: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrendSummary {
    pub series: Vec<TrendPoint>,
    /// Mean level of the latest day
    pub current: f64,
    /// Change from the previous day; None with a single day of history
    pub delta: Option<f64>,
}

impl TrendSummary {
    /// None for an empty table.
    pub fn from_samples(samples: &[LabeledSample]) -> Option<Self> {
        let mut days: BTreeMap<NaiveDate, (u64, u64)> = BTreeMap::new();
        for s in samples {
            let slot = days.entry(s.date).or_insert((0, 0));
            slot.0 += u64::from(s.threat_level.as_u8());
            slot.1 += 1;
        }

        let series: Vec<TrendPoint> = days
            .into_iter()
            .map(|(date, (sum, n))| TrendPoint {
                date,
                mean_level: sum as f64 / n as f64,
            })
            .collect();

        let current = series.last()?.mean_level;
        let delta = series
            .len()
            .checked_sub(2)
            .map(|i| current - series[i].mean_level);
        Some(Self {
            series,
            current,
            delta,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::threat::ThreatLevel;

    fn s(day: u32, level: ThreatLevel) -> LabeledSample {
        LabeledSample {
            user: "u".into(),
            date: NaiveDate::from_ymd_opt(2024, 1, day).unwrap(),
            logins_per_day: 0,
            device_connections: 0,
            threat_level: level,
        }
    }

    #[test]
    fn daily_means_and_delta() {
        let t = TrendSummary::from_samples(&[
            s(2, ThreatLevel::Critical),
            s(1, ThreatLevel::Normal),
            s(1, ThreatLevel::Warning),
            s(2, ThreatLevel::Normal),
        ])
        .unwrap();
        assert_eq!(t.series.len(), 2);
        assert_eq!(t.series[0].mean_level, 0.5);
        assert_eq!(t.current, 1.0);
        assert_eq!(t.delta, Some(0.5));
    }

    #[test]
    fn single_day_has_no_delta() {
        let t = TrendSummary::from_samples(&[s(1, ThreatLevel::Warning)]).unwrap();
        assert_eq!(t.delta, None);
        assert!(TrendSummary::from_samples(&[]).is_none());
    }
}
