//! Join logon and device day counts into one record per (user, day).

use super::{DailyCount, DailyUserFeature};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Treatment of (user, day) keys present only in the device counts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MergePolicy {
    /// Keep only keys with logon activity; device-only days are dropped
    #[default]
    LogonLeft,
    /// Keep device-only days with `logins_per_day = 0`
    FullOuter,
}

/// Left join on (user, date) from the logon side. Missing device counts become 0.
/// Duplicate keys on either side are summed. Output sorted by user, then date.
pub fn merge(
    logons: &[DailyCount],
    devices: &[DailyCount],
    policy: MergePolicy,
) -> Vec<DailyUserFeature> {
    let mut rows: BTreeMap<(String, NaiveDate), DailyUserFeature> = BTreeMap::new();

    for c in logons {
        rows.entry((c.user.clone(), c.date))
            .or_insert_with(|| zero(&c.user, c.date))
            .logins_per_day += c.count;
    }

    for c in devices {
        let key = (c.user.clone(), c.date);
        match rows.get_mut(&key) {
            Some(row) => row.device_connections += c.count,
            None if policy == MergePolicy::FullOuter => {
                let mut row = zero(&c.user, c.date);
                row.device_connections = c.count;
                rows.insert(key, row);
            }
            None => {}
        }
    }

    rows.into_values().collect()
}

fn zero(user: &str, date: NaiveDate) -> DailyUserFeature {
    DailyUserFeature {
        user: user.to_string(),
        date,
        logins_per_day: 0,
        device_connections: 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn c(user: &str, day: u32, count: u32) -> DailyCount {
        DailyCount {
            user: user.to_string(),
            date: NaiveDate::from_ymd_opt(2024, 1, day).unwrap(),
            count,
        }
    }

    #[test]
    fn device_gaps_are_zero_filled() {
        let merged = merge(&[c("A", 1, 6), c("A", 2, 3)], &[c("A", 2, 4)], MergePolicy::LogonLeft);
        assert_eq!(merged.len(), 2);
        assert_eq!((merged[0].logins_per_day, merged[0].device_connections), (6, 0));
        assert_eq!((merged[1].logins_per_day, merged[1].device_connections), (3, 4));
    }

    #[test]
    fn device_only_days_follow_policy() {
        let logons = [c("A", 1, 2)];
        let devices = [c("B", 1, 5)];

        let left = merge(&logons, &devices, MergePolicy::LogonLeft);
        assert_eq!(left.len(), 1);
        assert_eq!(left[0].user, "A");

        let outer = merge(&logons, &devices, MergePolicy::FullOuter);
        assert_eq!(outer.len(), 2);
        assert_eq!(outer[1].user, "B");
        assert_eq!((outer[1].logins_per_day, outer[1].device_connections), (0, 5));
    }

    #[test]
    fn one_record_per_key() {
        let merged = merge(&[c("A", 1, 1), c("A", 1, 2)], &[c("A", 1, 1)], MergePolicy::FullOuter);
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].logins_per_day, 3);
    }
}
