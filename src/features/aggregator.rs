//! Count one activity per (user, calendar day).

use super::{DailyCount, DEVICES_COLUMN, LOGINS_COLUMN};
use crate::ingest::{EventSource, RawEvent};
use std::collections::BTreeMap;

pub struct FeatureAggregator {
    source: EventSource,
    positive_activity: String,
}

impl FeatureAggregator {
    pub fn new(source: EventSource, positive_activity: impl Into<String>) -> Self {
        Self {
            source,
            positive_activity: positive_activity.into(),
        }
    }

    /// `Logon` events from the auth source
    pub fn logons() -> Self {
        Self::new(EventSource::Auth, "Logon")
    }

    /// `Connect` events from the device source
    pub fn devices() -> Self {
        Self::new(EventSource::Device, "Connect")
    }

    pub fn source(&self) -> EventSource {
        self.source
    }

    /// Column name this domain's count is written under
    pub fn count_column(&self) -> &'static str {
        match self.source {
            EventSource::Auth => LOGINS_COLUMN,
            EventSource::Device => DEVICES_COLUMN,
        }
    }

    /// Sorted by user, then date. Input order does not matter.
    pub fn aggregate(&self, events: &[RawEvent]) -> Vec<DailyCount> {
        let mut groups: BTreeMap<(&str, chrono::NaiveDate), u32> = BTreeMap::new();
        for e in events
            .iter()
            .filter(|e| e.activity.matches(&self.positive_activity))
        {
            *groups.entry((e.user.as_str(), e.timestamp.date())).or_insert(0) += 1;
        }
        groups
            .into_iter()
            .map(|((user, date), count)| DailyCount {
                user: user.to_string(),
                date,
                count,
            })
            .collect()
    }
}
