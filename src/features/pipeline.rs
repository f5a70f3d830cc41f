//! Preprocess stage: raw tables → per-domain day counts → merged feature table.

use super::{merge, table, DailyCount, DailyUserFeature, FeatureAggregator};
use crate::config::{DataConfig, FeaturesConfig};
use crate::error::Result;
use crate::ingest::{EventLoader, EventSource, RawEvent};
use std::path::Path;
use tracing::{error, info};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PipelineSummary {
    pub logon_days: usize,
    pub device_days: usize,
    pub merged_rows: usize,
}

pub struct FeaturePipeline {
    logons: FeatureAggregator,
    devices: FeatureAggregator,
    config: FeaturesConfig,
}

impl FeaturePipeline {
    pub fn new(config: FeaturesConfig) -> Self {
        Self {
            logons: FeatureAggregator::new(EventSource::Auth, config.logon_activity.clone()),
            devices: FeatureAggregator::new(EventSource::Device, config.device_activity.clone()),
            config,
        }
    }

    /// In-memory path: events → (logon counts, device counts, merged rows)
    pub fn build(
        &self,
        logon_events: &[RawEvent],
        device_events: &[RawEvent],
    ) -> (Vec<DailyCount>, Vec<DailyCount>, Vec<DailyUserFeature>) {
        let logons = self.logons.aggregate(logon_events);
        let devices = self.devices.aggregate(device_events);
        let merged = merge(&logons, &devices, self.config.merge_policy);
        (logons, devices, merged)
    }

    /// Load one raw source, aggregate it, write its day-count table.
    fn process_source(
        &self,
        aggregator: &FeatureAggregator,
        raw: &Path,
        out: &Path,
    ) -> Result<Vec<DailyCount>> {
        let loaded = EventLoader::new(aggregator.source()).load(raw)?;
        let counts = aggregator.aggregate(&loaded.events);
        table::write_counts(out, aggregator.count_column(), &counts)?;
        info!(
            source = aggregator.source().as_str(),
            events = loaded.events.len(),
            days = counts.len(),
            path = %out.display(),
            "wrote daily counts"
        );
        Ok(counts)
    }

    /// Run the whole stage against the configured files. Both sources are
    /// attempted before any failure is reported, so a broken device export
    /// still leaves a fresh logon table behind.
    pub fn run(&self, data: &DataConfig) -> Result<PipelineSummary> {
        let logons = self.process_source(&self.logons, &data.logon_path(), &data.logon_features_path());
        if let Err(ref e) = logons {
            error!(source = "auth", error = %e, "logon source failed");
        }
        let devices =
            self.process_source(&self.devices, &data.device_path(), &data.device_features_path());
        if let Err(ref e) = devices {
            error!(source = "device", error = %e, "device source failed");
        }
        let (logons, devices) = (logons?, devices?);

        let merged = merge(&logons, &devices, self.config.merge_policy);
        let path = data.merged_features_path();
        table::write_features(&path, &merged)?;
        info!(rows = merged.len(), path = %path.display(), policy = ?self.config.merge_policy, "wrote merged features");

        Ok(PipelineSummary {
            logon_days: logons.len(),
            device_days: devices.len(),
            merged_rows: merged.len(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingest::Activity;
    use chrono::NaiveDate;

    fn at(day: u32, hour: u32) -> chrono::NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, day)
            .unwrap()
            .and_hms_opt(hour, 0, 0)
            .unwrap()
    }

    #[test]
    fn build_counts_the_configured_activity() {
        let config = FeaturesConfig {
            logon_activity: "logoff".into(),
            ..FeaturesConfig::default()
        };
        let pipeline = FeaturePipeline::new(config);
        let auth = vec![
            RawEvent::new("A", at(1, 8), Activity::Logon, EventSource::Auth),
            RawEvent::new("A", at(1, 17), Activity::Logoff, EventSource::Auth),
            RawEvent::new("A", at(1, 19), Activity::Logoff, EventSource::Auth),
            RawEvent::new("B", at(2, 9), Activity::Logon, EventSource::Auth),
        ];
        let device = vec![
            RawEvent::new("A", at(1, 9), Activity::Connect, EventSource::Device),
            RawEvent::new("B", at(2, 9), Activity::Connect, EventSource::Device),
        ];

        let (logons, devices, merged) = pipeline.build(&auth, &device);
        assert_eq!(logons.len(), 1);
        assert_eq!((logons[0].user.as_str(), logons[0].count), ("A", 2));
        assert_eq!(devices.len(), 2);
        assert_eq!(
            merged,
            vec![DailyUserFeature {
                user: "A".into(),
                date: NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
                logins_per_day: 2,
                device_connections: 1,
            }]
        );
    }
}
