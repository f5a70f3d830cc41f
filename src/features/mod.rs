//! Daily behavioral features: per-domain counts, merged per user-day records.

mod aggregator;
mod merger;
mod pipeline;
pub mod table;

pub use aggregator::FeatureAggregator;
pub use merger::{merge, MergePolicy};
pub use pipeline::{FeaturePipeline, PipelineSummary};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

pub const LOGINS_COLUMN: &str = "logins_per_day";
pub const DEVICES_COLUMN: &str = "device_connections";

/// One domain's count for a (user, day)
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DailyCount {
    pub user: String,
    pub date: NaiveDate,
    pub count: u32,
}

/// Merged per user-day record. Unsigned counts; absent sources are 0.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyUserFeature {
    pub user: String,
    pub date: NaiveDate,
    pub logins_per_day: u32,
    pub device_connections: u32,
}
