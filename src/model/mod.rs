//! Tree-ensemble threat classifier: fit on rule-labeled days, score unseen behavior.

mod forest;
mod training;

pub use forest::{ThreatClassifier, MODEL_FORMAT_VERSION};
pub use training::{train, Evaluation};
