//! Pipeline stages as the binary runs them: explore, preprocess, train, and
//! the startup of both monitors. Every fatal error surfaces here, before any
//! monitor exists.

use crate::config::AppConfig;
use crate::error::Result;
use crate::features::{table, FeaturePipeline, PipelineSummary};
use crate::ingest::{profile_dir, SourceProfile};
use crate::model::{self, Evaluation, ThreatClassifier};
use crate::monitor::{HistoricalMonitor, RandomSampler, SimulationMonitor, UniformGenerator};
use crate::threat::{label_all, LabeledSample, ThreatLevel};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

pub fn explore(config: &AppConfig) -> Result<Vec<(PathBuf, Result<SourceProfile>)>> {
    profile_dir(&config.data.raw_dir)
}

pub fn preprocess(config: &AppConfig) -> Result<PipelineSummary> {
    FeaturePipeline::new(config.features.clone()).run(&config.data)
}

/// Label the merged table, write the labeled table, fit and save the model.
pub fn train(config: &AppConfig) -> Result<Evaluation> {
    let features = table::read_features(&config.data.merged_features_path())?;
    let labeled = label_all(features, &config.labeling);

    let mut counts = [0usize; 3];
    for s in &labeled {
        counts[s.threat_level.as_u8() as usize] += 1;
    }
    info!(
        rows = labeled.len(),
        normal = counts[ThreatLevel::Normal as usize],
        warning = counts[ThreatLevel::Warning as usize],
        critical = counts[ThreatLevel::Critical as usize],
        "labeled feature table"
    );
    table::write_labeled(&config.data.labeled_features_path(), &labeled)?;

    let (classifier, eval) = model::train(&labeled, &config.model)?;
    classifier.save(&config.data.model_path())?;
    Ok(eval)
}

/// Labeled table and model, both required before monitoring starts.
pub fn load_monitor_inputs(
    config: &AppConfig,
) -> Result<(Arc<[LabeledSample]>, Arc<ThreatClassifier>)> {
    let labeled = table::read_labeled(&config.data.labeled_features_path())?;
    let classifier = load_classifier(config)?;
    Ok((labeled.into(), classifier))
}

/// The simulation path needs only the model, never the event tables.
pub fn load_classifier(config: &AppConfig) -> Result<Arc<ThreatClassifier>> {
    Ok(Arc::new(ThreatClassifier::load(&config.data.model_path())?))
}

pub fn historical_monitor(
    config: &AppConfig,
    table: Arc<[LabeledSample]>,
    classifier: Arc<ThreatClassifier>,
) -> HistoricalMonitor {
    let monitor = HistoricalMonitor::new(
        table,
        config.monitor.min_alert_level,
        config.monitor.batch_size,
        Box::new(RandomSampler::new(config.monitor.seed)),
    )
    .with_classifier(classifier);
    if let Some(trend) = monitor.trend() {
        info!(
            days = trend.series.len(),
            current = trend.current,
            "history loaded"
        );
    }
    monitor
}

pub fn simulation_monitor(config: &AppConfig, classifier: Arc<ThreatClassifier>) -> SimulationMonitor {
    SimulationMonitor::new(
        classifier,
        Box::new(UniformGenerator::from_config(&config.simulation)),
        1,
    )
}
