//! Replays stored user-days at or above the alert floor.

use super::{
    Alert, AlertBatch, AlertTime, MonitorState, SamplingPolicy, StateMachine, StopSignal,
    TickSource, TrendSummary,
};
use crate::error::{Result, ThreatError};
use crate::model::ThreatClassifier;
use crate::threat::{AlertFloor, LabeledSample};
use chrono::Utc;
use std::sync::Arc;
use tracing::{debug, warn};

pub struct HistoricalMonitor {
    table: Arc<[LabeledSample]>,
    eligible: Vec<usize>,
    everything: Vec<usize>,
    floor: AlertFloor,
    batch_size: usize,
    policy: Box<dyn SamplingPolicy>,
    classifier: Option<Arc<ThreatClassifier>>,
    trend: Option<TrendSummary>,
    machine: StateMachine,
}

impl HistoricalMonitor {
    pub fn new(
        table: Arc<[LabeledSample]>,
        floor: AlertFloor,
        batch_size: usize,
        policy: Box<dyn SamplingPolicy>,
    ) -> Self {
        // Table is read-only for the monitor's lifetime; filter and trend once.
        let eligible = table
            .iter()
            .enumerate()
            .filter(|(_, s)| floor.admits(s.threat_level))
            .map(|(i, _)| i)
            .collect();
        let everything = (0..table.len()).collect();
        let trend = TrendSummary::from_samples(&table);
        Self {
            table,
            eligible,
            everything,
            floor,
            batch_size: batch_size.max(1),
            policy,
            classifier: None,
            trend,
            machine: StateMachine::new(),
        }
    }

    /// Attach a classifier whose prediction is reported next to each stored label.
    pub fn with_classifier(mut self, classifier: Arc<ThreatClassifier>) -> Self {
        self.classifier = Some(classifier);
        self
    }

    pub fn trend(&self) -> Option<&TrendSummary> {
        self.trend.as_ref()
    }

    fn eligible(&self) -> Result<&[usize]> {
        if self.eligible.is_empty() {
            Err(ThreatError::EmptySampleSet { floor: self.floor })
        } else {
            Ok(&self.eligible)
        }
    }

    fn sample(&mut self) -> (Vec<usize>, bool) {
        let (pool, degraded) = match self.eligible() {
            Ok(pool) => (pool.to_vec(), false),
            Err(e) => {
                debug!(error = %e, "sampling from the full table");
                (self.everything.clone(), true)
            }
        };
        let picks = self.policy.pick(pool.len(), self.batch_size);
        (picks.into_iter().map(|i| pool[i]).collect(), degraded)
    }

    /// Stored labels are authoritative; the classifier only annotates.
    fn score(&self, rows: &[usize]) -> Vec<Alert> {
        let samples: Vec<&LabeledSample> = rows.iter().map(|&i| &self.table[i]).collect();

        let predicted = self.classifier.as_ref().and_then(|c| {
            let features: Vec<(u32, u32)> = samples.iter().map(|s| s.features()).collect();
            c.predict_batch(&features)
                .map_err(|e| warn!(error = %e, "classifier cross-check failed"))
                .ok()
        });

        samples
            .iter()
            .enumerate()
            .map(|(i, s)| Alert {
                user: s.user.clone(),
                at: AlertTime::Day(s.date),
                logins_per_day: s.logins_per_day,
                device_connections: s.device_connections,
                threat_level: s.threat_level,
                cross_check: predicted.as_ref().map(|p| p[i]),
            })
            .collect()
    }
}

impl TickSource for HistoricalMonitor {
    fn tick(&mut self, stop: &StopSignal) -> Option<AlertBatch> {
        if !self.machine.advance(MonitorState::Sampling, stop) {
            return None;
        }
        let (rows, degraded) = self.sample();

        if !self.machine.advance(MonitorState::Scoring, stop) {
            return None;
        }
        let alerts = self.score(&rows);
        let diverging = alerts.iter().filter(|a| a.diverges()).count();
        if diverging > 0 {
            debug!(diverging, "classifier disagrees with stored labels");
        }

        if !self.machine.advance(MonitorState::Presenting, stop) {
            return None;
        }
        Some(AlertBatch {
            tick: self.machine.ticks(),
            generated_at: Utc::now(),
            alerts,
            trend: self.trend.clone(),
            degraded,
        })
    }

    fn machine(&mut self) -> &mut StateMachine {
        &mut self.machine
    }

    fn state(&self) -> MonitorState {
        self.machine.state()
    }
}
