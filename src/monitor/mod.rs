//! Live monitoring: one alert batch per tick, cooperative stop, fixed cadence.
//!
//! Two tick sources share the same loop ([`run`]):
//! - [`HistoricalMonitor`] replays stored, rule-labeled user-days above a floor;
//! - [`SimulationMonitor`] scores synthetic behavior with the classifier.

mod historical;
mod runner;
mod sampler;
mod simulation;
mod sink;
mod trend;

pub use historical::HistoricalMonitor;
pub use runner::{run, AlertSink, PresentResult, RunSummary};
pub use sampler::{RandomSampler, RoundRobinSampler, SamplingPolicy};
pub use simulation::{BehaviorGenerator, SimulationMonitor, UniformGenerator};
pub use sink::{format_alert, ConsoleSink, JsonSink};
pub use trend::{TrendPoint, TrendSummary};

use crate::threat::ThreatLevel;
use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::trace;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MonitorState {
    Idle,
    Sampling,
    Scoring,
    Presenting,
    Waiting,
    Stopped,
}

impl MonitorState {
    /// Presenting → Sampling is allowed for callers that drive ticks themselves.
    pub fn can_enter(self, next: MonitorState) -> bool {
        use MonitorState::*;
        match (self, next) {
            (Stopped, _) => false,
            (_, Stopped) => true,
            (Idle, Sampling)
            | (Sampling, Scoring)
            | (Scoring, Presenting)
            | (Presenting, Waiting)
            | (Presenting, Sampling)
            | (Waiting, Sampling) => true,
            _ => false,
        }
    }
}

/// Shared stop flag. Cloning yields another handle to the same signal.
#[derive(Debug, Clone)]
pub struct StopSignal {
    tx: Arc<watch::Sender<bool>>,
    rx: watch::Receiver<bool>,
}

impl StopSignal {
    pub fn new() -> Self {
        let (tx, rx) = watch::channel(false);
        Self {
            tx: Arc::new(tx),
            rx,
        }
    }

    pub fn stop(&self) {
        self.tx.send_replace(true);
    }

    pub fn is_stopped(&self) -> bool {
        *self.rx.borrow()
    }

    /// Resolves once [`stop`](Self::stop) has been called on any handle.
    pub async fn stopped(&self) {
        let mut rx = self.rx.clone();
        loop {
            if *rx.borrow_and_update() {
                return;
            }
            if rx.changed().await.is_err() {
                return;
            }
        }
    }
}

impl Default for StopSignal {
    fn default() -> Self {
        Self::new()
    }
}

/// State plus tick counter. The stop flag is checked on every transition.
#[derive(Debug)]
pub struct StateMachine {
    state: MonitorState,
    ticks: u64,
}

impl StateMachine {
    pub fn new() -> Self {
        Self {
            state: MonitorState::Idle,
            ticks: 0,
        }
    }

    pub fn state(&self) -> MonitorState {
        self.state
    }

    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    /// Move to `next`, or to Stopped when the signal is set. Returns false once stopped.
    pub fn advance(&mut self, next: MonitorState, stop: &StopSignal) -> bool {
        if self.state == MonitorState::Stopped {
            return false;
        }
        if stop.is_stopped() {
            self.halt();
            return false;
        }
        debug_assert!(self.state.can_enter(next), "{:?} -> {:?}", self.state, next);
        if next == MonitorState::Sampling {
            self.ticks += 1;
        }
        trace!(from = ?self.state, to = ?next, tick = self.ticks, "monitor transition");
        self.state = next;
        true
    }

    pub fn halt(&mut self) {
        self.state = MonitorState::Stopped;
    }
}

impl Default for StateMachine {
    fn default() -> Self {
        Self::new()
    }
}

/// One loop body. `tick` runs Sampling → Scoring → Presenting and returns the
/// batch, or None if the stop signal was observed at any transition.
pub trait TickSource {
    fn tick(&mut self, stop: &StopSignal) -> Option<AlertBatch>;

    fn machine(&mut self) -> &mut StateMachine;

    fn state(&self) -> MonitorState;

    fn begin_wait(&mut self, stop: &StopSignal) -> bool {
        self.machine().advance(MonitorState::Waiting, stop)
    }

    fn halt(&mut self) {
        self.machine().halt();
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum AlertTime {
    /// Stored user-day
    Day(NaiveDate),
    /// Synthetic sample drawn at this instant
    Instant(DateTime<Utc>),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Alert {
    pub user: String,
    pub at: AlertTime,
    pub logins_per_day: u32,
    pub device_connections: u32,
    pub threat_level: ThreatLevel,
    /// Level from the other scorer: classifier output for stored rows,
    /// rule label for synthetic rows
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cross_check: Option<ThreatLevel>,
}

impl Alert {
    pub fn diverges(&self) -> bool {
        self.cross_check.map_or(false, |c| c != self.threat_level)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct AlertBatch {
    pub tick: u64,
    pub generated_at: DateTime<Utc>,
    pub alerts: Vec<Alert>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trend: Option<TrendSummary>,
    /// No stored row met the floor; alerts were drawn from the whole table
    pub degraded: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stop_is_terminal() {
        let stop = StopSignal::new();
        let mut m = StateMachine::new();
        assert!(m.advance(MonitorState::Sampling, &stop));
        assert_eq!(m.ticks(), 1);
        stop.stop();
        assert!(!m.advance(MonitorState::Scoring, &stop));
        assert_eq!(m.state(), MonitorState::Stopped);
        assert!(!MonitorState::Stopped.can_enter(MonitorState::Sampling));
    }

    #[test]
    fn clones_share_the_flag() {
        let a = StopSignal::new();
        let b = a.clone();
        assert!(!b.is_stopped());
        a.stop();
        assert!(b.is_stopped());
    }
}
