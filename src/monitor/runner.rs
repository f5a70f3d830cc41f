//! Drives a tick source at a fixed cadence until stopped.

use super::{AlertBatch, StopSignal, TickSource};
use std::time::Duration;
use tracing::{info, warn};

pub type PresentResult = Result<(), Box<dyn std::error::Error + Send + Sync>>;

/// Presentation collaborator (console, UI bridge, test collector).
pub trait AlertSink {
    fn present(&mut self, batch: &AlertBatch) -> PresentResult;
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub ticks: u64,
    pub alerts: usize,
    pub degraded_ticks: u64,
    pub present_errors: u64,
}

/// Tick, present, wait; repeat. Ends when the stop signal fires (checked on
/// every transition and raced against the wait) or after `max_ticks`.
/// A failing sink is logged and skipped; it never ends the loop.
pub async fn run<M, S>(
    monitor: &mut M,
    sink: &mut S,
    interval: Duration,
    stop: &StopSignal,
    max_ticks: Option<u64>,
) -> RunSummary
where
    M: TickSource + ?Sized,
    S: AlertSink + ?Sized,
{
    let mut summary = RunSummary::default();
    info!(interval_ms = interval.as_millis() as u64, max_ticks = ?max_ticks, "monitor loop starting");

    loop {
        let Some(batch) = monitor.tick(stop) else {
            break;
        };
        summary.ticks += 1;
        summary.alerts += batch.alerts.len();
        if batch.degraded {
            summary.degraded_ticks += 1;
        }

        if let Err(e) = sink.present(&batch) {
            summary.present_errors += 1;
            warn!(tick = batch.tick, error = %e, "presentation failed");
        }

        if max_ticks.map_or(false, |max| summary.ticks >= max) {
            break;
        }
        if !monitor.begin_wait(stop) {
            break;
        }
        tokio::select! {
            _ = tokio::time::sleep(interval) => {}
            _ = stop.stopped() => break,
        }
    }

    monitor.halt();
    info!(
        ticks = summary.ticks,
        alerts = summary.alerts,
        degraded_ticks = summary.degraded_ticks,
        "monitor loop stopped"
    );
    summary
}
