//! Synthetic behavior scored by the classifier, one small batch per tick.

use super::{Alert, AlertBatch, AlertTime, MonitorState, StateMachine, StopSignal, TickSource};
use crate::config::SimulationConfig;
use crate::model::ThreatClassifier;
use crate::threat::label;
use chrono::Utc;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::ops::RangeInclusive;
use std::sync::Arc;
use tracing::warn;

pub const SYNTHETIC_USER: &str = "synthetic";

pub trait BehaviorGenerator: Send {
    /// (logins_per_day, device_connections)
    fn next_pair(&mut self) -> (u32, u32);
}

/// Uniform integers within inclusive bounds.
pub struct UniformGenerator {
    rng: StdRng,
    logins: RangeInclusive<u32>,
    devices: RangeInclusive<u32>,
}

impl UniformGenerator {
    pub fn new(logins: RangeInclusive<u32>, devices: RangeInclusive<u32>, seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(s) => StdRng::seed_from_u64(s),
            None => StdRng::from_entropy(),
        };
        Self { rng, logins, devices }
    }

    pub fn from_config(config: &SimulationConfig) -> Self {
        Self::new(
            config.logins_min..=config.logins_max,
            config.devices_min..=config.devices_max,
            config.seed,
        )
    }
}

impl BehaviorGenerator for UniformGenerator {
    fn next_pair(&mut self) -> (u32, u32) {
        (
            self.rng.gen_range(self.logins.clone()),
            self.rng.gen_range(self.devices.clone()),
        )
    }
}

pub struct SimulationMonitor {
    classifier: Arc<ThreatClassifier>,
    generator: Box<dyn BehaviorGenerator>,
    batch_size: usize,
    machine: StateMachine,
}

impl SimulationMonitor {
    pub fn new(
        classifier: Arc<ThreatClassifier>,
        generator: Box<dyn BehaviorGenerator>,
        batch_size: usize,
    ) -> Self {
        Self {
            classifier,
            generator,
            batch_size: batch_size.max(1),
            machine: StateMachine::new(),
        }
    }
}

impl TickSource for SimulationMonitor {
    fn tick(&mut self, stop: &StopSignal) -> Option<AlertBatch> {
        if !self.machine.advance(MonitorState::Sampling, stop) {
            return None;
        }
        let pairs: Vec<(u32, u32)> = (0..self.batch_size)
            .map(|_| self.generator.next_pair())
            .collect();

        if !self.machine.advance(MonitorState::Scoring, stop) {
            return None;
        }
        // The classifier is the authority here, even where it departs from the rules.
        let alerts = match self.classifier.predict_batch(&pairs) {
            Ok(levels) => {
                let now = Utc::now();
                pairs
                    .iter()
                    .zip(levels)
                    .map(|(&(logins, devices), level)| Alert {
                        user: SYNTHETIC_USER.to_string(),
                        at: AlertTime::Instant(now),
                        logins_per_day: logins,
                        device_connections: devices,
                        threat_level: level,
                        cross_check: Some(label(logins, devices)),
                    })
                    .collect()
            }
            Err(e) => {
                warn!(tick = self.machine.ticks(), error = %e, "synthetic batch not scored");
                Vec::new()
            }
        };

        if !self.machine.advance(MonitorState::Presenting, stop) {
            return None;
        }
        Some(AlertBatch {
            tick: self.machine.ticks(),
            generated_at: Utc::now(),
            alerts,
            trend: None,
            degraded: false,
        })
    }

    fn machine(&mut self) -> &mut StateMachine {
        &mut self.machine
    }

    fn state(&self) -> MonitorState {
        self.machine.state()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generator_respects_bounds() {
        let mut g = UniformGenerator::new(1..=15, 0..=7, Some(3));
        for _ in 0..500 {
            let (l, d) = g.next_pair();
            assert!((1..=15).contains(&l));
            assert!(d <= 7);
        }
    }

    #[test]
    fn seeded_generators_agree() {
        let mut a = UniformGenerator::new(1..=15, 0..=7, Some(9));
        let mut b = UniformGenerator::new(1..=15, 0..=7, Some(9));
        for _ in 0..20 {
            assert_eq!(a.next_pair(), b.next_pair());
        }
    }
}
