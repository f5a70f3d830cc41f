//! Fit the classifier and measure its agreement with the rule labels.

use super::ThreatClassifier;
use crate::config::ModelConfig;
use crate::error::Result;
use crate::threat::{LabeledSample, ThreatLevel};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::Serialize;
use tracing::info;

/// Classifier vs rule labels on an evaluation set.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Evaluation {
    pub samples: usize,
    pub agreement: f64,
    /// `confusion[rule][predicted]`
    pub confusion: [[usize; 3]; 3],
    /// True when scored on rows the model never saw
    pub held_out: bool,
}

impl Evaluation {
    pub fn score(model: &ThreatClassifier, samples: &[LabeledSample], held_out: bool) -> Result<Self> {
        let rows: Vec<(u32, u32)> = samples.iter().map(LabeledSample::features).collect();
        let predicted = model.predict_batch(&rows)?;

        let mut eval = Evaluation {
            samples: samples.len(),
            held_out,
            ..Evaluation::default()
        };
        let mut agree = 0usize;
        for (s, p) in samples.iter().zip(&predicted) {
            eval.confusion[s.threat_level.as_u8() as usize][p.as_u8() as usize] += 1;
            if s.threat_level == *p {
                agree += 1;
            }
        }
        eval.agreement = if samples.is_empty() {
            0.0
        } else {
            agree as f64 / samples.len() as f64
        };
        Ok(eval)
    }

    pub fn disagreements(&self) -> usize {
        self.samples - (0..ThreatLevel::ALL.len()).map(|i| self.confusion[i][i]).sum::<usize>()
    }
}

/// Fit on the labeled table. With `holdout_fraction > 0` a seeded slice is kept
/// out of training and used for evaluation; otherwise the model is scored on
/// the rows it was fitted on.
pub fn train(samples: &[LabeledSample], config: &ModelConfig) -> Result<(ThreatClassifier, Evaluation)> {
    let holdout = holdout_len(samples.len(), config.holdout_fraction);

    if holdout == 0 {
        let model = ThreatClassifier::fit(samples, config)?;
        let eval = Evaluation::score(&model, samples, false)?;
        info!(samples = samples.len(), agreement = eval.agreement, "trained on full table");
        return Ok((model, eval));
    }

    let mut shuffled: Vec<LabeledSample> = samples.to_vec();
    shuffled.shuffle(&mut StdRng::seed_from_u64(config.seed));
    let (test, fit) = shuffled.split_at(holdout);

    let model = ThreatClassifier::fit(fit, config)?;
    let eval = Evaluation::score(&model, test, true)?;
    info!(
        train = fit.len(),
        held_out = test.len(),
        agreement = eval.agreement,
        "trained with holdout"
    );
    Ok((model, eval))
}

fn holdout_len(total: usize, fraction: f64) -> usize {
    if total < 2 || fraction <= 0.0 {
        return 0;
    }
    // Always leave at least one row to fit on.
    ((total as f64 * fraction).round() as usize).min(total - 1)
}
