use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, warn};

use crate::config::AnalysisSettings;
use crate::engine::{Analyzer, EngineError, LevelEvent};

use super::render::bucket_means;

/// `10^(db/20)`, clamped to `[0, 1]`.
pub fn db_to_linear(db: f64) -> f32 {
    (10f64.powf(db / 20.0) as f32).clamp(0.0, 1.0)
}

/// Average of per-channel dB levels as one linear amplitude.
pub fn level_to_linear(levels: &[f64]) -> Option<f32> {
    if levels.is_empty() {
        return None;
    }
    let avg = levels.iter().sum::<f64>() / levels.len() as f64;
    Some(db_to_linear(avg))
}

/// One offline analysis pass over a URI.
pub struct WaveformSampler {
    analyzer: Arc<dyn Analyzer>,
    interval: Duration,
    max_samples: usize,
}

impl WaveformSampler {
    pub fn new(analyzer: Arc<dyn Analyzer>, settings: &AnalysisSettings) -> Self {
        Self {
            analyzer,
            interval: Duration::from_millis(settings.interval_ms),
            max_samples: settings.max_samples.max(1),
        }
    }

    /// Collect linear loudness samples until end-of-stream or error.
    ///
    /// An error part-way through keeps what was measured so far. Results
    /// longer than `max_samples` are averaged down to exactly that length.
    pub fn run(&self, uri: &str) -> Result<Vec<f32>, EngineError> {
        let stream = self.analyzer.open(uri, self.interval)?;
        let mut samples = Vec::new();
        for event in stream {
            match event {
                LevelEvent::Level(levels) => {
                    if let Some(v) = level_to_linear(&levels) {
                        samples.push(v);
                    }
                }
                LevelEvent::Eos => break,
                LevelEvent::Error(msg) => {
                    warn!(uri = %uri, error = %msg, "analysis stream error");
                    break;
                }
            }
        }
        debug!(uri = %uri, samples = samples.len(), "analysis pass done");

        if samples.len() > self.max_samples {
            samples = bucket_means(&samples, self.max_samples);
        }
        Ok(samples)
    }
}
