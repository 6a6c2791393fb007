use crate::config::AnalysisSettings;
use crate::library::Track;

use super::sampler::level_to_linear;

#[derive(Debug, Clone, PartialEq)]
pub enum LiveUpdate {
    Nothing,
    /// Partial data worth showing now.
    Push(Vec<f32>),
    /// The cap was reached; the waveform is final and should be cached.
    Finished(Vec<f32>),
}

/// Builds a waveform from the playback meter while a track plays.
#[derive(Debug, Clone)]
pub struct LiveAccumulator {
    push_every: u32,
    max_samples: usize,
    events: u32,
}

impl LiveAccumulator {
    pub fn new(settings: &AnalysisSettings) -> Self {
        Self {
            push_every: settings.live_push_every.max(1),
            max_samples: settings.max_samples.max(1),
            events: 0,
        }
    }

    /// New track or a seek: restart the push cadence.
    pub fn reset(&mut self) {
        self.events = 0;
    }

    pub fn on_loudness(&mut self, track: &mut Track, levels: &[f64]) -> LiveUpdate {
        if track.has_waveform() {
            return LiveUpdate::Nothing;
        }
        let Some(value) = level_to_linear(levels) else {
            return LiveUpdate::Nothing;
        };

        let max = self.max_samples;
        let waveform = track.live_waveform_mut();
        waveform.push_live(value, max);
        self.events = self.events.wrapping_add(1);

        if waveform.len() >= max {
            waveform.finalize();
            return LiveUpdate::Finished(waveform.samples().to_vec());
        }
        if self.events % self.push_every == 0 {
            return LiveUpdate::Push(waveform.samples().to_vec());
        }
        LiveUpdate::Nothing
    }
}
