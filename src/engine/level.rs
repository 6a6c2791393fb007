//! Loudness metering over interleaved `f32` samples.

use std::sync::Arc;
use std::time::Duration;

use rodio::Source;
use rodio::source::SeekError;

use super::types::LevelEvent;

/// Level reported for digital silence.
pub const SILENCE_DB: f64 = -100.0;

pub fn rms_db(sum_squares: f64, count: usize) -> f64 {
    if count == 0 {
        return SILENCE_DB;
    }
    let rms = (sum_squares / count as f64).sqrt();
    if rms <= 0.0 {
        return SILENCE_DB;
    }
    (20.0 * rms.log10()).max(SILENCE_DB)
}

/// Per-channel RMS over fixed-length windows.
#[derive(Debug, Clone)]
pub(crate) struct LevelWindow {
    channels: usize,
    window_samples: usize,
    sums: Vec<f64>,
    seen: usize,
}

impl LevelWindow {
    pub(crate) fn new(channels: u16, sample_rate: u32, interval: Duration) -> Self {
        let channels = usize::from(channels.max(1));
        let frames = (f64::from(sample_rate) * interval.as_secs_f64()).round() as usize;
        Self {
            channels,
            window_samples: frames.max(1) * channels,
            sums: vec![0.0; channels],
            seen: 0,
        }
    }

    /// Feed one sample; returns the levels when a window completes.
    pub(crate) fn push(&mut self, sample: f32) -> Option<Vec<f64>> {
        let ch = self.seen % self.channels;
        self.sums[ch] += f64::from(sample) * f64::from(sample);
        self.seen += 1;
        if self.seen >= self.window_samples {
            Some(self.take())
        } else {
            None
        }
    }

    /// Levels for a trailing partial window, if it holds anything.
    pub(crate) fn flush(&mut self) -> Option<Vec<f64>> {
        (self.seen > 0).then(|| self.take())
    }

    pub(crate) fn reset(&mut self) {
        self.sums.iter_mut().for_each(|s| *s = 0.0);
        self.seen = 0;
    }

    fn take(&mut self) -> Vec<f64> {
        let frames = (self.seen / self.channels).max(1);
        let levels = self.sums.iter().map(|s| rms_db(*s, frames)).collect();
        self.reset();
        levels
    }
}

pub type LevelTap = Arc<dyn Fn(Vec<f64>) + Send + Sync>;

/// Pass-through `Source` that reports levels to `tap` once per interval.
pub struct LevelMeter<S> {
    input: S,
    window: LevelWindow,
    tap: LevelTap,
}

impl<S: Source> LevelMeter<S> {
    pub fn new(input: S, interval: Duration, tap: LevelTap) -> Self {
        let window = LevelWindow::new(input.channels(), input.sample_rate(), interval);
        Self { input, window, tap }
    }
}

impl<S: Source> Iterator for LevelMeter<S> {
    type Item = f32;

    fn next(&mut self) -> Option<f32> {
        let sample = self.input.next()?;
        if let Some(levels) = self.window.push(sample) {
            (self.tap)(levels);
        }
        Some(sample)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.input.size_hint()
    }
}

impl<S: Source> Source for LevelMeter<S> {
    fn current_span_len(&self) -> Option<usize> {
        self.input.current_span_len()
    }

    fn channels(&self) -> rodio::ChannelCount {
        self.input.channels()
    }

    fn sample_rate(&self) -> rodio::SampleRate {
        self.input.sample_rate()
    }

    fn total_duration(&self) -> Option<Duration> {
        self.input.total_duration()
    }

    fn try_seek(&mut self, pos: Duration) -> Result<(), SeekError> {
        self.window.reset();
        self.input.try_seek(pos)
    }
}

/// Drains a source as fast as it decodes, yielding one `Level` per
/// interval and a final `Eos`.
pub struct LevelScan<S> {
    input: S,
    window: LevelWindow,
    done: bool,
}

impl<S: Source> LevelScan<S> {
    pub fn new(input: S, interval: Duration) -> Self {
        let window = LevelWindow::new(input.channels(), input.sample_rate(), interval);
        Self {
            input,
            window,
            done: false,
        }
    }
}

impl<S: Source> Iterator for LevelScan<S> {
    type Item = LevelEvent;

    fn next(&mut self) -> Option<LevelEvent> {
        if self.done {
            return None;
        }
        for sample in self.input.by_ref() {
            if let Some(levels) = self.window.push(sample) {
                return Some(LevelEvent::Level(levels));
            }
        }
        if let Some(levels) = self.window.flush() {
            return Some(LevelEvent::Level(levels));
        }
        self.done = true;
        Some(LevelEvent::Eos)
    }
}
