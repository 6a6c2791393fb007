//! Waveform analysis: offline sampler, the serial worker, live
//! accumulation from playback and the bar renderer.

mod live;
mod render;
mod sampler;
mod worker;

pub use live::{LiveAccumulator, LiveUpdate};
pub use render::{VISUAL_BOOST, bucket_means, render_bars};
pub use sampler::{WaveformSampler, db_to_linear, level_to_linear};
pub use worker::{AnalysisResult, AnalysisWorker, RequestOutcome};
