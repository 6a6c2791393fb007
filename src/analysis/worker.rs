use std::collections::HashSet;
use std::panic::{self, AssertUnwindSafe};
use std::sync::mpsc::{self, Sender};
use std::thread;

use tracing::{debug, info, warn};

use crate::cache::WaveformCache;
use crate::library::Track;

use super::sampler::WaveformSampler;

/// Completion message for one analysis run. Always posted, even when the
/// run failed or panicked.
#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisResult {
    pub uri: String,
    pub samples: Result<Vec<f32>, String>,
    /// Served from the waveform cache; nothing new to persist.
    pub cached: bool,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum RequestOutcome {
    /// The track already carries final waveform data.
    AlreadyHave,
    /// A run for this URI is queued or executing.
    InFlight,
    /// Loaded synchronously from the waveform cache.
    CacheHit,
    /// Handed to the worker thread.
    Queued,
}

/// Serial waveform analysis: one worker thread draining a FIFO.
///
/// Lives on the main loop. The in-flight set is only touched here; the
/// worker thread reads the cache but never writes it, and reports back
/// through `post`.
pub struct AnalysisWorker {
    jobs: Sender<String>,
    in_flight: HashSet<String>,
    cache: WaveformCache,
    dispatched: usize,
}

impl AnalysisWorker {
    pub fn spawn<F>(sampler: WaveformSampler, cache: WaveformCache, post: F) -> Self
    where
        F: Fn(AnalysisResult) + Send + 'static,
    {
        let (jobs, rx) = mpsc::channel::<String>();
        let worker_cache = cache.clone();

        thread::spawn(move || {
            for uri in rx {
                // Live playback may have finished this one while it was queued.
                if let Some(samples) = worker_cache.load(&uri) {
                    debug!(uri = %uri, "waveform cached meanwhile, skipping analysis");
                    post(AnalysisResult {
                        uri,
                        samples: Ok(samples),
                        cached: true,
                    });
                    continue;
                }
                let outcome = panic::catch_unwind(AssertUnwindSafe(|| sampler.run(&uri)));
                let samples = match outcome {
                    Ok(Ok(samples)) => Ok(samples),
                    Ok(Err(e)) => {
                        warn!(uri = %uri, error = %e, "waveform analysis failed");
                        Err(e.to_string())
                    }
                    Err(_) => {
                        warn!(uri = %uri, "waveform analysis panicked");
                        Err("analysis panicked".to_string())
                    }
                };
                post(AnalysisResult {
                    uri,
                    samples,
                    cached: false,
                });
            }
            debug!("analysis worker exiting");
        });

        Self {
            jobs,
            in_flight: HashSet::new(),
            cache,
            dispatched: 0,
        }
    }

    /// Make sure `track` gets waveform data, doing as little work as
    /// possible. A cache hit is installed on the track before returning.
    pub fn request(&mut self, track: &mut Track) -> RequestOutcome {
        if track.has_waveform() {
            return RequestOutcome::AlreadyHave;
        }
        let uri = track.uri().to_string();
        if self.in_flight.contains(&uri) {
            return RequestOutcome::InFlight;
        }
        if let Some(samples) = self.cache.load(&uri) {
            track.set_waveform(samples);
            return RequestOutcome::CacheHit;
        }

        if self.jobs.send(uri.clone()).is_err() {
            warn!(uri = %uri, "analysis worker is gone");
            return RequestOutcome::InFlight;
        }
        info!(uri = %uri, "waveform analysis queued");
        self.in_flight.insert(uri);
        self.dispatched += 1;
        RequestOutcome::Queued
    }

    /// Clear the in-flight marker for a finished run.
    pub fn finish(&mut self, uri: &str) {
        self.in_flight.remove(uri);
    }

    pub fn is_in_flight(&self, uri: &str) -> bool {
        self.in_flight.contains(uri)
    }

    pub fn cache(&self) -> &WaveformCache {
        &self.cache
    }

    /// Runs handed to the worker thread so far.
    pub fn dispatched(&self) -> usize {
        self.dispatched
    }
}
