use std::time::Duration;

use rodio::Source;
use tracing::debug;

use crate::library::uri_to_path;

use super::level::LevelScan;
use super::sink::open_decoder;
use super::types::{
    Analyzer, EngineError, LevelStream, ProbeError, ProbeInfo, Prober, duration_to_ns,
};

/// Engine-native prober: opens the decoder to learn the duration.
#[derive(Debug, Default, Clone, Copy)]
pub struct RodioProber;

impl Prober for RodioProber {
    fn probe(&self, uri: &str) -> Result<ProbeInfo, ProbeError> {
        let path = uri_to_path(uri).map_err(|_| ProbeError::UnsupportedUri(uri.to_string()))?;
        let decoder = open_decoder(&path)?;
        let duration_ns = decoder.total_duration().map(duration_to_ns).unwrap_or(0);
        debug!(uri = %uri, duration_ns, "probed");
        Ok(ProbeInfo {
            duration_ns,
            ..ProbeInfo::default()
        })
    }
}

/// Offline decode-and-measure pipeline; never touches the output device.
#[derive(Debug, Default, Clone, Copy)]
pub struct RodioAnalyzer;

impl Analyzer for RodioAnalyzer {
    fn open(&self, uri: &str, interval: Duration) -> Result<LevelStream, EngineError> {
        let path = uri_to_path(uri).map_err(|e| EngineError::Open {
            uri: uri.to_string(),
            reason: e.to_string(),
        })?;
        let decoder = open_decoder(&path).map_err(|e| EngineError::Decode {
            uri: uri.to_string(),
            reason: e.to_string(),
        })?;
        Ok(Box::new(LevelScan::new(decoder, interval)))
    }
}
