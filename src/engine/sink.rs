//! Opening and decoding a URI into a paused `rodio` sink.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use std::time::Duration;

use rodio::decoder::DecoderError;
use rodio::{Decoder, OutputStream, Sink, Source};

use crate::library::uri_to_path;

use super::level::{LevelMeter, LevelTap};
use super::types::{EngineError, ProbeError};

pub(super) fn open_decoder(path: &Path) -> Result<Decoder<BufReader<File>>, ProbeError> {
    let file = File::open(path).map_err(|e| ProbeError::Other(format!("{}: {e}", path.display())))?;
    Decoder::new(BufReader::new(file)).map_err(|e| match e {
        DecoderError::UnrecognizedFormat => ProbeError::MissingCodec(path.display().to_string()),
        other => ProbeError::Other(format!("{}: {other}", path.display())),
    })
}

/// A paused sink for `uri` positioned at `start_at`, with the level meter
/// inserted before output. Also returns the stream's total duration.
pub(super) fn create_sink_at(
    stream: &OutputStream,
    uri: &str,
    start_at: Duration,
    meter_interval: Duration,
    tap: LevelTap,
) -> Result<(Sink, Option<Duration>), EngineError> {
    let path = uri_to_path(uri).map_err(|e| EngineError::Open {
        uri: uri.to_string(),
        reason: e.to_string(),
    })?;
    let decoder = open_decoder(&path).map_err(|e| EngineError::Decode {
        uri: uri.to_string(),
        reason: e.to_string(),
    })?;
    let total = decoder.total_duration();

    // `skip_duration` is the seeking primitive; Duration::ZERO is fine.
    let source = LevelMeter::new(decoder.skip_duration(start_at), meter_interval, tap);

    let sink = Sink::connect_new(stream.mixer());
    sink.append(source);
    sink.pause();
    Ok((sink, total))
}
