//! Serde helpers for optional binary blobs stored as base64 text.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use serde::{Deserialize, Deserializer, Serializer};

use crate::library::ArtBytes;

pub fn encode(bytes: &[u8]) -> String {
    STANDARD.encode(bytes)
}

pub fn decode(text: &str) -> Option<ArtBytes> {
    STANDARD.decode(text.trim()).ok().map(ArtBytes::from)
}

pub fn serialize<S: Serializer>(value: &Option<ArtBytes>, s: S) -> Result<S::Ok, S::Error> {
    match value {
        Some(bytes) => s.serialize_some(&encode(bytes)),
        None => s.serialize_none(),
    }
}

/// Undecodable payloads become `None` instead of failing the document.
pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<ArtBytes>, D::Error> {
    let raw: Option<String> = Option::deserialize(d)?;
    Ok(raw
        .filter(|s| !s.trim().is_empty())
        .and_then(|s| decode(&s)))
}
