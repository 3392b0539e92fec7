//! Pipeline configuration.

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::vad::{Aggressiveness, FrameDuration};

/// Per-invocation pipeline settings. Every field has a default so a config
/// file may specify only what it changes.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// VAD aggressiveness; the default keeps ambiguous audio as non-speech.
    pub aggressiveness: Aggressiveness,
    /// VAD frame duration.
    pub frame: FrameDuration,
    /// Target sample rate everything is resampled to before measurement
    /// and detection.
    pub sample_rate: u32,
    /// Target integrated loudness in LUFS.
    pub target_loudness: f64,
    /// Skip stripping and persist the normalized waveform as-is.
    pub normalize_only: bool,
    /// Minimum stripped duration in seconds; anything at or below this is
    /// rejected (strictly-greater comparison).
    pub min_keep_secs: f64,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            aggressiveness: Aggressiveness::default(),
            frame: FrameDuration::default(),
            sample_rate: 8000,
            target_loudness: -35.0,
            normalize_only: false,
            min_keep_secs: 1.0,
        }
    }
}

/// Read a JSON config file, falling back to defaults when the file is
/// missing or malformed.
pub fn read_config(path: &Path) -> PipelineConfig {
    read_json_file(path).unwrap_or_default()
}

/// Generic helper: read a JSON file and deserialize it.
fn read_json_file<T: serde::de::DeserializeOwned>(path: &Path) -> Option<T> {
    match std::fs::read_to_string(path) {
        Ok(contents) => match serde_json::from_str(&contents) {
            Ok(val) => Some(val),
            Err(e) => {
                warn!("Failed to parse {}: {}", path.display(), e);
                None
            }
        },
        Err(e) => {
            if e.kind() != std::io::ErrorKind::NotFound {
                warn!("Failed to read {}: {}", path.display(), e);
            }
            None
        }
    }
}
