//! Voice activity detection.
//!
//! The pipeline consumes detection through the [`SpeechDetector`] seam and
//! never touches a concrete engine; [`webrtc::WebRtcDetector`] is the
//! shipped adapter.

pub mod webrtc;

pub use webrtc::{supported_rate, WebRtcDetector};

use anyhow::Result;
use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// A time range classified as speech, in seconds. Ordered by start and
/// non-overlapping within one detection result.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpeechInterval {
    pub start: f64,
    pub end: f64,
}

/// Detector aggressiveness, mapped onto the four WebRTC modes.
///
/// Higher modes are stricter about calling a frame speech, trading false
/// negatives for fewer false positives. The default prefers marking
/// ambiguous audio as non-speech.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum Aggressiveness {
    /// Least aggressive; best for clean audio (mode 0).
    #[default]
    Quality,
    /// Low-bitrate optimised (mode 1).
    LowBitrate,
    /// Moderate background noise (mode 2).
    Aggressive,
    /// Noisy environments (mode 3).
    VeryAggressive,
}

/// Frame duration for classification. WebRTC VAD accepts exactly 10, 20,
/// or 30 ms of audio per call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum FrameDuration {
    Ms10,
    Ms20,
    #[default]
    Ms30,
}

impl FrameDuration {
    /// Frame length in samples at the given rate.
    pub fn samples_at(&self, sample_rate: u32) -> usize {
        let ms = match self {
            FrameDuration::Ms10 => 10,
            FrameDuration::Ms20 => 20,
            FrameDuration::Ms30 => 30,
        };
        sample_rate as usize * ms / 1000
    }
}

/// Common seam for speech detectors.
pub trait SpeechDetector {
    /// Classify a mono f32 waveform and return its speech intervals,
    /// ordered by start and non-overlapping.
    fn detect(&mut self, samples: &[f32], sample_rate: u32) -> Result<Vec<SpeechInterval>>;
}

/// Merge per-frame speech flags into intervals.
///
/// Consecutive speech frames form one interval; a flag sequence that ends
/// in speech closes its interval at the last classified frame boundary.
pub(crate) fn frames_to_intervals(
    flags: &[bool],
    frame_samples: usize,
    sample_rate: u32,
) -> Vec<SpeechInterval> {
    let frame_secs = frame_samples as f64 / sample_rate as f64;
    let mut intervals = Vec::new();
    let mut open: Option<f64> = None;

    for (i, &speech) in flags.iter().enumerate() {
        let t = i as f64 * frame_secs;
        match (speech, open) {
            (true, None) => open = Some(t),
            (false, Some(start)) => {
                intervals.push(SpeechInterval { start, end: t });
                open = None;
            }
            _ => {}
        }
    }

    if let Some(start) = open {
        intervals.push(SpeechInterval {
            start,
            end: flags.len() as f64 * frame_secs,
        });
    }

    intervals
}
