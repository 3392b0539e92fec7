//! WebRTC VAD adapter.
//!
//! Classifies fixed-length frames with the `webrtc-vad` engine and merges
//! consecutive speech frames into intervals. The engine only accepts
//! 8/16/32/48 kHz input, so callers resample first.

use anyhow::{anyhow, bail, Result};
use tracing::debug;
use webrtc_vad::{SampleRate, Vad, VadMode};

use super::{frames_to_intervals, Aggressiveness, FrameDuration, SpeechDetector, SpeechInterval};

impl From<Aggressiveness> for VadMode {
    fn from(agg: Aggressiveness) -> Self {
        match agg {
            Aggressiveness::Quality => VadMode::Quality,
            Aggressiveness::LowBitrate => VadMode::LowBitrate,
            Aggressiveness::Aggressive => VadMode::Aggressive,
            Aggressiveness::VeryAggressive => VadMode::VeryAggressive,
        }
    }
}

/// Whether the engine accepts this sample rate.
pub fn supported_rate(sample_rate: u32) -> bool {
    vad_rate(sample_rate).is_ok()
}

fn vad_rate(sample_rate: u32) -> Result<SampleRate> {
    match sample_rate {
        8000 => Ok(SampleRate::Rate8kHz),
        16000 => Ok(SampleRate::Rate16kHz),
        32000 => Ok(SampleRate::Rate32kHz),
        48000 => Ok(SampleRate::Rate48kHz),
        other => bail!(
            "WebRTC VAD does not support {} Hz (use 8000, 16000, 32000, or 48000)",
            other
        ),
    }
}

/// Frame-based detector over the WebRTC VAD engine.
pub struct WebRtcDetector {
    aggressiveness: Aggressiveness,
    frame: FrameDuration,
}

impl WebRtcDetector {
    pub fn new(aggressiveness: Aggressiveness, frame: FrameDuration) -> Self {
        Self {
            aggressiveness,
            frame,
        }
    }
}

impl SpeechDetector for WebRtcDetector {
    fn detect(&mut self, samples: &[f32], sample_rate: u32) -> Result<Vec<SpeechInterval>> {
        let rate = vad_rate(sample_rate)?;
        let frame_samples = self.frame.samples_at(sample_rate);
        let mut vad = Vad::new_with_rate_and_mode(rate, self.aggressiveness.into());

        let mut flags = Vec::with_capacity(samples.len() / frame_samples + 1);
        let mut pcm = vec![0i16; frame_samples];
        // A trailing partial frame cannot be classified; it counts as non-speech.
        for frame in samples.chunks_exact(frame_samples) {
            for (dst, &src) in pcm.iter_mut().zip(frame) {
                *dst = (src * 32768.0).clamp(-32768.0, 32767.0) as i16;
            }
            let speech = vad
                .is_voice_segment(&pcm)
                .map_err(|_| anyhow!("WebRTC VAD rejected a {}-sample frame", frame_samples))?;
            flags.push(speech);
        }

        let intervals = frames_to_intervals(&flags, frame_samples, sample_rate);
        debug!(
            frames = flags.len(),
            intervals = intervals.len(),
            "speech detection complete"
        );
        Ok(intervals)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unsupported_rate_is_an_error() {
        assert!(vad_rate(44100).is_err());
        assert!(vad_rate(8000).is_ok());
    }

    #[test]
    fn supported_rates_are_the_webrtc_four() {
        for rate in [8000, 16000, 32000, 48000] {
            assert!(supported_rate(rate), "{rate} should be supported");
        }
        for rate in [0, 11025, 22050, 44100, 96000] {
            assert!(!supported_rate(rate), "{rate} should be unsupported");
        }
    }

    #[test]
    fn silence_produces_no_intervals() {
        let mut detector = WebRtcDetector::new(Aggressiveness::Quality, FrameDuration::Ms30);
        let silence = vec![0.0f32; 8000];
        let intervals = detector.detect(&silence, 8000).unwrap();
        assert!(intervals.is_empty());
    }
}
