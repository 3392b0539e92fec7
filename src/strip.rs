//! Speech-segment stripping.
//!
//! Consumes a waveform plus the detector's speech intervals and produces the
//! concatenation, in original order, of every sample that falls outside the
//! intervals, together with the retained (non-speech) regions.

use crate::vad::SpeechInterval;

/// A contiguous non-speech region copied into the output, in seconds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetainedInterval {
    pub start: f64,
    pub end: f64,
}

/// Output of [`strip_speech`].
#[derive(Debug, Clone, PartialEq)]
pub struct Stripped {
    /// Non-speech samples, concatenated in original temporal order.
    pub samples: Vec<f32>,
    /// Complement regions of the speech intervals within the signal.
    pub retained: Vec<RetainedInterval>,
}

/// Remove the given speech intervals from `samples`.
///
/// Intervals are taken as sorted by start and non-overlapping. Interval
/// endpoints are converted to sample indices and clamped to the signal;
/// a degenerate interval (end ≤ start after clamping, or entirely behind
/// an already-cut region) contributes no samples and is skipped.
///
/// Pure function of its inputs: no resampling, no dithering.
pub fn strip_speech(samples: &[f32], intervals: &[SpeechInterval], sample_rate: u32) -> Stripped {
    let len = samples.len();
    let rate = sample_rate as f64;

    let mut out = Vec::new();
    let mut retained = Vec::new();
    // First sample index not yet emitted or cut.
    let mut cursor = 0usize;

    for iv in intervals {
        let start = ((iv.start * rate).round() as i64).clamp(0, len as i64) as usize;
        let end = ((iv.end * rate).round() as i64).clamp(0, len as i64) as usize;
        if end <= start || end <= cursor {
            continue;
        }
        let start = start.max(cursor);
        if start > cursor {
            out.extend_from_slice(&samples[cursor..start]);
            retained.push(RetainedInterval {
                start: cursor as f64 / rate,
                end: start as f64 / rate,
            });
        }
        cursor = end;
    }

    if cursor < len {
        out.extend_from_slice(&samples[cursor..len]);
        retained.push(RetainedInterval {
            start: cursor as f64 / rate,
            end: len as f64 / rate,
        });
    }

    Stripped { samples: out, retained }
}
