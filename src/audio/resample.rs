//! Offline resampling via rubato.

use anyhow::{Context, Result};
use rubato::{FftFixedIn, Resampler};

/// Input chunk size fed to the FFT resampler.
const CHUNK_SIZE: usize = 1024;

/// Resample a mono waveform from `from` Hz to `to` Hz.
///
/// Identity when the rates already match. The resampler's output delay is
/// trimmed and the result truncated to `len * to / from` frames, so interval
/// arithmetic downstream sees the expected duration.
pub fn resample(samples: &[f32], from: u32, to: u32) -> Result<Vec<f32>> {
    if from == to || samples.is_empty() {
        return Ok(samples.to_vec());
    }

    let mut resampler = FftFixedIn::<f32>::new(from as usize, to as usize, CHUNK_SIZE, 2, 1)
        .with_context(|| format!("create {} -> {} Hz resampler", from, to))?;
    let delay = resampler.output_delay();
    let expected = (samples.len() as f64 * to as f64 / from as f64).round() as usize;

    let mut out: Vec<f32> = Vec::with_capacity(expected + delay);
    let mut pos = 0usize;
    while samples.len() - pos >= resampler.input_frames_next() {
        let n = resampler.input_frames_next();
        let chunk = resampler
            .process(&[&samples[pos..pos + n]], None)
            .context("resample chunk")?;
        out.extend_from_slice(&chunk[0]);
        pos += n;
    }
    if pos < samples.len() {
        let chunk = resampler
            .process_partial(Some(&[&samples[pos..]]), None)
            .context("resample tail")?;
        out.extend_from_slice(&chunk[0]);
    }
    // The output trails the input by `delay` frames; flush until the
    // expected length is covered.
    while out.len() < delay + expected {
        let chunk = resampler
            .process_partial::<&[f32]>(None, None)
            .context("flush resampler")?;
        if chunk[0].is_empty() {
            break;
        }
        out.extend_from_slice(&chunk[0]);
    }

    out.drain(..delay.min(out.len()));
    out.truncate(expected);
    Ok(out)
}
