//! Integrated loudness measurement and gain normalization.
//!
//! Measurement goes through the [`LoudnessMeter`] seam; [`Bs1770Meter`] is
//! the shipped adapter over the `ebur128` crate (BS.1770 / EBU R128).

use anyhow::{Context, Result};
use ebur128::{EbuR128, Mode};

/// Common seam for loudness meters.
pub trait LoudnessMeter {
    /// Integrated loudness of a mono waveform in LUFS. May be `-inf` for
    /// silent input, matching the underlying standard.
    fn integrated_loudness(&self, samples: &[f32], sample_rate: u32) -> Result<f64>;
}

/// BS.1770 meter backed by `ebur128`, mono, integrated mode.
pub struct Bs1770Meter;

impl LoudnessMeter for Bs1770Meter {
    fn integrated_loudness(&self, samples: &[f32], sample_rate: u32) -> Result<f64> {
        let mut meter =
            EbuR128::new(1, sample_rate, Mode::I).context("create BS.1770 meter")?;
        meter
            .add_frames_f32(samples)
            .context("feed BS.1770 meter")?;
        meter.loudness_global().context("integrated loudness")
    }
}

/// Linear gain that moves `current` LUFS to `target` LUFS.
fn gain_for(current: f64, target: f64) -> f64 {
    10f64.powf((target - current) / 20.0)
}

/// Rescale amplitude so measured loudness approximates `target`.
///
/// May clip; clipping correction is out of scope. A non-finite `current`
/// measurement (silent input) returns the waveform unchanged, since any
/// gain derived from it would be meaningless.
pub fn normalize(samples: &[f32], current: f64, target: f64) -> Vec<f32> {
    if !current.is_finite() {
        return samples.to_vec();
    }
    let gain = gain_for(current, target) as f32;
    samples.iter().map(|&s| s * gain).collect()
}
