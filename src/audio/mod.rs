//! Audio decoding, resampling, and WAV persistence.

pub mod decode;
pub mod resample;
pub mod wav;

/// Duration in seconds of `len` samples at `rate` Hz.
pub fn duration_secs(len: usize, rate: u32) -> f64 {
    len as f64 / rate as f64
}
