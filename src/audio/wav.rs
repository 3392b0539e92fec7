//! 16-bit PCM WAV persistence via hound.

use std::path::Path;

use anyhow::{Context, Result};

/// Write mono f32 samples as a 16-bit PCM WAV file.
pub fn write_pcm16(path: &Path, samples: &[f32], sample_rate: u32) -> Result<()> {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut writer = hound::WavWriter::create(path, spec)
        .with_context(|| format!("create {}", path.display()))?;
    for &sample in samples {
        let s = (sample * 32768.0).clamp(-32768.0, 32767.0) as i16;
        writer
            .write_sample(s)
            .with_context(|| format!("write sample to {}", path.display()))?;
    }
    writer
        .finalize()
        .with_context(|| format!("finalize {}", path.display()))?;
    Ok(())
}

/// Read a mono 16-bit PCM WAV file back into f32 samples.
pub fn read_pcm16(path: &Path) -> Result<(Vec<f32>, u32)> {
    let mut reader =
        hound::WavReader::open(path).with_context(|| format!("open {}", path.display()))?;
    let rate = reader.spec().sample_rate;
    let samples = reader
        .samples::<i16>()
        .map(|s| s.map(|v| v as f32 / 32768.0))
        .collect::<Result<Vec<_>, _>>()
        .with_context(|| format!("read samples from {}", path.display()))?;
    Ok((samples, rate))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trip_preserves_length_and_rate() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tone.wav");
        let wave: Vec<f32> = (0..800).map(|i| (i as f32 * 0.01).sin() * 0.5).collect();

        write_pcm16(&path, &wave, 8000).unwrap();
        let (back, rate) = read_pcm16(&path).unwrap();

        assert_eq!(rate, 8000);
        assert_eq!(back.len(), wave.len());
        for (a, b) in wave.iter().zip(&back) {
            assert!((a - b).abs() < 1.0 / 32768.0 + 1e-6);
        }
    }

    #[test]
    fn out_of_range_samples_clamp_instead_of_wrapping() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("hot.wav");
        write_pcm16(&path, &[2.0, -2.0], 8000).unwrap();
        let (back, _) = read_pcm16(&path).unwrap();
        assert!((back[0] - (32767.0 / 32768.0)).abs() < 1e-6);
        assert!((back[1] + 1.0).abs() < 1e-6);
    }
}
