//! Pipeline orchestration: load → normalize → detect → strip → persist.
//!
//! The orchestrator depends only on the [`LoudnessMeter`] and
//! [`SpeechDetector`] seams, so tests can drive it with canned detector
//! output and a flat meter.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::{debug, info, warn};

use crate::audio::{self, decode, resample, wav};
use crate::config::PipelineConfig;
use crate::loudness::{self, LoudnessMeter};
use crate::strip::{strip_speech, RetainedInterval};
use crate::vad::SpeechDetector;

/// Terminal outcome for one input file.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// More than the minimum non-speech duration survived; the stripped
    /// waveform was written.
    Accepted {
        stripped_secs: f64,
        retained: Vec<RetainedInterval>,
    },
    /// Stripping left too little audio; no output remains.
    Rejected,
    /// Normalize-only mode; the normalized waveform was written unstripped.
    NormalizedOnly,
}

/// Per-file report: measured input values plus the terminal outcome.
#[derive(Debug, Clone)]
pub struct FileReport {
    pub file: String,
    pub original_secs: f64,
    pub original_loudness: f64,
    pub outcome: Outcome,
}

/// Totals for one directory run.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct BatchSummary {
    pub accepted: usize,
    pub rejected: usize,
    pub normalized: usize,
    pub failed: usize,
}

pub struct Pipeline<L, D> {
    meter: L,
    detector: D,
    config: PipelineConfig,
}

impl<L: LoudnessMeter, D: SpeechDetector> Pipeline<L, D> {
    pub fn new(meter: L, detector: D, config: PipelineConfig) -> Self {
        Self {
            meter,
            detector,
            config,
        }
    }

    /// Process `root/file`, writing any output under `destination`.
    ///
    /// One call runs the full chain for a single file; no state persists
    /// between calls.
    pub fn process(&mut self, root: &Path, file: &str, destination: &Path) -> Result<FileReport> {
        let input = root.join(file);
        let (raw, native_rate) = decode::load(&input)?;
        let rate = self.config.sample_rate;
        let samples = resample::resample(&raw, native_rate, rate)?;

        let original_secs = audio::duration_secs(samples.len(), rate);
        let original_loudness = self.meter.integrated_loudness(&samples, rate)?;
        debug!(
            file,
            secs = original_secs,
            lufs = original_loudness,
            "measured input"
        );
        if !original_loudness.is_finite() {
            warn!(file, "input measured as silent; leaving gain untouched");
        }
        let normalized = loudness::normalize(&samples, original_loudness, self.config.target_loudness);

        let dest = output_path(destination, file);

        if self.config.normalize_only {
            wav::write_pcm16(&dest, &normalized, rate)?;
            return Ok(FileReport {
                file: file.to_string(),
                original_secs,
                original_loudness,
                outcome: Outcome::NormalizedOnly,
            });
        }

        let intervals = self.detector.detect(&normalized, rate)?;
        let stripped = strip_speech(&normalized, &intervals, rate);
        let stripped_secs = audio::duration_secs(stripped.samples.len(), rate);
        debug!(
            file,
            intervals = intervals.len(),
            stripped_secs,
            "speech stripped"
        );

        let outcome = if stripped_secs > self.config.min_keep_secs {
            wav::write_pcm16(&dest, &stripped.samples, rate)?;
            Outcome::Accepted {
                stripped_secs,
                retained: stripped.retained,
            }
        } else {
            // Nothing may remain at the destination for a rejected file,
            // including a leftover from a previous run.
            if dest.exists() {
                fs::remove_file(&dest).with_context(|| format!("remove {}", dest.display()))?;
            }
            Outcome::Rejected
        };

        Ok(FileReport {
            file: file.to_string(),
            original_secs,
            original_loudness,
            outcome,
        })
    }

    /// Process every recognized audio file under `root`, in directory
    /// listing order. A failing file is logged and counted; the batch
    /// continues with the next one.
    pub fn run_batch<F>(
        &mut self,
        root: &Path,
        destination: &Path,
        mut on_report: F,
    ) -> Result<BatchSummary>
    where
        F: FnMut(&FileReport),
    {
        fs::create_dir_all(destination)
            .with_context(|| format!("create {}", destination.display()))?;

        let mut summary = BatchSummary::default();
        // Output paths claimed by earlier iterations of this run. Stems can
        // collide after the extension swap (rec.mp3 vs rec.wav); processing
        // both would let one iteration overwrite or delete the other's
        // output, so the later one fails instead.
        let mut claimed: HashSet<PathBuf> = HashSet::new();
        for entry in
            fs::read_dir(root).with_context(|| format!("read {}", root.display()))?
        {
            let entry = entry.context("read directory entry")?;
            if !entry.file_type().map(|t| t.is_file()).unwrap_or(false) {
                continue;
            }
            let name = entry.file_name();
            let Some(name) = name.to_str() else {
                continue;
            };
            if !is_audio_file(name) {
                continue;
            }

            let dest = output_path(destination, name);
            if !claimed.insert(dest.clone()) {
                warn!(
                    file = name,
                    output = %dest.display(),
                    "output name collides with an earlier file in this run; skipping"
                );
                summary.failed += 1;
                continue;
            }

            match self.process(root, name, destination) {
                Ok(report) => {
                    match &report.outcome {
                        Outcome::Accepted { .. } => summary.accepted += 1,
                        Outcome::Rejected => summary.rejected += 1,
                        Outcome::NormalizedOnly => summary.normalized += 1,
                    }
                    on_report(&report);
                }
                Err(e) => {
                    warn!(file = name, error = %e, "file failed; continuing batch");
                    summary.failed += 1;
                }
            }
        }

        info!(
            accepted = summary.accepted,
            rejected = summary.rejected,
            normalized = summary.normalized,
            failed = summary.failed,
            "batch complete"
        );
        Ok(summary)
    }
}

/// Outputs always carry a `.wav` extension; the stem is preserved.
fn output_path(destination: &Path, file: &str) -> PathBuf {
    let mut path = destination.join(file);
    path.set_extension("wav");
    path
}

fn is_audio_file(name: &str) -> bool {
    Path::new(name)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| {
            decode::AUDIO_EXTENSIONS
                .iter()
                .any(|a| a.eq_ignore_ascii_case(e))
        })
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vad::SpeechInterval;

    const RATE: u32 = 8000;

    /// Detector that returns a canned interval list.
    struct FixedDetector(Vec<SpeechInterval>);

    impl SpeechDetector for FixedDetector {
        fn detect(&mut self, _samples: &[f32], _rate: u32) -> Result<Vec<SpeechInterval>> {
            Ok(self.0.clone())
        }
    }

    /// Meter that always reports the same loudness.
    struct FlatMeter(f64);

    impl LoudnessMeter for FlatMeter {
        fn integrated_loudness(&self, _samples: &[f32], _rate: u32) -> Result<f64> {
            Ok(self.0)
        }
    }

    fn write_tone(dir: &Path, name: &str, secs: f64) {
        let n = (secs * RATE as f64).round() as usize;
        let samples: Vec<f32> = (0..n).map(|i| (i as f32 * 0.05).sin() * 0.1).collect();
        wav::write_pcm16(&dir.join(name), &samples, RATE).unwrap();
    }

    fn pipeline(
        intervals: Vec<SpeechInterval>,
        normalize_only: bool,
    ) -> Pipeline<FlatMeter, FixedDetector> {
        let config = PipelineConfig {
            normalize_only,
            ..Default::default()
        };
        // Meter reads exactly the target, so normalization is gain 1.0.
        Pipeline::new(FlatMeter(-35.0), FixedDetector(intervals), config)
    }

    fn iv(start: f64, end: f64) -> SpeechInterval {
        SpeechInterval { start, end }
    }

    #[test]
    fn no_speech_passes_through_whole_file() {
        let input = tempfile::tempdir().unwrap();
        let output = tempfile::tempdir().unwrap();
        write_tone(input.path(), "quiet.wav", 5.0);

        let report = pipeline(vec![], false)
            .process(input.path(), "quiet.wav", output.path())
            .unwrap();

        assert!((report.original_secs - 5.0).abs() < 1e-9);
        match report.outcome {
            Outcome::Accepted {
                stripped_secs,
                ref retained,
            } => {
                assert!((stripped_secs - 5.0).abs() < 1e-9);
                assert_eq!(retained.len(), 1);
            }
            ref other => panic!("expected Accepted, got {:?}", other),
        }

        let (back, rate) = wav::read_pcm16(&output.path().join("quiet.wav")).unwrap();
        assert_eq!(rate, RATE);
        assert_eq!(back.len(), 40000);
    }

    #[test]
    fn mostly_speech_is_rejected_with_no_output() {
        let input = tempfile::tempdir().unwrap();
        let output = tempfile::tempdir().unwrap();
        write_tone(input.path(), "talk.wav", 3.0);

        let report = pipeline(vec![iv(0.0, 2.5)], false)
            .process(input.path(), "talk.wav", output.path())
            .unwrap();

        assert_eq!(report.outcome, Outcome::Rejected);
        assert!(!output.path().join("talk.wav").exists());
    }

    #[test]
    fn acceptance_boundary_is_strict() {
        let input = tempfile::tempdir().unwrap();
        let output = tempfile::tempdir().unwrap();
        write_tone(input.path(), "edge.wav", 2.0);

        // Exactly 1.0 s left: rejected.
        let report = pipeline(vec![iv(0.0, 1.0)], false)
            .process(input.path(), "edge.wav", output.path())
            .unwrap();
        assert_eq!(report.outcome, Outcome::Rejected);

        // 1.01 s left: accepted.
        let report = pipeline(vec![iv(0.0, 0.99)], false)
            .process(input.path(), "edge.wav", output.path())
            .unwrap();
        assert!(matches!(report.outcome, Outcome::Accepted { .. }));
        assert!(output.path().join("edge.wav").exists());
    }

    #[test]
    fn retained_runs_match_detected_gaps() {
        let input = tempfile::tempdir().unwrap();
        let output = tempfile::tempdir().unwrap();
        write_tone(input.path(), "long.wav", 10.0);

        let report = pipeline(vec![iv(1.0, 2.0), iv(5.0, 5.5)], false)
            .process(input.path(), "long.wav", output.path())
            .unwrap();

        let Outcome::Accepted {
            stripped_secs,
            retained,
        } = report.outcome
        else {
            panic!("expected Accepted");
        };
        assert!((stripped_secs - 8.5).abs() < 1e-9);
        let runs: Vec<(f64, f64)> = retained.iter().map(|r| (r.start, r.end)).collect();
        assert_eq!(runs, vec![(0.0, 1.0), (2.0, 5.0), (5.5, 10.0)]);
    }

    #[test]
    fn normalize_only_ignores_detector_output() {
        let input = tempfile::tempdir().unwrap();
        let output = tempfile::tempdir().unwrap();
        write_tone(input.path(), "norm.wav", 3.0);

        // Detector would reject everything, but normalize-only never strips.
        let report = pipeline(vec![iv(0.0, 3.0)], true)
            .process(input.path(), "norm.wav", output.path())
            .unwrap();

        assert_eq!(report.outcome, Outcome::NormalizedOnly);
        let (back, _) = wav::read_pcm16(&output.path().join("norm.wav")).unwrap();
        assert_eq!(back.len(), 24000);
    }

    #[test]
    fn rejection_removes_stale_output_from_earlier_run() {
        let input = tempfile::tempdir().unwrap();
        let output = tempfile::tempdir().unwrap();
        write_tone(input.path(), "talk.wav", 3.0);
        write_tone(output.path(), "talk.wav", 3.0); // stale artifact

        let report = pipeline(vec![iv(0.0, 3.0)], false)
            .process(input.path(), "talk.wav", output.path())
            .unwrap();

        assert_eq!(report.outcome, Outcome::Rejected);
        assert!(!output.path().join("talk.wav").exists());
    }

    #[test]
    fn batch_skips_non_audio_and_counts_outcomes() {
        let input = tempfile::tempdir().unwrap();
        let output = tempfile::tempdir().unwrap();
        write_tone(input.path(), "keep.wav", 5.0);
        write_tone(input.path(), "drop.wav", 1.5);
        std::fs::write(input.path().join("notes.txt"), "not audio").unwrap();

        let mut reports = Vec::new();
        let summary = pipeline(vec![iv(0.0, 1.0)], false)
            .run_batch(input.path(), output.path(), |r| reports.push(r.file.clone()))
            .unwrap();

        // keep.wav: 4 s left; drop.wav: 0.5 s left.
        assert_eq!(summary.accepted, 1);
        assert_eq!(summary.rejected, 1);
        assert_eq!(summary.failed, 0);
        assert_eq!(reports.len(), 2);
        assert!(output.path().join("keep.wav").exists());
        assert!(!output.path().join("drop.wav").exists());
    }

    #[test]
    fn unreadable_file_does_not_abort_the_batch() {
        let input = tempfile::tempdir().unwrap();
        let output = tempfile::tempdir().unwrap();
        write_tone(input.path(), "good.wav", 5.0);
        std::fs::write(input.path().join("bad.wav"), b"this is not a wav file").unwrap();

        let summary = pipeline(vec![], false)
            .run_batch(input.path(), output.path(), |_| {})
            .unwrap();

        assert_eq!(summary.accepted, 1);
        assert_eq!(summary.failed, 1);
        assert!(output.path().join("good.wav").exists());
    }

    #[test]
    fn colliding_output_names_never_clobber_a_siblings_output() {
        let input = tempfile::tempdir().unwrap();
        let output = tempfile::tempdir().unwrap();
        // Both names map to the same output path after the extension swap.
        // With speech at [0, 2]: the 5 s file keeps 3 s (accepted), the 2 s
        // file keeps nothing (rejected) — and the rejection must not delete
        // what the sibling wrote.
        write_tone(input.path(), "rec.wav", 5.0);
        write_tone(input.path(), "rec.WAV", 2.0);

        let summary = pipeline(vec![iv(0.0, 2.0)], false)
            .run_batch(input.path(), output.path(), |_| {})
            .unwrap();

        // Whichever file is listed second fails on the collision.
        assert_eq!(summary.failed, 1);
        assert_eq!(summary.accepted + summary.rejected, 1);

        let dest = output.path().join("rec.wav");
        if summary.accepted == 1 {
            let (back, _) = wav::read_pcm16(&dest).unwrap();
            assert_eq!(back.len(), 24000);
        } else {
            assert!(!dest.exists());
        }
    }

    #[test]
    fn output_extension_is_always_wav() {
        assert_eq!(
            output_path(Path::new("/out"), "rec.mp3"),
            PathBuf::from("/out/rec.wav")
        );
        assert_eq!(
            output_path(Path::new("/out"), "rec.wav"),
            PathBuf::from("/out/rec.wav")
        );
    }
}
