//! Batch speech removal for field recordings.
//!
//! Pipeline per file: decode → resample to a fixed rate → BS.1770 loudness
//! normalization → WebRTC voice-activity detection → speech stripping →
//! 16-bit PCM WAV output. Files left with no more than the minimum
//! non-speech duration are rejected and leave no output behind.

pub mod audio;
pub mod config;
pub mod loudness;
pub mod pipeline;
pub mod strip;
pub mod vad;

pub use config::PipelineConfig;
pub use pipeline::{BatchSummary, FileReport, Outcome, Pipeline};
