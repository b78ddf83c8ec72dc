//! # Audio Feature
//!
//! Voice notes from staff: Whisper transcription followed by a short summary.
//!
//! - **Version**: 2.0.0
//! - **Since**: 0.1.0
//! - **Toggleable**: true
//!
//! ## Changelog
//! - 2.0.0: Voice-note summaries for care notes

pub mod summarizer;
pub mod transcriber;

pub use summarizer::{NoteSummarizer, EMPTY_TRANSCRIPT_SUMMARY};
pub use transcriber::{AudioTranscriber, TranscriptionResult};
