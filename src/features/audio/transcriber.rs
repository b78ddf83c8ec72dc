//! # Feature: Voice Note Transcription
//!
//! Whisper-powered transcription of chat voice notes. Telegram records voice
//! notes as Opus in an Ogg container, which Whisper does not take directly,
//! so those go through ffmpeg first.
//!
//! - **Version**: 2.0.0
//! - **Since**: 0.1.0
//! - **Toggleable**: true
//!
//! ## Changelog
//! - 2.0.0: Telegram voice notes, reqwest download into the temp directory
//! - 1.2.0: Added ffmpeg conversion for broader format support
//! - 1.0.0: Initial release with Whisper API integration

use anyhow::{anyhow, Result};
use log::{error, info, warn};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tokio::fs;
use tokio::process::Command;

#[derive(Debug)]
pub struct TranscriptionResult {
    pub text: String,
    pub duration_seconds: u32,
}

/// Formats that OpenAI Whisper supports natively (no conversion needed)
const WHISPER_NATIVE_FORMATS: &[&str] =
    &[".mp3", ".mp4", ".m4a", ".wav", ".webm", ".mpeg", ".mpga"];

/// All formats we accept (will convert if not native)
const SUPPORTED_FORMATS: &[&str] = &[
    ".mp3", ".mp4", ".m4a", ".wav", ".webm", ".mpeg", ".mpga",
    ".oga", ".ogg", ".opus", ".flac", ".aac",
];

#[derive(Clone)]
pub struct AudioTranscriber {
    openai_api_key: String,
    http: reqwest::Client,
}

impl AudioTranscriber {
    pub fn new(openai_api_key: String) -> Self {
        AudioTranscriber {
            openai_api_key,
            http: reqwest::Client::new(),
        }
    }

    pub async fn transcribe_file(&self, file_path: &Path) -> Result<String> {
        let display = file_path.display();
        info!("Transcribing audio file: {display}");

        if !is_audio_file(&file_path.to_string_lossy()) {
            return Err(anyhow!("File is not a supported audio format"));
        }
        if fs::metadata(file_path).await.is_err() {
            return Err(anyhow!("Audio file not found: {display}"));
        }

        let output = Command::new("curl")
            .args([
                "-sS",
                "https://api.openai.com/v1/audio/transcriptions",
                "-H",
                &format!("Authorization: Bearer {}", self.openai_api_key),
                "-H",
                "Content-Type: multipart/form-data",
                "-F",
                &format!("file=@{display}"),
                "-F",
                "model=whisper-1",
            ])
            .output()
            .await?;

        if !output.status.success() {
            let error_msg = String::from_utf8_lossy(&output.stderr);
            error!("Transcription failed: {error_msg}");
            return Err(anyhow!("Transcription failed: {}", error_msg));
        }

        let response = String::from_utf8(output.stdout)?;
        let json: serde_json::Value = serde_json::from_str(&response)?;
        if let Some(text) = json.get("text").and_then(|t| t.as_str()) {
            info!("Transcription successful, length: {} characters", text.len());
            Ok(text.to_string())
        } else if let Some(error) = json.get("error") {
            error!("OpenAI API error: {error}");
            Err(anyhow!("OpenAI API error: {}", error))
        } else {
            error!("Unexpected response format: {response}");
            Err(anyhow!("Unexpected response format"))
        }
    }

    /// Convert to mp3 next to the input file
    async fn convert_to_mp3(&self, input_path: &Path) -> Result<PathBuf> {
        let output_path = input_path.with_extension("mp3");
        info!("Converting {} to mp3 via ffmpeg", input_path.display());
        let start = Instant::now();

        let output = Command::new("ffmpeg")
            .arg("-i")
            .arg(input_path)
            .args(["-vn", "-acodec", "libmp3lame", "-q:a", "2", "-y"])
            .arg(&output_path)
            .output()
            .await
            .map_err(|e| {
                error!("FFmpeg not found: {e}");
                anyhow!("FFmpeg is required for voice notes but not installed. Install with: apt install ffmpeg")
            })?;

        if output.status.success() {
            info!("FFmpeg conversion completed in {:?}", start.elapsed());
            Ok(output_path)
        } else {
            let stderr = String::from_utf8_lossy(&output.stderr);
            error!("FFmpeg conversion failed: {stderr}");
            Err(anyhow!("FFmpeg conversion failed: {}", stderr))
        }
    }

    /// Download a voice note, convert it when needed, and transcribe it.
    /// Temporary files are removed whatever the outcome.
    pub async fn download_and_transcribe(
        &self,
        url: &str,
        filename: &str,
        duration_seconds: u32,
    ) -> Result<TranscriptionResult> {
        let temp_file = std::env::temp_dir().join(format!("carebot_voice_{filename}"));
        info!("Downloading voice note: {filename}");

        let response = self.http.get(url).send().await?;
        if !response.status().is_success() {
            return Err(anyhow!("Failed to download voice note: HTTP {}", response.status()));
        }
        let bytes = response.bytes().await?;
        fs::write(&temp_file, &bytes).await?;

        let mut converted_file: Option<PathBuf> = None;
        let file_to_transcribe = if needs_conversion(filename) {
            match self.convert_to_mp3(&temp_file).await {
                Ok(mp3_path) => {
                    converted_file = Some(mp3_path.clone());
                    mp3_path
                }
                Err(e) => {
                    let _ = fs::remove_file(&temp_file).await;
                    return Err(e);
                }
            }
        } else {
            temp_file.clone()
        };

        let transcription = self.transcribe_file(&file_to_transcribe).await;

        if let Err(e) = fs::remove_file(&temp_file).await {
            warn!("Failed to cleanup temp file {}: {e}", temp_file.display());
        }
        if let Some(converted) = &converted_file {
            if let Err(e) = fs::remove_file(converted).await {
                warn!("Failed to cleanup converted file {}: {e}", converted.display());
            }
        }

        transcription.map(|text| TranscriptionResult {
            text,
            duration_seconds,
        })
    }
}

/// Check if file is a supported audio format
fn is_audio_file(file_path: &str) -> bool {
    let lower = file_path.to_lowercase();
    SUPPORTED_FORMATS.iter().any(|ext| lower.ends_with(ext))
}

/// Check if file format needs conversion before sending to Whisper
fn needs_conversion(filename: &str) -> bool {
    let lower = filename.to_lowercase();
    !WHISPER_NATIVE_FORMATS.iter().any(|ext| lower.ends_with(ext))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_voice_note_needs_conversion() {
        assert!(is_audio_file("file_12.oga"));
        assert!(needs_conversion("file_12.oga"));
        assert!(!needs_conversion("memo.MP3"));
    }

    #[test]
    fn test_unsupported_format() {
        assert!(!is_audio_file("photo.jpg"));
    }

    #[tokio::test]
    async fn test_missing_file_is_an_error() {
        let transcriber = AudioTranscriber::new("test".to_string());
        let err = transcriber
            .transcribe_file(Path::new("/nonexistent/carebot_missing.mp3"))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("not found"));
    }
}
