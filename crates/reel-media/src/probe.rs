//! FFprobe duration probing.

use std::path::Path;
use std::process::Stdio;

use serde::Deserialize;
use tokio::process::Command;

use crate::command::check_ffprobe;
use crate::error::{MediaError, MediaResult};

/// FFprobe JSON output format.
#[derive(Debug, Deserialize)]
struct FfprobeOutput {
    #[serde(default)]
    format: Option<FfprobeFormat>,
    #[serde(default)]
    streams: Vec<FfprobeStream>,
}

#[derive(Debug, Deserialize)]
struct FfprobeFormat {
    duration: Option<String>,
}

#[derive(Debug, Deserialize)]
struct FfprobeStream {
    #[serde(default)]
    codec_type: String,
    duration: Option<String>,
}

/// Probe an audio file for its duration in seconds.
///
/// Fails when the file is missing, has no audio stream, or reports no
/// positive finite duration.
pub async fn probe_duration(path: impl AsRef<Path>) -> MediaResult<f64> {
    let path = path.as_ref();

    if !path.exists() {
        return Err(MediaError::FileNotFound(path.to_path_buf()));
    }

    check_ffprobe()?;

    let output = Command::new("ffprobe")
        .args([
            "-v",
            "error",
            "-print_format",
            "json",
            "-show_format",
            "-show_streams",
        ])
        .arg(path)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .output()
        .await?;

    if !output.status.success() {
        return Err(MediaError::FfprobeFailed {
            message: format!("FFprobe failed for {}", path.display()),
            stderr: Some(String::from_utf8_lossy(&output.stderr).trim().to_string()),
        });
    }

    parse_audio_duration(&output.stdout)
}

/// Extract the audio duration from FFprobe JSON.
///
/// Prefers the container duration and falls back to the longest audio
/// stream duration.
pub(crate) fn parse_audio_duration(json: &[u8]) -> MediaResult<f64> {
    let probe: FfprobeOutput = serde_json::from_slice(json)?;

    let audio_streams: Vec<_> = probe
        .streams
        .iter()
        .filter(|s| s.codec_type == "audio")
        .collect();
    if audio_streams.is_empty() {
        return Err(MediaError::invalid_media("no audio stream found"));
    }

    let container = probe
        .format
        .as_ref()
        .and_then(|f| f.duration.as_deref())
        .and_then(parse_seconds);
    let stream = audio_streams
        .iter()
        .filter_map(|s| s.duration.as_deref().and_then(parse_seconds))
        .fold(None, |max: Option<f64>, d| Some(max.map_or(d, |m| m.max(d))));

    container
        .or(stream)
        .ok_or_else(|| MediaError::invalid_media("audio duration is unknown"))
}

fn parse_seconds(value: &str) -> Option<f64> {
    value
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|d| d.is_finite() && *d > 0.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_container_duration() {
        let json = br#"{
            "streams": [{"codec_type": "audio", "duration": "11.990000"}],
            "format": {"duration": "12.000000"}
        }"#;
        assert!((parse_audio_duration(json).unwrap() - 12.0).abs() < 1e-9);
    }

    #[test]
    fn test_falls_back_to_stream_duration() {
        let json = br#"{
            "streams": [{"codec_type": "audio", "duration": "5.5"}],
            "format": {"duration": "N/A"}
        }"#;
        assert!((parse_audio_duration(json).unwrap() - 5.5).abs() < 1e-9);
    }

    #[test]
    fn test_rejects_missing_audio_stream() {
        let json = br#"{"streams": [{"codec_type": "video"}], "format": {"duration": "3.0"}}"#;
        assert!(matches!(parse_audio_duration(json), Err(MediaError::InvalidMedia(_))));
    }

    #[test]
    fn test_rejects_zero_duration() {
        let json = br#"{"streams": [{"codec_type": "audio"}], "format": {"duration": "0.000"}}"#;
        assert!(matches!(parse_audio_duration(json), Err(MediaError::InvalidMedia(_))));
    }

    #[test]
    fn test_rejects_garbage() {
        assert!(matches!(parse_audio_duration(b"not json"), Err(MediaError::JsonParse(_))));
    }

    #[tokio::test]
    async fn test_missing_file() {
        let result = probe_duration("/definitely/not/here.wav").await;
        assert!(matches!(result, Err(MediaError::FileNotFound(_))));
    }
}
