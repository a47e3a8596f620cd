//! Synthetic media rendered with lavfi sources, plus raw PCM encoding.
//!
//! Every helper renders into a `.partial.` sibling and publishes the file
//! only after FFmpeg succeeds.

use std::path::{Path, PathBuf};

use reel_storage::fs_utils::{discard_file, publish_file};

use crate::command::{FfmpegCommand, FfmpegInput, FfmpegRunner};
use crate::error::MediaResult;

/// Placeholder card colours, cycled by scene index.
pub const PLACEHOLDER_PALETTE: &[&str] = &["#1f77b4", "#ff7f0e", "#2ca02c"];

/// Placeholder card edge length in pixels.
pub const PLACEHOLDER_SIZE: u32 = 1024;

/// Length of generated silence in seconds.
pub const SILENCE_SECS: f64 = 10.0;

/// Raw PCM layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PcmFormat {
    pub sample_rate: u32,
    pub channels: u16,
}

impl Default for PcmFormat {
    /// 24 kHz mono, what speech endpoints return.
    fn default() -> Self {
        Self {
            sample_rate: 24_000,
            channels: 1,
        }
    }
}

/// Palette colour for a scene.
pub fn placeholder_color(index: usize) -> &'static str {
    PLACEHOLDER_PALETTE[index % PLACEHOLDER_PALETTE.len()]
}

/// Single-frame solid colour image. `color` accepts `#rrggbb` or a name.
pub fn color_card_command(color: &str, width: u32, height: u32, output: &Path) -> FfmpegCommand {
    let color = match color.strip_prefix('#') {
        Some(hex) => format!("0x{}", hex),
        None => color.to_string(),
    };
    FfmpegCommand::new(output)
        .input(FfmpegInput::lavfi(format!("color=c={}:s={}x{}", color, width, height)))
        .single_frame()
}

/// Stereo 48 kHz silence encoded as MP3.
pub fn silence_command(duration_secs: f64, output: &Path) -> FfmpegCommand {
    FfmpegCommand::new(output)
        .input(FfmpegInput::lavfi("anullsrc=channel_layout=stereo:sample_rate=48000"))
        .duration(duration_secs)
        .audio_codec("libmp3lame")
}

/// Wrap signed 16-bit little-endian PCM in a WAV container.
pub fn pcm_to_wav_command(pcm: &Path, format: PcmFormat, output: &Path) -> FfmpegCommand {
    FfmpegCommand::new(output)
        .input(
            FfmpegInput::file(pcm)
                .format("s16le")
                .arg("-ar")
                .arg(format.sample_rate.to_string())
                .arg("-ac")
                .arg(format.channels.to_string()),
        )
        .audio_codec("pcm_s16le")
}

/// Render a placeholder card to `output`.
pub async fn render_color_card(runner: &FfmpegRunner, color: &str, output: &Path) -> MediaResult<()> {
    render_published(runner, output, |tmp| {
        color_card_command(color, PLACEHOLDER_SIZE, PLACEHOLDER_SIZE, tmp)
    })
    .await
}

/// Render [`SILENCE_SECS`] of silence to `output`.
pub async fn render_silence(runner: &FfmpegRunner, output: &Path) -> MediaResult<()> {
    render_published(runner, output, |tmp| silence_command(SILENCE_SECS, tmp)).await
}

/// Encode a raw PCM file to WAV at `output`.
pub async fn encode_pcm_wav(
    runner: &FfmpegRunner,
    pcm: &Path,
    format: PcmFormat,
    output: &Path,
) -> MediaResult<()> {
    render_published(runner, output, |tmp| pcm_to_wav_command(pcm, format, tmp)).await
}

async fn render_published<F>(runner: &FfmpegRunner, output: &Path, build: F) -> MediaResult<()>
where
    F: FnOnce(&Path) -> FfmpegCommand,
{
    let tmp = partial_sibling(output);
    let command = build(&tmp);

    if let Err(e) = runner.run(&command).await {
        discard_file(&tmp).await;
        return Err(e);
    }
    publish_file(&tmp, output).await?;
    Ok(())
}

/// `name.partial.ext` next to `path`, keeping the extension for format detection.
fn partial_sibling(path: &Path) -> PathBuf {
    let stem = path.file_stem().unwrap_or_default().to_string_lossy();
    let name = match path.extension() {
        Some(ext) => format!("{}.partial.{}", stem, ext.to_string_lossy()),
        None => format!("{}.partial", stem),
    };
    path.with_file_name(name)
}
