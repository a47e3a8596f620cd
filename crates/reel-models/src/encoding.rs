//! Render profile for the final vertical video.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Default output width (9:16 portrait)
pub const DEFAULT_WIDTH: u32 = 1080;
/// Default output height (9:16 portrait)
pub const DEFAULT_HEIGHT: u32 = 1920;
/// Default frame rate
pub const DEFAULT_FPS: u32 = 25;
/// Default video codec (H.264)
pub const DEFAULT_VIDEO_CODEC: &str = "libx264";
/// Default audio codec
pub const DEFAULT_AUDIO_CODEC: &str = "aac";
/// Default pixel format, widest player compatibility
pub const DEFAULT_PIXEL_FORMAT: &str = "yuv420p";
/// Default encoding preset
pub const DEFAULT_PRESET: &str = "fast";
/// Display aspect ratio of every rendered video
pub const DISPLAY_ASPECT: (u32, u32) = (9, 16);

/// Frame geometry and codec settings used when rendering.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct RenderProfile {
    #[serde(default = "default_width")]
    pub width: u32,

    #[serde(default = "default_height")]
    pub height: u32,

    #[serde(default = "default_fps")]
    pub fps: u32,

    /// Video codec (e.g., "libx264")
    #[serde(default = "default_video_codec")]
    pub video_codec: String,

    #[serde(default = "default_audio_codec")]
    pub audio_codec: String,

    #[serde(default = "default_pixel_format")]
    pub pixel_format: String,

    /// Encoding preset (e.g., "fast", "medium")
    #[serde(default = "default_preset")]
    pub preset: String,
}

fn default_width() -> u32 {
    DEFAULT_WIDTH
}
fn default_height() -> u32 {
    DEFAULT_HEIGHT
}
fn default_fps() -> u32 {
    DEFAULT_FPS
}
fn default_video_codec() -> String {
    DEFAULT_VIDEO_CODEC.to_string()
}
fn default_audio_codec() -> String {
    DEFAULT_AUDIO_CODEC.to_string()
}
fn default_pixel_format() -> String {
    DEFAULT_PIXEL_FORMAT.to_string()
}
fn default_preset() -> String {
    DEFAULT_PRESET.to_string()
}

impl Default for RenderProfile {
    fn default() -> Self {
        Self {
            width: DEFAULT_WIDTH,
            height: DEFAULT_HEIGHT,
            fps: DEFAULT_FPS,
            video_codec: default_video_codec(),
            audio_codec: default_audio_codec(),
            pixel_format: default_pixel_format(),
            preset: default_preset(),
        }
    }
}

impl RenderProfile {
    /// Whether the frame is exactly 9:16 with even sides, as yuv420p needs.
    pub fn is_portrait_frame(&self) -> bool {
        let (num, den) = DISPLAY_ASPECT;
        self.width > 0
            && self.width % 2 == 0
            && self.height % 2 == 0
            && u64::from(self.width) * u64::from(den) == u64::from(self.height) * u64::from(num)
    }

    /// Encoder output arguments.
    pub fn to_ffmpeg_args(&self) -> Vec<String> {
        vec![
            "-c:v".to_string(),
            self.video_codec.clone(),
            "-c:a".to_string(),
            self.audio_codec.clone(),
            "-r".to_string(),
            self.fps.to_string(),
            "-pix_fmt".to_string(),
            self.pixel_format.clone(),
            "-preset".to_string(),
            self.preset.clone(),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_portrait_9_16() {
        let profile = RenderProfile::default();
        assert_eq!((profile.width, profile.height), (1080, 1920));
        assert!(profile.is_portrait_frame());
    }

    #[test]
    fn test_portrait_frame_check() {
        assert!(RenderProfile::default().is_portrait_frame());
        let frame = |width, height| RenderProfile {
            width,
            height,
            ..Default::default()
        };
        assert!(frame(720, 1280).is_portrait_frame());
        assert!(!frame(720, 1920).is_portrait_frame());
        assert!(!frame(1920, 1080).is_portrait_frame());
        // 9:16 but odd
        assert!(!frame(9, 16).is_portrait_frame());
        assert!(!frame(0, 0).is_portrait_frame());
    }

    #[test]
    fn test_ffmpeg_args() {
        let args = RenderProfile::default().to_ffmpeg_args();
        assert_eq!(
            args,
            vec!["-c:v", "libx264", "-c:a", "aac", "-r", "25", "-pix_fmt", "yuv420p", "-preset", "fast"]
        );
    }

    #[test]
    fn test_partial_deserialize_uses_defaults() {
        let profile: RenderProfile = serde_json::from_str(r#"{"fps": 30}"#).unwrap();
        assert_eq!(profile.fps, 30);
        assert_eq!(profile.video_codec, "libx264");
        assert_eq!(profile.height, 1920);
    }
}
