//! Pipeline configuration.

use std::path::PathBuf;

use reel_models::RenderProfile;
use tracing::warn;

pub const DEFAULT_ASSET_DIR: &str = "uploads";

/// Pipeline configuration.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Directory holding generated images, narration and final videos
    pub asset_dir: PathBuf,
    /// Output geometry and encoder settings
    pub render: RenderProfile,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            asset_dir: PathBuf::from(DEFAULT_ASSET_DIR),
            render: RenderProfile::default(),
        }
    }
}

impl PipelineConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Create config from an arbitrary key lookup. Unparseable values fall
    /// back to their defaults, and so does any frame size that is not an
    /// even 9:16 portrait.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = RenderProfile::default();
        let parse_u32 = |key: &str, default: u32| {
            lookup(key)
                .and_then(|s| s.trim().parse::<u32>().ok())
                .filter(|v| *v > 0)
                .unwrap_or(default)
        };

        let mut render = RenderProfile {
            width: parse_u32("RENDER_WIDTH", defaults.width),
            height: parse_u32("RENDER_HEIGHT", defaults.height),
            fps: parse_u32("RENDER_FPS", defaults.fps),
            preset: lookup("RENDER_PRESET")
                .filter(|s| !s.trim().is_empty())
                .unwrap_or(defaults.preset.clone()),
            ..defaults.clone()
        };
        if !render.is_portrait_frame() {
            warn!(
                width = render.width,
                height = render.height,
                "Render size is not an even 9:16 frame, using {}x{}",
                defaults.width,
                defaults.height
            );
            render.width = defaults.width;
            render.height = defaults.height;
        }

        Self {
            asset_dir: lookup("ASSET_DIR")
                .filter(|s| !s.trim().is_empty())
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_ASSET_DIR)),
            render,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = PipelineConfig::from_lookup(|_| None);
        assert_eq!(config.asset_dir, PathBuf::from("uploads"));
        assert_eq!(config.render.width, 1080);
        assert_eq!(config.render.height, 1920);
        assert_eq!(config.render.fps, 25);
    }

    #[test]
    fn test_overrides_and_bad_values() {
        let config = PipelineConfig::from_lookup(|key| match key {
            "ASSET_DIR" => Some("/var/reel".to_string()),
            "RENDER_WIDTH" => Some("720".to_string()),
            "RENDER_HEIGHT" => Some("tall".to_string()),
            "RENDER_FPS" => Some("0".to_string()),
            "RENDER_PRESET" => Some("veryfast".to_string()),
            _ => None,
        });
        assert_eq!(config.asset_dir, PathBuf::from("/var/reel"));
        // 720x1920 is not 9:16
        assert_eq!(config.render.width, 1080);
        assert_eq!(config.render.height, 1920);
        assert_eq!(config.render.fps, 25);
        assert_eq!(config.render.preset, "veryfast");
    }

    #[test]
    fn test_frame_size_must_be_even_portrait() {
        let render = |width: &str, height: &str| {
            let (width, height) = (width.to_string(), height.to_string());
            PipelineConfig::from_lookup(move |key| match key {
                "RENDER_WIDTH" => Some(width.clone()),
                "RENDER_HEIGHT" => Some(height.clone()),
                _ => None,
            })
            .render
        };

        let scaled = render("720", "1280");
        assert_eq!((scaled.width, scaled.height), (720, 1280));

        for (width, height) in [("720", "1920"), ("1920", "1080"), ("9", "16")] {
            let fallback = render(width, height);
            assert_eq!((fallback.width, fallback.height), (1080, 1920));
            assert!(fallback.is_portrait_frame());
        }
    }
}
