//! Slideshow filter graph.
//!
//! Each still image input is fitted into the output frame and padded to full
//! size, then all of them are concatenated in scene order:
//!
//! ```text
//! [0:v]scale=1080:1920:force_original_aspect_ratio=decrease,pad=1080:1920:(ow-iw)/2:(oh-ih)/2,setdar=9/16[v0];
//! [1:v]...[v1];
//! [v0][v1]concat=n=2:v=1:a=0[outv]
//! ```

use reel_models::{RenderProfile, DISPLAY_ASPECT};

use crate::error::{MediaError, MediaResult};

/// Label of the concatenated video stream.
pub const OUTPUT_LABEL: &str = "outv";

/// Target frame size and display aspect ratio.
///
/// The aspect is always 9:16 regardless of the pixel size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameGeometry {
    pub width: u32,
    pub height: u32,
    /// Display aspect ratio as (num, den)
    pub aspect: (u32, u32),
}

impl From<&RenderProfile> for FrameGeometry {
    fn from(profile: &RenderProfile) -> Self {
        Self {
            width: profile.width,
            height: profile.height,
            aspect: DISPLAY_ASPECT,
        }
    }
}

impl Default for FrameGeometry {
    fn default() -> Self {
        Self::from(&RenderProfile::default())
    }
}

/// Fit-and-pad transform for one input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScalePadStage {
    /// FFmpeg input index
    pub input: usize,
    /// Output label, without brackets
    pub label: String,
}

impl ScalePadStage {
    fn render(&self, geometry: &FrameGeometry) -> String {
        let FrameGeometry { width: w, height: h, aspect: (num, den) } = *geometry;
        format!(
            "[{input}:v]scale={w}:{h}:force_original_aspect_ratio=decrease,\
             pad={w}:{h}:(ow-iw)/2:(oh-ih)/2,setdar={num}/{den}[{label}]",
            input = self.input,
            label = self.label,
        )
    }
}

/// Concatenation of all scaled streams.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConcatStage {
    /// Input labels in playback order
    pub inputs: Vec<String>,
    pub output: String,
}

impl ConcatStage {
    fn render(&self) -> String {
        let inputs: String = self.inputs.iter().map(|l| format!("[{}]", l)).collect();
        format!(
            "{}concat=n={}:v=1:a=0[{}]",
            inputs,
            self.inputs.len(),
            self.output
        )
    }
}

/// Complete slideshow graph: one scale/pad stage per image plus one concat.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterGraph {
    pub geometry: FrameGeometry,
    pub stages: Vec<ScalePadStage>,
    pub concat: ConcatStage,
}

impl FilterGraph {
    /// Render as a `-filter_complex` argument.
    pub fn to_filter_complex(&self) -> String {
        let mut parts: Vec<String> = self
            .stages
            .iter()
            .map(|s| s.render(&self.geometry))
            .collect();
        parts.push(self.concat.render());
        parts.join(";")
    }

    /// Map specifier for the graph output, e.g. `[outv]`.
    pub fn output_spec(&self) -> String {
        format!("[{}]", self.concat.output)
    }
}

/// Build the graph for `image_count` inputs numbered `0..image_count`.
pub fn build_slideshow_graph(image_count: usize, geometry: FrameGeometry) -> MediaResult<FilterGraph> {
    if image_count == 0 {
        return Err(MediaError::invalid_input("slideshow needs at least one image"));
    }

    let stages: Vec<ScalePadStage> = (0..image_count)
        .map(|input| ScalePadStage {
            input,
            label: format!("v{}", input),
        })
        .collect();
    let concat = ConcatStage {
        inputs: stages.iter().map(|s| s.label.clone()).collect(),
        output: OUTPUT_LABEL.to_string(),
    };

    Ok(FilterGraph {
        geometry,
        stages,
        concat,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_per_image_and_single_concat() {
        let graph = build_slideshow_graph(3, FrameGeometry::default()).unwrap();
        assert_eq!(graph.stages.len(), 3);
        assert_eq!(graph.concat.inputs, vec!["v0", "v1", "v2"]);

        let filter = graph.to_filter_complex();
        let parts: Vec<_> = filter.split(';').collect();
        assert_eq!(parts.len(), 4);
        assert_eq!(
            parts[0],
            "[0:v]scale=1080:1920:force_original_aspect_ratio=decrease,\
             pad=1080:1920:(ow-iw)/2:(oh-ih)/2,setdar=9/16[v0]"
        );
        assert!(parts[2].starts_with("[2:v]"));
        assert_eq!(parts[3], "[v0][v1][v2]concat=n=3:v=1:a=0[outv]");
        assert_eq!(graph.output_spec(), "[outv]");
    }

    #[test]
    fn test_single_image_still_concats() {
        let graph = build_slideshow_graph(1, FrameGeometry::default()).unwrap();
        assert!(graph
            .to_filter_complex()
            .ends_with(";[v0]concat=n=1:v=1:a=0[outv]"));
    }

    #[test]
    fn test_zero_images_rejected() {
        assert!(matches!(
            build_slideshow_graph(0, FrameGeometry::default()),
            Err(MediaError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_geometry_from_profile() {
        let profile = RenderProfile {
            width: 720,
            height: 1280,
            ..Default::default()
        };
        let geometry = FrameGeometry::from(&profile);
        assert_eq!(geometry.aspect, DISPLAY_ASPECT);
        let filter = build_slideshow_graph(1, geometry).unwrap().to_filter_complex();
        assert!(filter.contains("pad=720:1280"));
    }

    #[test]
    fn test_display_aspect_ignores_pixel_size() {
        let profile = RenderProfile {
            width: 720,
            height: 1920,
            ..Default::default()
        };
        let filter = build_slideshow_graph(1, FrameGeometry::from(&profile))
            .unwrap()
            .to_filter_complex();
        assert!(filter.contains("pad=720:1920:(ow-iw)/2:(oh-ih)/2,setdar=9/16[v0]"));
        assert!(!filter.contains("setdar=3/8"));
    }
}
