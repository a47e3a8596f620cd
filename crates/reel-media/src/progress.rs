//! FFmpeg progress parsing.

use serde::{Deserialize, Serialize};

/// Progress information from FFmpeg.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FfmpegProgress {
    /// Current frame number
    pub frame: u64,
    /// Output time in milliseconds
    pub out_time_ms: i64,
    /// Encoding speed (e.g., 1.5 = 1.5x realtime)
    pub speed: f64,
    /// Whether encoding is complete
    pub is_complete: bool,
}

impl FfmpegProgress {
    /// Progress percentage given the expected output length in seconds.
    pub fn percentage(&self, total_secs: f64) -> f64 {
        if total_secs <= 0.0 {
            return 0.0;
        }
        ((self.out_time_ms as f64 / 1000.0 / total_secs) * 100.0).clamp(0.0, 100.0)
    }
}

/// Whether a stderr line belongs to the `-progress` key/value stream.
///
/// Anything else is an FFmpeg diagnostic.
pub(crate) fn is_progress_line(line: &str) -> bool {
    match line.trim().split_once('=') {
        Some((key, _)) => {
            !key.is_empty()
                && key
                    .chars()
                    .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_')
        }
        None => false,
    }
}

/// Fold one `-progress` line into `current`.
///
/// Returns a snapshot at the end of each block (`progress=continue|end`).
pub(crate) fn parse_progress_line(line: &str, current: &mut FfmpegProgress) -> Option<FfmpegProgress> {
    let (key, value) = line.trim().split_once('=')?;

    match key {
        // out_time_ms is actually microseconds in every FFmpeg release
        "out_time_us" | "out_time_ms" => {
            if let Ok(us) = value.parse::<i64>() {
                current.out_time_ms = us / 1000;
            }
        }
        "frame" => {
            if let Ok(frame) = value.parse() {
                current.frame = frame;
            }
        }
        "speed" => {
            if let Some(speed) = value.strip_suffix('x').and_then(|s| s.trim().parse().ok()) {
                current.speed = speed;
            }
        }
        "progress" => {
            current.is_complete = value == "end";
            return Some(current.clone());
        }
        _ => {}
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_progress_block() {
        let mut progress = FfmpegProgress::default();

        assert!(parse_progress_line("frame=100", &mut progress).is_none());
        parse_progress_line("out_time_us=4000000", &mut progress);
        parse_progress_line("speed=2.5x", &mut progress);
        parse_progress_line("speed=N/A", &mut progress);

        let snapshot = parse_progress_line("progress=continue", &mut progress).unwrap();
        assert_eq!(snapshot.frame, 100);
        assert_eq!(snapshot.out_time_ms, 4000);
        assert!((snapshot.speed - 2.5).abs() < 0.01);
        assert!(!snapshot.is_complete);

        let last = parse_progress_line("progress=end", &mut progress).unwrap();
        assert!(last.is_complete);
    }

    #[test]
    fn test_percentage() {
        let progress = FfmpegProgress {
            out_time_ms: 6000,
            ..Default::default()
        };
        assert!((progress.percentage(12.0) - 50.0).abs() < 0.01);
        assert!((progress.percentage(3.0) - 100.0).abs() < 0.01);
        assert_eq!(progress.percentage(0.0), 0.0);
    }

    #[test]
    fn test_diagnostic_lines_are_not_progress() {
        assert!(is_progress_line("out_time_us=100"));
        assert!(is_progress_line("stream_0_0_q=28.0"));
        assert!(!is_progress_line("[image2 @ 0x55] Could not open file : a.png"));
        assert!(!is_progress_line("Error opening input files: No such file or directory"));
        assert!(!is_progress_line("Invalid value 'x=1' for option"));
    }
}
