//! Session configuration types.
//!
//! Each collaborator takes a plain config struct with a `Default` impl; the
//! session validates the whole bundle once at `start`.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::core::error::{CaptureError, Result};

/// Frame rate stamped into the output container.
pub const DEFAULT_FRAME_RATE: u32 = 30;

/// Default directory recordings land in, created on demand.
pub const DEFAULT_OUTPUT_DIR: &str = "./output_videos";

/// How long the cadence loop dozes between state checks while paused.
pub const PAUSE_QUANTUM_MS: u64 = 100;

/// Target capture/display resolution.
///
/// Drives the negotiated camera format, the written-frame size and the
/// timestamp overlay's glyph scale and origin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ResolutionProfile {
    /// 640×480
    Standard,
    /// 1280×960
    High,
}

impl ResolutionProfile {
    pub fn dimensions(&self) -> (u32, u32) {
        match self {
            ResolutionProfile::Standard => (640, 480),
            ResolutionProfile::High => (1280, 960),
        }
    }

    /// Integer pixel multiplier for the embedded overlay font.
    pub fn overlay_scale(&self) -> u32 {
        match self {
            ResolutionProfile::Standard => 2,
            ResolutionProfile::High => 4,
        }
    }

    /// Top-left anchor of the overlay text, in pixels.
    pub fn overlay_origin(&self) -> (u32, u32) {
        match self {
            ResolutionProfile::Standard => (10, 16),
            ResolutionProfile::High => (20, 32),
        }
    }
}

impl Default for ResolutionProfile {
    fn default() -> Self {
        ResolutionProfile::Standard
    }
}

/// Configuration for one capture session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Milliseconds between captured frames. Must be greater than zero.
    pub interval_ms: u64,

    /// Capture/display resolution profile.
    pub profile: ResolutionProfile,

    /// Frame rate written into the output container.
    pub frame_rate: u32,

    /// Directory the output file is created in. Created if absent.
    pub output_dir: PathBuf,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            interval_ms: 1000,
            profile: ResolutionProfile::default(),
            frame_rate: DEFAULT_FRAME_RATE,
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
        }
    }
}

impl SessionConfig {
    /// Reject configurations the session must never start with.
    pub fn validate(&self) -> Result<()> {
        if self.interval_ms == 0 {
            return Err(CaptureError::Configuration(
                "interval must be greater than 0".into(),
            ));
        }
        if self.frame_rate == 0 {
            return Err(CaptureError::Configuration(
                "frame rate must be greater than 0".into(),
            ));
        }
        Ok(())
    }

    /// Resolve the output path for a session starting now, creating the
    /// output directory if needed.
    pub fn resolve_output_path(&self) -> Result<PathBuf> {
        std::fs::create_dir_all(&self.output_dir)?;
        Ok(self.output_dir.join(output_file_name(chrono::Local::now())))
    }
}

/// `video_<YYYY-MM-DD_HH-MM-SS>.mp4`, as the original tool named its files.
pub fn output_file_name(now: chrono::DateTime<chrono::Local>) -> String {
    format!("video_{}.mp4", now.format("%Y-%m-%d_%H-%M-%S"))
}

/// Wall-clock text stamped onto each frame.
pub fn overlay_text(now: chrono::DateTime<chrono::Local>) -> String {
    now.format("%d-%m-%Y %H:%M:%S").to_string()
}

/// Derived path for a post-processed copy: `<stem>_compressed.mp4` next to
/// the input.
pub fn compressed_path(input: &Path) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "video".to_string());
    input.with_file_name(format!("{stem}_compressed.mp4"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_default_config_is_valid() {
        assert!(SessionConfig::default().validate().is_ok());
    }

    #[test]
    fn test_zero_interval_rejected() {
        let config = SessionConfig {
            interval_ms: 0,
            ..Default::default()
        };
        let err = config.validate().unwrap_err();
        assert!(matches!(err, CaptureError::Configuration(_)));
    }

    #[test]
    fn test_profile_dimensions() {
        assert_eq!(ResolutionProfile::Standard.dimensions(), (640, 480));
        assert_eq!(ResolutionProfile::High.dimensions(), (1280, 960));
        assert!(ResolutionProfile::High.overlay_scale() > ResolutionProfile::Standard.overlay_scale());
    }

    #[test]
    fn test_output_file_name_format() {
        let when = chrono::Local.with_ymd_and_hms(2025, 3, 9, 14, 5, 7).unwrap();
        assert_eq!(output_file_name(when), "video_2025-03-09_14-05-07.mp4");
    }

    #[test]
    fn test_overlay_text_format() {
        let when = chrono::Local.with_ymd_and_hms(2025, 3, 9, 14, 5, 7).unwrap();
        assert_eq!(overlay_text(when), "09-03-2025 14:05:07");
    }

    #[test]
    fn test_compressed_path_sits_next_to_input() {
        let out = compressed_path(Path::new("/tmp/videos/video_x.mp4"));
        assert_eq!(out, PathBuf::from("/tmp/videos/video_x_compressed.mp4"));
    }

    #[test]
    fn test_config_serde_round_trip() {
        let config = SessionConfig {
            interval_ms: 250,
            profile: ResolutionProfile::High,
            ..Default::default()
        };
        let json = serde_json::to_string(&config).unwrap();
        let back: SessionConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back.interval_ms, 250);
        assert_eq!(back.profile, ResolutionProfile::High);
    }
}
