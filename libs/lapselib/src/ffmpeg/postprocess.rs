use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::thread::JoinHandle;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::core::config::compressed_path;
use crate::core::error::{CaptureError, Result};

/// Re-encode settings for a finished recording.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PostProcessConfig {
    /// Encoder binary. Tests substitute a scripted stand-in.
    pub program: PathBuf,
    /// Uniform scale applied to the source geometry before even-rounding.
    pub scale: f64,
    /// Constant-rate-factor quality.
    pub crf: u32,
    /// Encoder speed/quality preset.
    pub preset: String,
    /// Audio bitrate in kbit/s.
    pub audio_bitrate_kbps: u32,
}

impl Default for PostProcessConfig {
    fn default() -> Self {
        Self {
            program: PathBuf::from("ffmpeg"),
            scale: 1.0,
            crf: 23,
            preset: "medium".to_string(),
            audio_bitrate_kbps: 128,
        }
    }
}

/// Scaled target geometry, aspect preserved, each dimension rounded down to
/// an even number (required by common encoders), never below 2.
pub fn target_dimensions(width: u32, height: u32, scale: f64) -> (u32, u32) {
    let w = ((width as f64 * scale).floor() as u32) & !1;
    let h = ((height as f64 * scale).floor() as u32) & !1;
    (w.max(2), h.max(2))
}

/// Offline re-encode of a finished file.
///
/// The original is deleted only after the encoder exits 0 and the processed
/// file verifiably exists; on any failure the original is kept and the
/// error reported.
pub struct PostProcessor {
    config: PostProcessConfig,
}

impl PostProcessor {
    pub fn new(config: PostProcessConfig) -> Self {
        Self { config }
    }

    /// Re-encode `input` (whose geometry is `width`×`height`) synchronously.
    /// Returns the path of the processed file, which replaces the original.
    pub fn process(&self, input: &Path, width: u32, height: u32) -> Result<PathBuf> {
        let (target_w, target_h) = target_dimensions(width, height, self.config.scale);
        let output = compressed_path(input);

        debug!(
            input = %input.display(),
            output = %output.display(),
            target_w,
            target_h,
            "post-processing"
        );

        let status = Command::new(&self.config.program)
            .arg("-hide_banner")
            .arg("-loglevel")
            .arg("error")
            .arg("-y")
            .arg("-i")
            .arg(input)
            .arg("-vf")
            .arg(format!("scale={target_w}:{target_h}"))
            .arg("-c:v")
            .arg("libx264")
            .arg("-crf")
            .arg(self.config.crf.to_string())
            .arg("-preset")
            .arg(&self.config.preset)
            .arg("-c:a")
            .arg("aac")
            .arg("-b:a")
            .arg(format!("{}k", self.config.audio_bitrate_kbps))
            .arg(&output)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .map_err(|e| {
                CaptureError::PostProcess(format!(
                    "cannot run {}: {e}",
                    self.config.program.display()
                ))
            })?;

        if !status.success() {
            // Leave the original untouched; clear any partial output.
            if output.exists() {
                let _ = std::fs::remove_file(&output);
            }
            return Err(CaptureError::PostProcess(format!(
                "re-encode exited with {status}; original file retained"
            )));
        }

        if !output.is_file() {
            return Err(CaptureError::PostProcess(
                "re-encode reported success but produced no output; original file retained"
                    .into(),
            ));
        }

        std::fs::remove_file(input)?;
        info!(output = %output.display(), "post-processing finished, original removed");
        Ok(output)
    }

    /// Run [`process`](Self::process) on a background thread.
    pub fn spawn(self, input: PathBuf, width: u32, height: u32) -> PostProcessHandle {
        let handle = std::thread::Builder::new()
            .name("lapse-postprocess".to_string())
            .spawn(move || self.process(&input, width, height))
            .expect("failed to spawn post-process thread");
        PostProcessHandle { handle }
    }
}

/// Join handle for an in-flight background re-encode.
pub struct PostProcessHandle {
    handle: JoinHandle<Result<PathBuf>>,
}

impl PostProcessHandle {
    /// Wait for the re-encode and return the processed file path.
    pub fn join(self) -> Result<PathBuf> {
        self.handle
            .join()
            .map_err(|_| CaptureError::PostProcess("post-process thread panicked".into()))?
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}
