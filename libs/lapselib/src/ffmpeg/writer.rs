use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Child, ChildStdin, Command, Stdio};

use tracing::{debug, info, warn};

use crate::core::error::{CaptureError, Result};
use crate::core::frames::VideoFrame;
use crate::core::traits::FrameSink;

/// MP4 frame sink: pipes raw RGB24 frames into an `ffmpeg` child process
/// encoding H.264 into an MP4 container at a fixed frame rate.
///
/// `finalize` closes the pipe and waits for the encoder to flush the
/// container. With zero frames written ffmpeg cannot produce a playable
/// file; finalize reports that as a write error and removes the leftover.
pub struct Mp4WriterSink {
    child: Option<Child>,
    stdin: Option<ChildStdin>,
    path: PathBuf,
    width: u32,
    height: u32,
    frames_written: u64,
}

impl Mp4WriterSink {
    /// Spawn the encoder for `path` at the given geometry and frame rate.
    pub fn open(path: &Path, frame_rate: u32, width: u32, height: u32) -> Result<Self> {
        Self::open_with_program("ffmpeg", path, frame_rate, width, height)
    }

    /// Like [`open`](Self::open) with an explicit encoder binary. Tests use
    /// this to substitute a scripted stand-in for ffmpeg.
    pub fn open_with_program(
        program: &str,
        path: &Path,
        frame_rate: u32,
        width: u32,
        height: u32,
    ) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(CaptureError::Configuration(
                "frame dimensions must be non-zero".into(),
            ));
        }

        let mut child = Command::new(program)
            .arg("-hide_banner")
            .arg("-loglevel")
            .arg("error")
            .arg("-y")
            .arg("-f")
            .arg("rawvideo")
            .arg("-pixel_format")
            .arg("rgb24")
            .arg("-video_size")
            .arg(format!("{width}x{height}"))
            .arg("-framerate")
            .arg(frame_rate.to_string())
            .arg("-i")
            .arg("-")
            .arg("-c:v")
            .arg("libx264")
            .arg("-pix_fmt")
            .arg("yuv420p")
            .arg("-an")
            .arg(path)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| {
                CaptureError::EncoderUnavailable(format!("cannot spawn {program}: {e}"))
            })?;

        let stdin = child.stdin.take().ok_or_else(|| {
            CaptureError::EncoderUnavailable("encoder stdin unavailable".into())
        })?;

        info!(
            output = %path.display(),
            width,
            height,
            frame_rate,
            "mp4 writer opened"
        );

        Ok(Self {
            child: Some(child),
            stdin: Some(stdin),
            path: path.to_path_buf(),
            width,
            height,
            frames_written: 0,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn frames_written(&self) -> u64 {
        self.frames_written
    }
}

impl FrameSink for Mp4WriterSink {
    fn write_frame(&mut self, frame: &VideoFrame) -> Result<()> {
        if frame.width != self.width || frame.height != self.height {
            return Err(CaptureError::FrameWrite(format!(
                "frame geometry {}x{} does not match sink {}x{}",
                frame.width, frame.height, self.width, self.height
            )));
        }
        if frame.data.len() != frame.expected_len() {
            return Err(CaptureError::FrameWrite(format!(
                "frame buffer is {} bytes, expected {}",
                frame.data.len(),
                frame.expected_len()
            )));
        }

        let stdin = self.stdin.as_mut().ok_or_else(|| {
            CaptureError::FrameWrite("sink already finalized".into())
        })?;
        stdin
            .write_all(&frame.data)
            .map_err(|e| CaptureError::FrameWrite(format!("encoder pipe: {e}")))?;
        self.frames_written += 1;
        Ok(())
    }

    fn finalize(&mut self) -> Result<()> {
        // Idempotent: the second and later calls find nothing to do.
        drop(self.stdin.take());
        let Some(mut child) = self.child.take() else {
            return Ok(());
        };

        let status = child
            .wait()
            .map_err(|e| CaptureError::FrameWrite(format!("waiting for encoder: {e}")))?;

        if status.success() {
            info!(
                output = %self.path.display(),
                frames = self.frames_written,
                "mp4 file finalized"
            );
            return Ok(());
        }

        if self.frames_written == 0 {
            // Zero input frames: no playable file exists; drop the leftover.
            if let Err(e) = std::fs::remove_file(&self.path) {
                debug!("removing empty output failed: {e}");
            }
            return Err(CaptureError::FrameWrite(
                "no frames were written; no output file produced".into(),
            ));
        }

        warn!(status = %status, "encoder exited with failure");
        Err(CaptureError::FrameWrite(format!(
            "encoder exited with {status}"
        )))
    }
}

impl Drop for Mp4WriterSink {
    fn drop(&mut self) {
        // Backstop only; the cadence loop finalizes on its exit path.
        if self.child.is_some() {
            let _ = self.finalize();
        }
    }
}
