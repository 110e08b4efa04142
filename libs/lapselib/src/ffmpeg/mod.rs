// Copyright (c) 2025 Jonathan Fontanez
// SPDX-License-Identifier: BUSL-1.1

//! ffmpeg-backed video writing and post-processing.
//!
//! Both halves talk to an external `ffmpeg` binary: the writer pipes raw
//! frames into a long-lived child encoding straight to MP4/H.264, the
//! post-processor re-encodes a finished file in one shot. Exit status is
//! the whole contract with the tool.

mod postprocess;
mod writer;

pub use postprocess::{
    target_dimensions, PostProcessConfig, PostProcessHandle, PostProcessor,
};
pub use writer::Mp4WriterSink;

/// Check if ffmpeg is available on the system.
pub fn ffmpeg_available() -> bool {
    std::process::Command::new("ffmpeg")
        .arg("-version")
        .stdout(std::process::Stdio::null())
        .stderr(std::process::Stdio::null())
        .status()
        .map(|s| s.success())
        .unwrap_or(false)
}
