// Copyright (c) 2025 Jonathan Fontanez
// SPDX-License-Identifier: BUSL-1.1

//! Timed webcam capture sessions.
//!
//! lapselib records frames from a camera at a configurable interval,
//! stamps each one with the wall-clock time, writes them to an MP4 file
//! and hands a copy to a live preview — with pause-aware elapsed time,
//! deterministic stop, and an optional offline re-encode of the finished
//! file.
//!
//! The core (`CaptureSession`, `ElapsedTimer`, the `FrameSource` /
//! `FrameSink` / `DisplaySink` seams) is toolkit-agnostic; the `camera`
//! and `ffmpeg` modules supply the hardware-backed collaborators, and
//! [`Recorder`] wraps it all behind the control surface a front-end needs.

pub mod camera;
pub mod core;
pub mod ffmpeg;
pub mod recorder;

pub use crate::camera::{list_devices, CameraId, CameraSource};
pub use crate::core::{
    format_mm_ss, install_shutdown_hook, shutdown_all_sessions, CaptureError, CaptureSession,
    CellDisplay, DisplaySink, ElapsedReporter, ElapsedTimer, FrameCell, FrameSink, FrameSource,
    NullDisplay, ReadoutCell, ResolutionProfile, Result, SessionConfig, SessionState, SharedTimer,
    StopSummary, TimestampOverlay, VideoFrame,
};
pub use crate::ffmpeg::{
    ffmpeg_available, target_dimensions, Mp4WriterSink, PostProcessConfig, PostProcessHandle,
    PostProcessor,
};
pub use crate::recorder::{Recorder, RecorderState, RecordingOutcome};
