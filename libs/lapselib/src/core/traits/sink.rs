//! FrameSink - Trait for video writers
//!
//! A sink consumes finished (overlaid) frames and persists them. Exactly one
//! sink exists per session; it is writable only while the session is
//! Recording or Paused and is finalized exactly once, on the cadence
//! thread's exit path.

use crate::core::error::Result;
use crate::core::frames::VideoFrame;

/// Trait for video-writing sinks.
///
/// Implementations: `Mp4WriterSink` (ffmpeg child process) in production,
/// recording mocks in tests.
pub trait FrameSink: Send {
    /// Append one frame. Frames arrive in capture order, each exactly once.
    fn write_frame(&mut self, frame: &VideoFrame) -> Result<()>;

    /// Flush and close the output. Idempotent; safe to call when no frame
    /// was ever written (what lands on disk in that case is up to the
    /// implementation, which must document it).
    fn finalize(&mut self) -> Result<()>;
}
