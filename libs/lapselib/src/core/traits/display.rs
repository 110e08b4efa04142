//! DisplaySink - live preview collaborator
//!
//! The session pushes a copy of each captured frame to the display sink.
//! Display is strictly one-way: the sink renders, it never mutates session
//! state. Older frames are discarded, not queued (last-frame-wins).

use crate::core::frames::VideoFrame;

/// Receiver for live-preview frames.
pub trait DisplaySink: Send + Sync {
    /// Publish the most recently captured frame. Implementations must be
    /// cheap and non-blocking; the cadence loop calls this inline.
    fn publish(&self, frame: &VideoFrame);
}

/// Display sink that drops every frame. Useful for headless recording.
pub struct NullDisplay;

impl DisplaySink for NullDisplay {
    fn publish(&self, _frame: &VideoFrame) {}
}
