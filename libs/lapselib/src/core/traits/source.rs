//! FrameSource - Trait for frame producers
//!
//! A source wraps one camera device and produces frames on demand. The
//! session owns its source exclusively and calls it only from the cadence
//! thread.
//!
//! ## Failure semantics
//!
//! - Opening a device that cannot be acquired is a reported, recoverable
//!   error (`DeviceUnavailable`).
//! - A failed `read_frame` mid-recording is transient: the session skips
//!   that tick and keeps going. Sources should not retry internally.

use crate::core::error::Result;
use crate::core::frames::VideoFrame;

/// Trait for frame producers.
///
/// Implementations: `CameraSource` (nokhwa-backed hardware capture) in
/// production, scripted mocks in tests.
pub trait FrameSource: Send {
    /// Grab one frame from the device.
    ///
    /// Returns `CaptureError::FrameRead` on a transient device hiccup;
    /// callers treat that as "no frame this tick".
    fn read_frame(&mut self) -> Result<VideoFrame>;

    /// Negotiated frame geometry, fixed for the lifetime of the source.
    fn dimensions(&self) -> (u32, u32);

    /// Release the device. Also invoked on drop; must be safe to call twice.
    fn close(&mut self) {}
}
