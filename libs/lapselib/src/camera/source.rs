use std::time::Instant;

use nokhwa::pixel_format::RgbFormat;
use nokhwa::utils::{
    ApiBackend, CameraFormat, CameraIndex, FrameFormat, RequestedFormat, RequestedFormatType,
    Resolution,
};
use nokhwa::Camera;
use tracing::{debug, info};

use crate::core::config::ResolutionProfile;
use crate::core::error::{CaptureError, Result};
use crate::core::frames::VideoFrame;
use crate::core::traits::FrameSource;

/// Integer camera device identifier. 0 is the platform default device.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CameraId(pub u32);

impl Default for CameraId {
    fn default() -> Self {
        CameraId(0)
    }
}

impl std::fmt::Display for CameraId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "camera {}", self.0)
    }
}

/// Hardware frame source wrapping one nokhwa camera stream.
///
/// The stream is opened at construction and the negotiated geometry is
/// fixed for the source's lifetime. Frames are decoded to RGB24 and
/// timestamped against a per-source monotonic epoch.
pub struct CameraSource {
    camera: Camera,
    width: u32,
    height: u32,
    epoch: Instant,
    closed: bool,
}

impl CameraSource {
    /// Acquire the device and start streaming at the profile's geometry
    /// (closest negotiated match, 30 fps MJPEG preferred).
    pub fn open(device: CameraId, profile: ResolutionProfile) -> Result<Self> {
        let (width, height) = profile.dimensions();
        let requested = RequestedFormat::new::<RgbFormat>(RequestedFormatType::Closest(
            CameraFormat::new(
                Resolution::new(width, height),
                FrameFormat::MJPEG,
                crate::core::config::DEFAULT_FRAME_RATE,
            ),
        ));

        let mut camera = Camera::new(CameraIndex::Index(device.0), requested).map_err(|e| {
            CaptureError::DeviceUnavailable(format!("cannot access {device}: {e}"))
        })?;
        camera.open_stream().map_err(|e| {
            CaptureError::DeviceUnavailable(format!("cannot start stream on {device}: {e}"))
        })?;

        let negotiated = camera.resolution();
        info!(
            device = device.0,
            width = negotiated.width(),
            height = negotiated.height(),
            "camera stream opened"
        );

        Ok(Self {
            camera,
            width: negotiated.width(),
            height: negotiated.height(),
            epoch: Instant::now(),
            closed: false,
        })
    }
}

impl FrameSource for CameraSource {
    fn read_frame(&mut self) -> Result<VideoFrame> {
        let buffer = self
            .camera
            .frame()
            .map_err(|e| CaptureError::FrameRead(e.to_string()))?;
        let decoded = buffer
            .decode_image::<RgbFormat>()
            .map_err(|e| CaptureError::FrameRead(format!("decode failed: {e}")))?;

        let (width, height) = (decoded.width(), decoded.height());
        let timestamp_ns = self.epoch.elapsed().as_nanos() as i64;
        Ok(VideoFrame::new(decoded.into_raw(), width, height, timestamp_ns))
    }

    fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    fn close(&mut self) {
        if !self.closed {
            self.closed = true;
            if let Err(e) = self.camera.stop_stream() {
                debug!("stopping camera stream failed: {e}");
            }
        }
    }
}

impl Drop for CameraSource {
    fn drop(&mut self) {
        self.close();
    }
}

/// Human-readable list of attached camera devices, one `index: name` line
/// per device.
pub fn list_devices() -> Result<Vec<String>> {
    let devices = nokhwa::query(ApiBackend::Auto)
        .map_err(|e| CaptureError::DeviceUnavailable(format!("device query failed: {e}")))?;
    Ok(devices
        .iter()
        .map(|info| format!("{}: {}", info.index(), info.human_name()))
        .collect())
}
