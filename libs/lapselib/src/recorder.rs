// Copyright (c) 2025 Jonathan Fontanez
// SPDX-License-Identifier: BUSL-1.1

//! Front-end-facing recording controller.
//!
//! Mirrors the control surface a capture UI exposes: select a device, start,
//! pause/resume, stop. Holds at most one active session and enforces the
//! original tool's preconditions as reported errors — "select a camera
//! first", "interval must be greater than 0" — never as crashes.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use tracing::info;

use crate::camera::{CameraId, CameraSource};
use crate::core::clocks::{ElapsedReporter, ReadoutCell};
use crate::core::config::SessionConfig;
use crate::core::error::{CaptureError, Result};
use crate::core::session::{CaptureSession, SessionState, StopSummary};
use crate::core::traits::{DisplaySink, FrameSink, FrameSource};
use crate::ffmpeg::{Mp4WriterSink, PostProcessConfig, PostProcessHandle, PostProcessor};

/// The UI-level state machine: Idle → (select) → Ready → (start) →
/// Recording ⇄ Paused → (stop) → Idle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecorderState {
    Idle,
    Ready,
    Recording,
    Paused,
}

/// Everything `stop` leaves behind: the session summary plus the handle of
/// an optional in-flight background re-encode.
pub struct RecordingOutcome {
    pub summary: StopSummary,
    pub post_process: Option<PostProcessHandle>,
}

type SinkFactory = Box<dyn Fn(&Path, u32, u32, u32) -> Result<Box<dyn FrameSink>> + Send>;

/// Owns the selected device and the active session on behalf of a front-end.
pub struct Recorder {
    config: SessionConfig,
    display: Arc<dyn DisplaySink>,
    post_process: Option<PostProcessConfig>,
    sink_factory: SinkFactory,
    source: Option<Box<dyn FrameSource>>,
    session: Option<CaptureSession>,
    reporter: Option<ElapsedReporter>,
    readout: ReadoutCell,
}

impl Recorder {
    pub fn new(config: SessionConfig, display: Arc<dyn DisplaySink>) -> Self {
        Self {
            config,
            display,
            post_process: None,
            sink_factory: Box::new(|path, frame_rate, width, height| {
                Ok(Box::new(Mp4WriterSink::open(path, frame_rate, width, height)?))
            }),
            source: None,
            session: None,
            reporter: None,
            readout: ReadoutCell::new(),
        }
    }

    /// Re-encode finished recordings with the given settings.
    pub fn with_post_process(mut self, config: PostProcessConfig) -> Self {
        self.post_process = Some(config);
        self
    }

    /// Substitute the sink constructor. The default builds an
    /// [`Mp4WriterSink`]; tests install recording mocks here.
    pub fn with_sink_factory(mut self, factory: SinkFactory) -> Self {
        self.sink_factory = factory;
        self
    }

    /// Open the camera with the given id and hold it for the next `start`.
    pub fn select_device(&mut self, device: CameraId) -> Result<()> {
        let source = CameraSource::open(device, self.config.profile)?;
        self.attach_source(Box::new(source))?;
        info!(device = device.0, "camera selected");
        Ok(())
    }

    /// Hold an already-open source for the next `start`. Used by
    /// `select_device` and directly by tests and alternative capture
    /// backends.
    pub fn attach_source(&mut self, source: Box<dyn FrameSource>) -> Result<()> {
        if self.session.is_some() {
            return Err(CaptureError::Session(
                "stop the current recording before selecting a device".into(),
            ));
        }
        self.source = Some(source);
        Ok(())
    }

    /// Capture interval for the next `start`; validated there, as the
    /// original tool validated on start rather than on entry.
    pub fn set_interval_ms(&mut self, interval_ms: u64) {
        self.config.interval_ms = interval_ms;
    }

    /// Start a session with the held device.
    pub fn start(&mut self) -> Result<()> {
        if self.session.is_some() {
            return Err(CaptureError::Session("recording already in progress".into()));
        }
        self.config.validate()?;
        if self.source.is_none() {
            return Err(CaptureError::Configuration("select a camera first".into()));
        }

        let output_path = self.config.resolve_output_path()?;
        let source = self.source.take().ok_or_else(|| {
            CaptureError::Configuration("select a camera first".into())
        })?;

        let (width, height) = source.dimensions();
        let sink = match (self.sink_factory)(&output_path, self.config.frame_rate, width, height)
        {
            Ok(sink) => sink,
            Err(err) => {
                // Sink open failure aborts start; the device stays selected.
                self.source = Some(source);
                return Err(err);
            }
        };

        let session =
            CaptureSession::start(source, sink, self.display.clone(), &self.config, output_path)?;
        self.reporter = Some(ElapsedReporter::spawn(session.timer(), self.readout.clone()));
        self.session = Some(session);
        Ok(())
    }

    pub fn pause(&self) -> Result<()> {
        self.active()?.pause()
    }

    pub fn resume(&self) -> Result<()> {
        self.active()?.resume()
    }

    /// Stop the active session, finalize the file and, when configured,
    /// hand it to the post-processor in the background.
    pub fn stop(&mut self) -> Result<RecordingOutcome> {
        let session = self.session.take().ok_or_else(|| {
            CaptureError::Session("no active recording to stop".into())
        })?;
        if let Some(reporter) = self.reporter.take() {
            reporter.stop();
        }

        let summary = session.stop()?;

        let post_process = self.post_process.clone().map(|config| {
            PostProcessor::new(config).spawn(
                summary.output_path.clone(),
                summary.width,
                summary.height,
            )
        });

        Ok(RecordingOutcome {
            summary,
            post_process,
        })
    }

    pub fn state(&self) -> RecorderState {
        match (&self.session, &self.source) {
            (Some(session), _) => match session.state() {
                SessionState::Paused => RecorderState::Paused,
                _ => RecorderState::Recording,
            },
            (None, Some(_)) => RecorderState::Ready,
            (None, None) => RecorderState::Idle,
        }
    }

    /// Pause-adjusted recording time of the active session.
    pub fn elapsed(&self) -> Duration {
        self.session
            .as_ref()
            .map(|s| s.elapsed())
            .unwrap_or_default()
    }

    /// Cell the reporter thread keeps updated with the `MM:SS` readout.
    pub fn readout(&self) -> ReadoutCell {
        self.readout.clone()
    }

    fn active(&self) -> Result<&CaptureSession> {
        self.session.as_ref().ok_or_else(|| {
            CaptureError::Session("no active recording".into())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::frames::VideoFrame;
    use crate::core::traits::NullDisplay;
    use parking_lot::Mutex;

    struct StaticSource;

    impl FrameSource for StaticSource {
        fn read_frame(&mut self) -> Result<VideoFrame> {
            Ok(VideoFrame::blank(8, 8))
        }

        fn dimensions(&self) -> (u32, u32) {
            (8, 8)
        }
    }

    #[derive(Default)]
    struct CountingSinkState {
        written: u64,
        finalized: u64,
    }

    struct CountingSink(Arc<Mutex<CountingSinkState>>);

    impl FrameSink for CountingSink {
        fn write_frame(&mut self, _frame: &VideoFrame) -> Result<()> {
            self.0.lock().written += 1;
            Ok(())
        }

        fn finalize(&mut self) -> Result<()> {
            self.0.lock().finalized += 1;
            Ok(())
        }
    }

    fn test_recorder(state: Arc<Mutex<CountingSinkState>>) -> Recorder {
        let config = SessionConfig {
            interval_ms: 5,
            output_dir: std::env::temp_dir().join("lapselib-recorder-tests"),
            ..Default::default()
        };
        Recorder::new(config, Arc::new(NullDisplay)).with_sink_factory(Box::new(
            move |_path, _rate, _w, _h| Ok(Box::new(CountingSink(state.clone()))),
        ))
    }

    #[test]
    fn test_start_without_device_is_reported() {
        let mut recorder = test_recorder(Arc::default());
        let err = recorder.start().unwrap_err();
        assert!(matches!(err, CaptureError::Configuration(_)));
        assert_eq!(recorder.state(), RecorderState::Idle);
    }

    #[test]
    fn test_zero_interval_keeps_device_selected() {
        let mut recorder = test_recorder(Arc::default());
        recorder.attach_source(Box::new(StaticSource)).unwrap();
        recorder.set_interval_ms(0);
        let err = recorder.start().unwrap_err();
        assert!(matches!(err, CaptureError::Configuration(_)));
        // The device survives the rejected start.
        assert_eq!(recorder.state(), RecorderState::Ready);
    }

    #[test]
    fn test_full_lifecycle() {
        let state = Arc::new(Mutex::new(CountingSinkState::default()));
        let mut recorder = test_recorder(state.clone());
        assert_eq!(recorder.state(), RecorderState::Idle);

        recorder.attach_source(Box::new(StaticSource)).unwrap();
        assert_eq!(recorder.state(), RecorderState::Ready);

        recorder.start().unwrap();
        assert_eq!(recorder.state(), RecorderState::Recording);

        recorder.pause().unwrap();
        assert_eq!(recorder.state(), RecorderState::Paused);
        recorder.resume().unwrap();
        assert_eq!(recorder.state(), RecorderState::Recording);

        std::thread::sleep(Duration::from_millis(30));
        let outcome = recorder.stop().unwrap();
        assert_eq!(recorder.state(), RecorderState::Idle);
        assert!(outcome.summary.frames_written >= 1);
        assert!(outcome.post_process.is_none());

        let sink = state.lock();
        assert_eq!(sink.finalized, 1);
        assert_eq!(sink.written, outcome.summary.frames_written);
    }

    #[test]
    fn test_start_twice_is_an_error() {
        let mut recorder = test_recorder(Arc::default());
        recorder.attach_source(Box::new(StaticSource)).unwrap();
        recorder.start().unwrap();
        let err = recorder.start().unwrap_err();
        assert!(matches!(err, CaptureError::Session(_)));
        recorder.stop().unwrap();
    }

    #[test]
    fn test_pause_when_idle_is_an_error() {
        let recorder = test_recorder(Arc::default());
        assert!(matches!(
            recorder.pause().unwrap_err(),
            CaptureError::Session(_)
        ));
        assert!(matches!(
            recorder.resume().unwrap_err(),
            CaptureError::Session(_)
        ));
    }

    #[test]
    fn test_stop_when_idle_is_an_error() {
        let mut recorder = test_recorder(Arc::default());
        assert!(matches!(
            recorder.stop().unwrap_err(),
            CaptureError::Session(_)
        ));
    }
}
