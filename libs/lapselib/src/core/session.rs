// Copyright (c) 2025 Jonathan Fontanez
// SPDX-License-Identifier: BUSL-1.1

//! Capture session: the record/pause/stop state machine and its cadence loop.
//!
//! A session owns one open frame source and one open sink for its whole
//! life. Both are moved into a dedicated cadence thread; control operations
//! touch only shared flags and the elapsed timer, so pause/resume/stop never
//! block on device or disk I/O.
//!
//! The cadence loop's sleep is a `recv_timeout` on the stop channel: `stop`
//! interrupts the wait instead of waiting out a full interval. Resource
//! release (sink finalize + source close) happens in exactly one place, the
//! cadence thread's exit path, whatever caused the exit.

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicU8, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

use crossbeam_channel::{bounded, Receiver, RecvTimeoutError, Sender};
use parking_lot::Mutex;
use tracing::{debug, info, warn};

use crate::core::clocks::SharedTimer;
use crate::core::config::{SessionConfig, PAUSE_QUANTUM_MS};
use crate::core::error::{CaptureError, Result};
use crate::core::overlay::TimestampOverlay;
use crate::core::traits::{DisplaySink, FrameSink, FrameSource};

/// Session lifecycle. `Stopped` collapses into `Idle`: a stopped session is
/// gone, its resources released.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum SessionState {
    Idle = 0,
    Recording = 1,
    Paused = 2,
}

impl SessionState {
    fn from_u8(value: u8) -> Self {
        match value {
            1 => SessionState::Recording,
            2 => SessionState::Paused,
            _ => SessionState::Idle,
        }
    }
}

/// State shared between the session handle, the cadence thread and the
/// process-wide shutdown hook.
pub(crate) struct SessionShared {
    state: AtomicU8,
    stop_tx: Sender<()>,
    /// Set by the cadence thread once the sink is finalized and the source
    /// released. Never set anywhere else.
    released: AtomicBool,
    /// First write/finalize error, surfaced at `stop()`.
    deferred_error: Mutex<Option<CaptureError>>,
    frames_written: AtomicU64,
    frames_skipped: AtomicU64,
}

impl SessionShared {
    fn new(stop_tx: Sender<()>) -> Self {
        Self {
            state: AtomicU8::new(SessionState::Recording as u8),
            stop_tx,
            released: AtomicBool::new(false),
            deferred_error: Mutex::new(None),
            frames_written: AtomicU64::new(0),
            frames_skipped: AtomicU64::new(0),
        }
    }

    fn state(&self) -> SessionState {
        SessionState::from_u8(self.state.load(Ordering::SeqCst))
    }

    fn set_state(&self, state: SessionState) {
        self.state.store(state as u8, Ordering::SeqCst);
    }

    fn record_error(&self, err: CaptureError) {
        let mut slot = self.deferred_error.lock();
        if slot.is_none() {
            warn!("recording error deferred to stop(): {err}");
            *slot = Some(err);
        }
    }

    /// Flip to Idle and interrupt the cadence wait. Safe to call from any
    /// thread, any number of times, concurrently with an in-flight tick.
    pub(crate) fn request_stop(&self) {
        self.set_state(SessionState::Idle);
        let _ = self.stop_tx.try_send(());
    }

    /// Whether the cadence thread has released the source and sink.
    pub(crate) fn is_released(&self) -> bool {
        self.released.load(Ordering::SeqCst)
    }
}

/// What a finished session leaves behind.
#[derive(Debug)]
pub struct StopSummary {
    /// Finalized output file.
    pub output_path: PathBuf,
    /// Frame geometry the sink was opened with.
    pub width: u32,
    pub height: u32,
    /// Frames written to the sink, in capture order.
    pub frames_written: u64,
    /// Ticks skipped because the source produced no frame.
    pub frames_skipped: u64,
    /// Pause-adjusted recording time.
    pub recorded: Duration,
}

/// An active timed capture session.
///
/// Created by [`CaptureSession::start`]; consumed by [`CaptureSession::stop`].
/// Dropping a still-active session performs the stop sequence, so an early
/// return or panic in the owner cannot leave a half-open video file behind.
pub struct CaptureSession {
    shared: Arc<SessionShared>,
    handle: Option<JoinHandle<()>>,
    timer: SharedTimer,
    output_path: PathBuf,
    dimensions: (u32, u32),
}

impl CaptureSession {
    /// Begin recording.
    ///
    /// Requires an already-open source and sink (an unopenable device or
    /// encoder is the caller's reported error, before any session exists).
    /// Validates the config, starts the elapsed timer, spawns the cadence
    /// thread and registers the session with the shutdown hook registry.
    pub fn start(
        source: Box<dyn FrameSource>,
        sink: Box<dyn FrameSink>,
        display: Arc<dyn DisplaySink>,
        config: &SessionConfig,
        output_path: PathBuf,
    ) -> Result<Self> {
        config.validate()?;

        let dimensions = source.dimensions();
        let interval = Duration::from_millis(config.interval_ms);
        let overlay = TimestampOverlay::from_profile(config.profile);

        let (stop_tx, stop_rx) = bounded::<()>(1);
        let shared = Arc::new(SessionShared::new(stop_tx));

        let timer = SharedTimer::new();
        timer.start();

        let thread_shared = Arc::clone(&shared);
        let handle = std::thread::Builder::new()
            .name("lapse-cadence".to_string())
            .spawn(move || {
                run_cadence(source, sink, display, overlay, interval, thread_shared, stop_rx);
            })
            .map_err(|e| CaptureError::Session(format!("cannot spawn cadence thread: {e}")))?;

        crate::core::signals::register_session(&shared);

        info!(
            output = %output_path.display(),
            interval_ms = config.interval_ms,
            width = dimensions.0,
            height = dimensions.1,
            "capture session started"
        );

        Ok(Self {
            shared,
            handle: Some(handle),
            timer,
            output_path,
            dimensions,
        })
    }

    pub fn state(&self) -> SessionState {
        self.shared.state()
    }

    /// Pause-adjusted recording time so far.
    pub fn elapsed(&self) -> Duration {
        self.timer.elapsed()
    }

    /// Timer handle for an elapsed reporter.
    pub fn timer(&self) -> SharedTimer {
        self.timer.clone()
    }

    pub fn output_path(&self) -> &std::path::Path {
        &self.output_path
    }

    /// Recording → Paused; freezes the elapsed timer. Repeated pauses are
    /// no-ops; pausing a stopped session is an error.
    pub fn pause(&self) -> Result<()> {
        match self.shared.state() {
            SessionState::Recording => {
                self.shared.set_state(SessionState::Paused);
                self.timer.pause();
                debug!("session paused");
                Ok(())
            }
            SessionState::Paused => Ok(()),
            SessionState::Idle => Err(CaptureError::Session(
                "cannot pause: no active recording".into(),
            )),
        }
    }

    /// Paused → Recording; the elapsed timer continues from its frozen
    /// value. The cadence loop notices within one pause quantum.
    pub fn resume(&self) -> Result<()> {
        match self.shared.state() {
            SessionState::Paused => {
                self.timer.resume();
                self.shared.set_state(SessionState::Recording);
                debug!("session resumed");
                Ok(())
            }
            SessionState::Recording => Ok(()),
            SessionState::Idle => Err(CaptureError::Session(
                "cannot resume: no active recording".into(),
            )),
        }
    }

    /// Stop recording, finalize the output and release the device.
    ///
    /// Joins the cadence thread (which observes the stop signal within one
    /// tick or pause quantum), then surfaces any write error that was
    /// deferred during recording.
    pub fn stop(mut self) -> Result<StopSummary> {
        self.shutdown();

        let recorded = self.timer.elapsed();
        self.timer.reset();

        let summary = StopSummary {
            output_path: self.output_path.clone(),
            width: self.dimensions.0,
            height: self.dimensions.1,
            frames_written: self.shared.frames_written.load(Ordering::SeqCst),
            frames_skipped: self.shared.frames_skipped.load(Ordering::SeqCst),
            recorded,
        };

        if let Some(err) = self.shared.deferred_error.lock().take() {
            return Err(err);
        }

        info!(
            frames = summary.frames_written,
            skipped = summary.frames_skipped,
            recorded_ms = summary.recorded.as_millis() as u64,
            "capture session stopped"
        );
        Ok(summary)
    }

    fn shutdown(&mut self) {
        self.shared.request_stop();
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for CaptureSession {
    fn drop(&mut self) {
        if self.handle.is_some() {
            debug!("capture session dropped while active, stopping");
            self.shutdown();
            self.timer.reset();
        }
    }
}

/// The periodic read → stamp → write → display cycle.
///
/// Runs until the state flips to Idle or the stop channel fires. While
/// Paused it dozes in short quanta so a resume takes effect promptly
/// without busy-waiting.
fn run_cadence(
    mut source: Box<dyn FrameSource>,
    mut sink: Box<dyn FrameSink>,
    display: Arc<dyn DisplaySink>,
    overlay: TimestampOverlay,
    interval: Duration,
    shared: Arc<SessionShared>,
    stop_rx: Receiver<()>,
) {
    let pause_quantum = Duration::from_millis(PAUSE_QUANTUM_MS);
    let mut next_frame_number: u64 = 0;

    loop {
        let wait = match shared.state() {
            SessionState::Idle => break,
            SessionState::Paused => pause_quantum,
            SessionState::Recording => {
                match source.read_frame() {
                    Ok(mut frame) => {
                        frame.frame_number = next_frame_number;
                        next_frame_number += 1;
                        overlay.stamp_now(&mut frame);
                        match sink.write_frame(&frame) {
                            Ok(()) => {
                                shared.frames_written.fetch_add(1, Ordering::SeqCst);
                            }
                            Err(err) => shared.record_error(err),
                        }
                        display.publish(&frame);
                    }
                    Err(err) => {
                        // Best-effort: no frame this tick, keep going.
                        debug!("frame read failed, skipping tick: {err}");
                        shared.frames_skipped.fetch_add(1, Ordering::SeqCst);
                    }
                }
                interval
            }
        };

        match stop_rx.recv_timeout(wait) {
            Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
            Err(RecvTimeoutError::Timeout) => {}
        }
    }

    // The one place the sink and source are released.
    if let Err(err) = sink.finalize() {
        shared.record_error(err);
    }
    source.close();
    shared.set_state(SessionState::Idle);
    shared.released.store(true, Ordering::SeqCst);
    debug!("cadence loop exited, resources released");
}
