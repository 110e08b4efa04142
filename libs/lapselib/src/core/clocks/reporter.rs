//! Elapsed-time reporter thread.
//!
//! Publishes the formatted `MM:SS` readout into a shared cell on a fixed
//! period, so a front-end can poll a string instead of touching timer
//! state. The reporter only reads the timer.

use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

use crossbeam_channel::{bounded, Sender};
use parking_lot::Mutex;

use super::elapsed_timer::{format_mm_ss, SharedTimer};

const DEFAULT_REPORT_PERIOD: Duration = Duration::from_millis(200);

/// Shared slot holding the latest formatted elapsed string.
#[derive(Clone)]
pub struct ReadoutCell {
    value: Arc<Mutex<String>>,
}

impl ReadoutCell {
    pub fn new() -> Self {
        Self {
            value: Arc::new(Mutex::new(format_mm_ss(Duration::ZERO))),
        }
    }

    pub fn read(&self) -> String {
        self.value.lock().clone()
    }

    fn write(&self, text: String) {
        *self.value.lock() = text;
    }
}

impl Default for ReadoutCell {
    fn default() -> Self {
        Self::new()
    }
}

/// Background reporter driving a `ReadoutCell` from a `SharedTimer`.
pub struct ElapsedReporter {
    stop_tx: Sender<()>,
    handle: Option<JoinHandle<()>>,
}

impl ElapsedReporter {
    pub fn spawn(timer: SharedTimer, readout: ReadoutCell) -> Self {
        Self::spawn_with_period(timer, readout, DEFAULT_REPORT_PERIOD)
    }

    pub fn spawn_with_period(timer: SharedTimer, readout: ReadoutCell, period: Duration) -> Self {
        let (stop_tx, stop_rx) = bounded::<()>(1);
        let handle = std::thread::Builder::new()
            .name("lapse-reporter".to_string())
            .spawn(move || {
                tracing::debug!("elapsed reporter started");
                loop {
                    readout.write(format_mm_ss(timer.elapsed()));
                    // Waiting on the stop channel doubles as the sleep.
                    if stop_rx.recv_timeout(period).is_ok() {
                        break;
                    }
                }
                tracing::debug!("elapsed reporter exiting");
            })
            .expect("failed to spawn reporter thread");
        Self {
            stop_tx,
            handle: Some(handle),
        }
    }

    /// Stop the reporter and wait for it to exit.
    pub fn stop(mut self) {
        self.shutdown();
    }

    fn shutdown(&mut self) {
        let _ = self.stop_tx.send(());
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for ElapsedReporter {
    fn drop(&mut self) {
        self.shutdown();
    }
}
