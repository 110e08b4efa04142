//! Pause-aware elapsed time, as an explicit accumulator state machine.
//!
//! The usual shortcut — remembering a start instant and fudging it forward
//! on resume — drifts and is hard to test. This keeps two fields instead:
//! an anchor for the current Running stretch and the accumulated time of
//! all finished stretches. `elapsed()` never goes backward across any
//! pause/resume sequence.

use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerState {
    Stopped,
    Running,
    Paused,
}

/// Accumulator timer: {wall-clock anchor, accumulated offset}.
#[derive(Debug)]
pub struct ElapsedTimer {
    state: TimerState,
    anchor: Option<Instant>,
    accumulated: Duration,
}

impl ElapsedTimer {
    pub fn new() -> Self {
        Self {
            state: TimerState::Stopped,
            anchor: None,
            accumulated: Duration::ZERO,
        }
    }

    pub fn state(&self) -> TimerState {
        self.state
    }

    /// Stopped → Running. Anchor = now, offset = 0. No-op in other states.
    pub fn start(&mut self) {
        if self.state == TimerState::Stopped {
            self.state = TimerState::Running;
            self.anchor = Some(Instant::now());
            self.accumulated = Duration::ZERO;
        }
    }

    /// Running → Paused. Folds the current stretch into the accumulator.
    pub fn pause(&mut self) {
        if self.state == TimerState::Running {
            if let Some(anchor) = self.anchor.take() {
                self.accumulated += anchor.elapsed();
            }
            self.state = TimerState::Paused;
        }
    }

    /// Paused → Running. New anchor, offset retained.
    pub fn resume(&mut self) {
        if self.state == TimerState::Paused {
            self.anchor = Some(Instant::now());
            self.state = TimerState::Running;
        }
    }

    /// → Stopped, offset cleared.
    pub fn reset(&mut self) {
        self.state = TimerState::Stopped;
        self.anchor = None;
        self.accumulated = Duration::ZERO;
    }

    /// Active recording time so far: offset plus the live stretch while
    /// Running, the frozen offset while Paused, zero while Stopped.
    pub fn elapsed(&self) -> Duration {
        match self.state {
            TimerState::Running => {
                self.accumulated + self.anchor.map(|a| a.elapsed()).unwrap_or_default()
            }
            TimerState::Paused => self.accumulated,
            TimerState::Stopped => Duration::ZERO,
        }
    }
}

impl Default for ElapsedTimer {
    fn default() -> Self {
        Self::new()
    }
}

/// Cross-thread handle to one timer.
///
/// Control operations (start/pause/resume/reset) come from the session;
/// the reporter thread only reads. A single mutex keeps the anchor and the
/// accumulator pair-consistent.
#[derive(Clone, Default)]
pub struct SharedTimer {
    inner: Arc<Mutex<ElapsedTimer>>,
}

impl SharedTimer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn start(&self) {
        self.inner.lock().start();
    }

    pub fn pause(&self) {
        self.inner.lock().pause();
    }

    pub fn resume(&self) {
        self.inner.lock().resume();
    }

    pub fn reset(&self) {
        self.inner.lock().reset();
    }

    pub fn elapsed(&self) -> Duration {
        self.inner.lock().elapsed()
    }

    pub fn state(&self) -> TimerState {
        self.inner.lock().state()
    }
}

/// `MM:SS` readout of a duration. Minutes widen past two digits rather than
/// wrapping.
pub fn format_mm_ss(elapsed: Duration) -> String {
    let total = elapsed.as_secs();
    format!("{:02}:{:02}", total / 60, total % 60)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn test_stopped_timer_reads_zero() {
        let timer = ElapsedTimer::new();
        assert_eq!(timer.state(), TimerState::Stopped);
        assert_eq!(timer.elapsed(), Duration::ZERO);
    }

    #[test]
    fn test_running_timer_increases() {
        let mut timer = ElapsedTimer::new();
        timer.start();
        let t1 = timer.elapsed();
        thread::sleep(Duration::from_millis(10));
        let t2 = timer.elapsed();
        assert!(t2 > t1, "elapsed must increase while running");
        assert!(t2 >= Duration::from_millis(10));
    }

    #[test]
    fn test_pause_freezes_elapsed() {
        let mut timer = ElapsedTimer::new();
        timer.start();
        thread::sleep(Duration::from_millis(10));
        timer.pause();
        let frozen = timer.elapsed();
        thread::sleep(Duration::from_millis(15));
        assert_eq!(timer.elapsed(), frozen);
    }

    #[test]
    fn test_resume_continues_from_frozen_value() {
        let mut timer = ElapsedTimer::new();
        timer.start();
        thread::sleep(Duration::from_millis(10));
        timer.pause();
        let frozen = timer.elapsed();

        thread::sleep(Duration::from_millis(20));
        timer.resume();
        thread::sleep(Duration::from_millis(10));

        let total = timer.elapsed();
        assert!(total >= frozen + Duration::from_millis(10));
        // The paused stretch must not be counted.
        assert!(total < frozen + Duration::from_millis(30));
    }

    #[test]
    fn test_never_decreases_across_pause_resume_cycles() {
        let mut timer = ElapsedTimer::new();
        timer.start();
        let mut last = Duration::ZERO;
        for _ in 0..3 {
            thread::sleep(Duration::from_millis(5));
            timer.pause();
            let now = timer.elapsed();
            assert!(now >= last, "elapsed went backward");
            last = now;
            timer.resume();
            let now = timer.elapsed();
            assert!(now >= last, "elapsed went backward on resume");
            last = now;
        }
    }

    #[test]
    fn test_reset_clears_offset() {
        let mut timer = ElapsedTimer::new();
        timer.start();
        thread::sleep(Duration::from_millis(5));
        timer.reset();
        assert_eq!(timer.state(), TimerState::Stopped);
        assert_eq!(timer.elapsed(), Duration::ZERO);
    }

    #[test]
    fn test_invalid_transitions_are_no_ops() {
        let mut timer = ElapsedTimer::new();
        timer.pause();
        timer.resume();
        assert_eq!(timer.state(), TimerState::Stopped);

        timer.start();
        timer.start();
        timer.resume();
        assert_eq!(timer.state(), TimerState::Running);
    }

    #[test]
    fn test_shared_timer_cross_thread_read() {
        let timer = SharedTimer::new();
        timer.start();
        let reader = timer.clone();
        let handle = thread::spawn(move || {
            let mut last = Duration::ZERO;
            for _ in 0..10 {
                let now = reader.elapsed();
                assert!(now >= last);
                last = now;
                thread::sleep(Duration::from_millis(2));
            }
        });
        handle.join().unwrap();
    }

    #[test]
    fn test_format_mm_ss() {
        assert_eq!(format_mm_ss(Duration::ZERO), "00:00");
        assert_eq!(format_mm_ss(Duration::from_secs(61)), "01:01");
        assert_eq!(format_mm_ss(Duration::from_secs(599)), "09:59");
        assert_eq!(format_mm_ss(Duration::from_secs(6000)), "100:00");
    }
}
