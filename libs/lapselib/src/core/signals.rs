//! Process-wide cleanup for capture sessions.
//!
//! Whatever state a session is in when the process is told to die, its sink
//! must be finalized and its device released exactly once — a half-open
//! video file must never be the last artifact. Sessions register themselves
//! here on start; the shutdown hook asks every live session to stop and
//! waits for their cadence threads to release resources before the process
//! exits.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};
use std::time::{Duration, Instant};

use parking_lot::Mutex;

use crate::core::session::SessionShared;

static HOOK_INSTALLED: AtomicBool = AtomicBool::new(false);

static ACTIVE_SESSIONS: Mutex<Vec<Weak<SessionShared>>> = Mutex::new(Vec::new());

/// How long the hook waits for cadence threads before giving up.
const RELEASE_WAIT: Duration = Duration::from_secs(5);

pub(crate) fn register_session(shared: &Arc<SessionShared>) {
    let mut sessions = ACTIVE_SESSIONS.lock();
    // Prune entries whose sessions are already gone.
    sessions.retain(|weak| weak.strong_count() > 0);
    sessions.push(Arc::downgrade(shared));
}

/// Request stop on every live session and wait (bounded) until each has
/// finalized its sink and released its source. Returns how many sessions
/// were asked to stop.
pub fn shutdown_all_sessions(wait: Duration) -> usize {
    let live: Vec<Arc<SessionShared>> = {
        let mut sessions = ACTIVE_SESSIONS.lock();
        let live = sessions.iter().filter_map(Weak::upgrade).collect::<Vec<_>>();
        sessions.clear();
        live
    };

    for shared in &live {
        shared.request_stop();
    }

    let deadline = Instant::now() + wait;
    for shared in &live {
        while !shared.is_released() && Instant::now() < deadline {
            std::thread::sleep(Duration::from_millis(10));
        }
        if !shared.is_released() {
            tracing::warn!("capture session did not release resources before deadline");
        }
    }

    live.len()
}

/// Install Ctrl+C / SIGTERM handlers that close every live session before
/// the process exits.
///
/// Installed once per process; later calls are no-ops. The handlers run the
/// same stop sequence as a normal `stop()`, so the cadence thread finalizes
/// the sink on its usual exit path.
pub fn install_shutdown_hook() -> std::io::Result<()> {
    if HOOK_INSTALLED.swap(true, Ordering::SeqCst) {
        tracing::warn!("shutdown hook already installed, skipping");
        return Ok(());
    }

    ctrlc::set_handler(move || {
        tracing::info!("Ctrl+C received, closing capture sessions");
        let closed = shutdown_all_sessions(RELEASE_WAIT);
        tracing::info!("closed {closed} session(s), exiting");
        std::process::exit(130);
    })
    .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e))?;

    #[cfg(unix)]
    install_sigterm_handler()?;

    tracing::info!("shutdown hook installed (Ctrl+C, SIGTERM)");
    Ok(())
}

#[cfg(unix)]
fn install_sigterm_handler() -> std::io::Result<()> {
    use signal_hook::consts::signal::SIGTERM;
    use signal_hook::flag;

    let term_flag = Arc::new(AtomicBool::new(false));
    flag::register(SIGTERM, Arc::clone(&term_flag))?;

    // Monitor the flag in a background thread; the handler itself only
    // flips the atomic, which is async-signal-safe.
    std::thread::Builder::new()
        .name("signal-handler".to_string())
        .spawn(move || loop {
            if term_flag.load(Ordering::Relaxed) {
                tracing::info!("SIGTERM received, closing capture sessions");
                shutdown_all_sessions(RELEASE_WAIT);
                std::process::exit(143);
            }
            std::thread::sleep(Duration::from_millis(100));
        })?;

    Ok(())
}
