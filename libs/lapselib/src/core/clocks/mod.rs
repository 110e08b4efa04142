mod elapsed_timer;
mod reporter;

pub use elapsed_timer::{format_mm_ss, ElapsedTimer, SharedTimer, TimerState};
pub use reporter::{ElapsedReporter, ReadoutCell};
