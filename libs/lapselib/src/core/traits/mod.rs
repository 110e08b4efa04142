mod display;
mod sink;
mod source;

pub use display::{DisplaySink, NullDisplay};
pub use sink::FrameSink;
pub use source::FrameSource;
