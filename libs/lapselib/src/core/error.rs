use thiserror::Error;

#[derive(Error, Debug)]
pub enum CaptureError {
    #[error("Invalid configuration: {0}")]
    Configuration(String),

    #[error("Camera device unavailable: {0}")]
    DeviceUnavailable(String),

    #[error("Frame read failed: {0}")]
    FrameRead(String),

    #[error("Encoder unavailable: {0}")]
    EncoderUnavailable(String),

    #[error("Frame write failed: {0}")]
    FrameWrite(String),

    #[error("Post-processing failed: {0}")]
    PostProcess(String),

    #[error("Session error: {0}")]
    Session(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, CaptureError>;
