//! Error types for device and capture operations.

/// Errors produced by the capture library.
#[derive(Debug, thiserror::Error)]
pub enum CaptureError {
    #[error("No device selected")]
    NoDeviceSelected,

    #[error("Unknown device: {0}")]
    UnknownDevice(String),

    #[error("Could not find adb: {0}")]
    AdbNotFound(String),

    #[error("{command} failed: {message}")]
    ExternalTool { command: String, message: String },

    #[error("Capture cancelled")]
    Cancelled,

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type CaptureResult<T> = Result<T, CaptureError>;

impl CaptureError {
    pub fn external(command: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ExternalTool {
            command: command.into(),
            message: message.into(),
        }
    }
}
