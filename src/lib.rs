pub mod capture;
pub mod driver;
pub mod error;
pub mod runner;
pub mod session;
pub mod utils;

// Re-export common items
pub use capture::{CaptureArtifact, CaptureKind, CaptureTask};
pub use driver::{list_devices, AdbClient, Device};
pub use error::{CaptureError, CaptureResult};
pub use session::Session;
