//! Screen recording and screenshots
//!
//! - [`controller`]: adb command sequences and recording state
//! - [`artifact`]: local file naming
//! - [`handoff`]: clipboard and file-browser integration
//! - [`task`]: handles to background capture sequences

pub mod artifact;
pub mod controller;
pub mod handoff;
pub mod task;

pub use artifact::{CaptureArtifact, CaptureKind};
pub use controller::CaptureController;
pub use handoff::{ArtifactHandoff, NoHandoff, SystemHandoff};
pub use task::CaptureTask;
