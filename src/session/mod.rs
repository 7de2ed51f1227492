//! Capture session: device selection plus the capture controller.
//!
//! A [`Session`] is the single owner of all mutable state. The selector sits
//! behind a `std::sync::Mutex` (never held across an await) and the recording
//! state lives inside the [`CaptureController`]. Progress is published on a
//! broadcast channel, see [`events`].

pub mod events;
pub mod selector;

pub use events::{CaptureEvent, ConsoleEventListener, EventEmitter};
pub use selector::DeviceSelector;

use crate::capture::{ArtifactHandoff, CaptureController, CaptureTask};
use crate::driver::{self, AdbBackend, Device};
use crate::error::CaptureResult;
use crate::utils::Config;
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::broadcast;

/// Result of a recording toggle
pub enum Toggle {
    Started,
    /// Stopped; the task finishes saving the file
    Stopped(CaptureTask),
}

pub struct Session {
    adb: Arc<dyn AdbBackend>,
    selector: Mutex<DeviceSelector>,
    controller: CaptureController,
    events: EventEmitter,
}

impl Session {
    pub fn new(adb: Arc<dyn AdbBackend>, handoff: Arc<dyn ArtifactHandoff>, config: Config) -> Self {
        let events = EventEmitter::default();
        let controller =
            CaptureController::new(adb.clone(), handoff, Arc::new(config), events.clone());

        Self {
            adb,
            selector: Mutex::new(DeviceSelector::new()),
            controller,
            events,
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<CaptureEvent> {
        self.events.subscribe()
    }

    fn selector(&self) -> MutexGuard<'_, DeviceSelector> {
        self.selector
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Re-enumerate devices and update the selection
    pub async fn refresh_devices(&self) -> Vec<Device> {
        let devices = driver::list_devices(self.adb.as_ref()).await;

        let selected = {
            let mut selector = self.selector();
            selector.apply_refresh(devices.clone());
            selector.current().map(str::to_string)
        };

        log::debug!("Found {} device(s), selected {:?}", devices.len(), selected);
        self.events.emit(CaptureEvent::DevicesRefreshed {
            count: devices.len(),
            selected,
        });
        devices
    }

    pub fn devices(&self) -> Vec<Device> {
        self.selector().devices().to_vec()
    }

    pub fn selected(&self) -> Option<String> {
        self.selector().current().map(str::to_string)
    }

    pub fn select(&self, id: &str) -> CaptureResult<()> {
        self.selector().select(id)
    }

    pub fn controller(&self) -> &CaptureController {
        &self.controller
    }

    pub async fn is_recording(&self) -> bool {
        self.controller.is_recording().await
    }

    /// Start recording the selected device
    pub async fn start_recording(&self) -> CaptureResult<bool> {
        let device_id = self.selected().unwrap_or_default();
        self.controller.start_recording(&device_id).await
    }

    pub async fn stop_recording(&self) -> Option<CaptureTask> {
        self.controller.stop_recording().await
    }

    /// Start when idle, stop otherwise
    pub async fn toggle_recording(&self) -> CaptureResult<Toggle> {
        if let Some(task) = self.controller.stop_recording().await {
            return Ok(Toggle::Stopped(task));
        }
        self.start_recording().await?;
        Ok(Toggle::Started)
    }

    /// Screenshot the selected device
    pub fn capture_screenshot(&self) -> CaptureResult<CaptureTask> {
        let device_id = self.selected().unwrap_or_default();
        self.controller.capture_screenshot(&device_id)
    }

    /// Forget the running recording without saving it
    pub async fn reset(&self) {
        self.controller.reset().await;
    }
}
