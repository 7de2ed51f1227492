use crate::driver::Device;
use crate::error::{CaptureError, CaptureResult};

/// Known devices and the chosen one
#[derive(Debug, Default, Clone)]
pub struct DeviceSelector {
    devices: Vec<Device>,
    selected: Option<String>,
}

impl DeviceSelector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Currently selected device id, `None` when nothing is selected
    pub fn current(&self) -> Option<&str> {
        self.selected.as_deref()
    }

    /// Last known device list
    pub fn devices(&self) -> &[Device] {
        &self.devices
    }

    /// Select a device from the last known list.
    ///
    /// An empty id clears the selection. Unknown ids are rejected and the
    /// selection is left as it was.
    pub fn select(&mut self, id: &str) -> CaptureResult<()> {
        if id.is_empty() {
            self.selected = None;
            return Ok(());
        }
        if !self.contains(id) {
            return Err(CaptureError::UnknownDevice(id.to_string()));
        }
        self.selected = Some(id.to_string());
        Ok(())
    }

    /// Replace the device list, keeping the selection when it is still
    /// connected and falling back to the first device otherwise.
    pub fn apply_refresh(&mut self, devices: Vec<Device>) {
        self.devices = devices;

        let keep = self
            .selected
            .as_deref()
            .is_some_and(|id| self.contains(id));
        if !keep {
            self.selected = self.devices.first().map(|d| d.id.clone());
        }
    }

    fn contains(&self, id: &str) -> bool {
        self.devices.iter().any(|d| d.id == id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn devices(ids: &[&str]) -> Vec<Device> {
        ids.iter().map(|id| Device::new(*id, "")).collect()
    }

    fn selector_with(selected: &str, ids: &[&str]) -> DeviceSelector {
        let mut selector = DeviceSelector::new();
        selector.apply_refresh(devices(ids));
        selector.select(selected).unwrap();
        selector
    }

    #[test]
    fn test_first_refresh_selects_first_device() {
        let mut selector = DeviceSelector::new();
        assert_eq!(selector.current(), None);
        selector.apply_refresh(devices(&["A", "B"]));
        assert_eq!(selector.current(), Some("A"));
    }

    #[test]
    fn test_selection_survives_refresh() {
        let mut selector = selector_with("A", &["A"]);
        selector.apply_refresh(devices(&["B", "A"]));
        assert_eq!(selector.current(), Some("A"));
    }

    #[test]
    fn test_selection_resets_to_first_device() {
        let mut selector = selector_with("A", &["A"]);
        selector.apply_refresh(devices(&["B", "C"]));
        assert_eq!(selector.current(), Some("B"));
    }

    #[test]
    fn test_selection_clears_when_no_devices() {
        let mut selector = selector_with("A", &["A"]);
        selector.apply_refresh(Vec::new());
        assert_eq!(selector.current(), None);
        assert!(selector.devices().is_empty());
    }

    #[test]
    fn test_unknown_device_is_rejected() {
        let mut selector = selector_with("A", &["A", "B"]);
        let err = selector.select("Z").unwrap_err();
        assert!(matches!(err, CaptureError::UnknownDevice(id) if id == "Z"));
        assert_eq!(selector.current(), Some("A"));

        selector.select("B").unwrap();
        assert_eq!(selector.current(), Some("B"));
    }

    #[test]
    fn test_empty_id_clears_selection() {
        let mut selector = selector_with("A", &["A"]);
        selector.select("").unwrap();
        assert_eq!(selector.current(), None);
    }
}
