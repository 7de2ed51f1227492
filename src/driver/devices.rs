use super::adb::AdbBackend;
use serde::Serialize;

/// Represents an Android device
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Device {
    pub id: String,
    /// Empty when `adb devices -l` does not advertise one
    pub model: String,
}

impl Device {
    pub fn new(id: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            model: model.into(),
        }
    }

    /// Model when known, id otherwise
    pub fn label(&self) -> &str {
        if self.model.is_empty() {
            &self.id
        } else {
            &self.model
        }
    }
}

/// Get list of connected Android devices.
///
/// Any failure to run adb yields an empty list.
pub async fn list_devices(adb: &dyn AdbBackend) -> Vec<Device> {
    match adb.exec(None, &["devices", "-l"]).await {
        Ok(stdout) => parse_devices(&stdout),
        Err(e) => {
            log::warn!("Failed to list devices: {}", e);
            Vec::new()
        }
    }
}

/// Parse the output of `adb devices -l`.
///
/// The first line is the `List of devices attached` header. Only devices in
/// the `device` state are returned; `offline`, `unauthorized` and
/// `no permissions` entries are skipped.
pub fn parse_devices(output: &str) -> Vec<Device> {
    let mut devices = Vec::new();

    for line in output.lines().skip(1) {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let Some((id, remainder)) = line.split_once(char::is_whitespace) else {
            log::debug!("Skipping device line without state: {:?}", line);
            continue;
        };

        if remainder.split_whitespace().next() != Some("device") {
            log::debug!("Skipping device line: {:?}", line);
            continue;
        }

        devices.push(Device {
            id: id.to_string(),
            model: extract_model(line),
        });
    }

    devices
}

fn extract_model(line: &str) -> String {
    match line.find("model:") {
        Some(pos) => line[pos + "model:".len()..]
            .split(char::is_whitespace)
            .next()
            .unwrap_or_default()
            .to_string(),
        None => String::new(),
    }
}
