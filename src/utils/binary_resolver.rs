use crate::error::{CaptureError, CaptureResult};
use std::path::{Path, PathBuf};

#[cfg(windows)]
const ADB_NAME: &str = "adb.exe";
#[cfg(not(windows))]
const ADB_NAME: &str = "adb";

/// Find the adb binary.
///
/// Lookup order: explicit override, `ANDROID_HOME` / `ANDROID_SDK_ROOT`,
/// the default SDK install location for the platform, then `PATH`.
pub fn find_adb(explicit: Option<&Path>) -> CaptureResult<PathBuf> {
    let mut checked_paths = Vec::new();

    if let Some(path) = explicit {
        if path.exists() {
            return Ok(path.to_path_buf());
        }
        return Err(CaptureError::AdbNotFound(format!(
            "configured path {} does not exist",
            path.display()
        )));
    }

    for var in ["ANDROID_HOME", "ANDROID_SDK_ROOT"] {
        if let Some(sdk) = std::env::var_os(var) {
            let candidate = sdk_adb(Path::new(&sdk));
            checked_paths.push(format!("{}: {:?}", var, candidate));
            if candidate.exists() {
                return Ok(candidate);
            }
        }
    }

    if let Some(sdk) = default_sdk_dir() {
        let candidate = sdk_adb(&sdk);
        checked_paths.push(format!("Default SDK: {:?}", candidate));
        if candidate.exists() {
            return Ok(candidate);
        }
    }

    if let Ok(path) = which::which(ADB_NAME) {
        return Ok(path);
    }
    checked_paths.push("PATH".to_string());

    Err(CaptureError::AdbNotFound(format!(
        "checked:\n{}",
        checked_paths.join("\n")
    )))
}

fn sdk_adb(sdk: &Path) -> PathBuf {
    sdk.join("platform-tools").join(ADB_NAME)
}

/// Where Android Studio installs the SDK by default
fn default_sdk_dir() -> Option<PathBuf> {
    if cfg!(target_os = "macos") {
        dirs::home_dir().map(|home| home.join("Library/Android/sdk"))
    } else if cfg!(windows) {
        dirs::data_local_dir().map(|dir| dir.join("Android").join("Sdk"))
    } else {
        dirs::home_dir().map(|home| home.join("Android").join("Sdk"))
    }
}
