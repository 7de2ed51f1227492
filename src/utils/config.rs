use std::path::PathBuf;
use std::time::Duration;

/// Directory under the desktop where artifacts are saved by default
pub const DEFAULT_OUTPUT_FOLDER: &str = "EmulatorScreenRecords";

/// Remote staging file for screen recordings
pub const DEFAULT_REMOTE_RECORDING: &str = "/sdcard/screenrecord1.mp4";

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Explicit adb binary, skips lookup when set
    pub adb_path: Option<PathBuf>,

    /// Local directory for pulled artifacts
    pub output_dir: PathBuf,

    /// Remote staging file used by `screenrecord`
    pub remote_recording_path: String,

    /// Remote directory for screenshot temp files
    pub remote_screenshot_dir: String,

    /// Optional `--bit-rate` passed to `screenrecord`
    pub bit_rate: Option<u32>,

    /// Time for the encoder to flush after SIGINT
    pub stop_grace: Duration,

    /// Delay between `screencap` and `pull`
    pub screenshot_delay: Duration,

    /// How long to wait for the local recorder process before killing it
    pub recorder_exit_timeout: Duration,

    /// Copy to clipboard and reveal saved files
    pub reveal: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            adb_path: None,
            output_dir: default_output_dir(),
            remote_recording_path: DEFAULT_REMOTE_RECORDING.to_string(),
            remote_screenshot_dir: "/sdcard".to_string(),
            bit_rate: None,
            stop_grace: Duration::from_millis(1000),
            screenshot_delay: Duration::from_millis(500),
            recorder_exit_timeout: Duration::from_secs(3),
            reveal: true,
        }
    }
}

/// `~/Desktop/EmulatorScreenRecords`, falling back to the home directory and
/// then the working directory when no desktop exists.
pub fn default_output_dir() -> PathBuf {
    dirs::desktop_dir()
        .or_else(|| dirs::home_dir().map(|home| home.join("Desktop")))
        .unwrap_or_else(|| PathBuf::from("."))
        .join(DEFAULT_OUTPUT_FOLDER)
}
