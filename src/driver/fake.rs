//! In-memory adb used by unit tests

use super::adb::{AdbBackend, BackgroundProcess};
use crate::error::{CaptureError, CaptureResult};
use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub const PS_OUTPUT: &str = "\
USER           PID  PPID     VSZ    RSS WCHAN            ADDR S NAME
root             1     0 10904672 12345 0                  0 S init
shell         4242  4240 10823472  9876 0                  0 S screenrecord
u0_a123       5000   300 15000000 80000 0                  0 S com.example.app
";

/// Records every invocation; `pull` writes a small file at the local path.
#[derive(Default)]
pub struct FakeAdb {
    calls: Mutex<Vec<Vec<String>>>,
    devices: String,
    ps: String,
    failing: Vec<String>,
    pull_delay: Duration,
    kills: Arc<AtomicUsize>,
}

impl FakeAdb {
    pub fn new() -> Self {
        Self {
            devices: "List of devices attached\n".to_string(),
            ps: PS_OUTPUT.to_string(),
            ..Default::default()
        }
    }

    pub fn with_devices(mut self, output: &str) -> Self {
        self.devices = output.to_string();
        self
    }

    /// Fail every command whose first non-serial argument is `command`
    pub fn failing(mut self, command: &str) -> Self {
        self.failing.push(command.to_string());
        self
    }

    pub fn with_pull_delay(mut self, delay: Duration) -> Self {
        self.pull_delay = delay;
        self
    }

    pub fn calls(&self) -> Vec<Vec<String>> {
        self.calls.lock().unwrap().clone()
    }

    /// Calls with the leading `-s <serial>` removed
    pub fn commands(&self) -> Vec<Vec<String>> {
        self.calls()
            .into_iter()
            .map(|call| {
                if call.first().map(String::as_str) == Some("-s") {
                    call[2..].to_vec()
                } else {
                    call
                }
            })
            .collect()
    }

    /// Number of commands starting with the given arguments
    pub fn count(&self, prefix: &[&str]) -> usize {
        self.commands()
            .iter()
            .filter(|call| call.len() >= prefix.len() && call[..prefix.len()] == *prefix)
            .count()
    }

    pub fn kills(&self) -> usize {
        self.kills.load(Ordering::SeqCst)
    }

    fn record(&self, serial: Option<&str>, args: &[&str]) {
        let mut call = Vec::new();
        if let Some(s) = serial {
            call.push("-s".to_string());
            call.push(s.to_string());
        }
        call.extend(args.iter().map(|a| a.to_string()));
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait]
impl AdbBackend for FakeAdb {
    async fn exec(&self, serial: Option<&str>, args: &[&str]) -> CaptureResult<String> {
        self.record(serial, args);

        let command = args.first().copied().unwrap_or_default();
        if self.failing.iter().any(|f| f == command) {
            return Err(CaptureError::external(
                format!("adb {}", args.join(" ")),
                "simulated failure",
            ));
        }

        match args {
            ["devices", ..] => Ok(self.devices.clone()),
            ["shell", "ps", ..] => Ok(self.ps.clone()),
            ["pull", _remote, local] => {
                if !self.pull_delay.is_zero() {
                    tokio::time::sleep(self.pull_delay).await;
                }
                std::fs::write(local, b"fake")?;
                Ok(format!("{}: 1 file pulled", local))
            }
            _ => Ok(String::new()),
        }
    }

    async fn spawn(
        &self,
        serial: Option<&str>,
        args: &[&str],
    ) -> CaptureResult<Box<dyn BackgroundProcess>> {
        self.record(serial, args);
        Ok(Box::new(FakeProcess {
            kills: self.kills.clone(),
        }))
    }
}

pub struct FakeProcess {
    kills: Arc<AtomicUsize>,
}

#[async_trait]
impl BackgroundProcess for FakeProcess {
    async fn wait_or_kill(&mut self, _timeout: Duration) {}

    async fn kill(&mut self) {
        self.kills.fetch_add(1, Ordering::SeqCst);
    }
}
