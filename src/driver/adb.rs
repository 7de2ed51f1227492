use crate::error::{CaptureError, CaptureResult};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;
use tokio::process::{Child, Command};

/// Process boundary to the adb tool
#[async_trait]
pub trait AdbBackend: Send + Sync {
    /// Run an adb command to completion and return its stdout.
    /// A non-zero exit status is reported as [`CaptureError::ExternalTool`].
    async fn exec(&self, serial: Option<&str>, args: &[&str]) -> CaptureResult<String>;

    /// Start a long-running adb command without waiting for it
    async fn spawn(
        &self,
        serial: Option<&str>,
        args: &[&str],
    ) -> CaptureResult<Box<dyn BackgroundProcess>>;

    /// Execute an adb shell command
    async fn shell(&self, serial: Option<&str>, cmd: &[&str]) -> CaptureResult<String> {
        let mut args = Vec::with_capacity(cmd.len() + 1);
        args.push("shell");
        args.extend_from_slice(cmd);
        self.exec(serial, &args).await
    }

    /// Pull a file from device
    async fn pull(&self, serial: Option<&str>, remote: &str, local: &Path) -> CaptureResult<()> {
        let local = local.to_string_lossy();
        self.exec(serial, &["pull", remote, &*local]).await?;
        Ok(())
    }
}

/// A running adb child that can be asked to finish
#[async_trait]
pub trait BackgroundProcess: Send {
    /// Wait up to `timeout` for the process to exit on its own, then kill it
    async fn wait_or_kill(&mut self, timeout: Duration);

    /// Kill the process immediately
    async fn kill(&mut self);
}

/// adb client backed by `tokio::process`
#[derive(Debug, Clone)]
pub struct AdbClient {
    path: PathBuf,
}

impl AdbClient {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Resolve adb (see [`crate::utils::binary_resolver::find_adb`]) and build a client
    pub fn locate(explicit: Option<&Path>) -> CaptureResult<Self> {
        let path = crate::utils::binary_resolver::find_adb(explicit)?;
        log::debug!("Using adb at {}", path.display());
        Ok(Self::new(path))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

fn full_args<'a>(serial: Option<&'a str>, args: &[&'a str]) -> Vec<&'a str> {
    let mut full_args = Vec::with_capacity(args.len() + 2);
    if let Some(s) = serial {
        full_args.push("-s");
        full_args.push(s);
    }
    full_args.extend_from_slice(args);
    full_args
}

#[async_trait]
impl AdbBackend for AdbClient {
    async fn exec(&self, serial: Option<&str>, args: &[&str]) -> CaptureResult<String> {
        let full_args = full_args(serial, args);
        let command = format!("adb {}", full_args.join(" "));
        log::debug!("Running {}", command);

        let output = Command::new(&self.path)
            .args(&full_args)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await
            .map_err(|e| CaptureError::external(&command, e.to_string()))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(CaptureError::external(
                command,
                format!("{} ({})", stderr.trim(), output.status),
            ));
        }

        Ok(String::from_utf8_lossy(&output.stdout).to_string())
    }

    async fn spawn(
        &self,
        serial: Option<&str>,
        args: &[&str],
    ) -> CaptureResult<Box<dyn BackgroundProcess>> {
        let full_args = full_args(serial, args);
        let command = format!("adb {}", full_args.join(" "));
        log::debug!("Spawning {}", command);

        let child = Command::new(&self.path)
            .args(&full_args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| CaptureError::external(command, e.to_string()))?;

        Ok(Box::new(ChildProcess { child }))
    }
}

/// [`BackgroundProcess`] over a local child process
pub struct ChildProcess {
    child: Child,
}

#[async_trait]
impl BackgroundProcess for ChildProcess {
    async fn wait_or_kill(&mut self, timeout: Duration) {
        match tokio::time::timeout(timeout, self.child.wait()).await {
            Ok(Ok(status)) => log::debug!("adb recorder exited with {}", status),
            Ok(Err(e)) => log::warn!("Failed to wait for adb recorder: {}", e),
            Err(_) => {
                log::warn!("adb recorder did not exit gracefully, force killing");
                self.kill().await;
            }
        }
    }

    async fn kill(&mut self) {
        if let Err(e) = self.child.kill().await {
            log::debug!("Kill adb recorder: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_args_with_serial() {
        assert_eq!(
            full_args(Some("emulator-5554"), &["shell", "ps"]),
            vec!["-s", "emulator-5554", "shell", "ps"]
        );
    }

    #[test]
    fn test_full_args_without_serial() {
        assert_eq!(full_args(None, &["devices", "-l"]), vec!["devices", "-l"]);
    }
}
