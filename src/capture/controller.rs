//! Recording and screenshot orchestration over adb.
//!
//! Recording is a small state machine: `start_recording` launches
//! `screenrecord` on the device and returns, `stop_recording` returns the
//! controller to idle at once and finishes the file in a background
//! [`CaptureTask`] (interrupt the recorder, let the encoder flush, pull,
//! remove the staging file, hand off). Screenshots are one-shot tasks.
//!
//! The stop sequence holds the staging lock until the remote recording file
//! has been pulled and removed, so a new recording started meanwhile waits
//! instead of overwriting it. Each screenshot uses its own remote file.
//!
//! A cancelled sequence removes its local placeholder and, in the background,
//! the remote file it was working on.

use super::artifact::{self, CaptureArtifact, CaptureKind};
use super::handoff::ArtifactHandoff;
use super::task::CaptureTask;
use crate::driver::adb::{AdbBackend, BackgroundProcess};
use crate::error::{CaptureError, CaptureResult};
use crate::session::events::{CaptureEvent, EventEmitter};
use crate::utils::Config;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::{Mutex, OwnedMutexGuard};

/// Name of the on-device recorder process
const RECORDER_PROCESS: &str = "screenrecord";

/// An in-progress screen recording
struct RecordingSession {
    device_id: String,
    process: Box<dyn BackgroundProcess>,
    started_at: Instant,
}

pub struct CaptureController {
    pipeline: Pipeline,
    recording: Mutex<Option<RecordingSession>>,
    staging: Arc<Mutex<()>>,
}

impl CaptureController {
    pub fn new(
        adb: Arc<dyn AdbBackend>,
        handoff: Arc<dyn ArtifactHandoff>,
        config: Arc<Config>,
        events: EventEmitter,
    ) -> Self {
        Self {
            pipeline: Pipeline {
                adb,
                handoff,
                config,
                events,
            },
            recording: Mutex::new(None),
            staging: Arc::new(Mutex::new(())),
        }
    }

    pub async fn is_recording(&self) -> bool {
        self.recording.lock().await.is_some()
    }

    /// Device of the running recording, if any
    pub async fn recording_device(&self) -> Option<String> {
        self.recording
            .lock()
            .await
            .as_ref()
            .map(|session| session.device_id.clone())
    }

    /// Start `screenrecord` on the device.
    ///
    /// Returns `Ok(false)` without touching adb when a recording is already
    /// running.
    pub async fn start_recording(&self, device_id: &str) -> CaptureResult<bool> {
        if device_id.is_empty() {
            return Err(CaptureError::NoDeviceSelected);
        }

        // Wait until a previous stop has pulled the staging file. Taken before
        // the recording lock so status queries stay responsive meanwhile.
        let _staging = self.staging.lock().await;

        let mut recording = self.recording.lock().await;
        if let Some(session) = recording.as_ref() {
            log::debug!(
                "Already recording {} for {:?}, ignoring start",
                session.device_id,
                session.started_at.elapsed()
            );
            return Ok(false);
        }

        let config = &self.pipeline.config;
        let bit_rate = config.bit_rate.map(|rate| rate.to_string());
        let mut args = vec!["shell", RECORDER_PROCESS];
        if let Some(rate) = bit_rate.as_deref() {
            args.push("--bit-rate");
            args.push(rate);
        }
        args.push(config.remote_recording_path.as_str());

        let process = self.pipeline.adb.spawn(Some(device_id), &args).await?;
        log::info!("Recording started on {}", device_id);

        *recording = Some(RecordingSession {
            device_id: device_id.to_string(),
            process,
            started_at: Instant::now(),
        });
        self.pipeline.events.emit(CaptureEvent::RecordingStarted {
            device_id: device_id.to_string(),
        });

        Ok(true)
    }

    /// Stop the running recording.
    ///
    /// The controller is idle again when this returns; the file is finished by
    /// the returned task. Returns `None` when nothing was recording.
    pub async fn stop_recording(&self) -> Option<CaptureTask> {
        let session = self.recording.lock().await.take()?;
        let staging = self.staging.clone().lock_owned().await;

        log::info!(
            "Stopping recording on {} after {:?}",
            session.device_id,
            session.started_at.elapsed()
        );
        self.pipeline.events.emit(CaptureEvent::RecordingStopped {
            device_id: session.device_id.clone(),
        });

        let pipeline = self.pipeline.clone();
        Some(CaptureTask::spawn(async move {
            pipeline.finish_recording(session, staging).await
        }))
    }

    /// Take a screenshot in the background
    pub fn capture_screenshot(&self, device_id: &str) -> CaptureResult<CaptureTask> {
        if device_id.is_empty() {
            return Err(CaptureError::NoDeviceSelected);
        }

        let remote = format!(
            "{}/emulator_capture_{}.png",
            self.pipeline.config.remote_screenshot_dir.trim_end_matches('/'),
            uuid::Uuid::new_v4().simple()
        );
        let device_id = device_id.to_string();
        let pipeline = self.pipeline.clone();

        Ok(CaptureTask::spawn(async move {
            pipeline.take_screenshot(&device_id, &remote).await
        }))
    }

    /// Drop the running recording without saving it
    pub async fn reset(&self) {
        if let Some(mut session) = self.recording.lock().await.take() {
            log::info!("Discarding recording on {}", session.device_id);
            session.process.kill().await;
        }
    }
}

#[derive(Clone)]
struct Pipeline {
    adb: Arc<dyn AdbBackend>,
    handoff: Arc<dyn ArtifactHandoff>,
    config: Arc<Config>,
    events: EventEmitter,
}

impl Pipeline {
    async fn finish_recording(
        &self,
        mut session: RecordingSession,
        staging: OwnedMutexGuard<()>,
    ) -> CaptureResult<CaptureArtifact> {
        let device_id = session.device_id.as_str();
        let cleanup = self.remote_cleanup(
            device_id,
            &self.config.remote_recording_path,
            Some(staging),
        );

        self.interrupt_recorder(device_id).await;
        session
            .process
            .wait_or_kill(self.config.recorder_exit_timeout)
            .await;

        // Let the encoder write the moov atom before pulling.
        tokio::time::sleep(self.config.stop_grace).await;

        let result = self
            .pull_artifact(
                device_id,
                &self.config.remote_recording_path,
                CaptureKind::Recording,
            )
            .await;
        cleanup.disarm();
        self.settle(CaptureKind::Recording, device_id, result).await
    }

    async fn take_screenshot(
        &self,
        device_id: &str,
        remote: &str,
    ) -> CaptureResult<CaptureArtifact> {
        let cleanup = self.remote_cleanup(device_id, remote, None);
        let result = match self
            .adb
            .shell(Some(device_id), &["screencap", "-p", remote])
            .await
        {
            Ok(_) => {
                tokio::time::sleep(self.config.screenshot_delay).await;
                self.pull_artifact(device_id, remote, CaptureKind::Screenshot)
                    .await
            }
            Err(e) => Err(e),
        };
        cleanup.disarm();
        self.settle(CaptureKind::Screenshot, device_id, result).await
    }

    /// Send SIGINT to every `screenrecord` on the device so it finalizes the file
    async fn interrupt_recorder(&self, device_id: &str) {
        let ps = match self.adb.shell(Some(device_id), &["ps"]).await {
            Ok(ps) => ps,
            Err(e) => {
                log::warn!("Could not list processes on {}: {}", device_id, e);
                return;
            }
        };

        let pids = recorder_pids(&ps);
        if pids.is_empty() {
            log::warn!("No {} process found on {}", RECORDER_PROCESS, device_id);
        }

        for pid in pids {
            if let Err(e) = self
                .adb
                .shell(Some(device_id), &["kill", "-2", pid.as_str()])
                .await
            {
                log::warn!("Failed to stop {} ({}): {}", RECORDER_PROCESS, pid, e);
            }
        }
    }

    /// Pull `remote` into the output directory, then delete it from the device
    async fn pull_artifact(
        &self,
        device_id: &str,
        remote: &str,
        kind: CaptureKind,
    ) -> CaptureResult<CaptureArtifact> {
        let created_at = chrono::Local::now();
        let reserved = artifact::reserve_path(&self.config.output_dir, kind, &created_at)?;

        self.adb.pull(Some(device_id), remote, reserved.path()).await?;
        let local_path = reserved.commit();

        if let Err(e) = self.adb.shell(Some(device_id), &["rm", remote]).await {
            log::warn!("Failed to remove {} from {}: {}", remote, device_id, e);
        }

        Ok(CaptureArtifact {
            kind,
            local_path,
            created_at,
        })
    }

    /// Arm removal of `remote` for when the sequence is dropped midway
    fn remote_cleanup(
        &self,
        device_id: &str,
        remote: &str,
        staging: Option<OwnedMutexGuard<()>>,
    ) -> RemoteCleanup {
        RemoteCleanup {
            adb: self.adb.clone(),
            device_id: device_id.to_string(),
            remote: remote.to_string(),
            staging,
            armed: true,
        }
    }

    /// Report the outcome and hand successful captures off
    async fn settle(
        &self,
        kind: CaptureKind,
        device_id: &str,
        result: CaptureResult<CaptureArtifact>,
    ) -> CaptureResult<CaptureArtifact> {
        match &result {
            Ok(artifact) => {
                log::info!("Saved {} to {}", kind, artifact.local_path.display());
                if self.config.reveal {
                    self.handoff.deliver(artifact).await;
                }
                self.events.emit(CaptureEvent::ArtifactSaved {
                    artifact: artifact.clone(),
                });
            }
            Err(e) => {
                log::warn!("{} on {} failed: {}", kind, device_id, e);
                self.events.emit(CaptureEvent::CaptureFailed {
                    kind,
                    device_id: device_id.to_string(),
                    error: e.to_string(),
                });
            }
        }
        result
    }
}

/// Deletes a remote capture file when dropped while armed.
///
/// The `rm` runs on a spawned task, which also holds the staging lock (if
/// any) until the file is gone.
struct RemoteCleanup {
    adb: Arc<dyn AdbBackend>,
    device_id: String,
    remote: String,
    staging: Option<OwnedMutexGuard<()>>,
    armed: bool,
}

impl RemoteCleanup {
    /// The sequence ran to its end; leave the remote file alone
    fn disarm(mut self) {
        self.armed = false;
    }
}

impl Drop for RemoteCleanup {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            log::warn!("Left {} on {}", self.remote, self.device_id);
            return;
        };

        let adb = self.adb.clone();
        let device_id = std::mem::take(&mut self.device_id);
        let remote = std::mem::take(&mut self.remote);
        let staging = self.staging.take();
        runtime.spawn(async move {
            log::debug!("Removing {} from {} after cancel", remote, device_id);
            if let Err(e) = adb
                .shell(Some(device_id.as_str()), &["rm", remote.as_str()])
                .await
            {
                log::warn!("Failed to remove {} from {}: {}", remote, device_id, e);
            }
            drop(staging);
        });
    }
}

/// PIDs of recorder processes in `ps` output (PID is the second column)
fn recorder_pids(ps: &str) -> Vec<String> {
    ps.lines()
        .filter(|line| line.contains(RECORDER_PROCESS))
        .filter_map(|line| line.split_whitespace().nth(1))
        .filter(|pid| pid.parse::<u32>().is_ok())
        .map(str::to_string)
        .collect()
}
