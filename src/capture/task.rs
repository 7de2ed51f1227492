use super::artifact::CaptureArtifact;
use crate::error::{CaptureError, CaptureResult};
use std::future::Future;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Handle to a background capture sequence (pull, cleanup, handoff).
///
/// Dropping the handle detaches the sequence; it still runs to completion as
/// long as the runtime is alive. Callers about to exit should wait first.
pub struct CaptureTask {
    handle: JoinHandle<CaptureResult<CaptureArtifact>>,
    cancel: CancellationToken,
}

impl CaptureTask {
    pub(crate) fn spawn<F>(sequence: F) -> Self
    where
        F: Future<Output = CaptureResult<CaptureArtifact>> + Send + 'static,
    {
        let cancel = CancellationToken::new();
        let token = cancel.clone();
        let handle = tokio::spawn(async move {
            tokio::select! {
                _ = token.cancelled() => Err(CaptureError::Cancelled),
                result = sequence => result,
            }
        });

        Self { handle, cancel }
    }

    /// Abort the sequence at its next await point
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Wait for the sequence and return the saved artifact
    pub async fn wait(self) -> CaptureResult<CaptureArtifact> {
        match self.handle.await {
            Ok(result) => result,
            Err(e) if e.is_cancelled() => Err(CaptureError::Cancelled),
            Err(e) => Err(CaptureError::external("capture task", e.to_string())),
        }
    }

    /// Like [`wait`](Self::wait), but cancel the sequence if `trigger`
    /// completes first
    pub async fn wait_or_cancel_on<F>(self, trigger: F) -> CaptureResult<CaptureArtifact>
    where
        F: Future<Output = ()>,
    {
        let cancel = self.cancel.clone();
        let wait = self.wait();
        tokio::pin!(wait);

        tokio::select! {
            result = &mut wait => return result,
            _ = trigger => {
                log::info!("Cancelling capture");
                cancel.cancel();
            }
        }
        wait.await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::artifact::CaptureKind;
    use std::time::Duration;

    #[tokio::test]
    async fn test_wait_returns_sequence_result() {
        let task = CaptureTask::spawn(async {
            Ok(CaptureArtifact {
                kind: CaptureKind::Screenshot,
                local_path: "shot.png".into(),
                created_at: chrono::Local::now(),
            })
        });
        let artifact = task.wait().await.unwrap();
        assert_eq!(artifact.kind, CaptureKind::Screenshot);
    }

    #[tokio::test]
    async fn test_cancel_stops_sequence() {
        let task = CaptureTask::spawn(async {
            tokio::time::sleep(Duration::from_secs(60)).await;
            Err(CaptureError::NoDeviceSelected)
        });
        task.cancel();
        assert!(matches!(task.wait().await, Err(CaptureError::Cancelled)));
    }

    #[tokio::test]
    async fn test_trigger_cancels_running_sequence() {
        let task = CaptureTask::spawn(async {
            tokio::time::sleep(Duration::from_secs(60)).await;
            Err(CaptureError::NoDeviceSelected)
        });
        let result = task
            .wait_or_cancel_on(tokio::time::sleep(Duration::from_millis(20)))
            .await;
        assert!(matches!(result, Err(CaptureError::Cancelled)));
    }

    #[tokio::test]
    async fn test_pending_trigger_lets_sequence_finish() {
        let task = CaptureTask::spawn(async {
            tokio::time::sleep(Duration::from_millis(20)).await;
            Ok(CaptureArtifact {
                kind: CaptureKind::Recording,
                local_path: "clip.mp4".into(),
                created_at: chrono::Local::now(),
            })
        });
        let artifact = task
            .wait_or_cancel_on(std::future::pending())
            .await
            .unwrap();
        assert_eq!(artifact.kind, CaptureKind::Recording);
    }
}
