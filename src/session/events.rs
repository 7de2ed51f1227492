use crate::capture::{CaptureArtifact, CaptureKind};
use tokio::sync::broadcast;

/// Capture lifecycle events for the presentation layer
#[derive(Debug, Clone)]
pub enum CaptureEvent {
    DevicesRefreshed {
        count: usize,
        selected: Option<String>,
    },
    RecordingStarted {
        device_id: String,
    },
    RecordingStopped {
        device_id: String,
    },
    ArtifactSaved {
        artifact: CaptureArtifact,
    },
    CaptureFailed {
        kind: CaptureKind,
        device_id: String,
        error: String,
    },
}

/// Event emitter for broadcasting capture events
#[derive(Clone)]
pub struct EventEmitter {
    sender: broadcast::Sender<CaptureEvent>,
}

impl EventEmitter {
    pub fn new() -> (Self, broadcast::Receiver<CaptureEvent>) {
        let (sender, receiver) = broadcast::channel(100);
        (Self { sender }, receiver)
    }

    pub fn emit(&self, event: CaptureEvent) {
        let _ = self.sender.send(event);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<CaptureEvent> {
        self.sender.subscribe()
    }
}

impl Default for EventEmitter {
    fn default() -> Self {
        let (sender, _) = broadcast::channel(100);
        Self { sender }
    }
}

/// Console event listener for printing capture progress
pub struct ConsoleEventListener;

impl ConsoleEventListener {
    pub async fn listen(mut receiver: broadcast::Receiver<CaptureEvent>) {
        use colored::Colorize;

        loop {
            let event = match receiver.recv().await {
                Ok(event) => event,
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    log::debug!("Console listener skipped {} events", skipped);
                    continue;
                }
                Err(broadcast::error::RecvError::Closed) => break,
            };

            match event {
                CaptureEvent::DevicesRefreshed { count, selected } => {
                    log::debug!("{} device(s), selected {:?}", count, selected);
                }
                CaptureEvent::RecordingStarted { device_id } => {
                    println!("{} Recording {}...", "●".red().bold(), device_id.cyan());
                }
                CaptureEvent::RecordingStopped { device_id } => {
                    println!(
                        "{} Stopped recording {}, saving...",
                        "■".yellow(),
                        device_id.cyan()
                    );
                }
                CaptureEvent::ArtifactSaved { artifact } => {
                    println!(
                        "{} Saved {}: {}",
                        "✓".green(),
                        artifact.kind,
                        artifact.local_path.display().to_string().cyan()
                    );
                }
                CaptureEvent::CaptureFailed {
                    kind,
                    device_id,
                    error,
                } => {
                    println!(
                        "{} {} on {} failed: {}",
                        "✗".red(),
                        kind,
                        device_id,
                        error
                    );
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_subscribers_receive_events() {
        let (emitter, mut first) = EventEmitter::new();
        let mut second = emitter.subscribe();

        emitter.emit(CaptureEvent::RecordingStarted {
            device_id: "emulator-5554".to_string(),
        });

        for receiver in [&mut first, &mut second] {
            match receiver.recv().await.unwrap() {
                CaptureEvent::RecordingStarted { device_id } => {
                    assert_eq!(device_id, "emulator-5554")
                }
                other => panic!("unexpected event {:?}", other),
            }
        }
    }

    #[test]
    fn test_emit_without_subscribers_is_silent() {
        EventEmitter::default().emit(CaptureEvent::DevicesRefreshed {
            count: 0,
            selected: None,
        });
    }
}
