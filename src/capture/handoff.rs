//! Clipboard and file-browser integration for saved captures

use super::artifact::CaptureArtifact;
use async_trait::async_trait;
use std::path::Path;
use tokio::process::Command;

/// Receives every artifact once it has been saved locally
#[async_trait]
pub trait ArtifactHandoff: Send + Sync {
    async fn deliver(&self, artifact: &CaptureArtifact);
}

/// Does nothing
pub struct NoHandoff;

#[async_trait]
impl ArtifactHandoff for NoHandoff {
    async fn deliver(&self, _artifact: &CaptureArtifact) {}
}

/// Puts the file on the clipboard and reveals it using the platform's tools.
/// Errors are logged and otherwise ignored.
pub struct SystemHandoff;

#[async_trait]
impl ArtifactHandoff for SystemHandoff {
    async fn deliver(&self, artifact: &CaptureArtifact) {
        let path = artifact.local_path.as_path();

        if cfg!(target_os = "macos") {
            let script = clipboard_script(path);
            let target = path.to_string_lossy();
            run_quietly("osascript", &["-e", script.as_str()]).await;
            run_quietly("open", &["-R", &*target]).await;
        } else if cfg!(target_os = "linux") {
            if let Some(dir) = path.parent() {
                let dir = dir.to_string_lossy();
                run_quietly("xdg-open", &[&*dir]).await;
            }
        } else {
            log::info!("Saved {}", path.display());
        }
    }
}

/// AppleScript that places the file itself (not its path text) on the clipboard
fn clipboard_script(path: &Path) -> String {
    let escaped = path
        .to_string_lossy()
        .replace('\\', "\\\\")
        .replace('"', "\\\"");
    format!("set the clipboard to (POSIX file \"{}\")", escaped)
}

async fn run_quietly(program: &str, args: &[&str]) {
    match Command::new(program).args(args).output().await {
        Ok(output) if output.status.success() => {}
        Ok(output) => log::warn!(
            "{} exited with {}: {}",
            program,
            output.status,
            String::from_utf8_lossy(&output.stderr).trim()
        ),
        Err(e) => log::warn!("Failed to run {}: {}", program, e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clipboard_script_escapes_quotes() {
        let script = clipboard_script(Path::new("/tmp/a \"b\"/shot.png"));
        assert_eq!(
            script,
            "set the clipboard to (POSIX file \"/tmp/a \\\"b\\\"/shot.png\")"
        );
    }
}
