pub mod shell;

use crate::capture::CaptureArtifact;
use crate::session::Session;
use anyhow::Result;
use colored::Colorize;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// List connected devices; `*` marks the one captures would target
pub async fn list_devices(session: &Session, json: bool) -> Result<()> {
    let devices = session.refresh_devices().await;

    if json {
        println!("{}", serde_json::to_string_pretty(&devices)?);
        return Ok(());
    }

    if devices.is_empty() {
        println!("  No Android devices connected");
        return Ok(());
    }

    let selected = session.selected();
    println!("  Found {} device(s):", devices.len());
    for (index, device) in devices.iter().enumerate() {
        let marker = if selected.as_deref() == Some(device.id.as_str()) {
            "*".green().bold()
        } else {
            " ".normal()
        };
        println!(
            "  {} {}. {} {}",
            marker,
            index + 1,
            device.id.white().bold(),
            device.model.dimmed()
        );
    }

    Ok(())
}

/// Refresh devices and apply an explicit choice, returning the target id
pub async fn prepare_device(session: &Session, device: Option<&str>) -> Result<String> {
    session.refresh_devices().await;
    if let Some(id) = device {
        session.select(id)?;
    }
    session
        .selected()
        .ok_or_else(|| anyhow::anyhow!("No Android devices connected"))
}

/// Take one screenshot and wait until it is saved
pub async fn run_screenshot(session: &Session, device: Option<&str>) -> Result<CaptureArtifact> {
    let device_id = prepare_device(session, device).await?;
    println!(
        "{} Capturing screenshot on {}...",
        "📸".to_string().blue(),
        device_id.cyan()
    );

    let artifact = session.capture_screenshot()?.wait().await?;
    print_saved(&artifact);
    Ok(artifact)
}

/// Record until Ctrl+C, then save the video. A second Ctrl+C while saving
/// cancels the save.
pub async fn run_record(session: &Session, device: Option<&str>) -> Result<CaptureArtifact> {
    let device_id = prepare_device(session, device).await?;

    let interrupts = Arc::new(AtomicUsize::new(0));
    let interrupts_handler = interrupts.clone();
    ctrlc::set_handler(move || {
        interrupts_handler.fetch_add(1, Ordering::SeqCst);
    })?;

    session.start_recording().await?;
    println!(
        "{} Recording {}. Press Ctrl+C to stop.",
        "🔴".red().bold(),
        device_id.cyan()
    );

    interrupted(&interrupts, 1).await;

    println!(
        "\n{} Stopping recording... (Ctrl+C again to cancel)",
        "⏹️ ".yellow()
    );
    let task = session
        .stop_recording()
        .await
        .ok_or_else(|| anyhow::anyhow!("Recording was not running"))?;
    let artifact = task
        .wait_or_cancel_on(async {
            interrupted(&interrupts, 2).await;
            println!("\n{} Cancelling...", "⚠".yellow());
        })
        .await?;
    print_saved(&artifact);
    Ok(artifact)
}

/// Resolves once Ctrl+C has been pressed `presses` times
async fn interrupted(counter: &AtomicUsize, presses: usize) {
    while counter.load(Ordering::SeqCst) < presses {
        tokio::time::sleep(Duration::from_millis(200)).await;
    }
}

fn print_saved(artifact: &CaptureArtifact) {
    println!(
        "{} Saved {}: {}",
        "✅".green(),
        artifact.kind,
        artifact.local_path.display().to_string().cyan()
    );
}
