use crate::capture::{CaptureArtifact, CaptureTask};
use crate::error::CaptureResult;
use crate::session::{ConsoleEventListener, Session, Toggle};
use anyhow::Result;
use colored::Colorize;
use std::io::Write;
use tokio::io::{AsyncBufReadExt, BufReader};

/// A line typed at the menu prompt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MenuCommand {
    Devices,
    /// Device id, or a 1-based position in the last listing
    Select(String),
    Record,
    Screenshot,
    Status,
    Help,
    Exit,
}

pub fn parse_menu_command(line: &str) -> Result<MenuCommand, String> {
    let mut parts = line.split_whitespace();
    let Some(command) = parts.next() else {
        return Err("empty command".to_string());
    };

    let parsed = match command {
        "devices" | "ls" | "refresh" => MenuCommand::Devices,
        "select" | "use" => match parts.next() {
            Some(target) => MenuCommand::Select(target.to_string()),
            None => return Err("usage: select <id|number>".to_string()),
        },
        "record" | "r" => MenuCommand::Record,
        "screenshot" | "shot" | "s" => MenuCommand::Screenshot,
        "status" => MenuCommand::Status,
        "help" | "?" => MenuCommand::Help,
        "exit" | "quit" | "q" => MenuCommand::Exit,
        other => return Err(format!("unknown command: {}", other)),
    };

    if parts.next().is_some() {
        return Err(format!("too many arguments for {}", command));
    }
    Ok(parsed)
}

/// Capture sequences started from the menu that may still be running
#[derive(Default)]
pub struct PendingCaptures {
    tasks: Vec<CaptureTask>,
}

impl PendingCaptures {
    pub fn push(&mut self, task: CaptureTask) {
        self.prune();
        self.tasks.push(task);
    }

    /// Forget sequences that already finished (they reported through events)
    pub fn prune(&mut self) {
        self.tasks.retain(|task| !task.is_finished());
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Wait for every pending sequence
    pub async fn drain(&mut self) -> Vec<CaptureResult<CaptureArtifact>> {
        let mut results = Vec::with_capacity(self.tasks.len());
        for task in self.tasks.drain(..) {
            results.push(task.wait().await);
        }
        results
    }
}

/// Interactive menu: the status-bar menu as a prompt
pub async fn run_shell(session: &Session) -> Result<()> {
    tokio::spawn(ConsoleEventListener::listen(session.subscribe()));

    println!("\n{}", "=== emulator-capture ===".bold().green());
    print_help();
    super::list_devices(session, false).await?;

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut pending = PendingCaptures::default();

    loop {
        print!("{} ", prompt(session).await);
        std::io::stdout().flush()?;

        let Some(line) = lines.next_line().await? else {
            break; // EOF
        };
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let command = match parse_menu_command(line) {
            Ok(command) => command,
            Err(e) => {
                println!("{} {}", "⚠".yellow(), e);
                continue;
            }
        };

        match command {
            MenuCommand::Devices => super::list_devices(session, false).await?,
            MenuCommand::Select(target) => select(session, &target),
            MenuCommand::Record => match session.toggle_recording().await {
                // Start and stop are reported by the event listener.
                Ok(Toggle::Started) => {}
                Ok(Toggle::Stopped(task)) => pending.push(task),
                Err(e) => println!("{} {}", "❌".red(), e),
            },
            MenuCommand::Screenshot => match session.capture_screenshot() {
                Ok(task) => pending.push(task),
                Err(e) => println!("{} {}", "❌".red(), e),
            },
            MenuCommand::Status => print_status(session).await,
            MenuCommand::Help => print_help(),
            MenuCommand::Exit => break,
        }
    }

    if session.is_recording().await {
        println!("{} Discarding unfinished recording", "⚠".yellow());
        session.reset().await;
    }

    pending.prune();
    if !pending.is_empty() {
        println!(
            "{} Waiting for {} capture(s) to finish...",
            "⏳".yellow(),
            pending.len()
        );
        for result in pending.drain().await {
            if let Err(e) = result {
                log::debug!("Capture finished with error: {}", e);
            }
        }
        // Let the listener print the last events.
        tokio::task::yield_now().await;
    }
    println!("\nGoodbye!");
    Ok(())
}

async fn prompt(session: &Session) -> String {
    let device = session.selected().unwrap_or_else(|| "no device".to_string());
    if session.is_recording().await {
        format!("{} {}>", "●".red(), device)
    } else {
        format!("{}>", device).blue().bold().to_string()
    }
}

fn select(session: &Session, target: &str) {
    let id = match target.parse::<usize>() {
        Ok(position) => match session.devices().get(position.wrapping_sub(1)) {
            Some(device) => device.id.clone(),
            None => {
                println!("{} No device #{}", "❌".red(), position);
                return;
            }
        },
        Err(_) => target.to_string(),
    };

    match session.select(&id) {
        Ok(()) => println!("{} Selected {}", "✓".green(), id.cyan()),
        Err(e) => println!("{} {}", "❌".red(), e),
    }
}

async fn print_status(session: &Session) {
    match session.controller().recording_device().await {
        Some(device) => println!("  Recording {}", device.cyan()),
        None => println!("  Idle"),
    }
    match session.selected() {
        Some(device) => println!("  Selected {}", device.cyan()),
        None => println!("  No device selected"),
    }
}

fn print_help() {
    println!("Commands:");
    println!("  devices            refresh and list devices");
    println!("  select <id|n>      choose the capture target");
    println!("  record             start or stop screen recording");
    println!("  screenshot         capture a screenshot");
    println!("  status             show recording state");
    println!("  exit               quit\n");
}
