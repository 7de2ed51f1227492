use clap::{Parser, Subcommand};
use colored::Colorize;
use std::path::PathBuf;
use std::sync::Arc;

use emulator_capture::capture::{ArtifactHandoff, NoHandoff, SystemHandoff};
use emulator_capture::utils::Config;
use emulator_capture::{runner, AdbClient, Session};

#[derive(Parser)]
#[command(name = "emulator-capture")]
#[command(author = "NL Team")]
#[command(version)]
#[command(about = "Screen recording and screenshots for Android devices over adb", long_about = None)]
struct Cli {
    /// Path to the adb binary (looked up in the Android SDK and PATH otherwise)
    #[arg(long, global = true, env = "EMULATOR_CAPTURE_ADB")]
    adb: Option<PathBuf>,

    /// Directory for saved captures [default: ~/Desktop/EmulatorScreenRecords]
    #[arg(short, long, global = true, env = "EMULATOR_CAPTURE_OUTPUT")]
    output: Option<PathBuf>,

    /// Do not copy saved files to the clipboard or reveal them
    #[arg(long, global = true, default_value = "false")]
    no_reveal: bool,

    /// Video bit rate passed to screenrecord (bits per second)
    #[arg(long, global = true)]
    bit_rate: Option<u32>,

    /// Enable debug logging
    #[arg(short, long, global = true, default_value = "false")]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// List connected devices
    Devices {
        /// Print the list as JSON
        #[arg(long, default_value = "false")]
        json: bool,
    },

    /// Capture a screenshot
    Screenshot {
        /// Device serial (defaults to the first connected device)
        #[arg(short, long)]
        device: Option<String>,
    },

    /// Record the screen until Ctrl+C
    Record {
        /// Device serial (defaults to the first connected device)
        #[arg(short, long)]
        device: Option<String>,
    },

    /// Interactive capture menu (default)
    Menu {
        /// Device serial to select initially
        #[arg(short, long)]
        device: Option<String>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let default_filter = if cli.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();

    let mut config = Config {
        adb_path: cli.adb,
        bit_rate: cli.bit_rate,
        reveal: !cli.no_reveal,
        ..Config::default()
    };
    if let Some(output) = cli.output {
        config.output_dir = output;
    }

    let adb = AdbClient::locate(config.adb_path.as_deref())?;
    log::info!("adb: {}", adb.path().display());

    let handoff: Arc<dyn ArtifactHandoff> = if config.reveal {
        Arc::new(SystemHandoff)
    } else {
        Arc::new(NoHandoff)
    };
    let session = Session::new(Arc::new(adb), handoff, config);

    match cli.command.unwrap_or(Commands::Menu { device: None }) {
        Commands::Devices { json } => {
            if !json {
                println!("{} Listing android devices...", "🔍".to_string().blue());
            }
            runner::list_devices(&session, json).await?;
        }

        Commands::Screenshot { device } => {
            runner::run_screenshot(&session, device.as_deref()).await?;
        }

        Commands::Record { device } => {
            runner::run_record(&session, device.as_deref()).await?;
        }

        Commands::Menu { device } => {
            if let Some(id) = device {
                runner::prepare_device(&session, Some(id.as_str())).await?;
            }
            runner::shell::run_shell(&session).await?;
        }
    }

    Ok(())
}
