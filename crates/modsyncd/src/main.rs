//! Modsync daemon - chassis module state synchronization.
//!
//! This binary mirrors live chassis module state (presence, identity,
//! operational status) into the shared store and applies module config
//! changes back to the platform as admin-state commands.
//!
//! # Usage
//!
//! ```bash
//! # Start the daemon (foreground)
//! modsyncd start
//!
//! # Start the daemon (background/daemonized)
//! modsyncd start -d
//!
//! # Stop the daemon
//! modsyncd stop
//!
//! # Check daemon status
//! modsyncd status
//!
//! # Start with a custom platform fixture
//! MODSYNC_FIXTURE=/etc/modsync/platform.toml modsyncd start
//!
//! # Enable debug logging
//! RUST_LOG=modsyncd=debug modsyncd start
//! ```
//!
//! # Signal Handling
//!
//! - SIGTERM/SIGINT: Graceful stop; published state is removed on exit
//! - SIGHUP: Logged and ignored
//!
//! # Exit Codes
//!
//! - 0: graceful exit (including after non-fatal per-cycle errors)
//! - 2: platform facade could not be loaded
//! - 3: platform lacks the role-determining slot capability

use std::env;
use std::fs::{self, File};
use std::io::{Read, Write};
use std::path::PathBuf;
use std::process::{self, ExitCode};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use tokio_util::sync::CancellationToken;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use modsyncd::channel::change_channel;
use modsyncd::confighandler::ConfigEventHandler;
use modsyncd::lifecycle::{FatalError, LifecycleController, DEFAULT_WAIT_TIMEOUT};
use modsyncd::platform::{Platform, StaticPlatform};
use modsyncd::reconcile::Reconciler;
use modsyncd::store::MemTable;

/// Default location of the platform fixture file.
const DEFAULT_FIXTURE_PATH: &str = "/etc/modsync/platform.toml";

/// Config topic the coordinator subscribes to.
const MODULE_CONFIG_TOPIC: &str = "CONFIG:CHASSIS_MODULE";

/// Modsync daemon - chassis module state mirror
#[derive(Parser, Debug)]
#[command(name = "modsyncd", version, about)]
struct Args {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the daemon
    Start {
        /// Run as a background daemon (fork to background)
        #[arg(short = 'd', long)]
        daemon: bool,

        /// Platform fixture file (overrides MODSYNC_FIXTURE)
        #[arg(long)]
        fixture: Option<PathBuf>,

        /// Reconciliation period / wait timeout in seconds
        #[arg(long)]
        interval_secs: Option<u64>,
    },
    /// Stop the running daemon
    Stop,
    /// Show daemon status
    Status,
}

/// Returns the path to the PID file.
fn pid_file_path() -> PathBuf {
    let state_dir = dirs::state_dir()
        .unwrap_or_else(|| PathBuf::from("/tmp"))
        .join("modsync");
    state_dir.join("modsyncd.pid")
}

/// Returns the path to the log file.
fn log_file_path() -> PathBuf {
    let state_dir = dirs::state_dir()
        .unwrap_or_else(|| PathBuf::from("/tmp"))
        .join("modsync");
    state_dir.join("modsyncd.log")
}

/// Reads the PID from the PID file, if it exists.
fn read_pid() -> Option<u32> {
    let path = pid_file_path();
    let mut file = File::open(&path).ok()?;
    let mut contents = String::new();
    file.read_to_string(&mut contents).ok()?;
    contents.trim().parse().ok()
}

/// Writes the current PID to the PID file.
fn write_pid() -> Result<()> {
    let path = pid_file_path();
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).context("Failed to create state directory")?;
    }
    let mut file = File::create(&path).context("Failed to create PID file")?;
    write!(file, "{}", process::id()).context("Failed to write PID")?;
    Ok(())
}

/// Removes the PID file.
fn remove_pid_file() {
    let path = pid_file_path();
    let _ = fs::remove_file(path);
}

/// Checks if a process with the given PID is running.
fn is_process_running(pid: u32) -> bool {
    PathBuf::from(format!("/proc/{}", pid)).exists()
}

/// Checks if the daemon is already running.
fn is_daemon_running() -> Option<u32> {
    if let Some(pid) = read_pid() {
        if is_process_running(pid) {
            return Some(pid);
        }
        // Stale PID file - remove it
        remove_pid_file();
    }
    None
}

/// Sends SIGTERM to the daemon process.
fn stop_daemon(pid: u32) -> Result<()> {
    #[cfg(unix)]
    {
        let result = unsafe { libc::kill(pid as i32, libc::SIGTERM) };
        if result != 0 {
            bail!("Failed to send SIGTERM to process {}", pid);
        }
    }
    #[cfg(not(unix))]
    {
        bail!("Stop command is only supported on Unix systems");
    }
    Ok(())
}

fn main() -> ExitCode {
    let args = Args::parse();

    // Default to 'start' if no subcommand given
    let command = args.command.unwrap_or(Command::Start {
        daemon: false,
        fixture: None,
        interval_secs: None,
    });

    match command {
        Command::Start {
            daemon,
            fixture,
            interval_secs,
        } => {
            if let Some(pid) = is_daemon_running() {
                eprintln!("Daemon is already running (PID {})", pid);
                eprintln!("Use 'modsyncd stop' to stop it first.");
                return ExitCode::FAILURE;
            }

            if daemon {
                // Daemonize before starting the tokio runtime
                if let Err(e) = daemonize() {
                    eprintln!("Failed to daemonize: {e:#}");
                    return ExitCode::FAILURE;
                }
            }

            if let Err(e) = write_pid() {
                eprintln!("Failed to write PID file: {e:#}");
                return ExitCode::FAILURE;
            }

            let result = run_daemon(fixture, interval_secs);
            remove_pid_file();

            match result {
                Ok(()) => ExitCode::SUCCESS,
                Err(RunError::Fatal(fatal)) => {
                    eprintln!("{fatal}");
                    ExitCode::from(fatal.exit_code())
                }
                Err(RunError::Setup(e)) => {
                    eprintln!("{e:#}");
                    ExitCode::FAILURE
                }
            }
        }
        Command::Stop => match run_stop() {
            Ok(()) => ExitCode::SUCCESS,
            Err(e) => {
                eprintln!("{e:#}");
                ExitCode::FAILURE
            }
        },
        Command::Status => {
            if let Some(pid) = is_daemon_running() {
                println!("Daemon is running (PID {})", pid);
                ExitCode::SUCCESS
            } else {
                println!("Daemon is not running.");
                ExitCode::FAILURE
            }
        }
    }
}

/// Stops a running daemon and waits for it to exit.
fn run_stop() -> Result<()> {
    let Some(pid) = is_daemon_running() else {
        println!("Daemon is not running.");
        return Ok(());
    };

    println!("Stopping daemon (PID {})...", pid);
    stop_daemon(pid)?;

    // Wait for process to exit (up to 5 seconds)
    for _ in 0..50 {
        if !is_process_running(pid) {
            println!("Daemon stopped.");
            return Ok(());
        }
        std::thread::sleep(Duration::from_millis(100));
    }

    bail!("Daemon did not stop within 5 seconds");
}

/// Daemonizes the current process.
fn daemonize() -> Result<()> {
    use daemonize::Daemonize;

    let log_path = log_file_path();
    if let Some(parent) = log_path.parent() {
        fs::create_dir_all(parent).context("Failed to create log directory")?;
    }

    let stdout = File::create(&log_path).context("Failed to create log file for stdout")?;
    let stderr = File::create(&log_path).context("Failed to create log file for stderr")?;

    let daemonize = Daemonize::new()
        .working_directory("/")
        .stdout(stdout)
        .stderr(stderr);

    daemonize.start().context("Failed to daemonize")?;

    Ok(())
}

/// Errors from a daemon run, separated so fatal startup conditions map
/// to their distinct exit codes.
enum RunError {
    Fatal(FatalError),
    Setup(anyhow::Error),
}

impl From<anyhow::Error> for RunError {
    fn from(e: anyhow::Error) -> Self {
        Self::Setup(e)
    }
}

/// Runs the daemon (async entry point).
#[tokio::main]
async fn run_daemon(fixture: Option<PathBuf>, interval_secs: Option<u64>) -> Result<(), RunError> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env()
                .add_directive("modsyncd=info".parse().map_err(anyhow::Error::from)?)
                .add_directive("modsync_core=info".parse().map_err(anyhow::Error::from)?),
        )
        .init();

    info!(
        version = env!("CARGO_PKG_VERSION"),
        pid = process::id(),
        "Modsync daemon starting"
    );

    // Init → PlatformLoaded: acquire the platform facade. Fatal on failure.
    let fixture_path = fixture
        .or_else(|| env::var("MODSYNC_FIXTURE").ok().map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from(DEFAULT_FIXTURE_PATH));
    let platform: Arc<dyn Platform> = match StaticPlatform::from_path(&fixture_path) {
        Ok(platform) => Arc::new(platform),
        Err(e) => {
            error!(fixture = %fixture_path.display(), error = %e, "Platform load failed");
            return Err(RunError::Fatal(FatalError::PlatformLoad(e.to_string())));
        }
    };
    info!(fixture = %fixture_path.display(), "Platform loaded");

    let wait_timeout = interval_secs
        .map(Duration::from_secs)
        .unwrap_or(DEFAULT_WAIT_TIMEOUT);

    // Store tables. The in-memory store stands in for the shared store
    // client; the Table seam is where a real client plugs in.
    let chassis_table = Arc::new(MemTable::new());
    let module_table = Arc::new(MemTable::new());

    let reconciler = Reconciler::new(platform.clone(), chassis_table, module_table);
    let mut controller =
        LifecycleController::new(platform.clone(), reconciler).with_wait_timeout(wait_timeout);

    // Module config subscription for the coordinator worker. The
    // sender side belongs to the store subscription bridge and must
    // outlive the run, otherwise the channel reads as closed.
    let (_config_tx, config_channel) = change_channel(MODULE_CONFIG_TOPIC);
    controller.set_coordinator_channel(config_channel, ConfigEventHandler::new(platform.clone()));

    // Stop flag, set by signal delivery, observed at most one wait
    // timeout later.
    let cancel = CancellationToken::new();
    let shutdown_token = cancel.clone();
    tokio::spawn(async move {
        if let Err(e) = wait_for_shutdown_signal().await {
            error!(error = %e, "Error waiting for shutdown signal");
        }
        info!("Shutdown signal received");
        shutdown_token.cancel();
    });

    controller.run(cancel).await.map_err(RunError::Fatal)?;

    info!("Modsync daemon stopped");
    Ok(())
}

/// Waits for a graceful-stop signal (SIGTERM or SIGINT).
///
/// SIGHUP is logged and ignored.
async fn wait_for_shutdown_signal() -> Result<()> {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        let mut sigterm = signal(SignalKind::terminate())?;
        let mut sigint = signal(SignalKind::interrupt())?;
        let mut sighup = signal(SignalKind::hangup())?;

        loop {
            tokio::select! {
                _ = sigterm.recv() => {
                    info!("Received SIGTERM");
                    break;
                }
                _ = sigint.recv() => {
                    info!("Received SIGINT");
                    break;
                }
                _ = sighup.recv() => {
                    info!("Received SIGHUP; ignoring");
                }
            }
        }
    }

    #[cfg(not(unix))]
    {
        tokio::signal::ctrl_c().await?;
        info!("Received Ctrl+C");
    }

    Ok(())
}
