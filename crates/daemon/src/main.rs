// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Hazard coordination daemon (hzd)
//!
//! Background process that owns the shared registries of one node and
//! serves routed requests for them.
//!
//! Architecture:
//! - Listener Task: Spawned task handling socket I/O, dispatches through the router
//! - Main Loop: heartbeat notices, checkpoints and signals, handled sequentially

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

use std::path::Path;
use std::time::Duration;

use hz_core::SystemClock;
use hz_daemon::{lifecycle, Config, LifecycleError, Listener, StartupResult};
use hz_engine::Timer;
use tokio::signal::unix::{signal, SignalKind};
use tokio::sync::mpsc;
use tracing::{error, info, warn};

const VERSION: &str = env!("CARGO_PKG_VERSION");

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Handle info flags before any config/lock acquisition
    if let Some(arg) = std::env::args().nth(1) {
        match arg.as_str() {
            "--version" | "-V" | "-v" => {
                println!("hzd {VERSION}");
                return Ok(());
            }
            "--help" | "-h" | "help" => {
                println!("hzd {VERSION}");
                println!(
                    "Hazard coordination daemon - serves event storage, locks and recommenders"
                );
                println!();
                println!("USAGE:");
                println!("    hzd");
                println!();
                println!("State lives in $HZ_STATE_DIR (default ~/.local/state/hz); tunables");
                println!("are read from hz.toml there. Requests arrive on daemon.sock.");
                println!();
                println!("OPTIONS:");
                println!("    -h, --help       Print help information");
                println!("    -v, --version    Print version information");
                return Ok(());
            }
            _ => {
                eprintln!("error: unexpected argument '{arg}'");
                eprintln!("Usage: hzd [--help | --version]");
                std::process::exit(1);
            }
        }
    }

    let config = Config::load()?;

    // Write startup marker to log (before tracing setup)
    rotate_log_if_needed(&config.log_path);
    write_startup_marker(&config)?;

    let log_guard = setup_logging(&config)?;

    info!("Starting daemon");

    let StartupResult {
        mut daemon,
        listener: unix_listener,
    } = match lifecycle::startup(&config).await {
        Ok(r) => r,
        Err(LifecycleError::LockFailed(_)) => {
            // Another daemon holds the lock; report its pid
            let pid = std::fs::read_to_string(&config.lock_path)
                .unwrap_or_default()
                .trim()
                .to_string();
            eprintln!("hzd is already running");
            if !pid.is_empty() {
                eprintln!("  pid: {pid}");
            }
            std::process::exit(1);
        }
        Err(e) => {
            // Write error synchronously (tracing is non-blocking and may not flush in time)
            write_startup_error(&config, &e);
            error!("Failed to start daemon: {}", e);
            drop(log_guard);
            return Err(e.into());
        }
    };

    // Spawn listener task
    let listener = Listener::new(unix_listener, daemon.services.router.clone());
    tokio::spawn(listener.run());

    // Heartbeat notices are dispatched from this loop, never from the timer task
    let (notice_tx, mut notices) = mpsc::channel(16);
    let heartbeat = Timer::start(
        config.settings.heartbeat(),
        true,
        SystemClock,
        notice_tx,
    );

    // Set up signal handlers
    let mut sigterm = signal(SignalKind::terminate())?;
    let mut sigint = signal(SignalKind::interrupt())?;

    info!(
        "Daemon ready, listening on {}",
        config.socket_path.display()
    );

    // Signal ready for parent process (e.g., systemd)
    println!("READY");

    // NOTE: Must be created outside the loop - tokio::select! re-evaluates
    // branches on each iteration, so using sleep() inside would reset on
    // every notice.
    let mut checkpoint = tokio::time::interval(CHECKPOINT_INTERVAL);
    checkpoint.tick().await;

    loop {
        tokio::select! {
            notice = notices.recv() => {
                match notice {
                    Some(notice) => {
                        if notice.drift() > config.settings.heartbeat() {
                            warn!(
                                seq = notice.seq,
                                drift = ?notice.drift(),
                                "heartbeat running late"
                            );
                        }
                        daemon.services.tick(&notice);
                    }
                    None => {
                        warn!("heartbeat timer stopped");
                        break;
                    }
                }
            }

            _ = checkpoint.tick() => {
                if let Err(e) = daemon.save_snapshot() {
                    warn!(error = %e, "failed to save checkpoint snapshot");
                }
            }

            // Graceful shutdown on SIGTERM
            _ = sigterm.recv() => {
                info!("Received SIGTERM, shutting down...");
                break;
            }

            // Graceful shutdown on SIGINT
            _ = sigint.recv() => {
                info!("Received SIGINT, shutting down...");
                break;
            }
        }
    }

    heartbeat.stop();
    daemon.shutdown().await?;
    info!(uptime = ?daemon.start_time.elapsed(), "Daemon stopped");
    Ok(())
}

/// Checkpoint interval (60 seconds)
const CHECKPOINT_INTERVAL: Duration = Duration::from_secs(60);

/// Rotate once the log passes this size
const MAX_LOG_SIZE: u64 = 10 * 1024 * 1024;

/// Rotated logs kept (`daemon.log.1` is the newest)
const MAX_ROTATIONS: u32 = 3;

/// Shift `daemon.log` to `daemon.log.1` (and older rotations up by one)
/// when it has grown past [`MAX_LOG_SIZE`]
fn rotate_log_if_needed(log_path: &Path) {
    let Ok(meta) = std::fs::metadata(log_path) else {
        return;
    };
    if meta.len() <= MAX_LOG_SIZE {
        return;
    }

    let rotation = |n: u32| {
        let mut name = log_path.as_os_str().to_owned();
        name.push(format!(".{n}"));
        std::path::PathBuf::from(name)
    };
    let _ = std::fs::remove_file(rotation(MAX_ROTATIONS));
    for n in (1..MAX_ROTATIONS).rev() {
        let from = rotation(n);
        if from.exists() {
            let _ = std::fs::rename(&from, rotation(n + 1));
        }
    }
    let _ = std::fs::rename(log_path, rotation(1));
}

/// Startup marker prefix written to log before anything else.
/// Full format: "--- hzd: starting (pid: 12345) ---"
pub const STARTUP_MARKER_PREFIX: &str = "--- hzd: starting (pid: ";

/// Write startup marker to log file (appends to existing log)
fn write_startup_marker(config: &Config) -> Result<(), LifecycleError> {
    use std::io::Write;

    if let Some(parent) = config.log_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let mut file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&config.log_path)?;
    writeln!(file, "{}{}) ---", STARTUP_MARKER_PREFIX, std::process::id())?;

    Ok(())
}

/// Write startup error synchronously to log file.
fn write_startup_error(config: &Config, error: &LifecycleError) {
    use std::io::Write;

    let Ok(mut file) = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&config.log_path)
    else {
        return;
    };
    let _ = writeln!(file, "ERROR Failed to start daemon: {}", error);
}

fn setup_logging(
    config: &Config,
) -> Result<tracing_appender::non_blocking::WorkerGuard, LifecycleError> {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    if let Some(parent) = config.log_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let file_appender = tracing_appender::rolling::never(
        config.log_path.parent().ok_or(LifecycleError::NoStateDir)?,
        config
            .log_path
            .file_name()
            .ok_or(LifecycleError::NoStateDir)?,
    );
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(non_blocking))
        .init();

    Ok(guard)
}

#[cfg(test)]
#[path = "main_tests.rs"]
mod tests;
