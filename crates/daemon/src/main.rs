// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Reel pipeline daemon (reeld)
//!
//! Background process that owns the queue root: polls the messaging
//! inbox, claims queued requests one at a time, and drives each through
//! the pipeline. Start it under a supervisor; stop it with SIGTERM.

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

use reel_adapters::{
    CliAgentDispatch, DesktopMessaging, DisabledVideoGeneration, LocalFileDelivery, NoopInbox,
    SystemResourceMonitor,
};
use reel_daemon::lifecycle::DaemonDeps;
use reel_daemon::{Daemon, LifecycleError, Settings};
use tokio::signal::unix::{signal, SignalKind};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    if let Some(arg) = std::env::args().nth(1) {
        match arg.as_str() {
            "--version" | "-V" | "-v" => {
                println!("reeld {}", env!("CARGO_PKG_VERSION"));
                return Ok(());
            }
            "--help" | "-h" | "help" => {
                println!("reeld {}", env!("CARGO_PKG_VERSION"));
                println!("Reel pipeline daemon - turns source videos into short vertical reels");
                println!();
                println!("USAGE:");
                println!("    reeld");
                println!();
                println!("Configuration is environment-driven (REEL_* variables); see the");
                println!("project documentation. Queue requests with the `reel` CLI.");
                println!();
                println!("OPTIONS:");
                println!("    -h, --help       Print help information");
                println!("    -v, --version    Print version information");
                return Ok(());
            }
            _ => {
                eprintln!("error: unexpected argument '{arg}'");
                eprintln!("Usage: reeld [--help | --version]");
                std::process::exit(2);
            }
        }
    }

    let settings = Settings::load()?;
    std::fs::create_dir_all(&settings.state_dir)?;

    let appender = tracing_appender::rolling::never(
        &settings.state_dir,
        settings
            .log_path()
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| "daemon.log".into()),
    );
    let (writer, _log_guard) = tracing_appender::non_blocking(appender);
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_new(&settings.log_filter)
                .unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(writer)
        .with_ansi(false)
        .init();

    if settings.messaging_token.is_some() {
        // The chat transport ships separately; surface events locally
        // until it is wired in.
        warn!("REEL_MESSAGING_TOKEN is set but no chat adapter is bundled; using desktop notifications");
    }
    if settings.generation_api_key.is_some() {
        warn!("REEL_GENERATION_API_KEY is set but no generation adapter is bundled; side clips disabled");
    }

    let dispatch = CliAgentDispatch::new(settings.agent_program.clone());
    let deps = DaemonDeps {
        dispatch,
        messaging: DesktopMessaging::new(),
        inbox: NoopInbox::new(),
        delivery: LocalFileDelivery::new(settings.state_dir.join("exports")),
        generation: DisabledVideoGeneration::new(),
        monitor: SystemResourceMonitor::new(),
    };

    let mut daemon = match Daemon::startup(settings, deps).await {
        Ok(daemon) => daemon,
        Err(LifecycleError::AlreadyRunning { path, pid }) => {
            eprintln!("reeld is already running");
            if !pid.is_empty() {
                eprintln!("  pid: {pid}");
            }
            eprintln!("  lock: {}", path.display());
            std::process::exit(1);
        }
        Err(err) => return Err(err.into()),
    };

    let shutdown = CancellationToken::new();
    {
        let shutdown = shutdown.clone();
        let mut sigterm = signal(SignalKind::terminate())?;
        let mut sigint = signal(SignalKind::interrupt())?;
        tokio::spawn(async move {
            tokio::select! {
                _ = sigterm.recv() => info!("SIGTERM received"),
                _ = sigint.recv() => info!("SIGINT received"),
            }
            shutdown.cancel();
        });
    }

    info!("reeld ready");
    daemon.run(shutdown).await?;
    Ok(())
}
