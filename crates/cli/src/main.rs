// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! reel: foreground CLI for the reel pipeline.
//!
//! `reel run <url>` drives one request through the full pipeline in the
//! current process, printing user-facing progress to stdout. Exit codes:
//! 0 success, 2 invalid arguments, 64 unrecoverable run failure, 130
//! interrupted.

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

mod args;

use anyhow::Context;
use args::{Cli, Command, RunArgs};
use clap::Parser;
use reel_adapters::{
    CliAgentDispatch, ConsoleMessaging, DisabledVideoGeneration, KnowledgeBase, LocalFileDelivery,
    YamlKnowledgeBase,
};
use reel_core::{Clock, QueueItem, Request, RunId, SystemClock};
use reel_daemon::Settings;
use reel_engine::{
    GateConfig, PipelineConfig, PipelineDeps, PipelineRunner, QaConfig, RunOutcome, SideGenConfig,
};
use reel_storage::{CheckpointStore, WorkspaceManager};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

const EXIT_OK: i32 = 0;
const EXIT_USAGE: i32 = 2;
const EXIT_RUN_FAILED: i32 = 64;
const EXIT_INTERRUPTED: i32 = 130;

fn main() {
    let cli = Cli::parse();
    let code = match cli.command {
        Command::Run(run) => run_command(run),
    };
    std::process::exit(code);
}

fn run_command(args: RunArgs) -> i32 {
    if let Err(err) = args.validate() {
        eprintln!("error: {}", err.message);
        eprintln!("hint: {}", err.hint);
        return EXIT_USAGE;
    }

    let runtime = match tokio::runtime::Runtime::new() {
        Ok(runtime) => runtime,
        Err(err) => {
            eprintln!("error: failed to start runtime: {err}");
            return EXIT_RUN_FAILED;
        }
    };
    match runtime.block_on(run_pipeline(args)) {
        Ok(code) => code,
        Err(err) => {
            eprintln!("error: {err:#}");
            EXIT_RUN_FAILED
        }
    }
}

async fn run_pipeline(args: RunArgs) -> anyhow::Result<i32> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_env("REEL_LOG")
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let settings = Settings::load().context("loading settings")?;

    // A resume path points at an existing workspace; the run id is its
    // directory name and the runs root its parent.
    let (workspace_root, run_id) = match &args.resume {
        Some(resume) => {
            let name = resume
                .file_name()
                .map(|n| n.to_string_lossy().to_string())
                .context("resume path has no directory name")?;
            let parent = resume
                .parent()
                .map(Path::to_path_buf)
                .context("resume path has no parent directory")?;
            (parent, RunId::new(name))
        }
        None => {
            let clock = SystemClock;
            (settings.workspace_root.clone(), RunId::generate(clock.now_utc()))
        }
    };

    let mut request = Request::new(args.url.clone(), args.message.clone());
    request.directives.target_duration_s = args.target_duration;
    request.directives.segment_count = args.moments;
    request.directives.resume_path = args.resume.clone();
    request.directives.start_stage = args.start_stage;
    for (key, value) in YamlKnowledgeBase::new(&settings.knowledge_base)
        .entries()
        .unwrap_or_default()
    {
        request.directives.advisory.insert(key, value);
    }
    if settings.clip_crop_px > 0 {
        request
            .directives
            .advisory
            .insert("clip_crop_px".to_string(), settings.clip_crop_px.to_string());
    }

    let agent_timeout = args
        .timeout
        .map(Duration::from_secs)
        .unwrap_or(settings.agent_timeout);
    let config = PipelineConfig {
        docs_root: settings.docs_root.clone(),
        agent_timeout,
        qa: QaConfig {
            agent_timeout,
            ..QaConfig::default()
        },
        sidegen: SideGenConfig {
            max_clips: settings.clip_count,
            ..SideGenConfig::default()
        },
        gate: GateConfig {
            timeout: settings.generation_timeout,
            ..GateConfig::default()
        },
    };

    let store = Arc::new(CheckpointStore::new(&workspace_root));
    let runner = PipelineRunner::new(
        PipelineDeps {
            dispatch: CliAgentDispatch::new(settings.agent_program.clone()),
            messaging: ConsoleMessaging::new(),
            delivery: LocalFileDelivery::new(settings.state_dir.join("exports")),
            generation: DisabledVideoGeneration::new(),
        },
        store,
        WorkspaceManager::new(&workspace_root),
        config,
    );

    let item = QueueItem::new(run_id.clone(), SystemClock.now_utc(), request);
    println!("Starting run {run_id}");

    let cancel = CancellationToken::new();
    {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                eprintln!("interrupt received, finishing the current stage...");
                cancel.cancel();
            }
        });
    }

    match runner.run_until(&item, &cancel).await {
        Ok(RunOutcome::Completed) => Ok(EXIT_OK),
        Ok(RunOutcome::Interrupted) => {
            eprintln!("interrupted; resume later with --resume {}", workspace_root.join(run_id.as_str()).display());
            Ok(EXIT_INTERRUPTED)
        }
        Err(err) => {
            eprintln!("run failed: {err}");
            Ok(EXIT_RUN_FAILED)
        }
    }
}
