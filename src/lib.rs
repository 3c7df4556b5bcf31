// src/lib.rs

pub mod cli;
pub mod config;
pub mod dag;
pub mod engine;
pub mod errors;
pub mod logging;
pub mod server;
pub mod tasks;
pub mod transform;
pub mod types;
pub mod watch;

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::cli::{CliArgs, Command};
use crate::config::loader::load_and_validate;
use crate::config::model::ConfigFile;
use crate::dag::DagGraph;
use crate::engine::lifecycle::{Lifecycle, LifecyclePhase, run_build, run_task, start_dev_session};
use crate::engine::{CoreRuntime, Runtime, RuntimeEvent, RuntimeOptions};
use crate::errors::AssetflowError;
use crate::server::{ReloadHub, spawn_dev_server};
use crate::tasks::{RunContext, TaskRegistry};
use crate::transform::BuildSettings;
use crate::types::Mode;
use crate::watch::{WatchOptions, build_bindings_from_config, spawn_watcher};

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - config loading and mode selection
/// - the task registry
/// - the lifecycle for `build` / `dev`, or a single task for `run`
/// - for `dev`: dev server, file watcher, dispatch loop and Ctrl-C handling
pub async fn run(args: CliArgs) -> Result<()> {
    let config_path = PathBuf::from(&args.config);
    let cfg = load_and_validate(&config_path)?;
    let mode = Mode::from_env(&cfg.config.mode_var).map_err(AssetflowError::config)?;
    let registry = TaskRegistry::from_config(&cfg)?;

    if args.dry_run {
        print_dry_run(&cfg, &registry, mode);
        return Ok(());
    }

    let root = config_root_dir(&config_path);
    let settings = BuildSettings::new(root.clone(), &cfg.config.output, mode);
    info!(
        mode = %mode,
        root = %root.display(),
        output = %settings.output.display(),
        "assetflow starting"
    );

    match args.command() {
        Command::Build => {
            run_build(&registry, &RunContext::new(settings), &cfg.pipeline).await?;
        }
        Command::Run { task } => {
            run_task(&registry, &RunContext::new(settings), &task).await?;
        }
        Command::Dev => run_dev(&cfg, root, registry, settings).await?,
    }

    Ok(())
}

async fn run_dev(
    cfg: &ConfigFile,
    root: PathBuf,
    registry: TaskRegistry,
    settings: BuildSettings,
) -> Result<()> {
    let hub = ReloadHub::new();
    let ctx = RunContext::new(settings.clone()).with_reload(hub.clone());

    let mut lifecycle = Lifecycle::new();
    start_dev_session(&mut lifecycle, &registry, &ctx, &cfg.pipeline).await?;

    let server = spawn_dev_server(&cfg.server, &settings.output, hub).await?;

    // Runtime event channel.
    let (rt_tx, rt_rx) = mpsc::channel::<RuntimeEvent>(64);

    let bindings = build_bindings_from_config(cfg)?;
    let _watcher_handle = spawn_watcher(
        root,
        bindings.clone(),
        WatchOptions {
            debounce: Duration::from_millis(cfg.config.debounce_ms),
            output_dir: cfg.config.output.trim_start_matches("./").to_string(),
            use_hash: cfg.config.use_hash,
        },
        rt_tx.clone(),
    )?;

    // Ctrl-C → graceful shutdown.
    {
        let tx = rt_tx.clone();
        tokio::spawn(async move {
            if let Err(e) = tokio::signal::ctrl_c().await {
                eprintln!("failed to listen for Ctrl+C: {e}");
                return;
            }
            let _ = tx.send(RuntimeEvent::ShutdownRequested).await;
        });
    }

    let core = CoreRuntime::new(
        bindings,
        cfg.config.triggered_while_running_behaviour,
        RuntimeOptions::default(),
    );
    Runtime::new(core, rt_rx, rt_tx, Arc::new(registry), ctx)
        .run()
        .await?;

    server.task.abort();
    lifecycle.advance(LifecyclePhase::Done)?;
    Ok(())
}

/// Project root: the config file's directory, or the current working
/// directory for a bare file name.
fn config_root_dir(config_path: &Path) -> PathBuf {
    match config_path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
    }
}

/// Print the pipeline, every task and its watch globs without running.
fn print_dry_run(cfg: &ConfigFile, registry: &TaskRegistry, mode: Mode) {
    println!("assetflow dry-run");
    println!("  mode = {mode} (from {})", cfg.config.mode_var);
    println!("  output = {}", cfg.config.output);
    println!(
        "  pipeline = {} -> {}",
        cfg.pipeline.clean, cfg.pipeline.build
    );
    println!(
        "  config.triggered_while_running_behaviour = {:?}",
        cfg.config.triggered_while_running_behaviour
    );
    println!();

    let graph = DagGraph::from_config(cfg);
    println!("tasks ({}):", cfg.task.len());
    for name in graph.members_first_order() {
        let Some(task) = cfg.task.get(&name) else {
            continue;
        };
        println!("  - {name}");
        if let Some(desc) = &task.description {
            println!("      description: {desc}");
        }
        if let Some(plan) = registry.describe(&name) {
            println!("      run: {plan}");
        }
        if !task.watch.is_empty() {
            println!("      watch: {:?}", task.watch);
        }
        if !task.exclude.is_empty() {
            println!("      exclude: {:?}", task.exclude);
        }
        let parents = graph.parents_of(&name);
        if !parents.is_empty() {
            println!("      used by: {parents:?}");
        }
        let reload = registry.reload_kind(&name);
        if reload != crate::types::ReloadKind::None {
            println!("      reload: {reload:?}");
        }
    }

    println!();
    println!("build order under '{}':", cfg.pipeline.build);
    for leaf in graph.leaves_under(&cfg.pipeline.build) {
        println!("  - {leaf}");
    }

    debug!("dry-run complete (no execution)");
}
