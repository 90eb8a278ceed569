//! Multi-engine `run-all` command: fan the suite out across every registered
//! engine, one isolated child process per engine.
//!
//! Several engines hold per-process resources (a local browser profile, an
//! HTTP client pool, a subprocess driver) that must start clean for every
//! engine regardless of what the adapter does internally; a process per
//! engine guarantees that. Each child gets its own wall-clock timeout, and a
//! timed-out or failing engine never disturbs its siblings.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::Args;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::Command;
use tokio::sync::Semaphore;
use tracing::{info, warn};

use scrapebench_common::artifacts;
use scrapebench_engines::EngineRegistry;

/// Exit code recorded for a timed-out engine process.
const TIMEOUT_EXIT_CODE: i32 = 124;

#[derive(Debug, Clone, Args)]
pub struct RunAllArgs {
    /// Dataset CSV (id,url,truth_text,lie_text).
    #[arg(long)]
    pub dataset: PathBuf,

    /// Suite to run.
    #[arg(long, default_value = "quality")]
    pub suite: String,

    /// Output base directory.
    #[arg(long, default_value = "runs")]
    pub output_dir: PathBuf,

    /// Number of engine processes running at once (0 = CPU count).
    #[arg(long, default_value_t = 0)]
    pub concurrency: usize,

    /// Per-engine wall-clock timeout in minutes.
    #[arg(long, default_value_t = 45)]
    pub timeout_minutes: u64,

    /// Forward --resume to every engine run.
    #[arg(long)]
    pub resume: bool,

    /// Pre-clean engine directories before running. Children are not passed
    /// --rerun: concurrent per-child deletes would race.
    #[arg(long)]
    pub rerun: bool,

    /// Forward --analysis-only to every engine run.
    #[arg(long)]
    pub analysis_only: bool,

    /// Forward --dry-run to every engine run.
    #[arg(long)]
    pub dry_run: bool,

    /// Per-engine fetch concurrency, forwarded when set.
    #[arg(long)]
    pub max_workers: Option<usize>,
}

pub async fn run_all(args: RunAllArgs) -> Result<()> {
    let registry = EngineRegistry::standard();
    let engines = registry.names();
    if engines.is_empty() {
        bail!("No engines registered");
    }

    std::fs::create_dir_all(&args.output_dir)
        .with_context(|| format!("Failed to create {}", args.output_dir.display()))?;

    if args.rerun {
        pre_clean(&args, &engines);
    }

    let concurrency = if args.concurrency == 0 {
        std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(4)
    } else {
        args.concurrency
    };
    let timeout = Duration::from_secs(args.timeout_minutes * 60);
    let current_exe =
        std::env::current_exe().context("Failed to resolve current executable")?;

    info!(
        engines = engines.len(),
        concurrency,
        timeout_minutes = args.timeout_minutes,
        "Fanning out engine processes"
    );

    let gate = Arc::new(Semaphore::new(concurrency));
    let mut handles = Vec::new();
    for engine in engines {
        let gate = gate.clone();
        let args = args.clone();
        let exe = current_exe.clone();
        handles.push(tokio::spawn(async move {
            let Ok(_permit) = gate.acquire_owned().await else {
                return;
            };
            match run_one_engine(&exe, engine, &args, timeout).await {
                Ok(0) => {}
                Ok(code) => warn!(engine, exit_code = code, "Engine exited non-zero"),
                Err(e) => warn!(engine, error = %e, "Engine process failed"),
            }
        }));
    }
    for handle in handles {
        // A panic inside one engine's task is already isolated; log and move on.
        if let Err(e) = handle.await {
            warn!(error = %e, "Engine task panicked");
        }
    }

    info!("All engines attempted");
    Ok(())
}

/// Delete every engine's output directory up front so children all start
/// from a clean slate without racing each other on deletes.
fn pre_clean(args: &RunAllArgs, engines: &[&str]) {
    for engine in engines {
        let dir = artifacts::engine_dir(&args.output_dir, engine, &args.suite);
        if dir.exists() {
            if let Err(e) = std::fs::remove_dir_all(&dir) {
                warn!(engine, error = %e, "Failed to pre-clean engine directory");
            }
        }
    }
}

/// Spawn one engine's suite run and wait for it under the timeout. Returns
/// the child's exit code, with `TIMEOUT_EXIT_CODE` standing in after a kill.
async fn run_one_engine(
    exe: &Path,
    engine: &str,
    args: &RunAllArgs,
    timeout: Duration,
) -> Result<i32> {
    let mut cmd = Command::new(exe);
    cmd.arg("run")
        .arg("--engine")
        .arg(engine)
        .arg("--suite")
        .arg(&args.suite)
        .arg("--output-dir")
        .arg(&args.output_dir)
        .arg("--dataset")
        .arg(&args.dataset)
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);
    if args.resume {
        cmd.arg("--resume");
    }
    if args.analysis_only {
        cmd.arg("--analysis-only");
    }
    if args.dry_run {
        cmd.arg("--dry-run");
    }
    if let Some(workers) = args.max_workers {
        cmd.arg("--max-workers").arg(workers.to_string());
    }

    let mut child = cmd
        .spawn()
        .with_context(|| format!("Failed to spawn engine process for {engine}"))?;

    // Re-emit child output under an engine prefix so interleaved runs stay
    // readable; draining also keeps the pipes from backpressuring the child.
    let stdout = child.stdout.take().expect("stdout piped");
    let stderr = child.stderr.take().expect("stderr piped");
    let drain_out = tokio::spawn(drain(stdout, engine.to_string()));
    let drain_err = tokio::spawn(drain(stderr, engine.to_string()));

    let code = match tokio::time::timeout(timeout, child.wait()).await {
        Ok(status) => {
            let status = status.with_context(|| format!("Failed to wait on {engine}"))?;
            status.code().unwrap_or(-1)
        }
        Err(_) => {
            warn!(
                engine,
                timeout_secs = timeout.as_secs(),
                "Engine timed out, killing process"
            );
            if let Err(e) = child.start_kill() {
                warn!(engine, error = %e, "Failed to kill timed-out engine");
            }
            let _ = child.wait().await;
            TIMEOUT_EXIT_CODE
        }
    };

    let _ = drain_out.await;
    let _ = drain_err.await;
    Ok(code)
}

async fn drain<R: AsyncRead + Unpin>(reader: R, engine: String) {
    let mut lines = BufReader::new(reader).lines();
    while let Ok(Some(line)) = lines.next_line().await {
        println!("[{engine}] {line}");
    }
}
