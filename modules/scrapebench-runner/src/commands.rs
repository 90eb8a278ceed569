//! Single-engine `run` command: output-directory policy, engine lookup, and
//! one suite execution.

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::Args;
use tracing::info;

use scrapebench_common::{artifacts, EngineConfig};
use scrapebench_engines::EngineRegistry;
use scrapebench_suite::QualitySuite;

#[derive(Debug, Args)]
pub struct RunArgs {
    /// Engine to benchmark (see `run-all` for the full roster).
    #[arg(long)]
    pub engine: String,

    /// Suite to run.
    #[arg(long, default_value = "quality")]
    pub suite: String,

    /// Output directory for artifacts and the summary.
    #[arg(long)]
    pub output_dir: PathBuf,

    /// Dataset CSV (id,url,truth_text,lie_text).
    #[arg(long)]
    pub dataset: PathBuf,

    /// Weight for the reserved lie-text penalty.
    #[arg(long, default_value_t = 4.0)]
    pub lie_weight: f64,

    /// Resume: skip tasks whose scrape output already exists.
    #[arg(long)]
    pub resume: bool,

    /// Recreate the output directory (deletes existing artifacts).
    #[arg(long)]
    pub rerun: bool,

    /// Only analyze existing scrape outputs; never fetch.
    #[arg(long)]
    pub analysis_only: bool,

    /// Fetch concurrency limit.
    #[arg(long, default_value_t = 10)]
    pub max_workers: usize,

    /// Run a handful of tasks against a temporary directory, then clean up.
    #[arg(long)]
    pub dry_run: bool,
}

pub async fn run(args: RunArgs) -> Result<()> {
    if args.suite != "quality" {
        bail!("Unsupported suite: {}", args.suite);
    }

    // Dry runs work in a temp dir that is removed when the guard drops.
    let temp_dir = if args.dry_run {
        let dir = tempfile::Builder::new()
            .prefix("scrapebench_dry_run_")
            .tempdir()
            .context("Failed to create dry-run directory")?;
        info!(dir = %dir.path().display(), "Dry run using temporary directory");
        Some(dir)
    } else {
        None
    };
    let base: PathBuf = temp_dir
        .as_ref()
        .map(|d| d.path().to_path_buf())
        .unwrap_or_else(|| args.output_dir.clone());

    let engine_out = artifacts::engine_dir(&base, &args.engine, &args.suite);
    if args.analysis_only {
        // Analysis-only must never mutate scrape outputs; it needs an
        // existing run directory to read from.
        let has_artifacts = engine_out.exists()
            && engine_out
                .read_dir()
                .with_context(|| format!("Failed to read {}", engine_out.display()))?
                .next()
                .is_some();
        if !has_artifacts {
            bail!(
                "Output directory for {}_{} is empty or missing at {}. \
                 Provide an existing run directory or drop --analysis-only.",
                args.engine,
                args.suite,
                engine_out.display()
            );
        }
    } else {
        artifacts::ensure_output_dir(&engine_out, args.rerun, args.resume)?;
    }

    let engine_config = EngineConfig::from_env();
    engine_config.log_redacted();
    let adapter = EngineRegistry::standard().build(&args.engine, &engine_config)?;

    let suite = QualitySuite::new(
        adapter,
        base,
        args.dataset.clone(),
        args.dry_run,
        args.max_workers,
        args.lie_weight,
    );

    // Analysis-only implies resume semantics: existing artifacts are input,
    // not a conflict.
    let effective_resume = args.resume || args.analysis_only;
    suite.run(effective_resume, args.analysis_only).await?;

    if let Some(dir) = temp_dir {
        info!(dir = %dir.path().display(), "Dry run complete, cleaning temporary directory");
    }
    Ok(())
}
