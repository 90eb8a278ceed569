//! Suite orchestration: the resumable fetch → analyze → summarize pipeline
//! for one engine.

use std::path::PathBuf;

use anyhow::{bail, Result};
use tracing::info;
use uuid::Uuid;

use scrapebench_common::{artifacts, dataset, ScrapeOutput, Task, TaskResult};
use scrapebench_engines::EngineAdapter;

use crate::{analyzer, dispatcher};

const SUITE_KEY: &str = "quality";

/// Number of tasks a dry run keeps.
const DRY_RUN_TASK_LIMIT: usize = 5;

/// Drives one engine through the content-quality benchmark.
///
/// Phases run in order (load, fetch, analyze, summarize) and every phase is
/// idempotent: state lives in per-task artifacts, so a crashed or killed run
/// picks up where it left off under `resume`.
pub struct QualitySuite {
    adapter: EngineAdapter,
    output_dir: PathBuf,
    dataset_csv: PathBuf,
    dry_run: bool,
    max_workers: usize,
    lie_weight: f64,
}

impl QualitySuite {
    pub fn new(
        adapter: EngineAdapter,
        output_dir: PathBuf,
        dataset_csv: PathBuf,
        dry_run: bool,
        max_workers: usize,
        lie_weight: f64,
    ) -> Self {
        Self {
            adapter,
            output_dir,
            dataset_csv,
            dry_run,
            max_workers,
            lie_weight,
        }
    }

    pub fn load_tasks(&self) -> Result<Vec<Task>> {
        let limit = self.dry_run.then_some(DRY_RUN_TASK_LIMIT);
        dataset::load_tasks(&self.dataset_csv, limit)
    }

    /// Run the pipeline. `resume` skips any task whose scrape artifact
    /// already exists; `analysis_only` skips the fetch phase entirely and
    /// requires every artifact to be present.
    pub async fn run(&self, resume: bool, analysis_only: bool) -> Result<Vec<TaskResult>> {
        let engine = self.adapter.name().to_string();
        let tasks = self.load_tasks()?;
        let run_id = Uuid::new_v4().to_string();

        if !analysis_only {
            self.fetch_phase(&engine, &tasks, &run_id, resume).await?;
        }

        let results = self.analyze_phase(&engine, &tasks, &run_id, analysis_only)?;

        let analyzer_results: Vec<_> =
            results.iter().map(|r| r.analyzer_result.clone()).collect();
        let summary = analyzer::summarize(&analyzer_results);
        artifacts::write_json(
            &artifacts::summary_path(&self.output_dir, &engine, SUITE_KEY),
            &summary,
        )?;
        info!(
            phase = "summary",
            suite = SUITE_KEY,
            engine = engine.as_str(),
            run_id = run_id.as_str(),
            tasks = tasks.len(),
            analyzed = results.len(),
            success_rate = summary.success_rate,
            avg_f1 = summary.avg_f1,
            "Suite complete"
        );

        Ok(results)
    }

    /// Fetch every task that does not already have a scrape artifact,
    /// persisting each result the moment it completes.
    async fn fetch_phase(
        &self,
        engine: &str,
        tasks: &[Task],
        run_id: &str,
        resume: bool,
    ) -> Result<()> {
        let mut to_fetch = Vec::new();
        for task in tasks {
            let dir = artifacts::task_dir(&self.output_dir, engine, SUITE_KEY, &task.id);
            artifacts::write_json(&dir.join(artifacts::TASK_FILE), task)?;
            if resume && dir.join(artifacts::SCRAPE_OUTPUT_FILE).exists() {
                continue;
            }
            info!(
                phase = "scrape_start",
                suite = SUITE_KEY,
                engine,
                run_id,
                task_id = task.id.as_str(),
                url = task.url.as_str(),
                "Scraping task"
            );
            to_fetch.push(task.clone());
        }

        if to_fetch.is_empty() {
            return Ok(());
        }

        dispatcher::dispatch(
            &self.adapter,
            to_fetch,
            run_id,
            self.max_workers,
            |task, output| {
                let path = artifacts::task_dir(&self.output_dir, engine, SUITE_KEY, &task.id)
                    .join(artifacts::SCRAPE_OUTPUT_FILE);
                artifacts::write_json(&path, output)?;
                info!(
                    phase = "scrape_done",
                    suite = SUITE_KEY,
                    engine,
                    run_id,
                    task_id = task.id.as_str(),
                    url = task.url.as_str(),
                    status_code = output.status_code,
                    content_size = output.content_size,
                    error = output.error.as_deref(),
                    saved = %path.display(),
                    "Scrape complete"
                );
                Ok(())
            },
        )
        .await;

        Ok(())
    }

    /// Score persisted scrape outputs in dataset order, so summaries are
    /// deterministic no matter how fetch completion interleaved.
    fn analyze_phase(
        &self,
        engine: &str,
        tasks: &[Task],
        run_id: &str,
        analysis_only: bool,
    ) -> Result<Vec<TaskResult>> {
        let mut results = Vec::new();
        for task in tasks {
            let dir = artifacts::task_dir(&self.output_dir, engine, SUITE_KEY, &task.id);
            let scrape_path = dir.join(artifacts::SCRAPE_OUTPUT_FILE);
            if !scrape_path.exists() {
                if analysis_only {
                    bail!(
                        "Missing scrape output for task {}. Run without --analysis-only or use --resume.",
                        task.id
                    );
                }
                // Not fetched this run (failed upstream of persistence);
                // nothing to score.
                continue;
            }
            let output: ScrapeOutput = artifacts::read_json(&scrape_path)?;
            let analysis = analyzer::analyze_one(task, &output, self.lie_weight);
            artifacts::write_json(&dir.join(artifacts::GRADER_OUTPUT_FILE), &analysis)?;
            info!(
                phase = "analyze_done",
                suite = SUITE_KEY,
                engine,
                run_id,
                task_id = task.id.as_str(),
                url = task.url.as_str(),
                success = analysis.success,
                recall = analysis.recall,
                precision = analysis.precision,
                f1 = analysis.f1,
                "Task analyzed"
            );
            results.push(TaskResult {
                task: task.clone(),
                scrape_output: output,
                analyzer_result: analysis,
            });
        }
        Ok(results)
    }
}
