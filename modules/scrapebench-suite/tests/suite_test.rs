//! End-to-end tests for the quality suite pipeline: artifact layout, resume,
//! analysis-only, dry-run truncation.

use std::fs;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use scrapebench_common::{artifacts, AnalyzerResult, ContentFormat, ScrapeOutput, Summary};
use scrapebench_engines::{EngineAdapter, SuspendingFetcher};
use scrapebench_suite::QualitySuite;

/// Canned engine: every URL yields a page embedding the quick-brown-fox
/// snippet, and the fetch count is observable for resume assertions.
struct CannedFetcher {
    calls: AtomicUsize,
}

#[async_trait]
impl SuspendingFetcher for CannedFetcher {
    async fn fetch(&self, url: &str, _run_id: &str) -> ScrapeOutput {
        self.calls.fetch_add(1, Ordering::SeqCst);
        ScrapeOutput::completed(
            "canned",
            url,
            Some(200),
            None,
            ContentFormat::Html,
            Some("<p>the quick brown fox jumps</p>".to_string()),
        )
    }

    fn name(&self) -> &str {
        "canned"
    }
}

fn write_dataset(dir: &Path, rows: &[(&str, &str)]) -> std::path::PathBuf {
    let mut csv = String::from("id,url,truth_text,lie_text\n");
    for (id, truth) in rows {
        csv.push_str(&format!("{id},http://example.com/{id},{truth},\n"));
    }
    let path = dir.join("dataset.csv");
    fs::write(&path, csv).expect("write dataset");
    path
}

fn canned_suite(out: &Path, dataset: &Path, dry_run: bool) -> (QualitySuite, Arc<CannedFetcher>) {
    let fetcher = Arc::new(CannedFetcher {
        calls: AtomicUsize::new(0),
    });
    let suite = QualitySuite::new(
        EngineAdapter::Suspending(fetcher.clone()),
        out.to_path_buf(),
        dataset.to_path_buf(),
        dry_run,
        4,
        4.0,
    );
    (suite, fetcher)
}

#[tokio::test]
async fn full_run_persists_artifacts_and_summary() {
    let dir = tempfile::tempdir().unwrap();
    let dataset = write_dataset(dir.path(), &[("t1", "quick brown fox"), ("t2", "nothing here")]);
    let (suite, _) = canned_suite(dir.path(), &dataset, false);

    let results = suite.run(false, false).await.unwrap();
    assert_eq!(results.len(), 2);

    let t1 = artifacts::task_dir(dir.path(), "canned", "quality", "t1");
    assert!(t1.join("task.json").exists());
    assert!(t1.join("scrape_output.json").exists());
    assert!(t1.join("grader_output.json").exists());

    let graded: AnalyzerResult = artifacts::read_json(&t1.join("grader_output.json")).unwrap();
    assert!(graded.success);
    assert_eq!(graded.f1, 1.0);

    let summary: Summary =
        artifacts::read_json(&artifacts::summary_path(dir.path(), "canned", "quality")).unwrap();
    assert_eq!(summary.success_rate, 1.0);
    assert_eq!(summary.avg_recall, 0.5); // t2's truth never appears
}

#[tokio::test]
async fn resume_never_refetches_persisted_tasks() {
    let dir = tempfile::tempdir().unwrap();
    let dataset = write_dataset(dir.path(), &[("t1", "quick brown fox"), ("t2", "quick brown fox")]);

    let (suite, fetcher) = canned_suite(dir.path(), &dataset, false);
    suite.run(false, false).await.unwrap();
    assert_eq!(fetcher.calls.load(Ordering::SeqCst), 2);

    // Drop one artifact to simulate an interrupted run.
    let t2 = artifacts::task_dir(dir.path(), "canned", "quality", "t2");
    fs::remove_file(t2.join("scrape_output.json")).unwrap();

    let (suite, fetcher) = canned_suite(dir.path(), &dataset, false);
    suite.run(true, false).await.unwrap();
    // Only the missing task was fetched again.
    assert_eq!(fetcher.calls.load(Ordering::SeqCst), 1);
    assert!(t2.join("scrape_output.json").exists());
}

#[tokio::test]
async fn analysis_only_is_idempotent_byte_for_byte() {
    let dir = tempfile::tempdir().unwrap();
    let dataset = write_dataset(dir.path(), &[("t1", "quick brown fox")]);

    let (suite, _) = canned_suite(dir.path(), &dataset, false);
    suite.run(false, false).await.unwrap();

    let grader = artifacts::task_dir(dir.path(), "canned", "quality", "t1").join("grader_output.json");
    let first = fs::read(&grader).unwrap();

    let (suite, fetcher) = canned_suite(dir.path(), &dataset, false);
    suite.run(true, true).await.unwrap();
    assert_eq!(fetcher.calls.load(Ordering::SeqCst), 0);
    assert_eq!(fs::read(&grader).unwrap(), first);
}

#[tokio::test]
async fn analysis_only_with_missing_artifact_is_fatal() {
    let dir = tempfile::tempdir().unwrap();
    let dataset = write_dataset(dir.path(), &[("t1", "quick brown fox")]);
    let (suite, _) = canned_suite(dir.path(), &dataset, false);

    let err = suite.run(true, true).await.unwrap_err();
    assert!(err.to_string().contains("Missing scrape output"));
}

#[tokio::test]
async fn dry_run_truncates_the_dataset() {
    let dir = tempfile::tempdir().unwrap();
    let rows: Vec<(String, &str)> = (0..8).map(|i| (format!("t{i}"), "x")).collect();
    let rows_ref: Vec<(&str, &str)> = rows.iter().map(|(id, t)| (id.as_str(), *t)).collect();
    let dataset = write_dataset(dir.path(), &rows_ref);

    let (suite, fetcher) = canned_suite(dir.path(), &dataset, true);
    let results = suite.run(false, false).await.unwrap();
    assert_eq!(results.len(), 5);
    assert_eq!(fetcher.calls.load(Ordering::SeqCst), 5);
}

#[tokio::test]
async fn empty_dataset_summarizes_to_zero_metrics() {
    let dir = tempfile::tempdir().unwrap();
    let dataset = write_dataset(dir.path(), &[]);
    let (suite, _) = canned_suite(dir.path(), &dataset, false);

    let results = suite.run(false, false).await.unwrap();
    assert!(results.is_empty());

    let summary: Summary =
        artifacts::read_json(&artifacts::summary_path(dir.path(), "canned", "quality")).unwrap();
    assert_eq!(summary, Summary::default());
}
