//! Task dispatch: run one engine over a batch of tasks under a concurrency
//! cap, delivering results in completion order.

use futures::stream::{self, StreamExt};
use tracing::warn;

use scrapebench_common::{ScrapeOutput, Task};
use scrapebench_engines::EngineAdapter;

/// Fetch every task with the given adapter and stream each completed result
/// to `on_result` as soon as it finishes.
///
/// Suspending adapters fan out with at most `max_workers` fetches in flight;
/// results arrive in completion order, not submission order, so persistence
/// and progress reporting never wait for the slowest task. Blocking adapters
/// run strictly sequentially on a blocking-capable thread.
///
/// A failure inside `on_result` is logged and swallowed: one bad write must
/// not lose the remaining in-flight results.
pub async fn dispatch<F>(
    adapter: &EngineAdapter,
    tasks: Vec<Task>,
    run_id: &str,
    max_workers: usize,
    mut on_result: F,
) -> Vec<(Task, ScrapeOutput)>
where
    F: FnMut(&Task, &ScrapeOutput) -> anyhow::Result<()> + Send,
{
    let mut results = Vec::with_capacity(tasks.len());

    match adapter {
        EngineAdapter::Suspending(fetcher) => {
            let mut completed = stream::iter(tasks.into_iter().map(|task| {
                let fetcher = fetcher.clone();
                let run_id = run_id.to_string();
                async move {
                    let output = fetcher.fetch(&task.url, &run_id).await;
                    (task, output)
                }
            }))
            .buffer_unordered(max_workers.max(1));

            while let Some((task, output)) = completed.next().await {
                deliver(&mut on_result, &task, &output);
                results.push((task, output));
            }
        }
        EngineAdapter::Blocking(fetcher) => {
            // No slot contention is possible without native threads; one
            // fetch at a time, in submission order.
            for task in tasks {
                let fetcher = fetcher.clone();
                let url = task.url.clone();
                let run_id = run_id.to_string();
                match tokio::task::spawn_blocking(move || fetcher.fetch(&url, &run_id)).await {
                    Ok(output) => {
                        deliver(&mut on_result, &task, &output);
                        results.push((task, output));
                    }
                    Err(e) => {
                        // A panicking adapter fails its own task only; the
                        // absent result stays recoverable via resume.
                        warn!(task_id = task.id.as_str(), error = %e, "Blocking fetch panicked");
                    }
                }
            }
        }
    }

    results
}

fn deliver<F>(on_result: &mut F, task: &Task, output: &ScrapeOutput)
where
    F: FnMut(&Task, &ScrapeOutput) -> anyhow::Result<()>,
{
    if let Err(e) = on_result(task, output) {
        warn!(task_id = task.id.as_str(), error = %e, "Result callback failed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    use async_trait::async_trait;
    use scrapebench_common::ContentFormat;
    use scrapebench_engines::{BlockingFetcher, SuspendingFetcher};

    fn task(id: &str, url: &str) -> Task {
        Task {
            id: id.to_string(),
            url: url.to_string(),
            truth_text: String::new(),
            lie_text: String::new(),
        }
    }

    /// Suspending fetcher that sleeps per-URL so completion order can be
    /// forced to differ from submission order.
    struct SleepyFetcher;

    #[async_trait]
    impl SuspendingFetcher for SleepyFetcher {
        async fn fetch(&self, url: &str, _run_id: &str) -> ScrapeOutput {
            let delay = if url.contains("slow") { 80 } else { 5 };
            tokio::time::sleep(Duration::from_millis(delay)).await;
            ScrapeOutput::completed(
                "sleepy",
                url,
                Some(200),
                None,
                ContentFormat::Html,
                Some("ok".to_string()),
            )
        }

        fn name(&self) -> &str {
            "sleepy"
        }
    }

    /// Tracks how many fetches run at once.
    struct GaugeFetcher {
        in_flight: AtomicUsize,
        peak: AtomicUsize,
    }

    #[async_trait]
    impl SuspendingFetcher for GaugeFetcher {
        async fn fetch(&self, url: &str, _run_id: &str) -> ScrapeOutput {
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(20)).await;
            self.in_flight.fetch_sub(1, Ordering::SeqCst);
            ScrapeOutput::completed("gauge", url, Some(200), None, ContentFormat::Html, None)
        }

        fn name(&self) -> &str {
            "gauge"
        }
    }

    struct CountingBlockingFetcher {
        calls: AtomicUsize,
    }

    impl BlockingFetcher for CountingBlockingFetcher {
        fn fetch(&self, url: &str, _run_id: &str) -> ScrapeOutput {
            self.calls.fetch_add(1, Ordering::SeqCst);
            ScrapeOutput::completed(
                "counting",
                url,
                Some(200),
                None,
                ContentFormat::Html,
                Some("ok".to_string()),
            )
        }

        fn name(&self) -> &str {
            "counting"
        }
    }

    #[tokio::test]
    async fn suspending_results_arrive_in_completion_order() {
        let adapter = EngineAdapter::Suspending(Arc::new(SleepyFetcher));
        let tasks = vec![task("slow", "http://slow.example"), task("fast", "http://fast.example")];

        let mut seen = Vec::new();
        let results = dispatch(&adapter, tasks, "run-1", 4, |t, _| {
            seen.push(t.id.clone());
            Ok(())
        })
        .await;

        assert_eq!(seen, vec!["fast", "slow"]);
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].0.id, "fast");
    }

    #[tokio::test]
    async fn concurrency_never_exceeds_max_workers() {
        let fetcher = Arc::new(GaugeFetcher {
            in_flight: AtomicUsize::new(0),
            peak: AtomicUsize::new(0),
        });
        let adapter = EngineAdapter::Suspending(fetcher.clone());
        let tasks: Vec<Task> = (0..12)
            .map(|i| task(&i.to_string(), &format!("http://t{i}.example")))
            .collect();

        let results = dispatch(&adapter, tasks, "run-1", 3, |_, _| Ok(())).await;

        assert_eq!(results.len(), 12);
        assert!(fetcher.peak.load(Ordering::SeqCst) <= 3);
    }

    #[tokio::test]
    async fn callback_failure_does_not_abort_the_batch() {
        let adapter = EngineAdapter::Suspending(Arc::new(SleepyFetcher));
        let tasks = vec![task("a", "http://a.example"), task("b", "http://b.example")];

        let mut delivered = 0;
        let results = dispatch(&adapter, tasks, "run-1", 2, |_, _| {
            delivered += 1;
            anyhow::bail!("disk full")
        })
        .await;

        assert_eq!(delivered, 2);
        assert_eq!(results.len(), 2);
    }

    #[tokio::test]
    async fn blocking_adapter_runs_every_task_sequentially() {
        let fetcher = Arc::new(CountingBlockingFetcher {
            calls: AtomicUsize::new(0),
        });
        let adapter = EngineAdapter::Blocking(fetcher.clone());
        let tasks = vec![
            task("1", "http://a.example"),
            task("2", "http://b.example"),
            task("3", "http://c.example"),
        ];

        let mut seen = Vec::new();
        let results = dispatch(&adapter, tasks, "run-1", 8, |t, _| {
            seen.push(t.id.clone());
            Ok(())
        })
        .await;

        assert_eq!(fetcher.calls.load(Ordering::SeqCst), 3);
        // Sequential execution preserves submission order.
        assert_eq!(seen, vec!["1", "2", "3"]);
        assert_eq!(results.len(), 3);
    }
}
