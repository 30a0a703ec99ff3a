use std::sync::Arc;

use futures::stream::{FuturesUnordered, StreamExt};
use tokio::sync::Semaphore;

use crate::aggregate::{ExportSummary, ResultAggregator};
use crate::config::ExecutionConfig;
use crate::error::Result;
use crate::export::ExportRunner;
use crate::job::Job;
use crate::logging::LogSink;
use crate::partition::partition;
use crate::subprocess::ProcessRunner;

/// Bounded worker pool. Jobs are admitted in submission order as permits
/// free up; outcomes surface in completion order. A failed job releases
/// its slot like any other and never stops the rest of the queue.
pub struct Scheduler {
    max_workers: usize,
}

impl Scheduler {
    pub fn new(max_workers: usize) -> Self {
        Self { max_workers }
    }

    pub async fn run(
        &self,
        exporter: Arc<ExportRunner>,
        jobs: Vec<Job>,
        aggregator: &mut ResultAggregator,
    ) {
        let semaphore = Arc::new(Semaphore::new(self.max_workers));
        let mut in_flight = FuturesUnordered::new();

        for job in jobs {
            let exporter = Arc::clone(&exporter);
            let semaphore = Arc::clone(&semaphore);
            in_flight.push(async move {
                let _permit = semaphore.acquire_owned().await.unwrap();
                exporter.run_job(job).await
            });
        }

        while let Some(outcome) = in_flight.next().await {
            aggregator.record(&outcome);
        }
    }
}

/// Partition the configured range, drive every chunk through the pool,
/// and aggregate the outcomes. Only pre-flight errors (bad range, bad
/// chunk size) surface here; per-job failures end up in the summary.
pub async fn run(
    config: ExecutionConfig,
    runner: Arc<dyn ProcessRunner>,
    sink: Arc<dyn LogSink>,
) -> Result<ExportSummary> {
    let jobs = partition(&config)?;
    tracing::info!(
        "exporting blocks {} to {}: {} chunks, {} workers",
        config.start_block,
        config.end_block,
        jobs.len(),
        config.max_workers
    );

    let scheduler = Scheduler::new(config.max_workers);
    let exporter = Arc::new(ExportRunner::new(config, runner, sink.clone()));
    let mut aggregator = ResultAggregator::new(sink);
    scheduler.run(exporter, jobs, &mut aggregator).await;
    Ok(aggregator.finish())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logging::MemorySink;
    use crate::subprocess::mock::MockResponse;
    use crate::subprocess::{
        MockProcessRunner, ProcessCommand, ProcessError, ProcessStream,
    };
    use async_trait::async_trait;
    use std::path::Path;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    fn test_config(output_dir: &Path, max_workers: usize) -> ExecutionConfig {
        ExecutionConfig {
            start_block: 0,
            end_block: 119,
            chunk_size: 10,
            max_workers,
            provider_uri: "http://127.0.0.1:8545".to_string(),
            batch_size: 20,
            writer_threads: 1,
            extractor: "ethereumetl".to_string(),
            output_dir: output_dir.to_path_buf(),
            log_file: output_dir.join("export_blocks.log"),
        }
    }

    /// Fake runner that records how many invocations overlap in time.
    struct GateRunner {
        current: Arc<AtomicUsize>,
        peak: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl ProcessRunner for GateRunner {
        async fn run_streaming(
            &self,
            _command: ProcessCommand,
        ) -> std::result::Result<ProcessStream, ProcessError> {
            let now = self.current.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(20)).await;
            self.current.fetch_sub(1, Ordering::SeqCst);

            Ok(ProcessStream {
                stdout: Box::pin(futures::stream::empty()),
                stderr: Box::pin(futures::stream::empty()),
                status: Box::pin(async {
                    Ok::<_, ProcessError>(crate::subprocess::ExitStatus::Success)
                }),
            })
        }
    }

    #[tokio::test]
    async fn never_exceeds_the_worker_bound() {
        let dir = tempfile::tempdir().unwrap();
        let peak = Arc::new(AtomicUsize::new(0));
        let runner = GateRunner {
            current: Arc::new(AtomicUsize::new(0)),
            peak: Arc::clone(&peak),
        };

        let summary = run(
            test_config(dir.path(), 3),
            Arc::new(runner),
            Arc::new(MemorySink::new()),
        )
        .await
        .unwrap();

        assert_eq!(summary.total, 12);
        assert_eq!(summary.succeeded, 12);
        assert!(peak.load(Ordering::SeqCst) <= 3);
        assert!(peak.load(Ordering::SeqCst) >= 2);
    }

    #[tokio::test]
    async fn single_worker_serializes_jobs() {
        let dir = tempfile::tempdir().unwrap();
        let peak = Arc::new(AtomicUsize::new(0));
        let runner = GateRunner {
            current: Arc::new(AtomicUsize::new(0)),
            peak: Arc::clone(&peak),
        };

        run(
            test_config(dir.path(), 1),
            Arc::new(runner),
            Arc::new(MemorySink::new()),
        )
        .await
        .unwrap();

        assert_eq!(peak.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn failed_jobs_do_not_block_the_rest() {
        let dir = tempfile::tempdir().unwrap();
        let runner = MockProcessRunner::new();
        runner.enqueue(MockResponse::success());
        runner.enqueue(MockResponse::exit_code(7));
        runner.enqueue(MockResponse::spawn_failure());
        runner.enqueue(MockResponse::success());

        let sink = MemorySink::new();
        let mut config = test_config(dir.path(), 1);
        config.end_block = 39; // four chunks

        let summary = run(config, Arc::new(runner), Arc::new(sink.clone()))
            .await
            .unwrap();

        assert_eq!(summary.total, 4);
        assert_eq!(summary.succeeded, 2);
        assert_eq!(summary.failed, 2);
        assert!(sink.contains("exit code 7"));
        assert!(sink.contains("All blocks have been exported!"));
    }

    #[tokio::test]
    async fn bad_range_aborts_before_any_job_runs() {
        let dir = tempfile::tempdir().unwrap();
        let runner = MockProcessRunner::new();
        let mut config = test_config(dir.path(), 2);
        config.start_block = 100;
        config.end_block = 50;

        let err = run(
            config,
            Arc::new(runner.clone()),
            Arc::new(MemorySink::new()),
        )
        .await
        .unwrap_err();

        assert!(matches!(err, crate::error::Error::Config(_)));
        assert!(runner.calls().is_empty());
    }
}
