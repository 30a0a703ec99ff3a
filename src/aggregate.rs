use std::sync::Arc;

use crate::job::{JobOutcome, JobStatus};
use crate::logging::LogSink;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportSummary {
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
}

/// Consumes outcomes in whatever order jobs finish. Sink writes are
/// fire-and-forget, so a bad append while recording one outcome cannot
/// stop the remaining outcomes from being drained.
pub struct ResultAggregator {
    sink: Arc<dyn LogSink>,
    succeeded: usize,
    failed: usize,
}

impl ResultAggregator {
    pub fn new(sink: Arc<dyn LogSink>) -> Self {
        Self {
            sink,
            succeeded: 0,
            failed: 0,
        }
    }

    pub fn record(&mut self, outcome: &JobOutcome) {
        let job = &outcome.job;
        match &outcome.status {
            JobStatus::Success => {
                self.succeeded += 1;
                tracing::debug!(
                    "job finished: blocks {} to {}",
                    job.start_block,
                    job.end_block
                );
            }
            JobStatus::ExitCode(code) => {
                self.failed += 1;
                self.sink.error(&format!(
                    "Export failed for blocks {} to {}: exit code {}",
                    job.start_block, job.end_block, code
                ));
            }
            JobStatus::Failed(err) => {
                self.failed += 1;
                self.sink.error(&format!(
                    "Export failed for blocks {} to {}: {}",
                    job.start_block, job.end_block, err
                ));
            }
        }
    }

    /// Emit the completion lines and hand back the tally.
    pub fn finish(self) -> ExportSummary {
        let summary = ExportSummary {
            total: self.succeeded + self.failed,
            succeeded: self.succeeded,
            failed: self.failed,
        };
        if summary.failed > 0 {
            self.sink.info(&format!(
                "Completed: {} chunks succeeded, {} failed",
                summary.succeeded, summary.failed
            ));
        }
        self.sink.info("All blocks have been exported!");
        summary
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::job::Job;
    use crate::logging::{LogLevel, MemorySink};
    use crate::subprocess::ProcessError;
    use std::path::Path;

    fn outcome(status: JobStatus) -> JobOutcome {
        JobOutcome::new(Job::new(0, 9, Path::new(".")), status)
    }

    #[test]
    fn tallies_successes_and_failures() {
        let sink = MemorySink::new();
        let mut aggregator = ResultAggregator::new(Arc::new(sink.clone()));
        aggregator.record(&outcome(JobStatus::Success));
        aggregator.record(&outcome(JobStatus::ExitCode(7)));
        aggregator.record(&outcome(JobStatus::Failed(ProcessError::Spawn {
            command: "ethereumetl".to_string(),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "missing"),
        })));

        let summary = aggregator.finish();
        assert_eq!(
            summary,
            ExportSummary {
                total: 3,
                succeeded: 1,
                failed: 2
            }
        );
        assert!(sink.contains("exit code 7"));
        assert!(sink.contains("failed to spawn"));
        assert!(sink.contains("All blocks have been exported!"));
    }

    #[test]
    fn all_success_run_skips_failure_summary() {
        let sink = MemorySink::new();
        let mut aggregator = ResultAggregator::new(Arc::new(sink.clone()));
        aggregator.record(&outcome(JobStatus::Success));
        let summary = aggregator.finish();
        assert_eq!(summary.failed, 0);
        assert_eq!(sink.lines_at(LogLevel::Error), Vec::<String>::new());
        assert!(sink.contains("All blocks have been exported!"));
    }
}
