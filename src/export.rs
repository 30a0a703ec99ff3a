use std::sync::Arc;

use futures::StreamExt;

use crate::config::ExecutionConfig;
use crate::job::{Job, JobOutcome, JobStatus};
use crate::logging::LogSink;
use crate::subprocess::{
    LineStream, ProcessCommand, ProcessCommandBuilder, ProcessError, ProcessRunner,
};

/// Runs one extractor invocation per job and folds every failure mode into
/// the returned outcome. Nothing escapes `run_job` as an error; the
/// scheduler only ever sees terminal outcomes.
pub struct ExportRunner {
    config: ExecutionConfig,
    runner: Arc<dyn ProcessRunner>,
    sink: Arc<dyn LogSink>,
}

impl ExportRunner {
    pub fn new(
        config: ExecutionConfig,
        runner: Arc<dyn ProcessRunner>,
        sink: Arc<dyn LogSink>,
    ) -> Self {
        Self {
            config,
            runner,
            sink,
        }
    }

    fn build_command(&self, job: &Job) -> ProcessCommand {
        ProcessCommandBuilder::new(&self.config.extractor)
            .arg("export_blocks_and_transactions")
            .arg(&format!("--start-block={}", job.start_block))
            .arg(&format!("--end-block={}", job.end_block))
            .arg(&format!("--batch-size={}", self.config.batch_size))
            .arg("-w")
            .arg(&self.config.writer_threads.to_string())
            .arg(&format!("--provider-uri={}", self.config.provider_uri))
            .arg(&format!("--blocks-output={}", job.blocks_output.display()))
            .arg(&format!(
                "--transactions-output={}",
                job.transactions_output.display()
            ))
            .build()
    }

    /// The extractor writes its CSVs itself but will not create the
    /// directories they live in.
    fn prepare_output_dirs(&self, job: &Job) -> std::io::Result<()> {
        for output in [&job.blocks_output, &job.transactions_output] {
            if let Some(parent) = output.parent() {
                std::fs::create_dir_all(parent)?;
            }
        }
        Ok(())
    }

    /// Forward every line to the sink at the given level, remembering the
    /// first read failure. Draining continues past a failure so the child
    /// never blocks on a full pipe that nobody is reading.
    async fn drain(
        mut stream: LineStream,
        sink: &Arc<dyn LogSink>,
        level: crate::logging::LogLevel,
    ) -> Option<ProcessError> {
        let mut failure = None;
        while let Some(item) = stream.next().await {
            match item {
                Ok(line) => sink.log(level, &line),
                Err(e) => {
                    if failure.is_none() {
                        failure = Some(e);
                    }
                }
            }
        }
        failure
    }

    pub async fn run_job(&self, job: Job) -> JobOutcome {
        use crate::logging::LogLevel;

        let command = self.build_command(&job);
        self.sink.info(&format!("Executing: {}", command.display()));

        if let Err(source) = self.prepare_output_dirs(&job) {
            let err = ProcessError::Io {
                command: command.display(),
                source,
            };
            self.sink
                .error(&format!("Error while executing command: {err}"));
            return JobOutcome::new(job, JobStatus::Failed(err));
        }

        let stream = match self.runner.run_streaming(command).await {
            Ok(stream) => stream,
            Err(err) => {
                self.sink
                    .error(&format!("Error while executing command: {err}"));
                return JobOutcome::new(job, JobStatus::Failed(err));
            }
        };

        // Both pipes are drained concurrently; a child that interleaves
        // heavy stdout and stderr traffic can never wedge on either one.
        let (stdout_failure, stderr_failure, status) = tokio::join!(
            Self::drain(stream.stdout, &self.sink, LogLevel::Info),
            Self::drain(stream.stderr, &self.sink, LogLevel::Error),
            stream.status,
        );

        if let Some(err) = stdout_failure.or(stderr_failure) {
            self.sink
                .error(&format!("Error while executing command: {err}"));
            return JobOutcome::new(job, JobStatus::Failed(err));
        }

        match status {
            Ok(status) if status.success() => {
                self.sink.info(&format!(
                    "Command completed successfully for blocks {} to {}",
                    job.start_block, job.end_block
                ));
                JobOutcome::new(job, JobStatus::Success)
            }
            Ok(status) => {
                self.sink.error(&format!(
                    "Command failed with exit code {}",
                    status.code()
                ));
                JobOutcome::new(job, JobStatus::ExitCode(status.code()))
            }
            Err(err) => {
                self.sink
                    .error(&format!("Error while executing command: {err}"));
                JobOutcome::new(job, JobStatus::Failed(err))
            }
        }
    }
}
