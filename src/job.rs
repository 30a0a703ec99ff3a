use std::path::{Path, PathBuf};

use crate::subprocess::ProcessError;

/// One chunk of the export range, consumed by exactly one extractor
/// invocation. Output paths are a pure function of the bounds so re-running
/// a chunk overwrites its own files and never touches a neighbour's.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Job {
    pub start_block: u64,
    pub end_block: u64,
    pub blocks_output: PathBuf,
    pub transactions_output: PathBuf,
}

impl Job {
    pub fn new(start_block: u64, end_block: u64, output_dir: &Path) -> Self {
        Self {
            start_block,
            end_block,
            blocks_output: output_dir
                .join("blocks")
                .join(format!("blocks_{start_block}_{end_block}.csv")),
            transactions_output: output_dir
                .join("transactions")
                .join(format!("transactions_{start_block}_{end_block}.csv")),
        }
    }
}

/// Terminal classification of one job. Never mutated after creation.
#[derive(Debug)]
pub enum JobStatus {
    /// Extractor exited with code 0
    Success,
    /// Extractor ran but exited nonzero
    ExitCode(i32),
    /// Extractor could not be launched or its output could not be read;
    /// no exit code is available
    Failed(ProcessError),
}

impl JobStatus {
    pub fn is_success(&self) -> bool {
        matches!(self, JobStatus::Success)
    }

    pub fn exit_code(&self) -> Option<i32> {
        match self {
            JobStatus::Success => Some(0),
            JobStatus::ExitCode(code) => Some(*code),
            JobStatus::Failed(_) => None,
        }
    }
}

#[derive(Debug)]
pub struct JobOutcome {
    pub job: Job,
    pub status: JobStatus,
}

impl JobOutcome {
    pub fn new(job: Job, status: JobStatus) -> Self {
        Self { job, status }
    }
}
