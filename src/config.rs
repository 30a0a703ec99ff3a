use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::{Error, Result};

pub const DEFAULT_CHUNK_SIZE: u64 = 10_000;
pub const DEFAULT_MAX_WORKERS: usize = 64;
pub const DEFAULT_BATCH_SIZE: u64 = 20;
pub const DEFAULT_WRITER_THREADS: usize = 1;
pub const DEFAULT_EXTRACTOR: &str = "ethereumetl";
pub const DEFAULT_LOG_FILE: &str = "export_blocks.log";

/// Resolved, validated configuration for one export run. Built once before
/// partitioning starts and read-only afterwards.
#[derive(Debug, Clone)]
pub struct ExecutionConfig {
    /// First block to export (inclusive)
    pub start_block: u64,
    /// Last block to export (inclusive)
    pub end_block: u64,
    /// Blocks per job
    pub chunk_size: u64,
    /// Maximum number of concurrent extractor processes
    pub max_workers: usize,
    /// Node endpoint passed through to the extractor
    pub provider_uri: String,
    /// Extractor-internal RPC batch size
    pub batch_size: u64,
    /// Extractor-internal writer thread count (`-w`)
    pub writer_threads: usize,
    /// Extractor executable to invoke
    pub extractor: String,
    /// Directory under which `blocks/` and `transactions/` are created
    pub output_dir: PathBuf,
    /// Append-only job log file
    pub log_file: PathBuf,
}

/// Partial configuration as read from a TOML file or collected from CLI
/// flags. Every field is optional so two layers can be merged.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigFile {
    pub start_block: Option<u64>,
    pub end_block: Option<u64>,
    pub chunk_size: Option<u64>,
    pub max_workers: Option<usize>,
    pub provider_uri: Option<String>,
    pub batch_size: Option<u64>,
    pub writer_threads: Option<usize>,
    pub extractor: Option<String>,
    pub output_dir: Option<PathBuf>,
    pub log_file: Option<PathBuf>,
}

impl ConfigFile {
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&raw)?)
    }
}

impl ExecutionConfig {
    /// Merge CLI overrides on top of file values, fill in defaults, and
    /// validate. Overrides win wherever both layers set a field.
    pub fn resolve(overrides: ConfigFile, file: ConfigFile) -> Result<Self> {
        let start_block = overrides
            .start_block
            .or(file.start_block)
            .ok_or_else(|| Error::Config("start-block is required".to_string()))?;
        let end_block = overrides
            .end_block
            .or(file.end_block)
            .ok_or_else(|| Error::Config("end-block is required".to_string()))?;
        let provider_uri = overrides
            .provider_uri
            .or(file.provider_uri)
            .ok_or_else(|| Error::Config("provider-uri is required".to_string()))?;

        let config = Self {
            start_block,
            end_block,
            provider_uri,
            chunk_size: overrides
                .chunk_size
                .or(file.chunk_size)
                .unwrap_or(DEFAULT_CHUNK_SIZE),
            max_workers: overrides
                .max_workers
                .or(file.max_workers)
                .unwrap_or(DEFAULT_MAX_WORKERS),
            batch_size: overrides
                .batch_size
                .or(file.batch_size)
                .unwrap_or(DEFAULT_BATCH_SIZE),
            writer_threads: overrides
                .writer_threads
                .or(file.writer_threads)
                .unwrap_or(DEFAULT_WRITER_THREADS),
            extractor: overrides
                .extractor
                .or(file.extractor)
                .unwrap_or_else(|| DEFAULT_EXTRACTOR.to_string()),
            output_dir: overrides
                .output_dir
                .or(file.output_dir)
                .unwrap_or_else(|| PathBuf::from(".")),
            log_file: overrides
                .log_file
                .or(file.log_file)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_LOG_FILE)),
        };

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.chunk_size == 0 {
            return Err(Error::Config(
                "chunk-size must be greater than zero".to_string(),
            ));
        }
        if self.start_block > self.end_block {
            return Err(Error::Config(format!(
                "start-block {} is past end-block {}",
                self.start_block, self.end_block
            )));
        }
        if self.max_workers == 0 {
            return Err(Error::Config(
                "max-workers must be greater than zero".to_string(),
            ));
        }
        if self.provider_uri.is_empty() {
            return Err(Error::Config("provider-uri must not be empty".to_string()));
        }
        Ok(())
    }
}
