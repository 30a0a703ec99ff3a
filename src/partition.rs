use crate::config::ExecutionConfig;
use crate::error::{Error, Result};
use crate::job::Job;

/// Split the configured inclusive block range into chunk-sized jobs.
///
/// Chunks are contiguous, non-overlapping, and cover exactly
/// `[start_block, end_block]`; only the final chunk may be shorter than
/// `chunk_size`. Pure function of the config, so calling it again yields
/// the identical job sequence.
pub fn partition(config: &ExecutionConfig) -> Result<Vec<Job>> {
    if config.chunk_size == 0 {
        return Err(Error::Config(
            "chunk-size must be greater than zero".to_string(),
        ));
    }
    if config.start_block > config.end_block {
        return Err(Error::Config(format!(
            "start-block {} is past end-block {}",
            config.start_block, config.end_block
        )));
    }

    let mut jobs = Vec::new();
    let mut start = config.start_block;
    while start <= config.end_block {
        let end = start
            .saturating_add(config.chunk_size - 1)
            .min(config.end_block);
        jobs.push(Job::new(start, end, &config.output_dir));
        match end.checked_add(1) {
            Some(next) => start = next,
            None => break,
        }
    }
    Ok(jobs)
}
