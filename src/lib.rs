//! Parallel chunked driver for `ethereumetl export_blocks_and_transactions`.
//!
//! Splits a block range into fixed-size chunks and runs one extractor
//! process per chunk under a bounded worker pool, streaming every child's
//! stdout and stderr into a shared log sink and aggregating per-chunk
//! outcomes with failure isolation.

pub mod aggregate;
pub mod config;
pub mod error;
pub mod export;
pub mod job;
pub mod logging;
pub mod partition;
pub mod scheduler;
pub mod subprocess;

pub use error::{Error, Result};
