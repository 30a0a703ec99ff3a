use thiserror::Error;

/// Per-process failure modes. All of these are caught at the exporter
/// boundary and folded into a job outcome; they never unwind into the
/// scheduler.
#[derive(Error, Debug)]
pub enum ProcessError {
    #[error("failed to spawn `{command}`: {source}")]
    Spawn {
        command: String,
        source: std::io::Error,
    },

    #[error("IO error while running `{command}`: {source}")]
    Io {
        command: String,
        source: std::io::Error,
    },
}
