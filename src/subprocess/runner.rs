use std::path::PathBuf;
use std::pin::Pin;
use std::process::Stdio;

use async_trait::async_trait;
use futures::stream::Stream;
use tokio::io::BufReader;

use super::error::ProcessError;

#[derive(Debug, Clone)]
pub struct ProcessCommand {
    pub program: String,
    pub args: Vec<String>,
    pub working_dir: Option<PathBuf>,
}

impl ProcessCommand {
    /// Render the command line the way it would be typed into a shell,
    /// for log lines and error context.
    pub fn display(&self) -> String {
        if self.args.is_empty() {
            self.program.clone()
        } else {
            format!("{} {}", self.program, self.args.join(" "))
        }
    }
}

pub type ProcessStreamItem = Result<String, ProcessError>;
pub type LineStream = Pin<Box<dyn Stream<Item = ProcessStreamItem> + Send>>;
pub type StatusFuture =
    Pin<Box<dyn futures::Future<Output = Result<ExitStatus, ProcessError>> + Send>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitStatus {
    Success,
    Error(i32),
}

impl ExitStatus {
    pub fn success(&self) -> bool {
        matches!(self, ExitStatus::Success)
    }

    pub fn code(&self) -> i32 {
        match self {
            ExitStatus::Success => 0,
            ExitStatus::Error(code) => *code,
        }
    }
}

/// A launched child process: one line stream per output pipe plus a future
/// resolving to the exit status once the child terminates.
pub struct ProcessStream {
    pub stdout: LineStream,
    pub stderr: LineStream,
    pub status: StatusFuture,
}

#[async_trait]
pub trait ProcessRunner: Send + Sync {
    async fn run_streaming(&self, command: ProcessCommand) -> Result<ProcessStream, ProcessError>;
}

pub struct TokioProcessRunner;

impl TokioProcessRunner {
    /// Strip the trailing newline (and carriage return) left by read_line
    fn normalize_line(mut line: String) -> String {
        if line.ends_with('\n') {
            line.pop();
            if line.ends_with('\r') {
                line.pop();
            }
        }
        line
    }

    fn create_line_stream<R>(reader: BufReader<R>, command: String) -> LineStream
    where
        R: tokio::io::AsyncRead + Send + Unpin + 'static,
    {
        use tokio::io::AsyncBufReadExt;

        Box::pin(futures::stream::unfold(
            (reader, command),
            |(mut reader, command)| async move {
                let mut line = String::new();
                match reader.read_line(&mut line).await {
                    Ok(0) => None, // EOF
                    Ok(_) => {
                        let normalized = Self::normalize_line(line);
                        Some((Ok(normalized), (reader, command)))
                    }
                    Err(e) => {
                        let err = ProcessError::Io {
                            command: command.clone(),
                            source: e,
                        };
                        Some((Err(err), (reader, command)))
                    }
                }
            },
        )) as LineStream
    }

    fn convert_exit_status(status: std::process::ExitStatus) -> ExitStatus {
        if status.success() {
            ExitStatus::Success
        } else {
            ExitStatus::Error(status.code().unwrap_or(-1))
        }
    }
}

#[async_trait]
impl ProcessRunner for TokioProcessRunner {
    async fn run_streaming(&self, command: ProcessCommand) -> Result<ProcessStream, ProcessError> {
        tracing::debug!("spawning subprocess: {}", command.display());

        let mut cmd = tokio::process::Command::new(&command.program);
        cmd.args(&command.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        if let Some(dir) = &command.working_dir {
            cmd.current_dir(dir);
        }

        let display = command.display();
        let mut child = cmd.spawn().map_err(|source| ProcessError::Spawn {
            command: display.clone(),
            source,
        })?;

        let stdout = child.stdout.take().ok_or_else(|| ProcessError::Io {
            command: display.clone(),
            source: std::io::Error::other("stdout pipe not captured"),
        })?;
        let stderr = child.stderr.take().ok_or_else(|| ProcessError::Io {
            command: display.clone(),
            source: std::io::Error::other("stderr pipe not captured"),
        })?;

        let stdout_stream = Self::create_line_stream(BufReader::new(stdout), display.clone());
        let stderr_stream = Self::create_line_stream(BufReader::new(stderr), display.clone());

        let status: StatusFuture = Box::pin(async move {
            child
                .wait()
                .await
                .map(Self::convert_exit_status)
                .map_err(|source| ProcessError::Io {
                    command: display,
                    source,
                })
        });

        Ok(ProcessStream {
            stdout: stdout_stream,
            stderr: stderr_stream,
            status,
        })
    }
}
