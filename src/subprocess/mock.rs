use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use super::error::ProcessError;
use super::runner::{ExitStatus, LineStream, ProcessCommand, ProcessRunner, ProcessStream};

/// Scripted behaviour for one expected spawn.
#[derive(Debug, Default)]
pub struct MockResponse {
    pub stdout: Vec<String>,
    pub stderr: Vec<String>,
    pub exit: Option<ExitStatus>,
    pub spawn_failure: bool,
    pub stdout_read_failure: bool,
}

impl MockResponse {
    pub fn success() -> Self {
        Self {
            exit: Some(ExitStatus::Success),
            ..Default::default()
        }
    }

    pub fn exit_code(code: i32) -> Self {
        Self {
            exit: Some(if code == 0 {
                ExitStatus::Success
            } else {
                ExitStatus::Error(code)
            }),
            ..Default::default()
        }
    }

    pub fn spawn_failure() -> Self {
        Self {
            spawn_failure: true,
            ..Default::default()
        }
    }

    pub fn stdout_lines<I, S>(mut self, lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.stdout = lines.into_iter().map(|s| s.as_ref().to_string()).collect();
        self
    }

    pub fn stderr_lines<I, S>(mut self, lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.stderr = lines.into_iter().map(|s| s.as_ref().to_string()).collect();
        self
    }

    pub fn stdout_read_failure(mut self) -> Self {
        self.stdout_read_failure = true;
        self
    }
}

/// In-process stand-in for the production runner. Responses are consumed
/// in FIFO order, one per spawn; an empty queue yields a clean exit with
/// no output.
#[derive(Clone, Default)]
pub struct MockProcessRunner {
    responses: Arc<Mutex<VecDeque<MockResponse>>>,
    call_history: Arc<Mutex<Vec<ProcessCommand>>>,
}

impl MockProcessRunner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn enqueue(&self, response: MockResponse) {
        self.responses.lock().unwrap().push_back(response);
    }

    pub fn calls(&self) -> Vec<ProcessCommand> {
        self.call_history.lock().unwrap().clone()
    }

    fn line_stream(lines: Vec<String>, trailing_failure: Option<ProcessError>) -> LineStream {
        let items: Vec<Result<String, ProcessError>> = lines
            .into_iter()
            .map(Ok)
            .chain(trailing_failure.map(Err))
            .collect();
        Box::pin(futures::stream::iter(items))
    }
}

#[async_trait]
impl ProcessRunner for MockProcessRunner {
    async fn run_streaming(&self, command: ProcessCommand) -> Result<ProcessStream, ProcessError> {
        self.call_history.lock().unwrap().push(command.clone());

        let response = self
            .responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(MockResponse::success);

        if response.spawn_failure {
            return Err(ProcessError::Spawn {
                command: command.display(),
                source: std::io::Error::new(std::io::ErrorKind::NotFound, "mock spawn failure"),
            });
        }

        let stdout_failure = response.stdout_read_failure.then(|| ProcessError::Io {
            command: command.display(),
            source: std::io::Error::other("mock read failure"),
        });

        let exit = response.exit.unwrap_or(ExitStatus::Success);
        Ok(ProcessStream {
            stdout: Self::line_stream(response.stdout, stdout_failure),
            stderr: Self::line_stream(response.stderr, None),
            status: Box::pin(async move { Ok::<_, ProcessError>(exit) }),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::StreamExt;

    #[tokio::test]
    async fn responses_are_consumed_in_order() {
        let runner = MockProcessRunner::new();
        runner.enqueue(MockResponse::exit_code(3));
        runner.enqueue(MockResponse::success().stdout_lines(["done"]));

        let command = ProcessCommand {
            program: "ethereumetl".to_string(),
            args: vec![],
            working_dir: None,
        };

        let first = runner.run_streaming(command.clone()).await.unwrap();
        assert_eq!(first.status.await.unwrap(), ExitStatus::Error(3));

        let second = runner.run_streaming(command).await.unwrap();
        let lines: Vec<_> = second.stdout.collect().await;
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].as_ref().unwrap(), "done");
        assert_eq!(second.status.await.unwrap(), ExitStatus::Success);

        assert_eq!(runner.calls().len(), 2);
    }

    #[tokio::test]
    async fn empty_queue_defaults_to_clean_exit() {
        let runner = MockProcessRunner::new();
        let stream = runner
            .run_streaming(ProcessCommand {
                program: "ethereumetl".to_string(),
                args: vec![],
                working_dir: None,
            })
            .await
            .unwrap();
        assert!(stream.status.await.unwrap().success());
    }
}
