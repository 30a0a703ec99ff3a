pub mod builder;
pub mod error;
pub mod mock;
pub mod runner;

pub use builder::ProcessCommandBuilder;
pub use error::ProcessError;
pub use mock::MockProcessRunner;
pub use runner::{
    ExitStatus, LineStream, ProcessCommand, ProcessRunner, ProcessStream, TokioProcessRunner,
};
