use std::path::Path;

use super::runner::ProcessCommand;

pub struct ProcessCommandBuilder {
    command: ProcessCommand,
}

impl ProcessCommandBuilder {
    pub fn new(program: &str) -> Self {
        Self {
            command: ProcessCommand {
                program: program.to_string(),
                args: Vec::new(),
                working_dir: None,
            },
        }
    }

    pub fn arg(mut self, arg: &str) -> Self {
        self.command.args.push(arg.to_string());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.command
            .args
            .extend(args.into_iter().map(|s| s.as_ref().to_string()));
        self
    }

    pub fn current_dir(mut self, dir: &Path) -> Self {
        self.command.working_dir = Some(dir.to_path_buf());
        self
    }

    pub fn build(self) -> ProcessCommand {
        self.command
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_program_and_args() {
        let command = ProcessCommandBuilder::new("ethereumetl")
            .arg("export_blocks_and_transactions")
            .args(["--start-block=0", "--end-block=9"])
            .build();
        assert_eq!(command.program, "ethereumetl");
        assert_eq!(
            command.args,
            vec![
                "export_blocks_and_transactions",
                "--start-block=0",
                "--end-block=9"
            ]
        );
        assert!(command.working_dir.is_none());
    }
}
