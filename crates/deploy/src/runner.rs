//! External command execution.

use std::{
    collections::BTreeSet,
    fmt,
    future::Future,
    path::{Path, PathBuf},
};

use crate::{ExternalCommandError, Stage};

/// Placeholder printed instead of secret arguments.
const REDACTED: &str = "***";

/// A fully described external command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    /// The stage the command belongs to.
    pub stage: Stage,
    /// The program to execute.
    pub program: String,
    /// Arguments passed to the program.
    pub args: Vec<String>,
    /// Extra environment variables.
    pub env: Vec<(String, String)>,
    /// Working directory, the current one when unset.
    pub current_dir: Option<PathBuf>,
    /// Indices into `args` that must never be printed.
    secrets: BTreeSet<usize>,
}

impl CommandSpec {
    /// Create a new command running `program` without arguments.
    pub fn new(stage: Stage, program: impl Into<String>) -> Self {
        Self {
            stage,
            program: program.into(),
            args: Vec::new(),
            env: Vec::new(),
            current_dir: None,
            secrets: BTreeSet::new(),
        }
    }

    /// Create a command from an argv list, `None` when the list is empty.
    pub fn from_argv(stage: Stage, argv: &[String]) -> Option<Self> {
        let (program, args) = argv.split_first()?;
        Some(Self::new(stage, program.clone()).args(args.iter().cloned()))
    }

    /// Add an argument.
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Add multiple arguments.
    pub fn args(mut self, args: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Add an argument that is redacted whenever the command is displayed.
    pub fn secret_arg(mut self, arg: impl Into<String>) -> Self {
        self.secrets.insert(self.args.len());
        self.args.push(arg.into());
        self
    }

    /// Set an environment variable.
    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.push((key.into(), value.into()));
        self
    }

    /// Set the working directory.
    pub fn current_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.current_dir = Some(dir.as_ref().to_path_buf());
        self
    }

    /// Value of an environment variable set on the command.
    pub fn env_value(&self, key: &str) -> Option<&str> {
        self.env
            .iter()
            .rev()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Whether `args` contains `arg`.
    pub fn has_arg(&self, arg: &str) -> bool {
        self.args.iter().any(|a| a == arg)
    }
}

/// The command line as a user would type it, secrets redacted.
impl fmt::Display for CommandSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (key, value) in &self.env {
            write!(f, "{key}={value} ")?;
        }
        f.write_str(&self.program)?;
        for (index, arg) in self.args.iter().enumerate() {
            if self.secrets.contains(&index) {
                write!(f, " {REDACTED}")?;
            } else {
                write!(f, " {arg}")?;
            }
        }
        Ok(())
    }
}

/// Captured output of a successful command.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    pub stdout: String,
    pub stderr: String,
}

/// Runs external commands to completion.
///
/// A command that cannot be started or exits with a non-zero status is an
/// [`ExternalCommandError`].
pub trait CommandRunner {
    fn run(
        &self,
        command: &CommandSpec,
    ) -> impl Future<Output = Result<CommandOutput, ExternalCommandError>> + Send;
}

/// Runs commands as child processes.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessRunner;

impl CommandRunner for ProcessRunner {
    async fn run(&self, command: &CommandSpec) -> Result<CommandOutput, ExternalCommandError> {
        let command_line = command.to_string();
        tracing::debug!(stage = %command.stage, command = %command_line, "Running command");

        let mut process = tokio::process::Command::new(&command.program);
        process
            .args(&command.args)
            .envs(command.env.iter().map(|(k, v)| (k, v)))
            .kill_on_drop(true);
        if let Some(dir) = &command.current_dir {
            process.current_dir(dir);
        }

        let output = process
            .output()
            .await
            .map_err(|source| ExternalCommandError::Spawn {
                stage: command.stage,
                command: command_line.clone(),
                source,
            })?;

        let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
        let stderr = String::from_utf8_lossy(&output.stderr).into_owned();

        for line in stdout.lines().filter(|line| !line.trim().is_empty()) {
            tracing::debug!(stage = %command.stage, "{line}");
        }

        if !output.status.success() {
            return Err(ExternalCommandError::Failed {
                stage: command.stage,
                command: command_line,
                code: output.status.code(),
                stderr,
            });
        }

        Ok(CommandOutput { stdout, stderr })
    }
}
