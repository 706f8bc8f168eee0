//! External process invocation.
//!
//! Orchestration stages talk to child processes through the
//! [`CommandRunner`] trait so tests can substitute a fake runner. The
//! production [`StreamingRunner`] drains child stdout to this process's
//! stderr line-by-line as it is produced, never buffering until exit.

use std::io::{BufRead, BufReader, Write};
use std::path::PathBuf;
use std::process::{Command, Stdio};

use crate::error::SubprocessError;

/// A single external command invocation
#[derive(Debug, Clone, Default)]
pub struct CommandSpec {
    /// Program to execute
    pub program: String,
    /// Arguments, in order
    pub args: Vec<String>,
    /// Working directory, current directory when absent
    pub cwd: Option<PathBuf>,
    /// Extra environment variables for the child
    pub envs: Vec<(String, String)>,
}

impl CommandSpec {
    /// Start a spec for the given program
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            ..Self::default()
        }
    }

    /// Append one argument
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Append several arguments
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Set the child's working directory
    pub fn current_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cwd = Some(dir.into());
        self
    }

    /// Set an environment variable on the child
    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.envs.push((key.into(), value.into()));
        self
    }

    /// Human-readable command line for error messages
    pub fn display(&self) -> String {
        let mut line = self.program.clone();
        for arg in &self.args {
            line.push(' ');
            line.push_str(arg);
        }
        line
    }
}

/// Abstraction over child-process execution
///
/// Stages depend on this trait rather than on `std::process` directly,
/// which keeps the orchestration logic testable with a recording fake.
pub trait CommandRunner {
    /// Run to completion, echoing output incrementally; non-zero exit is an error
    fn run(&self, spec: &CommandSpec) -> Result<(), SubprocessError>;

    /// Run to completion, capturing stdout as UTF-8 text
    fn capture_stdout(&self, spec: &CommandSpec) -> Result<String, SubprocessError>;
}

/// Production runner backed by `std::process`
///
/// Child stderr is inherited and reaches the terminal unaltered; child
/// stdout is piped and re-emitted on stderr one line at a time. Draining
/// incrementally keeps a chatty child from deadlocking on a full pipe
/// buffer.
#[derive(Debug, Clone, Copy, Default)]
pub struct StreamingRunner;

impl StreamingRunner {
    fn command(spec: &CommandSpec) -> Command {
        let mut command = Command::new(&spec.program);
        command.args(&spec.args);
        if let Some(dir) = &spec.cwd {
            command.current_dir(dir);
        }
        for (key, value) in &spec.envs {
            command.env(key, value);
        }
        command
    }
}

impl CommandRunner for StreamingRunner {
    fn run(&self, spec: &CommandSpec) -> Result<(), SubprocessError> {
        let display = spec.display();
        log::debug!("running: {}", display);

        let mut child = Self::command(spec)
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .spawn()
            .map_err(|e| SubprocessError::SpawnFailed {
                command: display.clone(),
                reason: e.to_string(),
            })?;

        if let Some(stdout) = child.stdout.take() {
            let reader = BufReader::new(stdout);
            let stderr = std::io::stderr();
            for line in reader.lines() {
                match line {
                    Ok(line) => {
                        let _ = writeln!(stderr.lock(), "{}", line);
                    }
                    Err(_) => break,
                }
            }
        }

        let status = child.wait().map_err(|e| SubprocessError::SpawnFailed {
            command: display.clone(),
            reason: e.to_string(),
        })?;

        if status.success() {
            Ok(())
        } else {
            Err(SubprocessError::NonZeroExit {
                command: display,
                status: status.code().unwrap_or(-1),
            })
        }
    }

    fn capture_stdout(&self, spec: &CommandSpec) -> Result<String, SubprocessError> {
        let display = spec.display();
        log::debug!("capturing: {}", display);

        let output = Self::command(spec)
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .output()
            .map_err(|e| SubprocessError::SpawnFailed {
                command: display.clone(),
                reason: e.to_string(),
            })?;

        if !output.status.success() {
            return Err(SubprocessError::NonZeroExit {
                command: display,
                status: output.status.code().unwrap_or(-1),
            });
        }

        String::from_utf8(output.stdout)
            .map_err(|_| SubprocessError::InvalidOutput { command: display })
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_joins_program_and_args() {
        let spec = CommandSpec::new("make").args(["check"]);
        assert_eq!(spec.display(), "make check");
    }

    #[cfg(unix)]
    #[test]
    fn run_reports_non_zero_exit() {
        let spec = CommandSpec::new("sh").args(["-c", "exit 3"]);
        let err = StreamingRunner.run(&spec).unwrap_err();
        assert!(matches!(
            err,
            SubprocessError::NonZeroExit { status: 3, .. }
        ));
    }

    #[cfg(unix)]
    #[test]
    fn capture_stdout_returns_text() {
        let spec = CommandSpec::new("sh").args(["-c", "printf hello"]);
        let out = StreamingRunner.capture_stdout(&spec).unwrap();
        assert_eq!(out, "hello");
    }

    #[test]
    fn missing_program_is_spawn_failure() {
        let spec = CommandSpec::new("definitely-not-a-real-binary-4185");
        let err = StreamingRunner.run(&spec).unwrap_err();
        assert!(matches!(err, SubprocessError::SpawnFailed { .. }));
    }

    #[cfg(unix)]
    #[test]
    fn env_and_cwd_reach_the_child() {
        let dir = tempfile::tempdir().unwrap();
        let spec = CommandSpec::new("sh")
            .args(["-c", "printf '%s' \"$MARKER\""])
            .env("MARKER", "on")
            .current_dir(dir.path());
        let out = StreamingRunner.capture_stdout(&spec).unwrap();
        assert_eq!(out, "on");
    }
}
