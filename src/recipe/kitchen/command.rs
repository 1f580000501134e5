// src/recipe/kitchen/command.rs

//! External command execution with a per-package log
//!
//! Every tool kiln shells out to (curl, git, tar, unzip, patch, sh, fakeroot,
//! strip, ldd) goes through [`CommandRunner`]. A command is described by an
//! [`ExternalCommand`] value: program, argument list, working directory and
//! environment overlay. No shell quoting happens here; arguments are passed
//! to the process as-is.
//!
//! Combined stdout/stderr is appended to the package log. The log is never
//! truncated, so all invocations of one package accumulate in order.

use crate::error::{Error, Result};
use crate::progress::{status, Spinner};
use std::ffi::OsString;
use std::fmt;
use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use tracing::{debug, info, warn};

/// Exit status reported when a program cannot be started at all
pub const SPAWN_FAILURE_CODE: i32 = 127;

/// Description of one external process invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExternalCommand {
    program: OsString,
    args: Vec<OsString>,
    cwd: Option<PathBuf>,
    env: Vec<(String, String)>,
}

impl ExternalCommand {
    pub fn new(program: impl Into<OsString>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            cwd: None,
            env: Vec::new(),
        }
    }

    pub fn arg(mut self, arg: impl Into<OsString>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<OsString>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn current_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cwd = Some(dir.into());
        self
    }

    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.push((key.into(), value.into()));
        self
    }

    pub fn envs<I>(mut self, vars: I) -> Self
    where
        I: IntoIterator<Item = (String, String)>,
    {
        self.env.extend(vars);
        self
    }

    /// Prefix the invocation with a wrapper program (e.g. `fakeroot`)
    pub fn wrapped_in(self, wrapper: impl Into<OsString>) -> Self {
        let mut args = Vec::with_capacity(self.args.len() + 1);
        args.push(self.program);
        args.extend(self.args);
        Self {
            program: wrapper.into(),
            args,
            cwd: self.cwd,
            env: self.env,
        }
    }

    pub fn program(&self) -> &OsString {
        &self.program
    }

    pub fn arguments(&self) -> &[OsString] {
        &self.args
    }

    pub fn working_dir(&self) -> Option<&Path> {
        self.cwd.as_deref()
    }

    pub fn env_overlay(&self) -> &[(String, String)] {
        &self.env
    }

    /// Look up an environment overlay value
    pub fn env_value(&self, key: &str) -> Option<&str> {
        self.env
            .iter()
            .rev()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    fn to_command(&self) -> Command {
        let mut command = Command::new(&self.program);
        command.args(&self.args);
        if let Some(dir) = &self.cwd {
            command.current_dir(dir);
        }
        command.envs(self.env.iter().map(|(k, v)| (k.as_str(), v.as_str())));
        command
    }
}

impl fmt::Display for ExternalCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program.to_string_lossy())?;
        for arg in &self.args {
            write!(f, " {}", arg.to_string_lossy())?;
        }
        Ok(())
    }
}

/// Exit status of a finished command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommandStatus {
    /// Exit code, `None` when killed by a signal
    pub code: Option<i32>,
}

impl CommandStatus {
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }
}

/// Status plus captured output of a command
#[derive(Debug, Clone)]
pub struct CapturedOutput {
    pub status: CommandStatus,
    pub stdout: String,
    pub stderr: String,
}

/// Append-only per-package log file
#[derive(Debug, Clone)]
pub struct BuildLog {
    path: PathBuf,
}

impl BuildLog {
    /// Use `path` as the log, creating its parent directory
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        Ok(Self { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn append(&self) -> Result<File> {
        OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| Error::IoError(format!("cannot open log {}: {}", self.path.display(), e)))
    }

    /// Append a free-form note to the log
    pub fn note(&self, line: &str) -> Result<()> {
        let mut file = self.append()?;
        writeln!(file, "{}", line)?;
        Ok(())
    }

    fn header(&self, file: &mut File, label: &str, command: &ExternalCommand) -> Result<()> {
        let now = chrono::Local::now().format("%Y-%m-%d %H:%M:%S");
        writeln!(file, "=== {} [{}] ===", label, now)?;
        if let Some(dir) = command.working_dir() {
            writeln!(file, "cwd: {}", dir.display())?;
        }
        writeln!(file, "$ {}", command)?;
        Ok(())
    }
}

/// Runs external commands, logging output and reporting outcome
#[derive(Debug, Clone)]
pub struct CommandRunner {
    log: BuildLog,
    interactive: bool,
}

impl CommandRunner {
    /// Runner writing to `log`; `interactive` enables spinner and status lines
    pub fn new(log: BuildLog, interactive: bool) -> Self {
        Self { log, interactive }
    }

    pub fn log(&self) -> &BuildLog {
        &self.log
    }

    /// Run `command`, appending its combined output to the log
    ///
    /// Only log I/O errors are returned as `Err`; a command that fails (or
    /// cannot be started) yields a non-success [`CommandStatus`] and the
    /// caller decides what that means.
    pub fn run(&self, command: &ExternalCommand, label: &str) -> Result<CommandStatus> {
        let mut file = self.log.append()?;
        self.log.header(&mut file, label, command)?;

        info!(label, command = %command, "running");
        let status = {
            let _spinner = self.spinner(label);
            let stdout = file.try_clone()?;
            let stderr = file.try_clone()?;
            let result = command
                .to_command()
                .stdin(Stdio::null())
                .stdout(Stdio::from(stdout))
                .stderr(Stdio::from(stderr))
                .status();

            match result {
                Ok(exit) => CommandStatus { code: exit.code() },
                Err(e) => {
                    writeln!(file, "failed to start {}: {}", command.program().to_string_lossy(), e)?;
                    CommandStatus {
                        code: Some(SPAWN_FAILURE_CODE),
                    }
                }
            }
        };

        self.report(label, status);
        Ok(status)
    }

    /// Run `command` and return its output, also appending it to the log
    pub fn capture(&self, command: &ExternalCommand, label: &str) -> Result<CapturedOutput> {
        let mut file = self.log.append()?;
        self.log.header(&mut file, label, command)?;

        debug!(label, command = %command, "capturing");
        let output = command.to_command().stdin(Stdio::null()).output();

        let captured = match output {
            Ok(output) => CapturedOutput {
                status: CommandStatus {
                    code: output.status.code(),
                },
                stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
                stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            },
            Err(e) => CapturedOutput {
                status: CommandStatus {
                    code: Some(SPAWN_FAILURE_CODE),
                },
                stdout: String::new(),
                stderr: format!("failed to start {}: {}", command.program().to_string_lossy(), e),
            },
        };

        file.write_all(captured.stdout.as_bytes())?;
        file.write_all(captured.stderr.as_bytes())?;
        Ok(captured)
    }

    fn spinner(&self, label: &str) -> Spinner {
        if self.interactive {
            Spinner::start(label)
        } else {
            Spinner::hidden()
        }
    }

    fn report(&self, label: &str, outcome: CommandStatus) {
        if outcome.success() {
            debug!(label, "done");
            if self.interactive {
                status::ok(&format!("{}: done", label));
            }
            return;
        }

        let code = outcome
            .code
            .map(|c| c.to_string())
            .unwrap_or_else(|| "signal".to_string());
        warn!(label, code = %code, log = %self.log.path().display(), "command failed");
        if self.interactive {
            status::fail(&format!("{}: error (code {})", label, code));
        }
    }
}
