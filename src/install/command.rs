//! External process execution with optional time bounds.
//!
//! Every tool the installer shells out to (driver query, `schtasks`, the
//! driver package installer) goes through [`CommandRunner`], so detection and
//! task registration can be exercised with a scripted runner in tests.

use std::ffi::{OsStr, OsString};
use std::fmt;
use std::io::{self, PipeReader, Read};
use std::path::PathBuf;
use std::process::{Command, Stdio};
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use log::{debug, warn};
use wait_timeout::ChildExt;

use super::InstallerError;

/// Driver query tool bound.
pub const DRIVER_QUERY_TIMEOUT: Duration = Duration::from_secs(3);
/// `schtasks /Delete` bound.
pub const TASK_DELETE_TIMEOUT: Duration = Duration::from_secs(1);
/// `schtasks /Create` bound.
pub const TASK_CREATE_TIMEOUT: Duration = Duration::from_secs(3);

/// A program invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    pub program: PathBuf,
    pub args: Vec<OsString>,
    /// Inherit the console instead of capturing output.
    pub foreground: bool,
}

impl CommandSpec {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            foreground: false,
        }
    }

    pub fn arg(mut self, arg: impl AsRef<OsStr>) -> Self {
        self.args.push(arg.as_ref().to_os_string());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        self.args
            .extend(args.into_iter().map(|a| a.as_ref().to_os_string()));
        self
    }

    pub fn foreground(mut self) -> Self {
        self.foreground = true;
        self
    }

    /// Arguments as lossy strings, handy for logging and assertions.
    pub fn arg_strings(&self) -> Vec<String> {
        self.args
            .iter()
            .map(|a| a.to_string_lossy().into_owned())
            .collect()
    }
}

impl fmt::Display for CommandSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program.display())?;
        for arg in &self.args {
            write!(f, " {}", arg.to_string_lossy())?;
        }
        Ok(())
    }
}

/// Result of a finished (or forcibly stopped) invocation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    /// Exit code; `None` when the process was killed or died from a signal.
    pub code: Option<i32>,
    /// stdout followed by stderr, lossily decoded. Empty for foreground runs.
    pub output: String,
    pub timed_out: bool,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }
}

/// Runs external programs synchronously.
pub trait CommandRunner {
    /// Run `spec`, waiting at most `timeout` (forever when `None`) before
    /// killing it. Only a failure to start the program is an error.
    fn run(
        &self,
        spec: &CommandSpec,
        timeout: Option<Duration>,
    ) -> Result<CommandOutput, InstallerError>;
}

/// Runs programs on the host with `std::process`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemRunner;

impl CommandRunner for SystemRunner {
    fn run(
        &self,
        spec: &CommandSpec,
        timeout: Option<Duration>,
    ) -> Result<CommandOutput, InstallerError> {
        debug!("Running: {spec}");

        let spawn_error = |source| InstallerError::Command {
            program: spec.program.display().to_string(),
            source,
        };

        let mut command = Command::new(&spec.program);
        command.args(&spec.args);

        // Both channels share one pipe so the captured text keeps write order.
        let reader = if spec.foreground {
            command
                .stdin(Stdio::inherit())
                .stdout(Stdio::inherit())
                .stderr(Stdio::inherit());
            None
        } else {
            let (reader, writer) = io::pipe().map_err(spawn_error)?;
            command
                .stdin(Stdio::null())
                .stdout(writer.try_clone().map_err(spawn_error)?)
                .stderr(writer);
            Some(reader)
        };

        let mut child = command.spawn().map_err(spawn_error)?;
        // Release the parent's write ends, or the reader never sees EOF.
        drop(command);

        let drain = reader.map(spawn_drain);

        let (status, timed_out) = match timeout {
            None => (child.wait()?, false),
            Some(limit) => match child.wait_timeout(limit)? {
                Some(status) => (status, false),
                None => {
                    warn!("{} did not finish within {limit:?}, killing it", spec.program.display());
                    // The child may exit between the timeout and the kill.
                    let _ = child.kill();
                    (child.wait()?, true)
                }
            },
        };

        let output = match drain {
            Some(rx) => collect_output(&rx),
            None => String::new(),
        };

        Ok(CommandOutput {
            code: if timed_out { None } else { status.code() },
            output,
            timed_out,
        })
    }
}

/// How long to wait for the output pipe to close once the child is gone.
/// A grandchild that inherited the pipe can keep it open indefinitely.
const OUTPUT_GRACE: Duration = Duration::from_millis(500);

fn spawn_drain(mut reader: PipeReader) -> mpsc::Receiver<Vec<u8>> {
    let (tx, rx) = mpsc::channel();
    thread::spawn(move || {
        let mut bytes = Vec::new();
        if let Err(e) = reader.read_to_end(&mut bytes) {
            debug!("Output pipe read failed: {e}");
        }
        let _ = tx.send(bytes);
    });
    rx
}

fn collect_output(rx: &mpsc::Receiver<Vec<u8>>) -> String {
    match rx.recv_timeout(OUTPUT_GRACE) {
        Ok(bytes) => String::from_utf8_lossy(&bytes).into_owned(),
        Err(_) => {
            warn!("Output pipe still open after the process exited, discarding output");
            String::new()
        }
    }
}
