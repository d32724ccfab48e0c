//! Child-process execution seam
//!
//! The orchestrator only ever reaches external tools through the [`Runner`]
//! trait; tests substitute a recording fake. The real implementation wraps
//! `std::process` and the `which` search-path lookup.

use std::path::PathBuf;
use std::process::{Command, Stdio};

use crate::error::{Error, Result};

/// How a child's output streams are wired.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Echo {
    /// Child inherits the parent's streams; the command line is shown first.
    Live,
    /// Output is captured and read back only for diagnostics.
    Captured,
}

/// Outcome of one child-process invocation.
///
/// Exit status and captured output are the only signals read back from a
/// child; there is no streaming interaction beyond the inherited streams of
/// [`Echo::Live`].
#[derive(Debug, Clone)]
pub struct RunReport {
    pub success: bool,
    pub code: Option<i32>,
    /// Captured stdout; empty under [`Echo::Live`].
    pub stdout: String,
    /// Captured stderr; empty under [`Echo::Live`].
    pub stderr: String,
}

/// One command line: a program plus its arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub program: String,
    pub args: Vec<String>,
}

impl Invocation {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }

    /// Render for the `$ ...` echo line and error messages.
    pub fn display(&self) -> String {
        let mut out = self.program.clone();
        for arg in &self.args {
            out.push(' ');
            out.push_str(arg);
        }
        out
    }
}

/// Search-path resolution and child-process execution.
pub trait Runner {
    /// Resolve an executable name on the search path.
    fn resolve(&self, name: &str) -> Option<PathBuf>;

    /// Run a program directly.
    fn run(&self, invocation: &Invocation, echo: Echo) -> Result<RunReport>;

    /// Run a command line through the platform command interpreter.
    fn run_shell(&self, command: &str, echo: Echo) -> Result<RunReport>;
}

/// Runner backed by the real system.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemRunner;

impl SystemRunner {
    fn execute(&self, mut cmd: Command, shown: &str, echo: Echo) -> Result<RunReport> {
        tracing::debug!(command = shown, ?echo, "running child process");
        match echo {
            Echo::Live => {
                println!("$ {shown}");
                let status = cmd
                    .stdin(Stdio::inherit())
                    .stdout(Stdio::inherit())
                    .stderr(Stdio::inherit())
                    .status()
                    .map_err(|source| Error::Spawn {
                        command: shown.to_string(),
                        source,
                    })?;
                Ok(RunReport {
                    success: status.success(),
                    code: status.code(),
                    stdout: String::new(),
                    stderr: String::new(),
                })
            }
            Echo::Captured => {
                let output = cmd.output().map_err(|source| Error::Spawn {
                    command: shown.to_string(),
                    source,
                })?;
                Ok(RunReport {
                    success: output.status.success(),
                    code: output.status.code(),
                    stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
                    stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
                })
            }
        }
    }
}

impl Runner for SystemRunner {
    fn resolve(&self, name: &str) -> Option<PathBuf> {
        which::which(name).ok()
    }

    fn run(&self, invocation: &Invocation, echo: Echo) -> Result<RunReport> {
        let mut cmd = Command::new(&invocation.program);
        cmd.args(&invocation.args);
        self.execute(cmd, &invocation.display(), echo)
    }

    fn run_shell(&self, command: &str, echo: Echo) -> Result<RunReport> {
        let cmd = if cfg!(windows) {
            let mut cmd = Command::new("cmd");
            cmd.args(["/C", command]);
            cmd
        } else {
            let mut cmd = Command::new("sh");
            cmd.args(["-c", command]);
            cmd
        };
        self.execute(cmd, command, echo)
    }
}
