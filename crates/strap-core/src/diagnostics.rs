//! Crash logging and the failure-trap suspension scope
//!
//! The whole orchestration runs under [`Diagnostics::trap`]: known failures
//! are rendered as one crafted error line, while anything unexpected is
//! appended (with a backtrace) to a per-user log file and summarized tersely
//! — the raw trace never reaches the terminal.

use std::backtrace::Backtrace;
use std::cell::Cell;
use std::fs::OpenOptions;
use std::io::Write;
use std::panic::{self, AssertUnwindSafe};
use std::path::{Path, PathBuf};

use colored::Colorize;

use crate::error::Result;

/// Environment marker that disables failure trapping under test: failures
/// re-raise instead of being swallowed into an exit code.
pub const TEST_MODE_KEY: &str = "STRAP_TEST";

/// Per-user directory (under the home directory) holding the crash log.
const LOG_DIR: &str = ".strap";
/// Crash log filename inside the diagnostic directory.
const LOG_FILE: &str = "strap.log";

/// Print a wrapped, colorized error line to stderr.
///
/// Messages follow the `ERROR: <message>. Exit...` convention.
pub fn print_error(message: &str) {
    let wrapped = format!("ERROR: {}. Exit...", message.trim_end_matches('.'));
    eprintln!("{}", wrapped.red());
}

/// Print a colorized error line to stderr without the wrapping template.
pub fn print_error_plain(message: &str) {
    eprintln!("{}", message.red());
}

/// Failure trap state for one invocation.
///
/// Owns the suspension counter: while any [`SuspendGuard`] is alive, a stage
/// is reporting its own failures and the trap stays out of the way. Guards
/// release on every exit path, including unwinding, and scopes nest.
pub struct Diagnostics {
    suspended: Cell<usize>,
    /// Latched when a failure unwinds through an active suspension scope.
    escaped_suspended: Cell<bool>,
    test_mode: bool,
    log_dir: PathBuf,
}

impl Diagnostics {
    pub fn new() -> Self {
        let home = dirs::home_dir().unwrap_or_else(|| PathBuf::from("."));
        Self::with_log_dir(home.join(LOG_DIR))
    }

    /// Diagnostics writing the crash log under a custom directory (tests).
    pub fn with_log_dir(log_dir: PathBuf) -> Self {
        Self {
            suspended: Cell::new(0),
            escaped_suspended: Cell::new(false),
            test_mode: std::env::var_os(TEST_MODE_KEY).is_some(),
            log_dir,
        }
    }

    /// Override the [`TEST_MODE_KEY`] probe (tests).
    pub fn with_test_mode(mut self, test_mode: bool) -> Self {
        self.test_mode = test_mode;
        self
    }

    pub fn test_mode(&self) -> bool {
        self.test_mode
    }

    pub fn log_dir(&self) -> &Path {
        &self.log_dir
    }

    /// Path of the crash log file.
    pub fn log_path(&self) -> PathBuf {
        self.log_dir.join(LOG_FILE)
    }

    /// Suspend failure trapping until the returned guard drops.
    pub fn suspend(&self) -> SuspendGuard<'_> {
        self.suspended.set(self.suspended.get() + 1);
        SuspendGuard { diagnostics: self }
    }

    pub fn is_suspended(&self) -> bool {
        self.suspended.get() > 0
    }

    /// Run the orchestration under the crash trap and return the process
    /// exit code.
    ///
    /// Known failures print one crafted error line. A panic is appended to
    /// the crash log and summarized — unless it unwound through an active
    /// suspension scope (the failing stage already spoke for itself), or
    /// test mode is on, in which case the panic resumes.
    pub fn trap(&self, run: impl FnOnce() -> Result<()>) -> i32 {
        // Keep the default hook from splattering the panic onto the
        // terminal; the crash log gets the details instead.
        let previous = if self.test_mode {
            None
        } else {
            let hook = panic::take_hook();
            panic::set_hook(Box::new(|_| {}));
            Some(hook)
        };

        let outcome = panic::catch_unwind(AssertUnwindSafe(run));

        if let Some(hook) = previous {
            panic::set_hook(hook);
        }

        match outcome {
            Ok(Ok(())) => 0,
            Ok(Err(err)) => {
                print_error(&err.to_string());
                1
            }
            Err(payload) => {
                if self.test_mode {
                    panic::resume_unwind(payload);
                }
                if !self.escaped_suspended.take() {
                    self.report_crash(&panic_message(payload.as_ref()));
                }
                1
            }
        }
    }

    fn report_crash(&self, message: &str) {
        let entry = format!(
            "--- Unexpected error caught ---\n{message}\n{}",
            Backtrace::force_capture()
        );
        print_error("Unexpected error caught");
        match append_entry(&self.log_dir, &entry) {
            Ok(path) => {
                print_error_plain(&format!("Full log stored to {}", path.display()));
            }
            Err(err) => {
                print_error_plain(&format!("Could not write crash log: {err}"));
            }
        }
    }
}

impl Default for Diagnostics {
    fn default() -> Self {
        Self::new()
    }
}

/// Scope holder returned by [`Diagnostics::suspend`].
pub struct SuspendGuard<'a> {
    diagnostics: &'a Diagnostics,
}

impl Drop for SuspendGuard<'_> {
    fn drop(&mut self) {
        let count = self.diagnostics.suspended.get();
        self.diagnostics.suspended.set(count.saturating_sub(1));
        if std::thread::panicking() {
            self.diagnostics.escaped_suspended.set(true);
        }
    }
}

/// Note a user interrupt in the crash log and summarize it on stderr.
///
/// Called from the Ctrl-C handler, which runs off-thread and therefore
/// cannot share the [`Diagnostics`] state.
pub fn report_user_abort(log_dir: &Path) {
    print_error("User aborted workflow");
    if let Ok(path) = append_entry(log_dir, "--- User aborted workflow ---") {
        print_error_plain(&format!("Full log stored to {}", path.display()));
    }
}

fn append_entry(log_dir: &Path, entry: &str) -> std::io::Result<PathBuf> {
    std::fs::create_dir_all(log_dir)?;
    let path = log_dir.join(LOG_FILE);
    let mut file = OpenOptions::new().create(true).append(true).open(&path)?;
    writeln!(file, "{entry}")?;
    Ok(path)
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
