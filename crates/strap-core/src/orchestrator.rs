//! The bootstrap state machine
//!
//! Strictly sequential stages: prerequisite check, environment creation,
//! dependency installation, optional post-bootstrap hook. Prerequisite,
//! environment-creation and primary-install failures abort the run;
//! dev-requirements and hook failures are reported and absorbed. Reruns are
//! safe: each stage re-detects existing state instead of assuming a clean
//! slate.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use strap_config::{ConfigStore, Settings, native_path};

use crate::args::section_to_args;
use crate::diagnostics::{Diagnostics, print_error, print_error_plain};
use crate::error::{Error, Result};
use crate::interpolate::InterpolationContext;
use crate::runner::{Echo, Invocation, RunReport, Runner};

/// The environment-creation tool; always checked as a prerequisite.
pub const ENV_TOOL: &str = "virtualenv";
/// The dependency installer, resolved inside the target environment.
pub const INSTALLER: &str = "pip";

/// Install mode, decided from the requirements path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstallMode {
    /// The requirements file exists: install from it.
    Project,
    /// No requirements file: editable install of the current directory.
    Library,
}

impl InstallMode {
    fn label(self) -> &'static str {
        match self {
            InstallMode::Project => "project",
            InstallMode::Library => "library",
        }
    }
}

/// Drives one bootstrap run against an injected [`Runner`].
pub struct Orchestrator<'a> {
    settings: Settings,
    store: ConfigStore,
    runner: &'a dyn Runner,
    diagnostics: &'a Diagnostics,
    /// Path of a pre-activated environment the process runs inside, if any.
    activated_env: Option<String>,
}

impl<'a> Orchestrator<'a> {
    pub fn new(store: ConfigStore, runner: &'a dyn Runner, diagnostics: &'a Diagnostics) -> Self {
        let settings = Settings::from_store(&store);
        let activated_env = std::env::var("VIRTUAL_ENV")
            .ok()
            .filter(|value| !value.is_empty());
        Self {
            settings,
            store,
            runner,
            diagnostics,
            activated_env,
        }
    }

    /// Override the activated-environment probe (tests).
    pub fn with_activated_env(mut self, activated_env: Option<String>) -> Self {
        self.activated_env = activated_env;
        self
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Run all stages. `Ok(())` is the overall success outcome; dev
    /// requirements and the hook cannot change it.
    pub fn run(&self) -> Result<()> {
        self.check_prerequisites()?;
        let context = self.interpolation_context();
        self.create_env(&context)?;
        self.install(&context)?;
        self.run_hook(&context)?;
        if !self.settings.quiet {
            println!("All OK!");
        }
        Ok(())
    }

    /// Stage 1: every prerequisite must resolve on the search path before
    /// any side effect happens.
    fn check_prerequisites(&self) -> Result<()> {
        let mut names: BTreeSet<&str> = self
            .settings
            .pre_requirements
            .iter()
            .map(String::as_str)
            .collect();
        names.insert(ENV_TOOL);

        for name in names {
            tracing::debug!(name, "checking prerequisite");
            if self.runner.resolve(name).is_none() {
                return Err(Error::MissingPrerequisite {
                    name: name.to_string(),
                });
            }
        }
        Ok(())
    }

    /// Stage 2: create the virtual environment unless an existing one
    /// already satisfies the run.
    fn create_env(&self, context: &InterpolationContext) -> Result<()> {
        let settings = &self.settings;
        let inside_env = self.activated_env.is_some();
        let env_exists = Path::new(&settings.env).is_dir();

        self.banner("== Step 1. Create virtual environment ==");

        // ignore_activated only forces creation while the directory is
        // absent; an existing directory always wins over it.
        let create = settings.recreate
            || (!inside_env && !env_exists)
            || (settings.ignore_activated && !env_exists);

        if !create {
            if !settings.quiet {
                if inside_env {
                    println!("Working inside of virtual environment, done...");
                } else {
                    println!(
                        "Virtual environment {:?} already created, done...",
                        settings.env
                    );
                }
                println!();
            }
            return Ok(());
        }

        let env_options = context.expand_section(&self.store.env_tool)?;
        let mut args = section_to_args(&env_options);
        args.push(settings.env.clone());
        let invocation = Invocation::new(ENV_TOOL, args);

        let report = {
            let _scope = self.diagnostics.suspend();
            self.runner.run(&invocation, self.echo())?
        };
        if !report.success {
            return Err(self.child_failure(invocation.display(), &report));
        }

        self.gap();
        Ok(())
    }

    /// Stage 3: install the project or library, then best-effort dev
    /// requirements.
    fn install(&self, context: &InterpolationContext) -> Result<()> {
        let settings = &self.settings;
        let mode = if Path::new(&settings.requirements).is_file() {
            InstallMode::Project
        } else {
            InstallMode::Library
        };
        tracing::debug!(mode = mode.label(), "selected install mode");

        self.banner(&format!("== Step 2. Install {} ==", mode.label()));

        let installer_options = context.expand_section(&self.store.installer)?;
        let mut args = section_to_args(&installer_options);
        match mode {
            InstallMode::Project => {
                args.push("-r".to_string());
                args.push(settings.requirements.clone());
            }
            InstallMode::Library => {
                args.extend(["-U".to_string(), "-e".to_string(), ".".to_string()]);
            }
        }

        let (invocation, report) = self.pip(args)?;
        if !report.success {
            return Err(self.child_failure(invocation.display(), &report));
        }
        self.gap();

        if settings.dev_requirements && mode == InstallMode::Project {
            self.install_dev_requirements();
        }
        Ok(())
    }

    /// Install the companion dev-requirements file if one exists. Failures
    /// are reported but never fail the overall run.
    fn install_dev_requirements(&self) {
        let Some(dev_requirements) = find_dev_requirements(&self.settings.requirements) else {
            return;
        };

        self.banner("== Install dev requirements ==");
        let args = vec!["-r".to_string(), dev_requirements.display().to_string()];
        match self.pip(args) {
            Ok((_, report)) if report.success => {}
            Ok((invocation, report)) => {
                print_error(&Error::ChildProcess {
                    command: invocation.display(),
                    code: report.code.unwrap_or(-1),
                }
                .to_string());
            }
            Err(err) => print_error(&err.to_string()),
        }
        self.gap();
    }

    /// Stage 4: run the post-bootstrap hook through the platform command
    /// interpreter. A failing hook is reported but never fails the run.
    fn run_hook(&self, context: &InterpolationContext) -> Result<()> {
        let Some(hook) = &self.settings.hook else {
            return Ok(());
        };

        self.banner("== Step 3. Run post-bootstrap hook ==");
        let command = context.expand(hook)?;

        let outcome = {
            let _scope = self.diagnostics.suspend();
            self.runner.run_shell(&command, self.echo())
        };
        match outcome {
            Ok(report) if report.success => {}
            Ok(report) => {
                if !report.stderr.trim().is_empty() {
                    print_error_plain(report.stderr.trim());
                }
                print_error(&format!(
                    "Hook {:?} returned non-zero exit status {}",
                    command,
                    report.code.unwrap_or(-1)
                ));
            }
            Err(err) => print_error(&err.to_string()),
        }

        self.gap();
        Ok(())
    }

    /// Build the per-run interpolation context: process environment plus
    /// the resolved runtime paths.
    fn interpolation_context(&self) -> InterpolationContext {
        let mut context = InterpolationContext::from_env();
        context.set("env", &self.settings.env);
        context.set("requirements", &self.settings.requirements);
        context.set(INSTALLER, self.installer_path().display().to_string());
        context
    }

    /// Path of the installer executable for the target environment.
    ///
    /// A pre-activated environment wins unless the run ignores it.
    fn installer_path(&self) -> PathBuf {
        let mut dir = PathBuf::from(native_path(&self.settings.env));
        if !self.settings.ignore_activated
            && let Some(active) = &self.activated_env
        {
            dir = PathBuf::from(active);
        }
        let bin = if cfg!(windows) { "Scripts" } else { "bin" };
        let exe = if cfg!(windows) { "pip.exe" } else { "pip" };
        dir.join(bin).join(exe)
    }

    /// Run `pip install` from the target environment.
    fn pip(&self, args: Vec<String>) -> Result<(Invocation, RunReport)> {
        let pip = self.installer_path();
        if !pip.is_file() {
            return Err(Error::InstallerNotFound { path: pip });
        }

        let mut all_args = vec!["install".to_string()];
        all_args.extend(args);
        let invocation = Invocation::new(pip.display().to_string(), all_args);

        let report = {
            let _scope = self.diagnostics.suspend();
            self.runner.run(&invocation, self.echo())?
        };
        Ok((invocation, report))
    }

    fn child_failure(&self, command: String, report: &RunReport) -> Error {
        // Captured stderr is surfaced here; Live mode already echoed it.
        if !report.stderr.trim().is_empty() {
            print_error_plain(report.stderr.trim());
        }
        Error::ChildProcess {
            command,
            code: report.code.unwrap_or(-1),
        }
    }

    fn echo(&self) -> Echo {
        if self.settings.quiet {
            Echo::Captured
        } else {
            Echo::Live
        }
    }

    fn banner(&self, text: &str) {
        if !self.settings.quiet {
            println!("{text}");
        }
    }

    fn gap(&self) {
        if !self.settings.quiet {
            println!();
        }
    }
}

/// Probe for a companion dev-requirements file next to the primary one.
///
/// Candidates derive from the primary basename and extension and are tried
/// per delimiter, suffix form before prefix form: `base-dev`, `dev-base`,
/// `base_dev`, `dev_base`, `basedev`, `devbase`. First existing file wins.
pub fn find_dev_requirements(requirements: &str) -> Option<PathBuf> {
    let path = Path::new(requirements);
    let dir = path.parent().unwrap_or_else(|| Path::new(""));
    let base = path.file_stem().and_then(|stem| stem.to_str())?;
    let ext = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| format!(".{ext}"))
        .unwrap_or_default();

    for delimiter in ["-", "_", ""] {
        let suffixed = dir.join(format!("{base}{delimiter}dev{ext}"));
        if suffixed.is_file() {
            return Some(suffixed);
        }
        let prefixed = dir.join(format!("dev{delimiter}{base}{ext}"));
        if prefixed.is_file() {
            return Some(prefixed);
        }
    }
    None
}
