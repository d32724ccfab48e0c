//! strap — bootstrap Python projects and libraries with virtualenv and pip
//!
//! Reads layered configuration (defaults, config file, command line),
//! provisions an isolated environment, installs declared dependencies and
//! optionally runs a post-bootstrap hook.

mod cli;

use clap::Parser;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

use strap_core::{Diagnostics, Orchestrator, SystemRunner, diagnostics};

use cli::Cli;

fn main() {
    let cli = Cli::parse();

    // Setup tracing if verbose
    if cli.verbose {
        let subscriber = FmtSubscriber::builder()
            .with_max_level(Level::DEBUG)
            .with_target(true)
            .finish();
        tracing::subscriber::set_global_default(subscriber)
            .expect("Failed to set tracing subscriber");
        tracing::debug!("Verbose mode enabled");
    }

    let diagnostics = Diagnostics::new();
    install_interrupt_handler(&diagnostics);
    let runner = SystemRunner;

    let code = diagnostics.trap(|| {
        let loaded = strap_config::load(&cli.config)?;
        let merged = strap_config::merge(&loaded, &cli.to_values());
        Orchestrator::new(merged, &runner, &diagnostics).run()
    });

    std::process::exit(code);
}

/// On Ctrl-C, note the abort in the crash log and exit non-zero. Skipped in
/// test mode, where failures re-raise instead of being trapped.
fn install_interrupt_handler(diagnostics: &Diagnostics) {
    if diagnostics.test_mode() {
        return;
    }
    let log_dir = diagnostics.log_dir().to_path_buf();
    if ctrlc::set_handler(move || {
        diagnostics::report_user_abort(&log_dir);
        std::process::exit(1);
    })
    .is_err()
    {
        tracing::debug!("could not install the interrupt handler");
    }
}
