//! CLI argument parsing using clap derive
//!
//! Every flag is optional. Toggles take an optional value
//! (`--recreate` / `--recreate=false`) so "not provided" stays
//! distinguishable from a provided falsy value — the merge step needs the
//! difference.

use clap::Parser;
use strap_config::{CliValues, DEFAULT_CONFIG};

/// Bootstrap Python projects and libraries with virtualenv and pip.
#[derive(Parser, Debug)]
#[command(name = "strap")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, default_value = DEFAULT_CONFIG)]
    pub config: String,

    /// List of pre-requirements to check, separated by space
    #[arg(short = 'p', long, num_args = 1.., value_name = "NAME")]
    pub pre_requirements: Vec<String>,

    /// Virtual environment name
    #[arg(short, long)]
    pub env: Option<String>,

    /// Path to requirements file
    #[arg(short, long)]
    pub requirements: Option<String>,

    /// Install prefixed or suffixed "dev" requirements after the original
    /// requirements file installed without errors; ignored when
    /// bootstrapping a library
    #[arg(
        short = 'd',
        long,
        num_args = 0..=1,
        require_equals = true,
        default_missing_value = "true",
        value_name = "BOOL"
    )]
    pub dev_requirements: Option<bool>,

    /// Execute this hook after the bootstrap process
    #[arg(short = 'C', long)]
    pub hook: Option<String>,

    /// Ignore a pre-activated virtualenv, like on CI workers
    #[arg(
        long,
        num_args = 0..=1,
        require_equals = true,
        default_missing_value = "true",
        value_name = "BOOL"
    )]
    pub ignore_activated: Option<bool>,

    /// Recreate the virtualenv on every run
    #[arg(
        long,
        num_args = 0..=1,
        require_equals = true,
        default_missing_value = "true",
        value_name = "BOOL"
    )]
    pub recreate: Option<bool>,

    /// Minimize output, show only error messages
    #[arg(
        short,
        long,
        num_args = 0..=1,
        require_equals = true,
        default_missing_value = "true",
        value_name = "BOOL"
    )]
    pub quiet: Option<bool>,

    /// Enable verbose tracing output
    #[arg(long)]
    pub verbose: bool,
}

impl Cli {
    /// Command-line values in the shape the merge step consumes.
    pub fn to_values(&self) -> CliValues {
        CliValues {
            env: self.env.clone(),
            requirements: self.requirements.clone(),
            quiet: self.quiet,
            recreate: self.recreate,
            ignore_activated: self.ignore_activated,
            dev_requirements: self.dev_requirements,
            hook: self.hook.clone(),
            pre_requirements: self.pre_requirements.clone(),
        }
    }
}
