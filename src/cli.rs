//! Command-line interface definitions for cdk-sweep.
//!
//! This module defines the CLI structure using clap. The main entry point is
//! the [`Cli`] struct.
//!
//! # Example
//!
//! ```no_run
//! use cdk_sweep::cli::Cli;
//!
//! let cli = Cli::parse_args();
//!
//! if cli.tmp() {
//!     println!("Sweeping the temp directory");
//! } else {
//!     println!("Sweeping {}", cli.outdir().display());
//! }
//! ```

use std::path::{Path, PathBuf};

use clap::Parser;

use crate::error::{Result, SweepError};
use crate::gc::DEFAULT_OUTDIR;

#[cfg(test)]
mod tests;

/// Command-line interface for cdk-sweep.
#[derive(Debug, Parser)]
#[command(
    name = "cdk-sweep",
    bin_name = "cdk-sweep",
    author,
    version,
    about = "Remove unreferenced assets from CDK output directories",
    long_about = None
)]
pub struct Cli {
    /// CDK output directory to sweep [default: cdk.out]
    #[arg(short, long, value_name = "DIR")]
    outdir: Option<PathBuf>,

    /// Show what would be deleted without actually deleting
    #[arg(long, env = "CDK_SWEEP_DRY_RUN")]
    dry_run: bool,

    /// Keep assets modified within this many hours (0 keeps nothing)
    #[arg(
        long,
        value_name = "HOURS",
        default_value = "0",
        allow_negative_numbers = true,
        value_parser = parse_keep_hours,
        env = "CDK_SWEEP_KEEP_HOURS"
    )]
    keep_hours: u32,

    /// Sweep CDK scratch directories in the system temp directory instead
    /// of an output directory
    #[arg(long, conflicts_with = "outdir")]
    tmp: bool,

    /// Enable verbose output (use multiple times for more verbosity)
    #[arg(short, long, action = clap::ArgAction::Count, env = "CDK_SWEEP_VERBOSE")]
    verbose: u8,

    /// Silence all output except for errors
    #[arg(short, long, conflicts_with = "verbose", env = "CDK_SWEEP_QUIET")]
    quiet: bool,
}

/// Parse `--keep-hours`, rejecting negative and non-numeric values
pub(crate) fn parse_keep_hours(value: &str) -> Result<u32> {
    let trimmed = value.trim();
    if trimmed.starts_with('-') {
        return Err(SweepError::InvalidRetention(format!(
            "{trimmed} (must not be negative)"
        )));
    }

    trimmed
        .parse::<u32>()
        .map_err(|_| SweepError::InvalidRetention(format!("{trimmed} (not a whole number)")))
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Create a builder for programmatic construction
    pub fn builder() -> CliBuilder {
        CliBuilder::default()
    }

    /// The output directory, falling back to `cdk.out`
    pub fn outdir(&self) -> &Path {
        self.outdir
            .as_deref()
            .unwrap_or_else(|| Path::new(DEFAULT_OUTDIR))
    }

    /// The output directory, only if one was given explicitly
    pub fn explicit_outdir(&self) -> Option<&Path> {
        self.outdir.as_deref()
    }

    pub fn dry_run(&self) -> bool {
        self.dry_run
    }

    pub fn keep_hours(&self) -> u32 {
        self.keep_hours
    }

    pub fn tmp(&self) -> bool {
        self.tmp
    }

    pub fn verbose(&self) -> u8 {
        self.verbose
    }

    pub fn quiet(&self) -> bool {
        self.quiet
    }
}

/// Builder for [`Cli`]
#[derive(Debug, Default)]
pub struct CliBuilder {
    outdir: Option<PathBuf>,
    dry_run: bool,
    keep_hours: u32,
    tmp: bool,
    verbose: u8,
    quiet: bool,
}

impl CliBuilder {
    /// Set the output directory
    pub fn outdir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.outdir = Some(dir.into());
        self
    }

    /// Enable dry run mode
    pub fn dry_run(mut self, enabled: bool) -> Self {
        self.dry_run = enabled;
        self
    }

    /// Set the retention window in hours
    pub fn keep_hours(mut self, hours: u32) -> Self {
        self.keep_hours = hours;
        self
    }

    /// Sweep the temp directory instead of an output directory
    pub fn tmp(mut self, enabled: bool) -> Self {
        self.tmp = enabled;
        self
    }

    /// Set the verbose level
    pub fn verbose(mut self, level: u8) -> Self {
        self.verbose = level;
        self
    }

    /// Enable quiet mode
    pub fn quiet(mut self, enabled: bool) -> Self {
        self.quiet = enabled;
        self
    }

    /// Build the Cli instance
    pub fn build(self) -> Result<Cli> {
        if self.tmp && self.outdir.is_some() {
            return Err(SweepError::ConfigError(
                "--tmp cannot be combined with --outdir".to_string(),
            ));
        }

        Ok(Cli {
            outdir: self.outdir,
            dry_run: self.dry_run,
            keep_hours: self.keep_hours,
            tmp: self.tmp,
            verbose: self.verbose,
            quiet: self.quiet,
        })
    }
}
