//! Implementation of the cdk-sweep command.
//!
//! `mod.rs` is a thin dispatcher: it turns the parsed [`Cli`] into a
//! [`Sweep`](crate::gc::Sweep), runs it and renders the report (`report`).
//!
//! # Example
//!
//! ```no_run
//! use cdk_sweep::cli::Cli;
//! use cdk_sweep::commands;
//!
//! let cli = Cli::parse_args();
//! if let Err(e) = commands::execute(&cli) {
//!     eprintln!("Error: {e:?}");
//! }
//! ```

use std::io::{self, Write};
use std::path::PathBuf;

use crate::cli::Cli;
use crate::error::{Result, SweepError};
use crate::gc::{Sweep, SweepOutcome};

pub(crate) mod report;

pub use report::render_outcome;


/// Execute the sweep described by the parsed CLI arguments, printing the
/// report to stdout.
pub fn execute(cli: &Cli) -> Result<()> {
    let mut stdout = io::stdout().lock();
    execute_with_output(cli, &mut stdout).map(|_| ())
}

/// Execute the sweep and write the report to `out`.
///
/// Nothing is written in quiet mode.
pub fn execute_with_output(cli: &Cli, out: &mut dyn Write) -> Result<SweepOutcome> {
    let sweep = sweep_for(cli)?;
    let outcome = sweep.perform_sweep()?;

    if !cli.quiet() {
        render_outcome(&outcome, out).map_err(|source| SweepError::IoError {
            path: PathBuf::from("<stdout>"),
            source,
        })?;
    }

    Ok(outcome)
}

/// Build the [`Sweep`] configured by `cli`
pub fn sweep_for(cli: &Cli) -> Result<Sweep> {
    let mut builder = Sweep::builder()
        .tmp(cli.tmp())
        .dry_run(cli.dry_run())
        .keep_hours(i64::from(cli.keep_hours()))
        .verbose(if cli.quiet() { 0 } else { cli.verbose() })
        .quiet(cli.quiet());

    if let Some(outdir) = cli.explicit_outdir() {
        builder = builder.outdir(outdir);
    }

    builder.build()
}
