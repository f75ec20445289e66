//! # cdk-sweep CLI
//!
//! Removes assets a CDK app no longer references from its output directory,
//! together with the local container images built from them.
//!
//! ## Usage
//!
//! ```bash
//! # Preview what would be removed from ./cdk.out
//! cdk-sweep --dry-run
//!
//! # Remove unreferenced assets older than a day from another assembly
//! cdk-sweep --outdir infra/cdk.out --keep-hours 24
//!
//! # Clean up CDK scratch directories in the system temp directory
//! cdk-sweep --tmp
//! ```
//!
//! ## Environment Variables
//!
//! - `CDK_SWEEP_DRY_RUN`: Same as `--dry-run`
//! - `CDK_SWEEP_KEEP_HOURS`: Same as `--keep-hours`
//! - `CDK_SWEEP_VERBOSE`: Enable verbose output
//! - `CDK_SWEEP_QUIET`: Silence all output except errors
//! - `CDK_DOCKER`: Container runtime used to remove images (default: docker)

use std::io::IsTerminal;

use cdk_sweep::cli::Cli;
use miette::{GraphicalReportHandler, GraphicalTheme, ReportHandler};

fn main() -> miette::Result<()> {
    miette::set_panic_hook();
    install_report_handler()?;

    let cli = Cli::parse_args();
    cdk_sweep::commands::execute(&cli).map_err(Into::into)
}

/// Unicode reports on a terminal, plain ones in CI logs
fn install_report_handler() -> miette::Result<()> {
    let interactive = std::io::stderr().is_terminal();
    miette::set_hook(Box::new(move |_| {
        let handler = if interactive {
            GraphicalReportHandler::new()
                .with_theme(GraphicalTheme::unicode_nocolor())
                .with_context_lines(3)
        } else {
            GraphicalReportHandler::new()
                .with_theme(GraphicalTheme::none())
                .with_context_lines(0)
        };
        Box::new(handler) as Box<dyn ReportHandler>
    }))?;
    Ok(())
}
