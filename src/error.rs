//! Error types for cdk-sweep.
//!
//! This module defines all error types used throughout cdk-sweep, using
//! a combination of `thiserror` for ergonomic error definitions and `miette`
//! for rich diagnostic output.
//!
//! # Error Handling Strategy
//!
//! - All errors derive from [`SweepError`]
//! - Fatal conditions (missing output directory, invalid configuration) are
//!   returned before anything is deleted
//! - Recoverable conditions (a malformed asset descriptor, an unreadable
//!   directory) are reported as warnings and the scan continues
//! - Errors are automatically converted to `miette::Result` for CLI output
//!
//! # Example
//!
//! ```no_run
//! use std::path::Path;
//!
//! use cdk_sweep::error::{Result, SweepError};
//!
//! fn check_outdir(path: &Path) -> Result<()> {
//!     if !path.is_dir() {
//!         return Err(SweepError::OutputDirNotFound(path.to_path_buf()));
//!     }
//!     Ok(())
//! }
//! ```

use std::path::PathBuf;

use miette::Diagnostic;
use thiserror::Error;

/// Error types that can occur in cdk-sweep operations
#[derive(Error, Debug, Diagnostic)]
pub enum SweepError {
    /// The CDK output directory does not exist or is not a directory.
    ///
    /// Raised before any scanning begins, so nothing has been read or
    /// deleted when this is reported.
    #[error("Output directory not found: '{0}'")]
    #[diagnostic(
        code(cdk_sweep::outdir::not_found),
        help("Run 'cdk synth' first, or point --outdir at an existing cloud assembly.")
    )]
    OutputDirNotFound(
        /// The directory that was expected to exist
        PathBuf,
    ),

    /// File system I/O error during cdk-sweep operations.
    ///
    /// Common causes: permission denied, file not found, or a path removed by
    /// another process while the sweep was running.
    #[error("I/O error accessing '{path}'")]
    #[diagnostic(code(cdk_sweep::io_error))]
    IoError {
        /// The path that caused the I/O error
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// An asset descriptor or manifest could not be parsed as JSON.
    ///
    /// Never fatal: the file is skipped and the error is surfaced as a scan
    /// warning.
    #[error("Failed to parse '{path}'")]
    #[diagnostic(
        code(cdk_sweep::descriptor::parse_error),
        help("The file is ignored; artifacts it references are not protected by it.")
    )]
    DescriptorParse {
        /// The descriptor that failed to parse
        path: PathBuf,
        /// The underlying JSON error
        #[source]
        source: serde_json::Error,
    },

    /// Invalid value for the retention window.
    #[error("Invalid retention window: '{0}'")]
    #[diagnostic(
        code(cdk_sweep::config::invalid_retention),
        help("--keep-hours takes a non-negative whole number of hours, e.g. '--keep-hours 24'.")
    )]
    InvalidRetention(
        /// The rejected value
        String,
    ),

    /// Invalid combination of options.
    #[error("Configuration error: {0}")]
    #[diagnostic(
        code(cdk_sweep::config::error),
        help("Check the combination of command-line options.")
    )]
    ConfigError(
        /// Description of the configuration error
        String,
    ),

    /// The container runtime could not be queried or refused a removal.
    ///
    /// Only ever logged: image cleanup is best-effort and never aborts
    /// artifact deletion.
    #[error("Container runtime error: {0}")]
    #[diagnostic(
        code(cdk_sweep::docker::error),
        help("Set CDK_DOCKER to the container runtime executable if it is not 'docker'.")
    )]
    ImageStoreError(
        /// Description of the runtime failure
        String,
    ),
}

/// Type alias for Results in this crate
pub type Result<T> = std::result::Result<T, SweepError>;
