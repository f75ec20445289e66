//! Garbage collection for CDK cloud assemblies.
//!
//! This module decides which staged assets of a `cdk.out` directory are no
//! longer used and removes them:
//!
//! - [`manifest`]: reads `manifest.json` and every `*.assets.json`, including
//!   those of nested stage assemblies
//! - [`references`]: turns those descriptors into a set of live paths
//! - [`protection`]: structural, reference and recency rules
//! - [`plan`]: candidate discovery, the deletion plan and its execution
//! - [`docker`]: container images built from swept asset directories
//!
//! # Features
//!
//! - Prefix scoping: only `asset.*` entries at the top of the output
//!   directory are ever candidates
//! - Reference closure: anything referenced from any descriptor, and every
//!   directory above it, is kept
//! - Recency: an optional retention window keeps recently modified assets
//! - Parallel processing: uses rayon to evaluate and size candidates
//! - Temp mode: sweeps CDK scratch directories from the OS temp directory
//!
//! # Example
//!
//! ```no_run
//! use cdk_sweep::gc::Sweep;
//!
//! let sweep = Sweep::builder()
//!     .outdir("cdk.out")
//!     .keep_hours(24)
//!     .dry_run(true)
//!     .build()?;
//!
//! let plan = sweep.plan()?;
//! println!("{} bytes reclaimable", plan.total_size());
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod config;
pub mod docker;
pub mod manifest;
pub mod plan;
pub mod protection;
pub mod references;
mod size;

pub use config::{DEFAULT_OUTDIR, Sweep, SweepBuilder, SweepMode, SweepOutcome};
pub use docker::{DockerCli, ImageStore};
pub use plan::{DeletionPlan, ExecutionReport, PlanEntry};
pub use references::References;
pub(crate) use size::format_size;
