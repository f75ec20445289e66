//! # cdk-sweep
//!
//! Reclaims disk space in AWS CDK output directories by removing staged
//! assets that the current synthesis no longer references.
//!
//! ## Overview
//!
//! Every `cdk synth` stages file and container-image assets into the output
//! directory as `asset.<hash>` entries. Old ones are never removed, so a
//! long-lived `cdk.out` keeps growing. cdk-sweep reads the cloud assembly
//! (`manifest.json` and every `*.assets.json`, including those of nested
//! stages), works out which assets are still referenced, and deletes the rest.
//!
//! ## Key Features
//!
//! - **Reference tracking**: anything referenced by any descriptor, and
//!   every directory above it, is kept
//! - **Prefix scoping**: only `asset.*` entries are ever candidates; your own
//!   files in the output directory are left alone
//! - **Retention window**: optionally keep anything modified in the last N
//!   hours
//! - **Container images**: local images built from removed asset directories
//!   are removed too
//! - **Dry runs**: the plan is identical whether or not it is applied
//! - **Temp cleanup**: sweeps CDK scratch directories from the temp dir
//!
//! ## Architecture
//!
//! - [`cli`]: Command-line interface definitions using clap
//! - [`commands`]: Runs a sweep from parsed arguments and renders the report
//! - [`error`]: Error types and handling with thiserror + miette
//! - [`gc`]: Reference collection, protection policy and deletion planning
//!
//! ## Library Usage
//!
//! ```no_run
//! use cdk_sweep::gc::Sweep;
//!
//! let sweep = Sweep::builder().outdir("cdk.out").dry_run(true).build()?;
//! let outcome = sweep.perform_sweep()?;
//! if let Some(plan) = outcome.plan() {
//!     for entry in plan.entries() {
//!         println!("{} ({} bytes)", entry.path().display(), entry.size());
//!     }
//! }
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod cli;
pub mod commands;
pub mod error;
pub mod gc;

mod logging;
mod paths;
