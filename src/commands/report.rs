//! Human-readable sweep report.

use std::error::Error;
use std::io::{self, Write};

use crate::error::SweepError;
use crate::gc::{DeletionPlan, SweepOutcome, format_size};

/// Write the report for `outcome` to `out`.
///
/// The plan section is identical for dry runs and real runs; only the
/// trailing summary differs.
pub fn render_outcome(outcome: &SweepOutcome, out: &mut dyn Write) -> io::Result<()> {
    match outcome {
        SweepOutcome::NothingToDo { root, .. } => {
            writeln!(out, "Nothing to clean in {}", root.display())
        }
        SweepOutcome::DryRun { plan, .. } => {
            render_plan(plan, out)?;
            writeln!(out, "(DRY RUN - nothing was deleted)")
        }
        SweepOutcome::Swept {
            plan,
            report,
            images_removed,
            ..
        } => {
            render_plan(plan, out)?;
            writeln!(
                out,
                "Removed {} of {} entries, freed {}",
                report.removed().len(),
                plan.len(),
                format_size(report.bytes_freed())
            )?;
            if !report.failures().is_empty() {
                writeln!(out, "Failed to remove {} entries:", report.failures().len())?;
                for failure in report.failures() {
                    writeln!(out, "  {}", describe_failure(failure))?;
                }
            }
            if !images_removed.is_empty() {
                writeln!(out, "Removed {} container images:", images_removed.len())?;
                for tag in images_removed {
                    writeln!(out, "  {tag}")?;
                }
            }
            Ok(())
        }
    }
}

fn render_plan(plan: &DeletionPlan, out: &mut dyn Write) -> io::Result<()> {
    writeln!(out, "Assets to remove from {}:", plan.root().display())?;

    let width = plan
        .entries()
        .iter()
        .map(|entry| entry.name().len())
        .max()
        .unwrap_or(0);
    for entry in plan.entries() {
        writeln!(
            out,
            "  {:<width$}  {}",
            entry.name(),
            format_size(entry.size())
        )?;
    }

    writeln!(
        out,
        "Total reclaimable: {} in {} entries",
        format_size(plan.total_size()),
        plan.len()
    )?;

    let hashes = plan.image_hashes();
    if !hashes.is_empty() {
        writeln!(out, "Container images built from removed assets:")?;
        for hash in hashes {
            writeln!(out, "  {hash}")?;
        }
    }

    Ok(())
}

/// A failure with its underlying cause, e.g. the permission error behind an
/// I/O failure
pub(crate) fn describe_failure(failure: &SweepError) -> String {
    match failure.source() {
        Some(cause) => format!("{failure}: {cause}"),
        None => failure.to_string(),
    }
}
