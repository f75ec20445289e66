use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use rayon::prelude::*;

use super::docker::extract_image_hash;
use super::protection::{Policy, Verdict};
use super::size::{calculate_size, format_size};
use crate::error::{Result, SweepError};
use crate::logging::Logger;

/// Name prefix of every asset staged into a cloud assembly
pub(crate) const ARTIFACT_PREFIX: &str = "asset.";

/// Name prefixes of scratch directories CDK and jsii leave in the temp dir
pub(crate) const TEMP_PREFIXES: &[&str] = &[
    "cdk.out",
    "cdk-docker-cp-",
    "cdk-asset-",
    "cdk-assets-",
    "jsii-kernel-",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    File,
    Directory,
    /// Symlinks, sockets and anything else that is neither
    Other,
}

/// A direct child of the sweep root that is eligible for deletion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    name: String,
    path: PathBuf,
    kind: EntryKind,
}

impl Candidate {
    pub fn new(name: impl Into<String>, path: impl Into<PathBuf>, kind: EntryKind) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
            kind,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn kind(&self) -> EntryKind {
        self.kind
    }
}

/// List the children of `root` whose name starts with one of `prefixes`.
///
/// Anything else in `root` is never considered, whatever its age or
/// reference state. Failing to list `root` is fatal; an entry that cannot be
/// read is skipped with a warning.
pub(crate) fn discover_candidates(
    root: &Path,
    prefixes: &[&str],
    log: Logger,
) -> Result<Vec<Candidate>> {
    let entries = fs::read_dir(root).map_err(|source| SweepError::IoError {
        path: root.to_path_buf(),
        source,
    })?;

    let mut candidates = Vec::new();
    for entry in entries {
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) => {
                log.warn(format!(
                    "skipping unreadable entry in '{}': {err}",
                    root.display()
                ));
                continue;
            }
        };

        let name = entry.file_name().to_string_lossy().into_owned();
        if !prefixes.iter().any(|prefix| name.starts_with(prefix)) {
            continue;
        }

        // the entry may disappear between listing and inspecting it
        let kind = match entry.file_type() {
            Ok(file_type) if file_type.is_dir() => EntryKind::Directory,
            Ok(file_type) if file_type.is_file() => EntryKind::File,
            _ => EntryKind::Other,
        };

        candidates.push(Candidate::new(name, entry.path(), kind));
    }

    candidates.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(candidates)
}

/// One candidate selected for deletion
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlanEntry {
    candidate: Candidate,
    size: u64,
    image_hash: Option<String>,
}

impl PlanEntry {
    pub fn candidate(&self) -> &Candidate {
        &self.candidate
    }

    pub fn path(&self) -> &Path {
        self.candidate.path()
    }

    pub fn name(&self) -> &str {
        self.candidate.name()
    }

    /// Bytes reclaimed by deleting this entry
    pub fn size(&self) -> u64 {
        self.size
    }

    /// Hash of the container image built from this entry, if it is a
    /// container-build artifact
    pub fn image_hash(&self) -> Option<&str> {
        self.image_hash.as_deref()
    }
}

/// Everything one sweep would delete, ordered by name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeletionPlan {
    root: PathBuf,
    entries: Vec<PlanEntry>,
}

impl DeletionPlan {
    /// The directory the candidates were taken from
    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn entries(&self) -> &[PlanEntry] {
        &self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn total_size(&self) -> u64 {
        self.entries.iter().map(PlanEntry::size).sum()
    }

    /// Container image hashes of the container-build artifacts in the plan
    pub fn image_hashes(&self) -> Vec<&str> {
        self.entries
            .iter()
            .filter_map(PlanEntry::image_hash)
            .collect()
    }
}

/// Evaluate every candidate against `policy` and size the ones that fail it.
///
/// Candidates are evaluated in parallel. `detect_images` controls whether
/// container-build artifacts get their image hash extracted.
pub(crate) fn build_plan(
    root: &Path,
    candidates: Vec<Candidate>,
    policy: &Policy<'_>,
    detect_images: bool,
    log: Logger,
) -> DeletionPlan {
    let mut entries: Vec<PlanEntry> = candidates
        .into_par_iter()
        .filter_map(|candidate| match policy.evaluate(&candidate) {
            Verdict::Protect(reason) => {
                log.verbose(
                    2,
                    format!("  Keeping {}: {}", candidate.name(), reason.describe()),
                );
                None
            }
            Verdict::Delete => {
                let size = calculate_size(candidate.path());
                let image_hash = if detect_images {
                    extract_image_hash(candidate.path())
                } else {
                    None
                };
                log.verbose(
                    2,
                    format!("  Selecting {} ({})", candidate.name(), format_size(size)),
                );
                Some(PlanEntry {
                    candidate,
                    size,
                    image_hash,
                })
            }
        })
        .collect();

    entries.sort_by(|a, b| a.name().cmp(b.name()));
    entries.dedup_by(|a, b| a.path() == b.path());

    DeletionPlan {
        root: root.to_path_buf(),
        entries,
    }
}

/// Outcome of applying a [`DeletionPlan`]
#[derive(Debug, Default)]
pub struct ExecutionReport {
    removed: Vec<PathBuf>,
    bytes_freed: u64,
    failures: Vec<SweepError>,
}

impl ExecutionReport {
    pub fn removed(&self) -> &[PathBuf] {
        &self.removed
    }

    pub fn bytes_freed(&self) -> u64 {
        self.bytes_freed
    }

    /// Entries that could not be removed
    pub fn failures(&self) -> &[SweepError] {
        &self.failures
    }
}

/// Delete every entry of `plan`, in parallel.
///
/// An entry that is already gone counts as removed. Other failures are
/// collected and do not stop the remaining deletions.
pub(crate) fn execute_plan(plan: &DeletionPlan, log: Logger) -> ExecutionReport {
    let results: Vec<(&PlanEntry, std::result::Result<(), SweepError>)> = plan
        .entries()
        .par_iter()
        .map(|entry| (entry, remove_entry(entry.candidate())))
        .collect();

    let mut report = ExecutionReport::default();
    for (entry, result) in results {
        match result {
            Ok(()) => {
                log.verbose(1, format!("Removed {}", entry.path().display()));
                report.removed.push(entry.path().to_path_buf());
                report.bytes_freed += entry.size();
            }
            Err(err) => {
                log.warn(format!("failed to remove '{}'", entry.path().display()));
                report.failures.push(err);
            }
        }
    }

    report
}

fn remove_entry(candidate: &Candidate) -> Result<()> {
    let path = candidate.path();
    let result = match candidate.kind() {
        EntryKind::Directory => fs::remove_dir_all(path),
        EntryKind::File | EntryKind::Other => fs::remove_file(path),
    };

    match result {
        Ok(()) => Ok(()),
        Err(err) if err.kind() == ErrorKind::NotFound => Ok(()),
        Err(source) => Err(SweepError::IoError {
            path: path.to_path_buf(),
            source,
        }),
    }
}
