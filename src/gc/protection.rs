//! Deciding whether a candidate survives the sweep.
//!
//! Three rules are checked in order and the first one that matches protects
//! the candidate:
//!
//! 1. **Structural**: files the assembly cannot do without (`manifest.json`,
//!    `tree.json`, stack templates, asset descriptors)
//! 2. **Referenced**: the candidate's path is in the [`References`] set
//! 3. **Recent**: the candidate was modified within the retention window
//!
//! Candidates are already narrowed to artifact-prefixed names before they get
//! here, so the structural rule only matters for odd names such as
//! `asset.x.template.json`. Temp-directory sweeps turn it off: a scratch
//! directory named `cdk.out` is not part of any assembly.

use std::fs;
use std::path::Path;
use std::time::{Duration, SystemTime};

use super::manifest::is_asset_descriptor;
use super::plan::Candidate;
use super::references::References;

/// File names that are never deleted
pub(crate) const ESSENTIAL_FILES: &[&str] = &["manifest.json", "tree.json", "cdk.out"];
/// Suffix of synthesized CloudFormation templates
pub(crate) const TEMPLATE_SUFFIX: &str = ".template.json";

const SECS_PER_HOUR: u64 = 60 * 60;

/// Why a candidate was kept
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Protection {
    Structural,
    Referenced,
    Recent,
}

impl Protection {
    pub fn describe(self) -> &'static str {
        match self {
            Protection::Structural => "required by the assembly",
            Protection::Referenced => "referenced by the current synthesis",
            Protection::Recent => "modified within the retention window",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Protect(Protection),
    Delete,
}

/// Grace period protecting recently modified candidates.
///
/// Zero (or a negative number of hours) disables recency protection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RetentionWindow {
    window: Option<Duration>,
}

impl RetentionWindow {
    pub fn from_hours(hours: i64) -> Self {
        let window = u64::try_from(hours)
            .ok()
            .filter(|hours| *hours > 0)
            .map(|hours| Duration::from_secs(hours.saturating_mul(SECS_PER_HOUR)));
        Self { window }
    }

    pub fn disabled() -> Self {
        Self::default()
    }

    pub fn is_enabled(&self) -> bool {
        self.window.is_some()
    }

    pub fn hours(&self) -> u64 {
        self.window
            .map(|window| window.as_secs() / SECS_PER_HOUR)
            .unwrap_or(0)
    }

    /// Whether something last modified at `modified` is still inside the
    /// window as of `now`. The boundary itself is inside.
    pub fn covers(&self, modified: SystemTime, now: SystemTime) -> bool {
        let Some(window) = self.window else {
            return false;
        };

        // a timestamp in the future has age zero
        let age = now.duration_since(modified).unwrap_or(Duration::ZERO);
        age <= window
    }
}

/// The rules applied to every candidate of one sweep.
///
/// `now` is fixed when the policy is created so every candidate is judged
/// against the same instant.
#[derive(Debug, Clone, Copy)]
pub struct Policy<'a> {
    references: Option<&'a References>,
    retention: RetentionWindow,
    now: SystemTime,
    structural: bool,
}

impl<'a> Policy<'a> {
    pub fn new(
        references: Option<&'a References>,
        retention: RetentionWindow,
        now: SystemTime,
    ) -> Self {
        Self {
            references,
            retention,
            now,
            structural: true,
        }
    }

    /// Enable or disable the structural rule (on by default)
    pub fn structural(mut self, enabled: bool) -> Self {
        self.structural = enabled;
        self
    }

    pub fn retention(&self) -> RetentionWindow {
        self.retention
    }

    pub fn evaluate(&self, candidate: &Candidate) -> Verdict {
        if self.structural && is_structural(candidate.name()) {
            return Verdict::Protect(Protection::Structural);
        }

        if self
            .references
            .is_some_and(|references| references.contains(candidate.path()))
        {
            return Verdict::Protect(Protection::Referenced);
        }

        if self.is_recent(candidate.path()) {
            return Verdict::Protect(Protection::Recent);
        }

        Verdict::Delete
    }

    /// Recency check. A path whose mtime cannot be read is not protected by
    /// this rule.
    fn is_recent(&self, path: &Path) -> bool {
        if !self.retention.is_enabled() {
            return false;
        }

        fs::metadata(path)
            .and_then(|metadata| metadata.modified())
            .map(|modified| self.retention.covers(modified, self.now))
            .unwrap_or(false)
    }
}

pub(crate) fn is_structural(name: &str) -> bool {
    ESSENTIAL_FILES.contains(&name) || name.ends_with(TEMPLATE_SUFFIX) || is_asset_descriptor(name)
}

#[cfg(test)]
mod tests {
    use filetime::FileTime;
    use tempfile::TempDir;

    use super::*;
    use crate::gc::plan::EntryKind;

    const HOUR: Duration = Duration::from_secs(60 * 60);

    fn candidate(dir: &Path, name: &str) -> Candidate {
        let path = dir.join(name);
        std::fs::create_dir_all(&path).unwrap();
        Candidate::new(name, path, EntryKind::Directory)
    }

    fn age(path: &Path, mtime: SystemTime) {
        filetime::set_file_mtime(path, FileTime::from_system_time(mtime)).unwrap();
    }

    #[test]
    fn test_structural_names() {
        assert!(is_structural("manifest.json"));
        assert!(is_structural("tree.json"));
        assert!(is_structural("cdk.out"));
        assert!(is_structural("MyStack.template.json"));
        assert!(is_structural("MyStack.assets.json"));
        assert!(is_structural("asset.abc.template.json"));
        assert!(!is_structural("asset.abc"));
        assert!(!is_structural("notes.txt"));
    }

    #[test]
    fn test_retention_window_from_hours() {
        assert!(!RetentionWindow::from_hours(0).is_enabled());
        assert!(!RetentionWindow::from_hours(-5).is_enabled());
        assert_eq!(RetentionWindow::from_hours(-5), RetentionWindow::disabled());
        assert_eq!(RetentionWindow::from_hours(24).hours(), 24);
    }

    #[test]
    fn test_retention_boundary_is_inclusive() {
        let now = SystemTime::now();
        let window = RetentionWindow::from_hours(2);

        assert!(window.covers(now - 2 * HOUR, now));
        assert!(window.covers(now - HOUR, now));
        assert!(!window.covers(now - 2 * HOUR - Duration::from_secs(1), now));
        assert!(window.covers(now + HOUR, now));
        assert!(!RetentionWindow::disabled().covers(now, now));
    }

    #[test]
    fn test_rule_order() {
        let temp = TempDir::new().unwrap();
        let now = SystemTime::now();

        let referenced = candidate(temp.path(), "asset.used");
        let recent = candidate(temp.path(), "asset.fresh");
        let stale = candidate(temp.path(), "asset.stale");
        let template = candidate(temp.path(), "asset.odd.template.json");
        age(referenced.path(), now - 100 * HOUR);
        age(recent.path(), now - HOUR);
        age(stale.path(), now - 100 * HOUR);

        let mut references = References::empty(temp.path().to_path_buf());
        references.insert(referenced.path().to_path_buf());

        let policy = Policy::new(Some(&references), RetentionWindow::from_hours(24), now);
        assert_eq!(
            policy.evaluate(&referenced),
            Verdict::Protect(Protection::Referenced)
        );
        assert_eq!(
            policy.evaluate(&recent),
            Verdict::Protect(Protection::Recent)
        );
        assert_eq!(
            policy.evaluate(&template),
            Verdict::Protect(Protection::Structural)
        );
        assert_eq!(policy.evaluate(&stale), Verdict::Delete);

        // without a retention window only references protect
        let policy = Policy::new(Some(&references), RetentionWindow::disabled(), now);
        assert_eq!(policy.evaluate(&recent), Verdict::Delete);
    }

    #[test]
    fn test_structural_rule_can_be_disabled() {
        let temp = TempDir::new().unwrap();
        let now = SystemTime::now();
        let scratch = candidate(temp.path(), "cdk.out");
        age(scratch.path(), now - 48 * HOUR);

        let assembly = Policy::new(None, RetentionWindow::from_hours(1), now);
        assert_eq!(
            assembly.evaluate(&scratch),
            Verdict::Protect(Protection::Structural)
        );

        let scratch_dir = assembly.structural(false);
        assert_eq!(scratch_dir.evaluate(&scratch), Verdict::Delete);

        age(scratch.path(), now);
        assert_eq!(
            scratch_dir.evaluate(&scratch),
            Verdict::Protect(Protection::Recent)
        );
    }

    #[test]
    fn test_vanished_candidate_is_not_recent() {
        let temp = TempDir::new().unwrap();
        let gone = Candidate::new("asset.gone", temp.path().join("asset.gone"), EntryKind::Directory);

        let policy = Policy::new(None, RetentionWindow::from_hours(24), SystemTime::now());
        assert_eq!(policy.evaluate(&gone), Verdict::Delete);
    }
}
