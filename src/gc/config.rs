use std::fmt;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use super::docker::{DockerCli, ImageStore, remove_images};
use super::manifest::ScanWarning;
use super::plan::{
    ARTIFACT_PREFIX, DeletionPlan, ExecutionReport, TEMP_PREFIXES, build_plan,
    discover_candidates, execute_plan,
};
use super::protection::{Policy, RetentionWindow};
use super::references::References;
use super::size::format_size;
use crate::error::{Result, SweepError};
use crate::logging::Logger;
use crate::paths::normalize_path;

/// Default CDK output directory
pub const DEFAULT_OUTDIR: &str = "cdk.out";

/// Where a sweep looks for candidates
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SweepMode {
    /// Assets of a cloud assembly directory
    Assembly(PathBuf),
    /// CDK scratch directories in a temp directory
    Temp(PathBuf),
}

/// A sweep of a CDK output directory (or of the temp directory)
pub struct Sweep {
    mode: SweepMode,
    /// Dry run mode - compute the plan but don't delete anything
    dry_run: bool,
    /// Retention window in hours; zero or negative disables it
    keep_hours: i64,
    verbose: u8,
    quiet: bool,
    /// Container runtime used to remove images of swept assets
    image_store: Option<Box<dyn ImageStore + Send + Sync>>,
}

impl fmt::Debug for Sweep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Sweep")
            .field("mode", &self.mode)
            .field("dry_run", &self.dry_run)
            .field("keep_hours", &self.keep_hours)
            .field("verbose", &self.verbose)
            .field("quiet", &self.quiet)
            .field("image_store", &self.image_store.is_some())
            .finish()
    }
}

impl Sweep {
    /// Creates a new builder for [`Sweep`]
    pub fn builder() -> SweepBuilder {
        SweepBuilder::default()
    }

    pub fn mode(&self) -> &SweepMode {
        &self.mode
    }

    /// The directory whose children are swept
    pub fn root(&self) -> &Path {
        match &self.mode {
            SweepMode::Assembly(root) | SweepMode::Temp(root) => root,
        }
    }

    pub fn dry_run(&self) -> bool {
        self.dry_run
    }

    pub fn retention(&self) -> RetentionWindow {
        RetentionWindow::from_hours(self.keep_hours)
    }

    fn logger(&self) -> Logger {
        Logger::new(self.verbose, self.quiet)
    }

    /// Compute what a sweep would delete, without deleting anything.
    ///
    /// A dry run and a real run produce the same plan for the same tree.
    pub fn plan(&self) -> Result<DeletionPlan> {
        self.plan_at(SystemTime::now()).map(|(plan, _)| plan)
    }

    /// Compute the plan with `now` as the reference instant for the retention
    /// window. Also returns the warnings collected while scanning.
    pub fn plan_at(&self, now: SystemTime) -> Result<(DeletionPlan, Vec<ScanWarning>)> {
        let log = self.logger();
        let root = self.root();

        if !root.is_dir() {
            return Err(SweepError::OutputDirNotFound(root.to_path_buf()));
        }

        let retention = self.retention();
        if retention.is_enabled() {
            log.verbose(
                1,
                format!("Keeping anything modified in the last {} hours", retention.hours()),
            );
        }

        let (references, prefixes, detect_images) = match &self.mode {
            SweepMode::Assembly(root) => {
                log.verbose(1, format!("Reading cloud assembly in {}", root.display()));
                let references = References::collect(root)?;
                for warning in references.warnings() {
                    log.warn(warning);
                }
                log.verbose(2, format!("  {} referenced paths", references.len()));
                (Some(references), &[ARTIFACT_PREFIX][..], true)
            }
            SweepMode::Temp(root) => {
                log.verbose(1, format!("Scanning {} for CDK scratch directories", root.display()));
                (None, TEMP_PREFIXES, false)
            }
        };

        let candidates = discover_candidates(root, prefixes, log)?;
        log.verbose(1, format!("Found {} candidates", candidates.len()));

        let policy = Policy::new(references.as_ref(), retention, now)
            .structural(matches!(self.mode, SweepMode::Assembly(_)));
        let plan = build_plan(root, candidates, &policy, detect_images, log);

        let warnings = references
            .map(|references| references.warnings().to_vec())
            .unwrap_or_default();
        Ok((plan, warnings))
    }

    /// Main entry point: plan the sweep and, unless this is a dry run, apply
    /// it.
    ///
    /// Images built from deleted container-build assets are removed through
    /// the configured [`ImageStore`] (the docker CLI by default). Image
    /// cleanup is best-effort and never fails the sweep.
    pub fn perform_sweep(&self) -> Result<SweepOutcome> {
        let log = self.logger();
        let (plan, warnings) = self.plan_at(SystemTime::now())?;

        if plan.is_empty() {
            return Ok(SweepOutcome::NothingToDo {
                root: plan.root().to_path_buf(),
                warnings,
            });
        }

        log.verbose(
            1,
            format!(
                "Selected {} entries ({})",
                plan.len(),
                format_size(plan.total_size())
            ),
        );

        if self.dry_run {
            return Ok(SweepOutcome::DryRun { plan, warnings });
        }

        let report = execute_plan(&plan, log);

        let hashes = plan.image_hashes();
        let images_removed = if hashes.is_empty() {
            Vec::new()
        } else {
            match &self.image_store {
                Some(store) => remove_images(store.as_ref(), &hashes, log),
                None => remove_images(&DockerCli::from_env(), &hashes, log),
            }
        };

        Ok(SweepOutcome::Swept {
            plan,
            report,
            images_removed,
            warnings,
        })
    }
}

/// Result of [`Sweep::perform_sweep`]
#[derive(Debug)]
pub enum SweepOutcome {
    /// Every candidate was protected
    NothingToDo {
        root: PathBuf,
        warnings: Vec<ScanWarning>,
    },
    /// A plan was computed but, as requested, not applied
    DryRun {
        plan: DeletionPlan,
        warnings: Vec<ScanWarning>,
    },
    /// The plan was applied
    Swept {
        plan: DeletionPlan,
        report: ExecutionReport,
        /// Local image tags removed for deleted container-build assets
        images_removed: Vec<String>,
        warnings: Vec<ScanWarning>,
    },
}

impl SweepOutcome {
    /// The computed plan, unless there was nothing to do
    pub fn plan(&self) -> Option<&DeletionPlan> {
        match self {
            SweepOutcome::NothingToDo { .. } => None,
            SweepOutcome::DryRun { plan, .. } | SweepOutcome::Swept { plan, .. } => Some(plan),
        }
    }

    pub fn warnings(&self) -> &[ScanWarning] {
        match self {
            SweepOutcome::NothingToDo { warnings, .. }
            | SweepOutcome::DryRun { warnings, .. }
            | SweepOutcome::Swept { warnings, .. } => warnings,
        }
    }

    pub fn is_nothing_to_do(&self) -> bool {
        matches!(self, SweepOutcome::NothingToDo { .. })
    }

    pub fn is_dry_run(&self) -> bool {
        matches!(self, SweepOutcome::DryRun { .. })
    }
}

/// Builder for [`Sweep`]
#[derive(Default)]
pub struct SweepBuilder {
    outdir: Option<PathBuf>,
    tmp: bool,
    tmp_root: Option<PathBuf>,
    dry_run: bool,
    keep_hours: i64,
    verbose: u8,
    quiet: bool,
    image_store: Option<Box<dyn ImageStore + Send + Sync>>,
}

impl SweepBuilder {
    /// Set the CDK output directory (defaults to `cdk.out`)
    pub fn outdir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.outdir = Some(dir.into());
        self
    }

    /// Sweep CDK scratch directories in the temp directory instead of an
    /// output directory
    pub fn tmp(mut self, enabled: bool) -> Self {
        self.tmp = enabled;
        self
    }

    /// Temp directory to sweep in temp mode (defaults to the OS temp dir)
    pub fn tmp_root(mut self, dir: impl Into<PathBuf>) -> Self {
        self.tmp_root = Some(dir.into());
        self
    }

    /// Enable dry run mode
    pub fn dry_run(mut self, enabled: bool) -> Self {
        self.dry_run = enabled;
        self
    }

    /// Keep anything modified within this many hours. Negative is treated
    /// as zero.
    pub fn keep_hours(mut self, hours: i64) -> Self {
        self.keep_hours = hours;
        self
    }

    pub fn verbose(mut self, level: u8) -> Self {
        self.verbose = level;
        self
    }

    pub fn quiet(mut self, quiet: bool) -> Self {
        self.quiet = quiet;
        self
    }

    /// Use `store` instead of the docker CLI for image cleanup
    pub fn image_store(mut self, store: impl ImageStore + Send + Sync + 'static) -> Self {
        self.image_store = Some(Box::new(store));
        self
    }

    /// Build the [`Sweep`]
    ///
    /// Fails when temp mode is combined with an explicit output directory.
    pub fn build(self) -> Result<Sweep> {
        let mode = match (self.tmp, self.outdir) {
            (true, Some(outdir)) => {
                return Err(SweepError::ConfigError(format!(
                    "cannot sweep the temp directory and '{}' at the same time",
                    outdir.display()
                )));
            }
            (true, None) => SweepMode::Temp(normalize_path(
                self.tmp_root.unwrap_or_else(std::env::temp_dir),
            )),
            (false, outdir) => SweepMode::Assembly(normalize_path(
                outdir.unwrap_or_else(|| PathBuf::from(DEFAULT_OUTDIR)),
            )),
        };

        Ok(Sweep {
            mode,
            dry_run: self.dry_run,
            keep_hours: self.keep_hours,
            verbose: self.verbose,
            quiet: self.quiet,
            image_store: self.image_store,
        })
    }
}
