//! Container images built from asset directories.
//!
//! An asset directory holding a `Dockerfile` is the build context of a
//! container image whose local tags embed the asset hash. Once such a
//! directory is swept, the images built from it are removed too, through an
//! [`ImageStore`].

use std::path::Path;
use std::process::Command;
use std::sync::OnceLock;

use regex::Regex;

use super::plan::ARTIFACT_PREFIX;
use crate::error::{Result, SweepError};
use crate::logging::Logger;

/// File marking an asset directory as a container build context
pub(crate) const BUILD_RECIPE: &str = "Dockerfile";
/// Environment variable naming the container runtime executable
pub const DOCKER_ENV: &str = "CDK_DOCKER";
const DEFAULT_DOCKER: &str = "docker";
/// Repository prefix CDK uses when tagging locally built asset images
const LOCAL_REPOSITORY_PREFIX: &str = "cdkasset-";
/// Asset hashes are hex-encoded SHA-256 digests
const ASSET_HASH_LEN: usize = 64;

/// Hash of the container image built from `path`.
///
/// `None` unless `path` is named `asset.<hash>`, with a full 64 character
/// hex hash, and is a directory containing a `Dockerfile`. Shorter suffixes
/// would match unrelated tags such as `node:10`.
pub fn extract_image_hash(path: &Path) -> Option<String> {
    let name = path.file_name()?.to_str()?;
    let hash = parse_image_hash(name)?;

    if path.is_dir() && path.join(BUILD_RECIPE).is_file() {
        Some(hash.to_string())
    } else {
        None
    }
}

/// The asset hash following the artifact prefix in `name`
pub(crate) fn parse_image_hash(name: &str) -> Option<&str> {
    static ASSET_HASH_RE: OnceLock<Regex> = OnceLock::new();

    let re = ASSET_HASH_RE.get_or_init(|| {
        Regex::new(&format!(
            r"^{}([0-9a-f]{{{ASSET_HASH_LEN}}})$",
            regex::escape(ARTIFACT_PREFIX)
        ))
            .expect("asset hash regex should compile")
    });

    re.captures(name)
        .and_then(|captures| captures.get(1))
        .map(|hash| hash.as_str())
}

/// Whether the local image `tag` (`repository:tag`) was built for `hash`.
///
/// Two shapes are recognised: `cdkasset-<hash>:<anything>` and
/// `<anything>:<hash>`.
pub fn tag_matches(tag: &str, hash: &str) -> bool {
    let Some((repository, version)) = tag.rsplit_once(':') else {
        return false;
    };

    version == hash
        || repository
            .rsplit('/')
            .next()
            .and_then(|name| name.strip_prefix(LOCAL_REPOSITORY_PREFIX))
            == Some(hash)
}

/// Local container images, as seen by the sweep.
pub trait ImageStore {
    /// Every local image as `repository:tag`
    fn list_tags(&self) -> Result<Vec<String>>;

    /// Remove one local image by `repository:tag`
    fn remove(&self, tag: &str) -> Result<()>;
}

/// [`ImageStore`] backed by the docker CLI (or a compatible runtime).
#[derive(Debug, Clone)]
pub struct DockerCli {
    program: String,
}

impl DockerCli {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }

    /// Use `$CDK_DOCKER`, falling back to `docker`
    pub fn from_env() -> Self {
        let program = std::env::var(DOCKER_ENV)
            .ok()
            .filter(|value| !value.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_DOCKER.to_string());
        Self::new(program)
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    fn run(&self, args: &[&str]) -> Result<String> {
        let output = Command::new(&self.program)
            .args(args)
            .output()
            .map_err(|err| {
                SweepError::ImageStoreError(format!("could not run '{}': {err}", self.program))
            })?;

        if !output.status.success() {
            return Err(SweepError::ImageStoreError(format!(
                "'{} {}' failed: {}",
                self.program,
                args.join(" "),
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

impl ImageStore for DockerCli {
    fn list_tags(&self) -> Result<Vec<String>> {
        let stdout = self.run(&["images", "--format", "{{.Repository}}:{{.Tag}}"])?;
        Ok(stdout
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty() && !line.contains("<none>"))
            .map(str::to_string)
            .collect())
    }

    fn remove(&self, tag: &str) -> Result<()> {
        self.run(&["rmi", tag]).map(|_| ())
    }
}

/// Remove every local image built for one of `hashes`.
///
/// Best-effort: if the store cannot be listed the cleanup is skipped with a
/// warning, and failed removals are warnings too. Returns the tags removed.
pub(crate) fn remove_images(store: &dyn ImageStore, hashes: &[&str], log: Logger) -> Vec<String> {
    if hashes.is_empty() {
        return Vec::new();
    }

    let tags = match store.list_tags() {
        Ok(tags) => tags,
        Err(err) => {
            log.warn(format!("{err}; skipping container image cleanup"));
            return Vec::new();
        }
    };

    let mut removed = Vec::new();
    for tag in tags {
        if !hashes.iter().any(|hash| tag_matches(&tag, hash)) {
            continue;
        }

        match store.remove(&tag) {
            Ok(()) => {
                log.verbose(1, format!("Removed image {tag}"));
                removed.push(tag);
            }
            Err(err) => log.warn(err),
        }
    }

    removed
}
