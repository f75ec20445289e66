//! Reading the cloud assembly: the root `manifest.json` and every
//! `*.assets.json` descriptor below the output directory.

use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use rayon::prelude::*;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use walkdir::WalkDir;

use crate::error::{Result, SweepError};

/// File name of the root build manifest
pub(crate) const MANIFEST_FILE: &str = "manifest.json";
/// Suffix shared by every asset descriptor file
pub(crate) const ASSET_DESCRIPTOR_SUFFIX: &str = ".assets.json";

/// Root descriptor of one cloud assembly.
///
/// Only `version` and `artifacts` are read; the artifact values are kept as
/// raw JSON since any string inside them may name a file in the assembly.
#[derive(Debug, Default, Deserialize)]
pub struct BuildManifest {
    #[serde(default)]
    version: Option<Value>,
    #[serde(default)]
    artifacts: Value,
}

impl BuildManifest {
    /// Manifest schema version, if it is a string. Advisory only.
    pub fn version(&self) -> Option<&str> {
        self.version.as_ref().and_then(Value::as_str)
    }

    /// Raw artifact descriptions keyed by artifact id
    pub fn artifacts(&self) -> &Value {
        &self.artifacts
    }
}

/// An `*.assets.json` file listing the file and image assets of one stack.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetDescriptor {
    #[serde(default)]
    files: BTreeMap<String, FileAsset>,
    #[serde(default)]
    docker_images: BTreeMap<String, DockerImageAsset>,
}

#[derive(Debug, Default, Deserialize)]
struct FileAsset {
    #[serde(default)]
    source: Option<FileSource>,
}

#[derive(Debug, Default, Deserialize)]
struct FileSource {
    #[serde(default)]
    path: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct DockerImageAsset {
    #[serde(default)]
    source: Option<DockerImageSource>,
}

#[derive(Debug, Default, Deserialize)]
struct DockerImageSource {
    #[serde(default)]
    directory: Option<String>,
}

impl AssetDescriptor {
    /// Source paths of file assets, as written in the descriptor
    pub fn file_sources(&self) -> impl Iterator<Item = &str> {
        self.files
            .values()
            .filter_map(|asset| asset.source.as_ref()?.path.as_deref())
    }

    /// Build-context directories of container image assets, as written in the
    /// descriptor
    pub fn image_sources(&self) -> impl Iterator<Item = &str> {
        self.docker_images
            .values()
            .filter_map(|asset| asset.source.as_ref()?.directory.as_deref())
    }

    /// All referenced source locations, relative to the descriptor's directory
    pub fn sources(&self) -> impl Iterator<Item = &str> {
        self.file_sources().chain(self.image_sources())
    }
}

/// A problem that was skipped over while scanning the output directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanWarning {
    path: PathBuf,
    reason: String,
}

impl ScanWarning {
    pub(crate) fn new(path: impl Into<PathBuf>, reason: impl fmt::Display) -> Self {
        Self {
            path: path.into(),
            reason: reason.to_string(),
        }
    }

    fn from_error(path: &Path, error: &SweepError) -> Self {
        let reason = match error {
            SweepError::DescriptorParse { source, .. } => format!("invalid JSON: {source}"),
            SweepError::IoError { source, .. } => source.to_string(),
            other => other.to_string(),
        };
        Self::new(path, reason)
    }

    /// The file or directory that was skipped
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn reason(&self) -> &str {
        &self.reason
    }
}

impl fmt::Display for ScanWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "skipping '{}': {}", self.path.display(), self.reason)
    }
}

/// Everything read from one output directory.
#[derive(Debug, Default)]
pub(crate) struct AssemblyScan {
    pub(crate) manifest: Option<BuildManifest>,
    /// Each descriptor with the directory it was found in
    pub(crate) descriptors: Vec<(PathBuf, AssetDescriptor)>,
    pub(crate) warnings: Vec<ScanWarning>,
}

/// Read the manifest and every asset descriptor under `root`.
///
/// Fails only when `root` is not an existing directory. Unreadable or
/// malformed files are recorded as warnings and skipped.
pub(crate) fn scan_assembly(root: &Path) -> Result<AssemblyScan> {
    if !root.is_dir() {
        return Err(SweepError::OutputDirNotFound(root.to_path_buf()));
    }

    let mut scan = AssemblyScan::default();

    let manifest_path = root.join(MANIFEST_FILE);
    match read_manifest(&manifest_path) {
        Ok(manifest) => scan.manifest = manifest,
        Err(err) => scan
            .warnings
            .push(ScanWarning::from_error(&manifest_path, &err)),
    }

    let descriptor_paths = find_asset_descriptors(root, &mut scan.warnings);

    let parsed: Vec<_> = descriptor_paths
        .into_par_iter()
        .map(|path| {
            let result = read_asset_descriptor(&path);
            (path, result)
        })
        .collect();

    for (path, result) in parsed {
        match result {
            Ok(descriptor) => {
                let dir = path.parent().unwrap_or(root).to_path_buf();
                scan.descriptors.push((dir, descriptor));
            }
            Err(err) => scan.warnings.push(ScanWarning::from_error(&path, &err)),
        }
    }

    Ok(scan)
}

/// Parse the build manifest at `path`; `Ok(None)` when there is none.
pub(crate) fn read_manifest(path: &Path) -> Result<Option<BuildManifest>> {
    if !path.is_file() {
        return Ok(None);
    }

    read_json(path).map(Some)
}

/// Parse one asset descriptor file
pub(crate) fn read_asset_descriptor(path: &Path) -> Result<AssetDescriptor> {
    read_json(path)
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let contents = fs::read(path).map_err(|source| SweepError::IoError {
        path: path.to_path_buf(),
        source,
    })?;

    serde_json::from_slice(&contents).map_err(|source| SweepError::DescriptorParse {
        path: path.to_path_buf(),
        source,
    })
}

/// Every file under `root` (at any depth) whose name marks it as an asset
/// descriptor, sorted for stable output.
pub(crate) fn find_asset_descriptors(root: &Path, warnings: &mut Vec<ScanWarning>) -> Vec<PathBuf> {
    let mut found = Vec::new();

    for entry in WalkDir::new(root).follow_links(false) {
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) => {
                let path = err.path().unwrap_or(root).to_path_buf();
                warnings.push(ScanWarning::new(path, err));
                continue;
            }
        };

        if entry.file_type().is_file()
            && is_asset_descriptor(&entry.file_name().to_string_lossy())
        {
            found.push(entry.into_path());
        }
    }

    found.sort();
    found
}

pub(crate) fn is_asset_descriptor(name: &str) -> bool {
    name.ends_with(ASSET_DESCRIPTOR_SUFFIX)
}
