//! The set of paths in the output directory that the current synthesis still
//! uses.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use serde_json::Value;

use super::manifest::{AssemblyScan, ScanWarning, scan_assembly};
use crate::error::Result;
use crate::paths::{ancestors_below, normalize_path, resolve};

/// Live paths of one output directory.
///
/// Every path is absolute and lexically normalised. A referenced path below
/// the output root also brings along each of its ancestor directories up to,
/// but not including, the root itself.
#[derive(Debug, Default)]
pub struct References {
    root: PathBuf,
    paths: HashSet<PathBuf>,
    warnings: Vec<ScanWarning>,
}

impl References {
    /// Scan `root` and collect everything its manifest and asset descriptors
    /// refer to.
    ///
    /// Returns [`SweepError::OutputDirNotFound`] when `root` is missing.
    /// Malformed descriptors do not fail the scan; they end up in
    /// [`References::warnings`].
    ///
    /// [`SweepError::OutputDirNotFound`]: crate::error::SweepError::OutputDirNotFound
    pub fn collect(root: impl AsRef<Path>) -> Result<Self> {
        let root = normalize_path(root);
        let scan = scan_assembly(&root)?;
        Ok(Self::from_scan(root, scan))
    }

    pub(crate) fn from_scan(root: PathBuf, scan: AssemblyScan) -> Self {
        let mut references = Self::empty(root);

        if let Some(manifest) = &scan.manifest {
            references.add_manifest_value(manifest.artifacts());
        }

        for (dir, descriptor) in &scan.descriptors {
            for source in descriptor.sources() {
                references.insert(resolve(dir, source));
            }
        }

        references.warnings = scan.warnings;
        references
    }

    pub(crate) fn empty(root: PathBuf) -> Self {
        Self {
            root,
            paths: HashSet::new(),
            warnings: Vec::new(),
        }
    }

    /// Treat every string inside `value` as a path relative to the root.
    pub(crate) fn add_manifest_value(&mut self, value: &Value) {
        let root = self.root.clone();
        visit_strings(value, &mut |leaf| {
            if !leaf.is_empty() {
                self.insert(resolve(&root, leaf));
            }
        });
    }

    /// Insert `path` along with its ancestors below the root
    pub(crate) fn insert(&mut self, path: PathBuf) {
        for ancestor in ancestors_below(&path, &self.root) {
            if !self.paths.insert(ancestor.to_path_buf()) {
                // an earlier insert already covered the rest of the chain
                break;
            }
        }
        self.paths.insert(path);
    }

    /// Whether `path` is referenced. `path` must already be normalised.
    pub fn contains(&self, path: &Path) -> bool {
        self.paths.contains(path)
    }

    /// The output directory these references were collected from
    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    /// Files and directories skipped while scanning
    pub fn warnings(&self) -> &[ScanWarning] {
        &self.warnings
    }
}

/// Call `visit` on every string leaf of a JSON value, depth first.
///
/// Object keys are not visited, only values. Numbers, booleans and null are
/// ignored.
pub(crate) fn visit_strings(value: &Value, visit: &mut impl FnMut(&str)) {
    match value {
        Value::String(s) => visit(s),
        Value::Array(items) => {
            for item in items {
                visit_strings(item, visit);
            }
        }
        Value::Object(map) => {
            for item in map.values() {
                visit_strings(item, visit);
            }
        }
        Value::Null | Value::Bool(_) | Value::Number(_) => {}
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use proptest::prelude::*;
    use serde_json::json;
    use tempfile::TempDir;

    use super::*;

    fn root() -> PathBuf {
        if cfg!(windows) {
            PathBuf::from("C:\\work\\cdk.out")
        } else {
            PathBuf::from("/work/cdk.out")
        }
    }

    #[test]
    fn test_visit_strings_collects_every_leaf() {
        let value = json!({
            "Stack": {
                "type": "aws:cloudformation:stack",
                "properties": { "templateFile": "Stack.template.json", "count": 3 },
                "dependencies": ["Stack.assets", null, true]
            }
        });

        let mut leaves = Vec::new();
        visit_strings(&value, &mut |s| leaves.push(s.to_string()));
        leaves.sort();
        assert_eq!(
            leaves,
            vec![
                "Stack.assets",
                "Stack.template.json",
                "aws:cloudformation:stack",
            ]
        );
    }

    #[test]
    fn test_manifest_strings_protect_ancestors() {
        let mut references = References::empty(root());
        references.add_manifest_value(&json!({
            "Stage": { "properties": { "directoryName": "stage-dir/nested/file.json" } }
        }));

        assert!(references.contains(&root().join("stage-dir/nested/file.json")));
        assert!(references.contains(&root().join("stage-dir/nested")));
        assert!(references.contains(&root().join("stage-dir")));
        assert!(!references.contains(&root()));
    }

    #[test]
    fn test_empty_manifest_yields_empty_set() {
        let mut references = References::empty(root());
        references.add_manifest_value(&json!({}));
        references.add_manifest_value(&Value::Null);
        assert!(references.is_empty());
    }

    #[test]
    fn test_shared_asset_is_recorded_once() {
        let mut references = References::empty(root());
        references.insert(resolve(&root(), "asset.shared"));
        references.insert(resolve(&root().join("assembly-Stage"), "../asset.shared"));
        assert_eq!(references.len(), 1);
        assert!(references.contains(&root().join("asset.shared")));
    }

    #[test]
    fn test_collect_resolves_relative_to_descriptor_directory() {
        let temp = TempDir::new().unwrap();
        let out = temp.path().join("cdk.out");
        let stage = out.join("assembly-Prod");
        fs::create_dir_all(&stage).unwrap();

        fs::write(
            out.join("manifest.json"),
            r#"{ "version": "36.0.0", "artifacts": { "Prod": { "properties": { "directoryName": "assembly-Prod" } } } }"#,
        )
        .unwrap();
        fs::write(
            stage.join("ProdStack.assets.json"),
            r#"{
                "files": {
                    "up": { "source": { "path": "../asset.up" } },
                    "local": { "source": { "path": "asset.local" } }
                },
                "dockerImages": { "img": { "source": { "directory": "../asset.img" } } }
            }"#,
        )
        .unwrap();

        let references = References::collect(&out).unwrap();
        let out = references.root().to_path_buf();
        assert!(references.contains(&out.join("asset.up")));
        assert!(references.contains(&out.join("asset.img")));
        assert!(references.contains(&out.join("assembly-Prod/asset.local")));
        assert!(references.contains(&out.join("assembly-Prod")));
        assert!(!references.contains(&stage.join("asset.up")));
        assert!(references.warnings().is_empty());
    }

    proptest! {
        #[test]
        fn test_reference_closure(segments in prop::collection::vec("[a-z0-9.]{1,8}", 1..5)) {
            prop_assume!(segments.iter().all(|s| s != "." && s != ".."));

            let relative = segments.join("/");
            let mut references = References::empty(root());
            references.add_manifest_value(&json!({ "artifact": relative }));

            let full = root().join(&relative);
            prop_assert!(references.contains(&full));
            for ancestor in full.ancestors().skip(1) {
                if ancestor == root() {
                    break;
                }
                prop_assert!(references.contains(ancestor));
            }
            prop_assert_eq!(references.len(), segments.len());
        }
    }
}
