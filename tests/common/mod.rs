#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use assert_fs::TempDir;
use filetime::FileTime;

pub const HOUR: Duration = Duration::from_secs(60 * 60);

/// A cloud assembly under construction inside a temporary directory.
pub struct Assembly {
    temp: TempDir,
    root: PathBuf,
}

impl Assembly {
    /// Empty `cdk.out` with a manifest that lists no artifacts
    pub fn new() -> Self {
        let temp = TempDir::new().expect("failed to create temp dir");
        let root = temp.path().join("cdk.out");
        fs::create_dir_all(&root).unwrap();
        let assembly = Self { temp, root };
        assembly.write("manifest.json", r#"{ "version": "36.0.0", "artifacts": {} }"#);
        assembly
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn temp(&self) -> &TempDir {
        &self.temp
    }

    pub fn path(&self, relative: &str) -> PathBuf {
        self.root.join(relative)
    }

    /// Write a file (creating parents) relative to the assembly root
    pub fn write(&self, relative: &str, contents: impl AsRef<[u8]>) -> PathBuf {
        let path = self.path(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(&path, contents).unwrap();
        path
    }

    /// An asset directory holding one file of `size` bytes
    pub fn asset_dir(&self, relative: &str, size: usize) -> PathBuf {
        self.write(&format!("{relative}/index.js"), vec![b'x'; size]);
        self.path(relative)
    }

    /// An asset directory that is a container build context
    pub fn image_asset(&self, relative: &str) -> PathBuf {
        self.write(&format!("{relative}/Dockerfile"), "FROM scratch\n");
        self.path(relative)
    }

    /// An `*.assets.json` descriptor referencing `files` and `images`
    pub fn descriptor(&self, relative: &str, files: &[&str], images: &[&str]) -> PathBuf {
        let files: Vec<String> = files
            .iter()
            .enumerate()
            .map(|(i, path)| format!(r#""f{i}": {{ "source": {{ "path": "{path}" }} }}"#))
            .collect();
        let images: Vec<String> = images
            .iter()
            .enumerate()
            .map(|(i, dir)| format!(r#""i{i}": {{ "source": {{ "directory": "{dir}" }} }}"#))
            .collect();
        let json = format!(
            r#"{{ "version": "36.0.0", "files": {{ {} }}, "dockerImages": {{ {} }} }}"#,
            files.join(", "),
            images.join(", ")
        );
        self.write(relative, json)
    }

    /// Set the mtime of `relative` to `age` before `now`
    pub fn age(&self, relative: &str, now: SystemTime, age: Duration) {
        set_mtime(&self.path(relative), now - age);
    }
}

pub fn set_mtime(path: &Path, mtime: SystemTime) {
    filetime::set_file_mtime(path, FileTime::from_system_time(mtime)).unwrap();
}

/// Every file and directory under `root` with its contents, for comparing
/// trees before and after a run.
pub fn snapshot(root: &Path) -> Vec<(PathBuf, Option<Vec<u8>>)> {
    let mut entries: Vec<_> = walkdir::WalkDir::new(root)
        .into_iter()
        .map(|entry| entry.unwrap())
        .map(|entry| {
            let contents = entry
                .file_type()
                .is_file()
                .then(|| fs::read(entry.path()).unwrap());
            (entry.into_path(), contents)
        })
        .collect();
    entries.sort();
    entries
}
