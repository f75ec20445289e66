use std::path::{Component, Path, PathBuf};

/// Normalize a path to be absolute and clean, without requiring it to exist.
///
/// This function:
/// - Converts relative paths to absolute using the current directory
/// - Removes `.` and `..` components where possible
/// - Does NOT resolve symlinks (preserves user intent)
/// - Does NOT require the path to exist
pub(crate) fn normalize_path(path: impl AsRef<Path>) -> PathBuf {
    let path = path.as_ref();

    let absolute = if path.is_relative() {
        std::env::current_dir()
            .unwrap_or_else(|_| PathBuf::from("."))
            .join(path)
    } else {
        path.to_path_buf()
    };

    clean(&absolute)
}

/// Resolve `relative` against `base` and clean the result lexically.
///
/// Absolute `relative` values replace `base`, as with [`Path::join`].
pub(crate) fn resolve(base: &Path, relative: impl AsRef<Path>) -> PathBuf {
    clean(&base.join(relative))
}

/// Remove `.` components and fold `..` into their parent.
fn clean(path: &Path) -> PathBuf {
    let mut components: Vec<Component<'_>> = Vec::new();
    for component in path.components() {
        match component {
            Component::ParentDir => match components.last() {
                Some(Component::Normal(_)) => {
                    components.pop();
                }
                // `/..` is `/`
                Some(Component::RootDir | Component::Prefix(_)) => {}
                _ => components.push(component),
            },
            Component::CurDir => continue,
            _ => components.push(component),
        }
    }

    components.into_iter().collect()
}

/// Every ancestor of `path` strictly below `root`, nearest first.
///
/// Empty when `path` does not live under `root`.
pub(crate) fn ancestors_below<'a>(path: &'a Path, root: &'a Path) -> Vec<&'a Path> {
    if !path.starts_with(root) {
        return Vec::new();
    }

    path.ancestors()
        .skip(1)
        .take_while(|ancestor| *ancestor != root && ancestor.starts_with(root))
        .collect()
}
