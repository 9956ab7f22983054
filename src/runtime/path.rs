//! Path utility functions for normalization and comparison.

use std::path::{Component, Path, PathBuf};

/// Normalize a path by processing `.` and `..` components lexically.
/// This does not access the filesystem and does not follow symlinks.
pub fn normalize_path(path: &Path) -> PathBuf {
    let mut result = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                // Keep the `..` if there is nothing left to pop
                if !result.pop() {
                    result.push(component);
                }
            }
            _ => {
                result.push(component);
            }
        }
    }
    result
}

/// Check if a path is under a given directory by comparing normalized path components.
/// Returns true if `path` is under `dir` (i.e., `dir` is a prefix of `path`).
///
/// `/project/../elsewhere/package` is NOT under `/project`.
pub fn is_path_under(path: &Path, dir: &Path) -> bool {
    let normalized_path = normalize_path(path);
    let normalized_dir = normalize_path(dir);

    let path_components: Vec<_> = normalized_path.components().collect();
    let dir_components: Vec<_> = normalized_dir.components().collect();

    if path_components.len() < dir_components.len() {
        return false;
    }

    dir_components
        .iter()
        .zip(path_components.iter())
        .all(|(d, p)| d == p)
}

/// Compute the install path stored in an install record.
///
/// Directories beneath `root_dir` are stored relative to it (`packages/foo`),
/// everything else is stored as the normalized absolute path.
pub fn relative_install_path(root_dir: &Path, package_dir: &Path) -> PathBuf {
    let package_dir = normalize_path(package_dir);
    if !is_path_under(&package_dir, root_dir) {
        return package_dir;
    }

    match pathdiff::diff_paths(&package_dir, normalize_path(root_dir)) {
        Some(relative) if relative.as_os_str().is_empty() => PathBuf::from("."),
        Some(relative) if !relative.is_absolute() => relative,
        _ => package_dir,
    }
}

/// Resolve a relative path against a base directory to get an absolute path.
/// This is used to turn stored install paths back into package directories.
///
/// For example, if base_dir is `/projects/app` and relative_path is
/// `../package1`, this returns `/projects/package1`.
pub fn resolve_relative_path(base_dir: &Path, relative_path: &Path) -> PathBuf {
    if relative_path.is_absolute() {
        normalize_path(relative_path)
    } else {
        normalize_path(&base_dir.join(relative_path))
    }
}
