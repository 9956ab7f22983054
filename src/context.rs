//! Project context the package manager operates on.

use log::debug;
use std::path::{Path, PathBuf};

use crate::config::GlobalConfig;
use crate::error::Result;
use crate::package::RootPackageMetadata;
use crate::runtime::{Runtime, normalize_path};
use crate::storage::PackageFileStorage;

/// Root directory, root package metadata and user config of one project.
#[derive(Debug, Clone)]
pub struct ProjectContext {
    root_dir: PathBuf,
    root_metadata: RootPackageMetadata,
    config: GlobalConfig,
}

impl ProjectContext {
    pub fn new(
        root_dir: impl Into<PathBuf>,
        root_metadata: RootPackageMetadata,
        config: GlobalConfig,
    ) -> Self {
        Self {
            root_dir: normalize_path(&root_dir.into()),
            root_metadata,
            config,
        }
    }

    /// Load the context of the project in `root_dir`.
    ///
    /// A project without a root package file starts with empty metadata; the
    /// file is created by the first successful save.
    pub fn load<S: PackageFileStorage>(
        storage: &S,
        root_dir: impl Into<PathBuf>,
        config: GlobalConfig,
    ) -> Result<Self> {
        let root_dir = normalize_path(&root_dir.into());
        let root_metadata = match storage.load_root_metadata(&root_dir) {
            Ok(metadata) => metadata,
            Err(e) if e.is_file_not_found() => {
                debug!("No root package file in {:?}, starting empty", root_dir);
                RootPackageMetadata::default()
            }
            Err(e) => return Err(e),
        };
        Ok(Self::new(root_dir, root_metadata, config))
    }

    pub fn root_dir(&self) -> &Path {
        &self.root_dir
    }

    pub fn root_metadata(&self) -> &RootPackageMetadata {
        &self.root_metadata
    }

    pub fn config(&self) -> &GlobalConfig {
        &self.config
    }

    pub(crate) fn into_parts(self) -> (PathBuf, RootPackageMetadata, GlobalConfig) {
        (self.root_dir, self.root_metadata, self.config)
    }
}

/// The project root: `root` if given (relative to the current directory), else the current directory.
pub fn resolve_root_dir<R: Runtime>(runtime: &R, root: Option<PathBuf>) -> anyhow::Result<PathBuf> {
    let cwd = runtime.current_dir()?;
    let root_dir = match root {
        Some(root) if root.is_absolute() => root,
        Some(root) => cwd.join(root),
        None => cwd,
    };
    Ok(normalize_path(&root_dir))
}
