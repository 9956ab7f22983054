use std::fmt;
use std::path::{Path, PathBuf};

use super::{InstallInfo, PackageMetadata};
use crate::error::PackageError;

/// Name of the root package when its metadata declares none.
pub const DEFAULT_ROOT_PACKAGE_NAME: &str = "__root__";

/// Whether a package is the root project or an installed package.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PackageKind {
    Root,
    Installed,
}

/// Outcome of loading a package's metadata.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PackageState {
    Enabled,
    NotFound,
    NotLoadable,
}

impl PackageState {
    pub fn as_str(&self) -> &'static str {
        match self {
            PackageState::Enabled => "enabled",
            PackageState::NotFound => "not-found",
            PackageState::NotLoadable => "not-loadable",
        }
    }
}

impl fmt::Display for PackageState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A package known to the registry.
///
/// Enabled packages carry their metadata and no load errors; packages that
/// could not be loaded carry no metadata and at least one load error.
#[derive(Debug, Clone)]
pub struct Package {
    name: String,
    install_path: PathBuf,
    kind: PackageKind,
    state: PackageState,
    metadata: Option<PackageMetadata>,
    install_info: Option<InstallInfo>,
    load_errors: Vec<PackageError>,
}

impl Package {
    /// The root package. It is always enabled.
    pub fn root(root_dir: impl Into<PathBuf>, metadata: PackageMetadata) -> Self {
        let name = metadata
            .name()
            .unwrap_or(DEFAULT_ROOT_PACKAGE_NAME)
            .to_string();
        Package {
            name,
            install_path: root_dir.into(),
            kind: PackageKind::Root,
            state: PackageState::Enabled,
            metadata: Some(metadata),
            install_info: None,
            load_errors: Vec::new(),
        }
    }

    /// An installed package whose metadata loaded successfully.
    ///
    /// Installed packages are keyed by their install record, so the record
    /// name wins over the name declared in the metadata.
    pub fn installed(
        install_path: impl Into<PathBuf>,
        install_info: InstallInfo,
        metadata: PackageMetadata,
    ) -> Self {
        Package {
            name: install_info.package_name().to_string(),
            install_path: install_path.into(),
            kind: PackageKind::Installed,
            state: PackageState::Enabled,
            metadata: Some(metadata),
            install_info: Some(install_info),
            load_errors: Vec::new(),
        }
    }

    /// An installed package whose metadata could not be loaded.
    pub fn failed(
        install_path: impl Into<PathBuf>,
        install_info: InstallInfo,
        error: PackageError,
    ) -> Self {
        let state = if error.is_file_not_found() {
            PackageState::NotFound
        } else {
            PackageState::NotLoadable
        };
        Package {
            name: install_info.package_name().to_string(),
            install_path: install_path.into(),
            kind: PackageKind::Installed,
            state,
            metadata: None,
            install_info: Some(install_info),
            load_errors: vec![error],
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Absolute directory of the package; the root directory for the root package.
    pub fn install_path(&self) -> &Path {
        &self.install_path
    }

    pub fn kind(&self) -> PackageKind {
        self.kind
    }

    pub fn is_root(&self) -> bool {
        self.kind == PackageKind::Root
    }

    pub fn state(&self) -> PackageState {
        self.state
    }

    pub fn is_enabled(&self) -> bool {
        self.state == PackageState::Enabled
    }

    pub fn is_not_found(&self) -> bool {
        self.state == PackageState::NotFound
    }

    pub fn is_not_loadable(&self) -> bool {
        self.state == PackageState::NotLoadable
    }

    pub fn metadata(&self) -> Option<&PackageMetadata> {
        self.metadata.as_ref()
    }

    pub fn install_info(&self) -> Option<&InstallInfo> {
        self.install_info.as_ref()
    }

    pub fn load_errors(&self) -> &[PackageError] {
        &self.load_errors
    }

    /// Re-key this package after its install record was renamed.
    pub(crate) fn rename_installed(&mut self, install_info: InstallInfo) {
        self.name = install_info.package_name().to_string();
        self.install_info = Some(install_info);
    }

    /// Re-key the root package after its declared name changed.
    pub(crate) fn rename_root(&mut self, name: &str) {
        self.name = name.to_string();
        if let Some(metadata) = self.metadata.as_mut() {
            metadata.set_name(Some(name.to_string()));
        }
    }
}
