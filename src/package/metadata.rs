use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::Path;

use super::InstallInfo;
use crate::error::{PackageError, Result};
use crate::runtime::resolve_relative_path;

/// Metadata declared in a package's own `pkgreg.json`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
pub struct PackageMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    name: Option<String>,
    /// Package-specific configuration: every other key of the file.
    #[serde(flatten)]
    config: BTreeMap<String, Value>,
}

impl PackageMetadata {
    pub fn new(name: Option<String>) -> Self {
        PackageMetadata {
            name,
            config: BTreeMap::new(),
        }
    }

    pub fn named(name: impl Into<String>) -> Self {
        Self::new(Some(name.into()))
    }

    /// The declared package name, if the file declares one.
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn set_name(&mut self, name: Option<String>) {
        self.name = name;
    }

    pub fn config(&self) -> &BTreeMap<String, Value> {
        &self.config
    }

    pub fn config_value(&self, key: &str) -> Option<&Value> {
        self.config.get(key)
    }

    pub fn set_config_value(&mut self, key: impl Into<String>, value: Value) {
        self.config.insert(key.into(), value);
    }
}

/// Metadata of the root project: its own package metadata plus the
/// ordered install records of every other package.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
pub struct RootPackageMetadata {
    #[serde(flatten)]
    package: PackageMetadata,
    #[serde(rename = "install", default, skip_serializing_if = "Vec::is_empty")]
    install_infos: Vec<InstallInfo>,
}

impl RootPackageMetadata {
    pub fn new(name: Option<String>) -> Self {
        RootPackageMetadata {
            package: PackageMetadata::new(name),
            install_infos: Vec::new(),
        }
    }

    pub fn named(name: impl Into<String>) -> Self {
        Self::new(Some(name.into()))
    }

    /// The root package's own metadata.
    pub fn package(&self) -> &PackageMetadata {
        &self.package
    }

    pub fn package_mut(&mut self) -> &mut PackageMetadata {
        &mut self.package
    }

    pub fn name(&self) -> Option<&str> {
        self.package.name()
    }

    pub fn set_name(&mut self, name: Option<String>) {
        self.package.set_name(name);
    }

    pub fn install_infos(&self) -> &[InstallInfo] {
        &self.install_infos
    }

    pub fn has_install_infos(&self) -> bool {
        !self.install_infos.is_empty()
    }

    pub fn has_install_info(&self, package_name: &str) -> bool {
        self.position(package_name).is_some()
    }

    pub fn install_info(&self, package_name: &str) -> Option<&InstallInfo> {
        self.install_infos
            .iter()
            .find(|info| info.package_name() == package_name)
    }

    /// Append an install record. Names are unique.
    pub fn add_install_info(&mut self, install_info: InstallInfo) -> Result<()> {
        if self.has_install_info(install_info.package_name()) {
            return Err(PackageError::NameConflict(
                install_info.package_name().to_string(),
            ));
        }
        self.install_infos.push(install_info);
        Ok(())
    }

    /// Remove the record of `package_name`, returning its former index and the record.
    pub fn remove_install_info(&mut self, package_name: &str) -> Option<(usize, InstallInfo)> {
        let index = self.position(package_name)?;
        Some((index, self.install_infos.remove(index)))
    }

    /// Put a previously removed record back where it was.
    ///
    /// Indices past the end append, so restoring a batch in ascending index
    /// order reproduces the original sequence.
    pub fn insert_install_info_at(&mut self, index: usize, install_info: InstallInfo) {
        let index = index.min(self.install_infos.len());
        self.install_infos.insert(index, install_info);
    }

    /// Remove every record matching `predicate` in one pass.
    ///
    /// Returns the removed records with their original indices, in ascending
    /// index order, ready for [`Self::restore_install_infos`].
    pub fn remove_install_infos_where<F>(&mut self, mut predicate: F) -> Vec<(usize, InstallInfo)>
    where
        F: FnMut(&InstallInfo) -> bool,
    {
        let mut removed = Vec::new();
        let mut kept = Vec::with_capacity(self.install_infos.len());
        for (index, info) in std::mem::take(&mut self.install_infos)
            .into_iter()
            .enumerate()
        {
            if predicate(&info) {
                removed.push((index, info));
            } else {
                kept.push(info);
            }
        }
        self.install_infos = kept;
        removed
    }

    /// Undo [`Self::remove_install_infos_where`].
    pub fn restore_install_infos(&mut self, removed: Vec<(usize, InstallInfo)>) {
        for (index, info) in removed {
            self.insert_install_info_at(index, info);
        }
    }

    /// Find the record whose install path resolves to `package_dir`.
    pub fn find_install_info_by_path(
        &self,
        root_dir: &Path,
        package_dir: &Path,
    ) -> Option<&InstallInfo> {
        let wanted = resolve_relative_path(root_dir, package_dir);
        self.install_infos
            .iter()
            .find(|info| resolve_relative_path(root_dir, info.install_path()) == wanted)
    }

    fn position(&self, package_name: &str) -> Option<usize> {
        self.install_infos
            .iter()
            .position(|info| info.package_name() == package_name)
    }
}
