//! Package registry manager.
//!
//! The manager owns the root package metadata of one project and keeps a
//! lazily built [`PackageCollection`] in sync with its install records.
//! Every mutation is persisted through the [`PackageFileStorage`]; if saving
//! fails, the in-memory state is restored before the error is returned.

use std::cell::OnceCell;
use std::collections::HashSet;
use std::path::{Path, PathBuf};

use log::{debug, info, warn};

use crate::config::GlobalConfig;
use crate::context::ProjectContext;
use crate::error::{PackageError, Result};
use crate::package::{
    Environment, Expr, InstallInfo, Package, PackageCollection, PackageMetadata,
    RootPackageMetadata,
};
use crate::runtime::{Runtime, relative_install_path, resolve_relative_path};
use crate::storage::{PackageFileStorage, package_file_path};

/// Options for [`PackageManager::install_package`]
#[derive(Debug, Clone, Default)]
pub struct InstallOptions {
    /// Package name overriding the name declared by the package
    pub name: Option<String>,
    /// Installer to record (defaults to the configured installer)
    pub installer_name: Option<String>,
    /// Environment to record (defaults to the configured environment)
    pub environment: Option<Environment>,
}

impl InstallOptions {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::default()
        }
    }
}

/// Check that `name` has the form `vendor/name`.
pub fn validate_package_name(name: &str) -> Result<()> {
    match name.split_once('/') {
        Some((vendor, rest)) if !vendor.trim().is_empty() && !rest.trim().is_empty() => Ok(()),
        _ => Err(PackageError::InvalidArgument(format!(
            "The package name \"{}\" must have the form \"vendor/name\"",
            name
        ))),
    }
}

/// Manages the packages installed in a project.
pub struct PackageManager<'a, R: Runtime, S: PackageFileStorage> {
    runtime: &'a R,
    storage: S,
    root_dir: PathBuf,
    root_metadata: RootPackageMetadata,
    config: GlobalConfig,
    /// Empty until the first query; updated in place after successful saves.
    packages: OnceCell<PackageCollection>,
}

impl<'a, R: Runtime, S: PackageFileStorage> PackageManager<'a, R, S> {
    pub fn new(runtime: &'a R, storage: S, context: ProjectContext) -> Self {
        let (root_dir, root_metadata, config) = context.into_parts();
        Self {
            runtime,
            storage,
            root_dir,
            root_metadata,
            config,
            packages: OnceCell::new(),
        }
    }

    pub fn root_dir(&self) -> &Path {
        &self.root_dir
    }

    pub fn root_metadata(&self) -> &RootPackageMetadata {
        &self.root_metadata
    }

    pub fn get_root_package(&self) -> Package {
        Package::root(self.root_dir.clone(), self.root_metadata.package().clone())
    }

    /// All packages: the root package first, then one package per install record.
    pub fn get_packages(&self) -> &PackageCollection {
        self.packages.get_or_init(|| self.load_packages())
    }

    pub fn find_packages(&self, expr: &Expr) -> PackageCollection {
        self.get_packages().filter(expr)
    }

    pub fn has_package(&self, name: &str) -> bool {
        self.get_packages().contains(name)
    }

    pub fn get_package(&self, name: &str) -> Result<&Package> {
        self.get_packages().get(name)
    }

    /// Whether any package (matching `expr`, if given) exists.
    pub fn has_packages(&self, expr: Option<&Expr>) -> bool {
        match expr {
            Some(expr) => self.get_packages().iter().any(|p| expr.evaluate(p)),
            None => !self.get_packages().is_empty(),
        }
    }

    /// Register the package in `path` (relative paths are resolved against the root directory).
    #[tracing::instrument(skip(self, path), fields(path = ?path.as_ref()))]
    pub fn install_package(&mut self, path: impl AsRef<Path>, options: InstallOptions) -> Result<()> {
        let package_dir = resolve_relative_path(&self.root_dir, path.as_ref());
        self.check_package_dir(&package_dir)?;

        if let Some(existing) = self
            .root_metadata
            .find_install_info_by_path(&self.root_dir, &package_dir)
        {
            info!(
                "{:?} is already installed as {}",
                package_dir,
                existing.package_name()
            );
            return Ok(());
        }

        // A name override makes a broken package file acceptable, but a file
        // from a newer format version is never installed.
        let loaded = self.load_package_file(&package_dir);
        if let Err(e) = &loaded
            && (options.name.is_none() || e.is_unsupported_version())
        {
            return Err(e.clone());
        }

        let name = match options.name {
            Some(name) => name,
            None => loaded
                .as_ref()
                .ok()
                .and_then(|metadata| metadata.name())
                .map(str::to_string)
                .ok_or_else(|| {
                    PackageError::invalid_config(package_file_path(&package_dir), "no name found")
                })?,
        };

        validate_package_name(&name)?;
        if self.has_package(&name) {
            return Err(PackageError::NameConflict(name));
        }

        let mut install_info =
            InstallInfo::new(&name, relative_install_path(&self.root_dir, &package_dir));
        install_info.set_installer_name(
            options
                .installer_name
                .unwrap_or_else(|| self.config.installer_name().to_string()),
        );
        install_info.set_environment(
            options
                .environment
                .unwrap_or_else(|| self.config.environment()),
        );

        self.root_metadata.add_install_info(install_info.clone())?;
        if let Err(e) = self.save() {
            self.root_metadata.remove_install_info(&name);
            return Err(e);
        }

        let package = match loaded {
            Ok(metadata) => Package::installed(package_dir, install_info, metadata),
            Err(e) => Package::failed(package_dir, install_info, e),
        };
        if let Some(packages) = self.packages.get_mut() {
            packages.add(package);
        }

        info!("Installed {}", name);
        Ok(())
    }

    /// Rename a package. The root package is renamed in its own metadata.
    #[tracing::instrument(skip(self))]
    pub fn rename_package(&mut self, old_name: &str, new_name: &str) -> Result<()> {
        if old_name == new_name {
            return Ok(());
        }

        let packages = self.get_packages();
        let is_root = packages.get(old_name)?.is_root();
        if packages.contains(new_name) {
            return Err(PackageError::NameConflict(new_name.to_string()));
        }
        validate_package_name(new_name)?;

        if is_root {
            self.rename_root_package(old_name, new_name)?;
        } else {
            self.rename_installed_package(old_name, new_name)?;
        }

        info!("Renamed {} to {}", old_name, new_name);
        Ok(())
    }

    /// Unregister a package. Unknown names and the root package are ignored.
    #[tracing::instrument(skip(self))]
    pub fn remove_package(&mut self, name: &str) -> Result<()> {
        let Some((index, removed)) = self.root_metadata.remove_install_info(name) else {
            debug!("No install record for {}, nothing to remove", name);
            return Ok(());
        };

        if let Err(e) = self.save() {
            self.root_metadata.insert_install_info_at(index, removed);
            return Err(e);
        }

        if let Some(packages) = self.packages.get_mut() {
            packages.remove(name);
        }

        info!("Removed {}", name);
        Ok(())
    }

    /// Unregister every installed package matching `expr` with a single save.
    #[tracing::instrument(skip(self))]
    pub fn remove_packages(&mut self, expr: &Expr) -> Result<()> {
        let names: HashSet<String> = self
            .get_packages()
            .installed_packages()
            .filter(|p| expr.evaluate(p))
            .map(|p| p.name().to_string())
            .collect();

        let removed = self
            .root_metadata
            .remove_install_infos_where(|info| names.contains(info.package_name()));
        if removed.is_empty() {
            debug!("No installed package matches, nothing to remove");
            return Ok(());
        }

        if let Err(e) = self.save() {
            self.root_metadata.restore_install_infos(removed);
            return Err(e);
        }

        if let Some(packages) = self.packages.get_mut() {
            for (_, info) in &removed {
                packages.remove(info.package_name());
            }
        }

        info!("Removed {} package(s)", removed.len());
        Ok(())
    }

    /// Unregister every installed package.
    pub fn clear_packages(&mut self) -> Result<()> {
        self.remove_packages(&Expr::all())
    }

    fn rename_root_package(&mut self, old_name: &str, new_name: &str) -> Result<()> {
        let previous = self.root_metadata.name().map(str::to_string);
        self.root_metadata.set_name(Some(new_name.to_string()));

        if let Err(e) = self.save() {
            self.root_metadata.set_name(previous);
            return Err(e);
        }

        if let Some(root) = self
            .packages
            .get_mut()
            .and_then(|packages| packages.find_mut(old_name))
        {
            root.rename_root(new_name);
        }
        Ok(())
    }

    fn rename_installed_package(&mut self, old_name: &str, new_name: &str) -> Result<()> {
        let (index, original) = self
            .root_metadata
            .remove_install_info(old_name)
            .ok_or_else(|| PackageError::NoSuchPackage(old_name.to_string()))?;
        let renamed = original.renamed(new_name);

        if let Err(e) = self.root_metadata.add_install_info(renamed.clone()) {
            self.root_metadata.insert_install_info_at(index, original);
            return Err(e);
        }

        if let Err(e) = self.save() {
            self.root_metadata.remove_install_info(new_name);
            self.root_metadata.insert_install_info_at(index, original);
            return Err(e);
        }

        // The renamed record moved to the end, so does the package.
        if let Some(packages) = self.packages.get_mut()
            && let Some(mut package) = packages.remove(old_name)
        {
            package.rename_installed(renamed);
            packages.add(package);
        }
        Ok(())
    }

    fn save(&self) -> Result<()> {
        self.storage
            .save_root_metadata(&self.root_metadata, &self.root_dir)
            .inspect_err(|e| warn!("Failed to save the root package file: {}", e))
    }

    fn load_packages(&self) -> PackageCollection {
        debug!(
            "Loading {} package(s) of {:?}",
            self.root_metadata.install_infos().len(),
            self.root_dir
        );

        let root = self.get_root_package();
        let root_name = root.name().to_string();
        let mut packages = PackageCollection::new();
        packages.add(root);
        for install_info in self.root_metadata.install_infos() {
            if install_info.package_name() == root_name {
                warn!(
                    "Skipping install record {:?}: the root package has that name",
                    install_info.package_name()
                );
                continue;
            }
            packages.add(self.load_package(install_info.clone()));
        }
        packages
    }

    fn load_package(&self, install_info: InstallInfo) -> Package {
        let package_dir = resolve_relative_path(&self.root_dir, install_info.install_path());
        let loaded = self
            .check_package_dir(&package_dir)
            .and_then(|_| self.load_package_file(&package_dir));

        match loaded {
            Ok(metadata) => Package::installed(package_dir, install_info, metadata),
            Err(e) => {
                debug!("Could not load {}: {}", install_info.package_name(), e);
                Package::failed(package_dir, install_info, e)
            }
        }
    }

    fn check_package_dir(&self, package_dir: &Path) -> Result<()> {
        if !self.runtime.exists(package_dir) {
            return Err(PackageError::FileNotFound(package_dir.to_path_buf()));
        }
        if !self.runtime.is_dir(package_dir) {
            return Err(PackageError::NoDirectory(package_dir.to_path_buf()));
        }
        Ok(())
    }

    /// Load the package file of an existing directory. A directory without
    /// a package file has empty metadata.
    fn load_package_file(&self, package_dir: &Path) -> Result<PackageMetadata> {
        match self.storage.load_package_metadata(package_dir) {
            Err(e) if e.is_file_not_found() => {
                debug!("No package file in {:?}", package_dir);
                Ok(PackageMetadata::default())
            }
            other => other,
        }
    }
}
