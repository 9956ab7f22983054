use anyhow::Result;
use log::debug;
use std::path::Path;

use crate::{
    manager::InstallOptions,
    runtime::{Runtime, resolve_relative_path},
};

use super::config::{Config, open_manager};

/// Install the package in `path` (relative to the current directory)
#[tracing::instrument(skip(runtime, options, config))]
pub fn install<R: Runtime>(
    runtime: &R,
    path: &Path,
    options: InstallOptions,
    config: Config,
) -> Result<()> {
    let mut manager = open_manager(runtime, &config)?;
    let package_dir = resolve_relative_path(&runtime.current_dir()?, path);
    debug!("Installing {:?} with {:?}", package_dir, options);

    if let Some(existing) = manager
        .root_metadata()
        .find_install_info_by_path(manager.root_dir(), &package_dir)
    {
        println!(
            "{} is already installed as {}",
            package_dir.display(),
            existing.package_name()
        );
        return Ok(());
    }

    manager.install_package(&package_dir, options)?;

    match manager
        .get_packages()
        .installed_packages()
        .find(|p| p.install_path() == package_dir)
    {
        Some(package) => println!(
            "Installed {} from {}",
            package.name(),
            package_dir.display()
        ),
        None => println!("Installed {}", package_dir.display()),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::RealRuntime;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_install_writes_root_package_file() {
        let dir = tempdir().unwrap();
        let root = dir.path().join("root");
        let package = dir.path().join("package");
        fs::create_dir_all(&root).unwrap();
        fs::create_dir_all(&package).unwrap();
        fs::write(
            package.join("pkgreg.json"),
            r#"{"version": "1.0", "name": "vendor/package"}"#,
        )
        .unwrap();

        let config = Config::new(Some(root.clone()), Some(dir.path().join("config.json")));
        install(&RealRuntime, &package, InstallOptions::default(), config).unwrap();

        let content = fs::read_to_string(root.join("pkgreg.json")).unwrap();
        let json: serde_json::Value = serde_json::from_str(&content).unwrap();
        assert_eq!(json["version"], "1.0");
        assert_eq!(json["install"][0]["name"], "vendor/package");
        assert_eq!(
            json["install"][0]["install-path"],
            package.to_string_lossy().as_ref()
        );
    }

    #[test]
    fn test_install_already_installed_directory_is_unchanged() {
        let dir = tempdir().unwrap();
        let root = dir.path().join("root");
        let package = dir.path().join("package");
        fs::create_dir_all(&root).unwrap();
        fs::create_dir_all(&package).unwrap();
        fs::write(package.join("pkgreg.json"), r#"{"name": "vendor/package"}"#).unwrap();

        let config_path = dir.path().join("config.json");
        let config = Config::new(Some(root.clone()), Some(config_path.clone()));
        install(&RealRuntime, &package, InstallOptions::default(), config).unwrap();
        let before = fs::read_to_string(root.join("pkgreg.json")).unwrap();

        let config = Config::new(Some(root.clone()), Some(config_path));
        install(&RealRuntime, &package, InstallOptions::named("vendor/other"), config).unwrap();

        let after = fs::read_to_string(root.join("pkgreg.json")).unwrap();
        assert_eq!(before, after);
    }

    #[test]
    fn test_install_missing_directory_fails() {
        let dir = tempdir().unwrap();
        let config = Config::new(
            Some(dir.path().to_path_buf()),
            Some(dir.path().join("config.json")),
        );

        let result = install(
            &RealRuntime,
            &dir.path().join("missing"),
            InstallOptions::default(),
            config,
        );

        assert!(result.is_err());
        assert!(!dir.path().join("pkgreg.json").exists());
    }
}
