use anyhow::{Context, Result};
use log::debug;
use std::path::PathBuf;

use crate::{
    config::{GlobalConfig, GlobalConfigStorage, default_config_path},
    context::{ProjectContext, resolve_root_dir},
    manager::PackageManager,
    runtime::Runtime,
    storage::JsonFileStorage,
};

/// Settings shared by every command.
#[derive(Debug, Clone, Default)]
pub struct Config {
    /// Project root (defaults to the current directory)
    pub root: Option<PathBuf>,
    /// User config file (defaults to `<config dir>/pkgreg/config.json`)
    pub config_path: Option<PathBuf>,
}

impl Config {
    pub fn new(root: Option<PathBuf>, config_path: Option<PathBuf>) -> Self {
        Self { root, config_path }
    }

    pub fn config_path<R: Runtime>(&self, runtime: &R) -> Result<PathBuf> {
        match &self.config_path {
            Some(path) => Ok(path.clone()),
            None => default_config_path(runtime),
        }
    }

    pub fn load_global_config<R: Runtime>(&self, runtime: &R) -> Result<GlobalConfig> {
        let path = self.config_path(runtime)?;
        debug!("Using config file {:?}", path);
        GlobalConfigStorage::new(runtime).load(&path)
    }
}

/// Open the package manager of the configured project.
pub fn open_manager<'a, R: Runtime>(
    runtime: &'a R,
    config: &Config,
) -> Result<PackageManager<'a, R, JsonFileStorage<'a, R>>> {
    let root_dir = resolve_root_dir(runtime, config.root.clone())?;
    debug!("Using project root {:?}", root_dir);

    let global_config = config.load_global_config(runtime)?;
    let storage = JsonFileStorage::new(runtime);
    let context = ProjectContext::load(&storage, &root_dir, global_config)
        .with_context(|| format!("Failed to load the project in {:?}", root_dir))?;

    Ok(PackageManager::new(runtime, storage, context))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::MockRuntime;
    use mockall::predicate::eq;

    #[test]
    fn test_config_path_prefers_explicit_path() {
        let runtime = MockRuntime::new();
        let config = Config::new(None, Some(PathBuf::from("/etc/pkgreg.json")));

        assert_eq!(
            config.config_path(&runtime).unwrap(),
            PathBuf::from("/etc/pkgreg.json")
        );
    }

    #[test]
    fn test_config_path_defaults_to_config_dir() {
        let mut runtime = MockRuntime::new();
        runtime
            .expect_config_dir()
            .returning(|| Some(PathBuf::from("/home/user/.config")));

        let config = Config::default();

        assert_eq!(
            config.config_path(&runtime).unwrap(),
            PathBuf::from("/home/user/.config/pkgreg/config.json")
        );
    }

    #[test]
    fn test_config_path_fails_without_config_dir() {
        let mut runtime = MockRuntime::new();
        runtime.expect_config_dir().returning(|| None);

        assert!(Config::default().config_path(&runtime).is_err());
    }

    #[test]
    fn test_open_manager_without_root_package_file() {
        let mut runtime = MockRuntime::new();
        runtime
            .expect_current_dir()
            .returning(|| Ok(PathBuf::from("/projects/app")));
        runtime
            .expect_exists()
            .with(eq(PathBuf::from("/etc/pkgreg.json")))
            .returning(|_| false);
        runtime
            .expect_exists()
            .with(eq(PathBuf::from("/projects/app/pkgreg.json")))
            .returning(|_| false);

        let config = Config::new(None, Some(PathBuf::from("/etc/pkgreg.json")));
        let manager = open_manager(&runtime, &config).unwrap();

        assert_eq!(manager.root_dir(), PathBuf::from("/projects/app"));
        assert!(!manager.root_metadata().has_install_infos());
        assert_eq!(manager.get_root_package().name(), "__root__");
    }
}
