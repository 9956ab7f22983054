//! Loading and saving package files.
//!
//! Every package directory may carry a `pkgreg.json`. The root project's file
//! additionally lists the install records of all other packages.

use log::debug;
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};

use crate::error::{PackageError, Result};
use crate::package::{DEFAULT_ROOT_PACKAGE_NAME, PackageMetadata, RootPackageMetadata};
use crate::runtime::Runtime;

/// File name of package files.
pub const PACKAGE_FILE_NAME: &str = "pkgreg.json";

/// Newest format version this build reads and the version it writes.
pub const FORMAT_VERSION: (u32, u32) = (1, 0);

/// Storage collaborator of the package manager.
#[cfg_attr(test, mockall::automock)]
pub trait PackageFileStorage {
    /// Load the root package file of `root_dir`. Fails with `FileNotFound` if absent.
    fn load_root_metadata(&self, root_dir: &Path) -> Result<RootPackageMetadata>;

    /// Persist the root package file of `root_dir`.
    fn save_root_metadata(&self, metadata: &RootPackageMetadata, root_dir: &Path) -> Result<()>;

    /// Load the package file of `package_dir`.
    fn load_package_metadata(&self, package_dir: &Path) -> Result<PackageMetadata>;
}

/// Path of the package file inside `dir`.
pub fn package_file_path(dir: &Path) -> PathBuf {
    dir.join(PACKAGE_FILE_NAME)
}

fn format_version() -> String {
    format!("{}.{}", FORMAT_VERSION.0, FORMAT_VERSION.1)
}

/// Parse a `major.minor` version string. A bare major means `major.0`.
fn parse_version(version: &str) -> Option<(u32, u32)> {
    let mut parts = version.trim().splitn(2, '.');
    let major = parts.next()?.parse().ok()?;
    let minor = match parts.next() {
        Some(minor) => minor.parse().ok()?,
        None => 0,
    };
    Some((major, minor))
}

fn check_version(path: &Path, version: Option<Value>) -> Result<()> {
    let version = match version {
        None | Some(Value::Null) => return Ok(()),
        Some(Value::String(version)) => version,
        Some(other) => {
            return Err(PackageError::invalid_config(
                path,
                format!("the version must be a string, got {}", other),
            ));
        }
    };

    let parsed = parse_version(&version).ok_or_else(|| {
        PackageError::invalid_config(path, format!("invalid version \"{}\"", version))
    })?;

    if parsed > FORMAT_VERSION {
        return Err(PackageError::UnsupportedVersion {
            path: path.to_path_buf(),
            version,
            supported: format_version(),
        });
    }
    Ok(())
}

/// Package file storage backed by JSON files.
pub struct JsonFileStorage<'a, R: Runtime> {
    runtime: &'a R,
}

impl<'a, R: Runtime> JsonFileStorage<'a, R> {
    pub fn new(runtime: &'a R) -> Self {
        Self { runtime }
    }

    /// Read a package file into its JSON fields, with the version checked and removed.
    fn read_document(&self, path: &Path) -> Result<Map<String, Value>> {
        if !self.runtime.exists(path) {
            return Err(PackageError::FileNotFound(path.to_path_buf()));
        }

        debug!("Reading package file {:?}", path);
        let content = self.runtime.read_to_string(path).map_err(|e| {
            PackageError::invalid_config(path, format!("could not be read: {:#}", e))
        })?;

        let value: Value = serde_json::from_str(&content)
            .map_err(|e| PackageError::invalid_config(path, e.to_string()))?;
        let Value::Object(mut fields) = value else {
            return Err(PackageError::invalid_config(path, "expected a JSON object"));
        };

        check_version(path, fields.remove("version"))?;
        Ok(fields)
    }

    fn write_atomically(&self, path: &Path, contents: &[u8]) -> Result<()> {
        let mut tmp = path.as_os_str().to_owned();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);

        self.runtime
            .write(&tmp, contents)
            .map_err(|e| PackageError::storage(path, e))?;

        if let Err(e) = self.runtime.rename(&tmp, path) {
            let _ = self.runtime.remove_file(&tmp);
            return Err(PackageError::storage(path, e));
        }
        Ok(())
    }
}

impl<R: Runtime> PackageFileStorage for JsonFileStorage<'_, R> {
    fn load_root_metadata(&self, root_dir: &Path) -> Result<RootPackageMetadata> {
        let path = package_file_path(root_dir);
        let fields = self.read_document(&path)?;
        let metadata: RootPackageMetadata = serde_json::from_value(Value::Object(fields))
            .map_err(|e| PackageError::invalid_config(&path, e.to_string()))?;

        let root_name = metadata.name().unwrap_or(DEFAULT_ROOT_PACKAGE_NAME);
        let mut seen = std::collections::HashSet::new();
        for info in metadata.install_infos() {
            if info.package_name() == root_name {
                return Err(PackageError::invalid_config(
                    &path,
                    format!(
                        "the package \"{}\" is installed under the root package's name",
                        root_name
                    ),
                ));
            }
            if !seen.insert(info.package_name()) {
                return Err(PackageError::invalid_config(
                    &path,
                    format!("the package \"{}\" is installed twice", info.package_name()),
                ));
            }
        }

        debug!(
            "Loaded root package file {:?} with {} install record(s)",
            path,
            metadata.install_infos().len()
        );
        Ok(metadata)
    }

    fn save_root_metadata(&self, metadata: &RootPackageMetadata, root_dir: &Path) -> Result<()> {
        let path = package_file_path(root_dir);

        let value = serde_json::to_value(metadata)
            .map_err(|e| PackageError::storage(&path, e.into()))?;
        let mut document = Map::new();
        document.insert("version".to_string(), Value::from(format_version()));
        if let Value::Object(fields) = value {
            document.extend(fields);
        }

        let content = serde_json::to_string_pretty(&Value::Object(document))
            .map_err(|e| PackageError::storage(&path, e.into()))?;

        debug!("Saving root package file {:?}", path);
        self.write_atomically(&path, content.as_bytes())
    }

    fn load_package_metadata(&self, package_dir: &Path) -> Result<PackageMetadata> {
        let path = package_file_path(package_dir);
        let fields = self.read_document(&path)?;
        serde_json::from_value(Value::Object(fields))
            .map_err(|e| PackageError::invalid_config(&path, e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::package::InstallInfo;
    use crate::runtime::{MockRuntime, RealRuntime};
    use mockall::predicate::eq;

    fn mock_file(runtime: &mut MockRuntime, path: &Path, content: &'static str) {
        runtime
            .expect_exists()
            .with(eq(path.to_path_buf()))
            .returning(|_| true);
        runtime
            .expect_read_to_string()
            .with(eq(path.to_path_buf()))
            .returning(move |_| Ok(content.to_string()));
    }

    #[test]
    fn test_parse_version() {
        assert_eq!(parse_version("1.0"), Some((1, 0)));
        assert_eq!(parse_version("2"), Some((2, 0)));
        assert_eq!(parse_version("1.x"), None);
        assert_eq!(parse_version(""), None);
    }

    #[test]
    fn test_load_package_metadata() {
        let mut runtime = MockRuntime::new();
        let dir = PathBuf::from("/projects/package1");
        mock_file(
            &mut runtime,
            &dir.join("pkgreg.json"),
            r#"{"version": "1.0", "name": "vendor/package1", "description": "x"}"#,
        );

        let storage = JsonFileStorage::new(&runtime);
        let metadata = storage.load_package_metadata(&dir).unwrap();

        assert_eq!(metadata.name(), Some("vendor/package1"));
        assert_eq!(metadata.config_value("description").unwrap(), "x");
        assert!(metadata.config_value("version").is_none());
    }

    #[test]
    fn test_load_package_metadata_without_version_or_name() {
        let mut runtime = MockRuntime::new();
        let dir = PathBuf::from("/projects/package1");
        mock_file(&mut runtime, &dir.join("pkgreg.json"), "{}");

        let storage = JsonFileStorage::new(&runtime);
        let metadata = storage.load_package_metadata(&dir).unwrap();
        assert_eq!(metadata.name(), None);
    }

    #[test]
    fn test_load_package_metadata_not_found() {
        let mut runtime = MockRuntime::new();
        let dir = PathBuf::from("/projects/package1");
        runtime
            .expect_exists()
            .with(eq(dir.join("pkgreg.json")))
            .returning(|_| false);

        let storage = JsonFileStorage::new(&runtime);
        let err = storage.load_package_metadata(&dir).unwrap_err();
        assert!(err.is_file_not_found());
    }

    #[test]
    fn test_load_package_metadata_unsupported_version() {
        let mut runtime = MockRuntime::new();
        let dir = PathBuf::from("/projects/version-too-high");
        mock_file(&mut runtime, &dir.join("pkgreg.json"), r#"{"version": "1.1"}"#);

        let storage = JsonFileStorage::new(&runtime);
        match storage.load_package_metadata(&dir).unwrap_err() {
            PackageError::UnsupportedVersion {
                version, supported, ..
            } => {
                assert_eq!(version, "1.1");
                assert_eq!(supported, "1.0");
            }
            other => panic!("expected UnsupportedVersion, got {:?}", other),
        }
    }

    #[test]
    fn test_load_package_metadata_invalid() {
        let cases = [
            "not json",
            "[1, 2]",
            r#"{"name": 42}"#,
            r#"{"version": 1}"#,
            r#"{"version": "one"}"#,
        ];
        for case in cases {
            let mut runtime = MockRuntime::new();
            let dir = PathBuf::from("/projects/broken");
            mock_file(&mut runtime, &dir.join("pkgreg.json"), case);

            let storage = JsonFileStorage::new(&runtime);
            let err = storage.load_package_metadata(&dir).unwrap_err();
            assert!(err.is_invalid_config(), "expected '{}' to be invalid", case);
        }
    }

    #[test]
    fn test_load_root_metadata_rejects_duplicate_install_names() {
        let mut runtime = MockRuntime::new();
        let dir = PathBuf::from("/projects/app");
        mock_file(
            &mut runtime,
            &dir.join("pkgreg.json"),
            r#"{
                "name": "vendor/root",
                "install": [
                    {"name": "vendor/a", "install-path": "../a"},
                    {"name": "vendor/a", "install-path": "../b"}
                ]
            }"#,
        );

        let storage = JsonFileStorage::new(&runtime);
        let err = storage.load_root_metadata(&dir).unwrap_err();
        assert!(err.to_string().contains("vendor/a"));
    }

    #[test]
    fn test_load_root_metadata_rejects_install_named_like_root() {
        let cases = [
            (
                r#"{"name": "vendor/a", "install": [{"name": "vendor/a", "install-path": "a"}]}"#,
                "vendor/a",
            ),
            (
                r#"{"install": [{"name": "__root__", "install-path": "a"}]}"#,
                "__root__",
            ),
        ];
        for (content, root_name) in cases {
            let mut runtime = MockRuntime::new();
            let dir = PathBuf::from("/projects/app");
            mock_file(&mut runtime, &dir.join("pkgreg.json"), content);

            let storage = JsonFileStorage::new(&runtime);
            let err = storage.load_root_metadata(&dir).unwrap_err();
            assert!(err.is_invalid_config(), "expected '{}' to be invalid", content);
            assert!(err.to_string().contains(root_name));
        }
    }

    #[test]
    fn test_save_writes_temp_file_then_renames() {
        let mut runtime = MockRuntime::new();
        let dir = PathBuf::from("/projects/app");
        let target = dir.join("pkgreg.json");
        let tmp = dir.join("pkgreg.json.tmp");

        runtime
            .expect_write()
            .withf(move |path, contents| {
                let text = std::str::from_utf8(contents).unwrap();
                path == Path::new("/projects/app/pkgreg.json.tmp")
                    && text.contains("\"version\": \"1.0\"")
                    && text.contains("\"vendor/package1\"")
            })
            .times(1)
            .returning(|_, _| Ok(()));
        runtime
            .expect_rename()
            .with(eq(tmp), eq(target))
            .times(1)
            .returning(|_, _| Ok(()));

        let mut metadata = RootPackageMetadata::named("vendor/root");
        metadata
            .add_install_info(InstallInfo::new("vendor/package1", "../package1"))
            .unwrap();

        let storage = JsonFileStorage::new(&runtime);
        storage.save_root_metadata(&metadata, &dir).unwrap();
    }

    #[test]
    fn test_save_failure_removes_temp_file() {
        let mut runtime = MockRuntime::new();
        let dir = PathBuf::from("/projects/app");

        runtime.expect_write().returning(|_, _| Ok(()));
        runtime
            .expect_rename()
            .returning(|_, _| Err(anyhow::anyhow!("permission denied")));
        runtime
            .expect_remove_file()
            .with(eq(dir.join("pkgreg.json.tmp")))
            .times(1)
            .returning(|_| Ok(()));

        let storage = JsonFileStorage::new(&runtime);
        let err = storage
            .save_root_metadata(&RootPackageMetadata::default(), &dir)
            .unwrap_err();
        assert!(matches!(err, PackageError::Storage { .. }));
    }

    #[test]
    fn test_real_filesystem_roundtrip() {
        let runtime = RealRuntime;
        let dir = tempfile::tempdir().unwrap();
        let storage = JsonFileStorage::new(&runtime);

        assert!(
            storage
                .load_root_metadata(dir.path())
                .unwrap_err()
                .is_file_not_found()
        );

        let mut metadata = RootPackageMetadata::named("vendor/root");
        let mut info = InstallInfo::new("vendor/package1", "../package1");
        info.set_installer_name("composer");
        metadata.add_install_info(info).unwrap();

        storage.save_root_metadata(&metadata, dir.path()).unwrap();
        assert!(!dir.path().join("pkgreg.json.tmp").exists());

        let loaded = storage.load_root_metadata(dir.path()).unwrap();
        assert_eq!(loaded, metadata);
    }
}
