use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use uuid::Uuid;

/// Installer name used when the caller does not name one.
pub const DEFAULT_INSTALLER_NAME: &str = "user";

/// The environment a package is installed for.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    Dev,
    #[default]
    Prod,
}

impl Environment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Environment::Dev => "dev",
            Environment::Prod => "prod",
        }
    }

    fn is_prod(&self) -> bool {
        *self == Environment::Prod
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Environment {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "dev" => Ok(Environment::Dev),
            "prod" => Ok(Environment::Prod),
            other => anyhow::bail!("Invalid environment '{}'. Expected 'dev' or 'prod'.", other),
        }
    }
}

/// Opaque identifier of a capability a package can have disabled.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(transparent)]
pub struct CapabilityId(Uuid);

impl CapabilityId {
    pub fn new_v4() -> Self {
        CapabilityId(Uuid::new_v4())
    }
}

impl From<Uuid> for CapabilityId {
    fn from(uuid: Uuid) -> Self {
        CapabilityId(uuid)
    }
}

impl fmt::Display for CapabilityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl FromStr for CapabilityId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(CapabilityId)
    }
}

fn is_default_installer(name: &String) -> bool {
    name == DEFAULT_INSTALLER_NAME
}

fn default_installer() -> String {
    DEFAULT_INSTALLER_NAME.to_string()
}

/// Install record of one non-root package, persisted in the root package file.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct InstallInfo {
    #[serde(rename = "name")]
    package_name: String,
    #[serde(rename = "install-path")]
    install_path: PathBuf,
    #[serde(
        rename = "installer",
        default = "default_installer",
        skip_serializing_if = "is_default_installer"
    )]
    installer_name: String,
    #[serde(rename = "env", default, skip_serializing_if = "Environment::is_prod")]
    environment: Environment,
    #[serde(
        rename = "disabled-capabilities",
        default,
        skip_serializing_if = "BTreeSet::is_empty"
    )]
    disabled_capability_ids: BTreeSet<CapabilityId>,
}

impl InstallInfo {
    pub fn new(package_name: impl Into<String>, install_path: impl Into<PathBuf>) -> Self {
        InstallInfo {
            package_name: package_name.into(),
            install_path: install_path.into(),
            installer_name: default_installer(),
            environment: Environment::default(),
            disabled_capability_ids: BTreeSet::new(),
        }
    }

    pub fn package_name(&self) -> &str {
        &self.package_name
    }

    /// The install path as stored: relative to the root directory or absolute.
    pub fn install_path(&self) -> &Path {
        &self.install_path
    }

    pub fn installer_name(&self) -> &str {
        &self.installer_name
    }

    pub fn set_installer_name(&mut self, installer_name: impl Into<String>) {
        self.installer_name = installer_name.into();
    }

    pub fn environment(&self) -> Environment {
        self.environment
    }

    pub fn set_environment(&mut self, environment: Environment) {
        self.environment = environment;
    }

    pub fn disabled_capability_ids(&self) -> &BTreeSet<CapabilityId> {
        &self.disabled_capability_ids
    }

    pub fn disable_capability(&mut self, id: CapabilityId) {
        self.disabled_capability_ids.insert(id);
    }

    pub fn enable_capability(&mut self, id: &CapabilityId) {
        self.disabled_capability_ids.remove(id);
    }

    pub fn is_capability_disabled(&self, id: &CapabilityId) -> bool {
        self.disabled_capability_ids.contains(id)
    }

    /// Copy of this record under a different package name.
    pub fn renamed(&self, package_name: impl Into<String>) -> Self {
        InstallInfo {
            package_name: package_name.into(),
            ..self.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_uses_defaults() {
        let info = InstallInfo::new("vendor/package1", "../package1");
        assert_eq!(info.package_name(), "vendor/package1");
        assert_eq!(info.install_path(), Path::new("../package1"));
        assert_eq!(info.installer_name(), "user");
        assert_eq!(info.environment(), Environment::Prod);
        assert!(info.disabled_capability_ids().is_empty());
    }

    #[test]
    fn test_renamed_preserves_other_fields() {
        let mut info = InstallInfo::new("vendor/package1", "../package1");
        let id = CapabilityId::new_v4();
        info.set_installer_name("composer");
        info.set_environment(Environment::Dev);
        info.disable_capability(id);

        let renamed = info.renamed("vendor/new");

        assert_eq!(renamed.package_name(), "vendor/new");
        assert_eq!(renamed.install_path(), Path::new("../package1"));
        assert_eq!(renamed.installer_name(), "composer");
        assert_eq!(renamed.environment(), Environment::Dev);
        assert!(renamed.is_capability_disabled(&id));
    }

    #[test]
    fn test_enable_capability() {
        let mut info = InstallInfo::new("vendor/package1", "../package1");
        let id = CapabilityId::new_v4();
        info.disable_capability(id);
        assert!(info.is_capability_disabled(&id));
        info.enable_capability(&id);
        assert!(!info.is_capability_disabled(&id));
    }

    #[test]
    fn test_serialization_omits_defaults() {
        let info = InstallInfo::new("vendor/package1", "../package1");
        let json = serde_json::to_value(&info).unwrap();
        assert_eq!(
            json,
            serde_json::json!({ "name": "vendor/package1", "install-path": "../package1" })
        );
    }

    #[test]
    fn test_deserialization_with_all_fields() {
        let id = "6ba7b810-9dad-11d1-80b4-00c04fd430c8";
        let json = format!(
            r#"{{
                "name": "vendor/package1",
                "install-path": "/opt/package1",
                "installer": "composer",
                "env": "dev",
                "disabled-capabilities": ["{}"]
            }}"#,
            id
        );
        let info: InstallInfo = serde_json::from_str(&json).unwrap();
        assert_eq!(info.installer_name(), "composer");
        assert_eq!(info.environment(), Environment::Dev);
        assert!(info.is_capability_disabled(&id.parse().unwrap()));
    }

    #[test]
    fn test_environment_from_str() {
        assert_eq!("dev".parse::<Environment>().unwrap(), Environment::Dev);
        assert_eq!(" PROD ".parse::<Environment>().unwrap(), Environment::Prod);
        assert!("staging".parse::<Environment>().is_err());
    }
}
