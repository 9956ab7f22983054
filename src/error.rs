//! Error kinds reported by the package registry.

use std::error::Error as StdError;
use std::path::PathBuf;
use std::sync::Arc;

/// Errors that can occur while loading or mutating the package registry.
///
/// The type is `Clone` because load failures are stored on the packages
/// they belong to and packages are handed out as snapshots.
#[derive(Debug, Clone, thiserror::Error)]
pub enum PackageError {
    /// The path does not exist.
    #[error("the path {0:?} does not exist")]
    FileNotFound(PathBuf),

    /// The path exists but is not a directory.
    #[error("the path {0:?} is not a directory")]
    NoDirectory(PathBuf),

    /// The file was written by a newer version of the format.
    #[error("{path:?} has version {version}, but only versions up to {supported} are supported")]
    UnsupportedVersion {
        path: PathBuf,
        version: String,
        supported: String,
    },

    /// The file is malformed or violates the schema.
    #[error("{path:?} is invalid: {reason}")]
    InvalidConfig { path: PathBuf, reason: String },

    /// A package with this name is already registered.
    #[error("a package named \"{0}\" is already registered")]
    NameConflict(String),

    /// No package with this name is registered.
    #[error("the package \"{0}\" does not exist")]
    NoSuchPackage(String),

    /// An argument failed validation.
    #[error("{0}")]
    InvalidArgument(String),

    /// The storage layer could not persist a file.
    #[error("failed to save {path:?}")]
    Storage {
        path: PathBuf,
        #[source]
        source: Arc<dyn StdError + Send + Sync>,
    },
}

impl PackageError {
    pub fn invalid_config(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        PackageError::InvalidConfig {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Wrap a runtime failure that happened while writing `path`.
    pub fn storage(path: impl Into<PathBuf>, err: anyhow::Error) -> Self {
        let source: Box<dyn StdError + Send + Sync> = err.into();
        PackageError::Storage {
            path: path.into(),
            source: Arc::from(source),
        }
    }

    pub fn is_file_not_found(&self) -> bool {
        matches!(self, PackageError::FileNotFound(_))
    }

    pub fn is_no_directory(&self) -> bool {
        matches!(self, PackageError::NoDirectory(_))
    }

    pub fn is_unsupported_version(&self) -> bool {
        matches!(self, PackageError::UnsupportedVersion { .. })
    }

    pub fn is_invalid_config(&self) -> bool {
        matches!(self, PackageError::InvalidConfig { .. })
    }
}

pub type Result<T, E = PackageError> = std::result::Result<T, E>;
