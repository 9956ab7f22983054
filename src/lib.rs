pub mod commands;
pub mod config;
pub mod context;
pub mod error;
pub mod manager;
pub mod package;
pub mod runtime;
pub mod storage;

pub use error::{PackageError, Result};
pub use manager::{InstallOptions, PackageManager};
