//! Package model
//!
//! This module provides the value types of the registry: install records,
//! package metadata, packages, package collections and the predicate
//! expressions used to query them.

mod collection;
mod expr;
mod install_info;
mod metadata;
#[allow(clippy::module_inception)]
mod package;

pub use collection::PackageCollection;
pub use expr::{Expr, StrPredicate};
pub use install_info::{CapabilityId, DEFAULT_INSTALLER_NAME, Environment, InstallInfo};
pub use metadata::{PackageMetadata, RootPackageMetadata};
pub use package::{DEFAULT_ROOT_PACKAGE_NAME, Package, PackageKind, PackageState};
