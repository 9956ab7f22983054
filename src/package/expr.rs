//! Predicate expressions over packages.
//!
//! An [`Expr`] is a small tree of leaf tests on a package's attributes
//! combined with `and`, `or` and `not`. The manager only ever calls
//! [`Expr::evaluate`].
//!
//! ```
//! use pkgreg::package::{Expr, StrPredicate};
//!
//! let expr = Expr::name(StrPredicate::ends_with("1"))
//!     .or(Expr::name(StrPredicate::ends_with("2")))
//!     .and(Expr::enabled());
//! # let _ = expr;
//! ```

use std::ops::Not;

use anyhow::{Context, Result};

use super::{CapabilityId, Environment, Package, PackageState};

/// Test applied to a string attribute.
#[derive(Debug, Clone, PartialEq)]
pub enum StrPredicate {
    Equals(String),
    NotEquals(String),
    StartsWith(String),
    EndsWith(String),
    Contains(String),
    /// Shell-style glob, e.g. `vendor/*`.
    Matches(glob::Pattern),
}

impl StrPredicate {
    pub fn equals(value: impl Into<String>) -> Self {
        StrPredicate::Equals(value.into())
    }

    pub fn not_equals(value: impl Into<String>) -> Self {
        StrPredicate::NotEquals(value.into())
    }

    pub fn starts_with(value: impl Into<String>) -> Self {
        StrPredicate::StartsWith(value.into())
    }

    pub fn ends_with(value: impl Into<String>) -> Self {
        StrPredicate::EndsWith(value.into())
    }

    pub fn contains(value: impl Into<String>) -> Self {
        StrPredicate::Contains(value.into())
    }

    pub fn matches(pattern: &str) -> Result<Self> {
        let pattern = glob::Pattern::new(pattern)
            .with_context(|| format!("Invalid glob pattern '{}'", pattern))?;
        Ok(StrPredicate::Matches(pattern))
    }

    pub fn test(&self, value: &str) -> bool {
        match self {
            StrPredicate::Equals(expected) => value == expected,
            StrPredicate::NotEquals(expected) => value != expected,
            StrPredicate::StartsWith(prefix) => value.starts_with(prefix.as_str()),
            StrPredicate::EndsWith(suffix) => value.ends_with(suffix.as_str()),
            StrPredicate::Contains(needle) => value.contains(needle.as_str()),
            StrPredicate::Matches(pattern) => pattern.matches(value),
        }
    }
}

/// Predicate over a [`Package`].
///
/// Leaves that look through the install record (installer, environment,
/// disabled capabilities) are false for the root package.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// Matches every package.
    All,
    Name(StrPredicate),
    /// Tested against the absolute install path.
    InstallPath(StrPredicate),
    InstallerName(StrPredicate),
    Environment(Environment),
    State(PackageState),
    Enabled(bool),
    Root(bool),
    CapabilityDisabled(CapabilityId),
    Not(Box<Expr>),
    And(Vec<Expr>),
    Or(Vec<Expr>),
}

impl Expr {
    pub fn all() -> Self {
        Expr::All
    }

    pub fn name(predicate: StrPredicate) -> Self {
        Expr::Name(predicate)
    }

    pub fn install_path(predicate: StrPredicate) -> Self {
        Expr::InstallPath(predicate)
    }

    pub fn installer_name(predicate: StrPredicate) -> Self {
        Expr::InstallerName(predicate)
    }

    pub fn environment(environment: Environment) -> Self {
        Expr::Environment(environment)
    }

    pub fn state(state: PackageState) -> Self {
        Expr::State(state)
    }

    pub fn enabled() -> Self {
        Expr::Enabled(true)
    }

    pub fn root() -> Self {
        Expr::Root(true)
    }

    pub fn capability_disabled(id: CapabilityId) -> Self {
        Expr::CapabilityDisabled(id)
    }

    /// Conjunction; nested `And`s are flattened.
    pub fn and(self, other: Expr) -> Self {
        match self {
            Expr::And(mut exprs) => {
                exprs.push(other);
                Expr::And(exprs)
            }
            expr => Expr::And(vec![expr, other]),
        }
    }

    /// Disjunction; nested `Or`s are flattened.
    pub fn or(self, other: Expr) -> Self {
        match self {
            Expr::Or(mut exprs) => {
                exprs.push(other);
                Expr::Or(exprs)
            }
            expr => Expr::Or(vec![expr, other]),
        }
    }

    pub fn evaluate(&self, package: &Package) -> bool {
        match self {
            Expr::All => true,
            Expr::Name(predicate) => predicate.test(package.name()),
            Expr::InstallPath(predicate) => {
                predicate.test(&package.install_path().to_string_lossy())
            }
            Expr::InstallerName(predicate) => package
                .install_info()
                .is_some_and(|info| predicate.test(info.installer_name())),
            Expr::Environment(environment) => package
                .install_info()
                .is_some_and(|info| info.environment() == *environment),
            Expr::State(state) => package.state() == *state,
            Expr::Enabled(enabled) => package.is_enabled() == *enabled,
            Expr::Root(root) => package.is_root() == *root,
            Expr::CapabilityDisabled(id) => package
                .install_info()
                .is_some_and(|info| info.is_capability_disabled(id)),
            Expr::Not(expr) => !expr.evaluate(package),
            Expr::And(exprs) => exprs.iter().all(|expr| expr.evaluate(package)),
            Expr::Or(exprs) => exprs.iter().any(|expr| expr.evaluate(package)),
        }
    }
}

impl Not for Expr {
    type Output = Expr;

    fn not(self) -> Expr {
        match self {
            Expr::Not(inner) => *inner,
            expr => Expr::Not(Box::new(expr)),
        }
    }
}
