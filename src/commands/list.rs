use anyhow::Result;
use log::debug;

use crate::{
    package::{Environment, Expr, PackageCollection, PackageState, StrPredicate},
    runtime::Runtime,
};

use super::config::{Config, open_manager};

/// Filters of the list command. Unset filters match every package.
#[derive(Debug, Clone, Default)]
pub struct ListOptions {
    /// Glob matched against package names
    pub name: Option<String>,
    pub installer: Option<String>,
    pub environment: Option<Environment>,
    /// Accepted states; empty accepts all
    pub states: Vec<PackageState>,
}

impl ListOptions {
    pub fn to_expr(&self) -> Result<Expr> {
        let mut expr = Expr::all();

        if let Some(pattern) = &self.name {
            expr = expr.and(Expr::name(StrPredicate::matches(pattern)?));
        }
        if let Some(installer) = &self.installer {
            expr = expr.and(Expr::installer_name(StrPredicate::equals(installer)));
        }
        if let Some(environment) = self.environment {
            expr = expr.and(Expr::environment(environment));
        }
        if let Some(states) = self
            .states
            .iter()
            .map(|state| Expr::state(*state))
            .reduce(Expr::or)
        {
            expr = expr.and(states);
        }

        Ok(expr)
    }
}

/// List the packages of the project
#[tracing::instrument(skip(runtime, config))]
pub fn list<R: Runtime>(runtime: &R, options: &ListOptions, config: Config) -> Result<()> {
    let manager = open_manager(runtime, &config)?;
    let expr = options.to_expr()?;
    debug!("Listing packages of {:?} matching {:?}", manager.root_dir(), expr);

    let packages = manager.find_packages(&expr);
    if packages.is_empty() {
        println!("No packages found.");
        return Ok(());
    }

    print!("{}", render(&packages));
    Ok(())
}

fn render(packages: &PackageCollection) -> String {
    let name_width = packages.iter().map(|p| p.name().len()).max().unwrap_or(0);
    let state_width = packages
        .iter()
        .map(|p| p.state().as_str().len())
        .max()
        .unwrap_or(0);

    let mut out = String::new();
    for package in packages {
        out.push_str(&format!(
            "{:<name_width$}  {:<state_width$}  {}\n",
            package.name(),
            package.state().as_str(),
            package.install_path().display(),
        ));
        for error in package.load_errors() {
            out.push_str(&format!("    {}\n", error));
        }
    }
    out
}
