use anyhow::Result;
use log::{debug, warn};

use crate::{
    package::{Expr, StrPredicate},
    runtime::Runtime,
};

use super::config::{Config, open_manager};

/// Remove packages by name. Unknown names and the root package are skipped.
#[tracing::instrument(skip(runtime, config))]
pub fn remove<R: Runtime>(runtime: &R, names: &[String], config: Config) -> Result<()> {
    let mut manager = open_manager(runtime, &config)?;
    debug!("Removing {:?} from {:?}", names, manager.root_dir());

    let mut known = Vec::new();
    for name in names {
        match manager.get_packages().find(name) {
            Some(package) if package.is_root() => warn!("Cannot remove the root package {}", name),
            Some(_) => known.push(name.as_str()),
            None => warn!("Package {} is not installed, skipping", name),
        }
    }

    let Some(expr) = known
        .iter()
        .map(|name| Expr::name(StrPredicate::equals(*name)))
        .reduce(Expr::or)
    else {
        println!("Nothing to remove.");
        return Ok(());
    };

    manager.remove_packages(&expr)?;
    for name in known {
        println!("Removed {}", name);
    }
    Ok(())
}
