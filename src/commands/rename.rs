use anyhow::Result;
use log::debug;

use crate::runtime::Runtime;

use super::config::{Config, open_manager};

/// Rename a package
#[tracing::instrument(skip(runtime, config))]
pub fn rename<R: Runtime>(runtime: &R, old_name: &str, new_name: &str, config: Config) -> Result<()> {
    let mut manager = open_manager(runtime, &config)?;
    debug!("Renaming {} to {} in {:?}", old_name, new_name, manager.root_dir());

    manager.rename_package(old_name, new_name)?;
    println!("Renamed {} to {}", old_name, new_name);
    Ok(())
}
