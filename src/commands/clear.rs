use anyhow::Result;
use log::debug;

use crate::runtime::Runtime;

use super::config::{Config, open_manager};

/// Remove every installed package
#[tracing::instrument(skip(runtime, config))]
pub fn clear<R: Runtime>(runtime: &R, config: Config) -> Result<()> {
    let mut manager = open_manager(runtime, &config)?;
    let count = manager.root_metadata().install_infos().len();
    debug!("Clearing {} package(s) from {:?}", count, manager.root_dir());

    if count == 0 {
        println!("No packages installed.");
        return Ok(());
    }

    manager.clear_packages()?;
    println!("Removed {} package(s)", count);
    Ok(())
}
