use anyhow::Result;
use log::debug;

use crate::{config::GlobalConfigStorage, runtime::Runtime};

use super::config::Config;

/// Print a user config value. Unset keys print nothing.
#[tracing::instrument(skip(runtime, config))]
pub fn config_get<R: Runtime>(runtime: &R, key: &str, config: Config) -> Result<()> {
    let global_config = config.load_global_config(runtime)?;
    match global_config.get(key)? {
        Some(value) => println!("{}", value),
        None => debug!("{} is not set", key),
    }
    Ok(())
}

/// Set a user config value and save the config file.
#[tracing::instrument(skip(runtime, config))]
pub fn config_set<R: Runtime>(runtime: &R, key: &str, value: &str, config: Config) -> Result<()> {
    let path = config.config_path(runtime)?;
    let storage = GlobalConfigStorage::new(runtime);

    let mut global_config = storage.load(&path)?;
    global_config.set(key, value)?;
    storage.save(&global_config, &path)?;

    debug!("Saved {} = {} to {:?}", key, value, path);
    Ok(())
}
