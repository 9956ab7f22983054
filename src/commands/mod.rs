pub mod config;
mod clear;
mod install;
mod list;
mod remove;
mod rename;
mod settings;

pub use clear::clear;
pub use config::Config;
pub use install::install;
pub use list::{ListOptions, list};
pub use remove::remove;
pub use rename::rename;
pub use settings::{config_get, config_set};
