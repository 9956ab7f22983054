use anyhow::Result;
use clap::Parser;
use pkgreg::commands::{self, Config, ListOptions};
use pkgreg::manager::InstallOptions;
use pkgreg::package::{Environment, PackageState};
use std::path::PathBuf;

/// pkgreg - Package registry manager
///
/// Keeps track of the packages installed into a project. The registry lives
/// in the `pkgreg.json` file of the project root.
///
/// Examples:
///   pkgreg install ../my-package          # Install the package declared in ../my-package
///   pkgreg install ./lib acme/lib --dev   # Install ./lib as acme/lib for development
///   pkgreg list --not-found               # Show packages whose directory is gone
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Project root directory (defaults to the current directory; also via PKGREG_ROOT)
    #[arg(
        long = "root",
        short = 'r',
        env = "PKGREG_ROOT",
        value_name = "PATH",
        global = true
    )]
    pub root: Option<PathBuf>,

    /// User config file (also via PKGREG_CONFIG)
    #[arg(long = "config", env = "PKGREG_CONFIG", value_name = "PATH", global = true)]
    pub config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long, short = 'v', global = true)]
    pub verbose: bool,
}

#[derive(clap::Subcommand, Debug)]
enum Commands {
    /// List the packages of the project
    List(ListArgs),

    /// Install the package in a directory
    Install(InstallArgs),

    /// Rename a package
    Rename(RenameArgs),

    /// Remove installed packages
    Remove(RemoveArgs),

    /// Remove all installed packages
    Clear,

    /// Read or change the user configuration
    #[command(subcommand)]
    Config(ConfigCommands),
}

#[derive(clap::Args, Debug)]
pub struct ListArgs {
    /// Only packages whose name matches this glob
    #[arg(long, value_name = "GLOB")]
    pub name: Option<String>,

    /// Only packages installed by this installer
    #[arg(long, value_name = "NAME")]
    pub installer: Option<String>,

    /// Only packages installed for this environment
    #[arg(long = "env", value_name = "ENV", value_parser = ["dev", "prod"])]
    pub environment: Option<String>,

    /// Only enabled packages
    #[arg(long)]
    pub enabled: bool,

    /// Only packages whose directory is missing
    #[arg(long)]
    pub not_found: bool,

    /// Only packages that could not be loaded
    #[arg(long)]
    pub not_loadable: bool,
}

impl ListArgs {
    fn into_options(self) -> Result<ListOptions> {
        let states = [
            (self.enabled, PackageState::Enabled),
            (self.not_found, PackageState::NotFound),
            (self.not_loadable, PackageState::NotLoadable),
        ]
        .into_iter()
        .filter_map(|(selected, state)| selected.then_some(state))
        .collect();

        Ok(ListOptions {
            name: self.name,
            installer: self.installer,
            environment: self.environment.as_deref().map(str::parse::<Environment>).transpose()?,
            states,
        })
    }
}

#[derive(clap::Args, Debug)]
pub struct InstallArgs {
    /// Directory of the package
    #[arg(value_name = "PATH")]
    pub path: PathBuf,

    /// Package name, overriding the name in the package file ("vendor/name")
    #[arg(value_name = "NAME")]
    pub name: Option<String>,

    /// Installer recorded for the package
    #[arg(long, value_name = "NAME")]
    pub installer: Option<String>,

    /// Install for the development environment only
    #[arg(long)]
    pub dev: bool,
}

impl From<InstallArgs> for InstallOptions {
    fn from(args: InstallArgs) -> Self {
        InstallOptions {
            name: args.name,
            installer_name: args.installer,
            environment: args.dev.then_some(Environment::Dev),
        }
    }
}

#[derive(clap::Args, Debug)]
pub struct RenameArgs {
    /// Current package name
    pub old_name: String,

    /// New package name ("vendor/name")
    pub new_name: String,
}

#[derive(clap::Args, Debug)]
pub struct RemoveArgs {
    /// Names of the packages to remove
    #[arg(required = true, value_name = "NAME")]
    pub names: Vec<String>,
}

#[derive(clap::Subcommand, Debug)]
enum ConfigCommands {
    /// Print a config value
    Get {
        /// Config key (default-installer, default-environment)
        key: String,
    },

    /// Set a config value
    Set {
        /// Config key (default-installer, default-environment)
        key: String,
        value: String,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let default_filter = if cli.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();

    let runtime = pkgreg::runtime::RealRuntime;
    let config = Config::new(cli.root, cli.config);

    match cli.command {
        Commands::List(args) => commands::list(&runtime, &args.into_options()?, config)?,
        Commands::Install(args) => {
            let path = args.path.clone();
            commands::install(&runtime, &path, args.into(), config)?
        }
        Commands::Rename(args) => {
            commands::rename(&runtime, &args.old_name, &args.new_name, config)?
        }
        Commands::Remove(args) => commands::remove(&runtime, &args.names, config)?,
        Commands::Clear => commands::clear(&runtime, config)?,
        Commands::Config(ConfigCommands::Get { key }) => {
            commands::config_get(&runtime, &key, config)?
        }
        Commands::Config(ConfigCommands::Set { key, value }) => {
            commands::config_set(&runtime, &key, &value, config)?
        }
    }
    Ok(())
}
