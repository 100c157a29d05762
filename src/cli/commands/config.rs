//! `ecopark config` command - Configuration management
//!
//! Values are written to the local `.ecopark/config.yaml` unless `--global`
//! is given. Numbers and booleans are stored typed so the loader reads them back.

use clap::Subcommand;
use console::style;
use miette::{IntoDiagnostic, Result};
use std::fs;
use std::path::{Path, PathBuf};

use crate::cli::GlobalOpts;
use crate::core::config::KEYS;
use crate::core::Config;

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Show current configuration values
    Show(ShowArgs),

    /// Set a configuration value
    Set(SetArgs),

    /// Unset (remove) a configuration value
    Unset(UnsetArgs),

    /// Show paths to configuration files
    Path(PathArgs),

    /// List all available configuration keys
    Keys,
}

#[derive(clap::Args, Debug)]
pub struct ShowArgs {
    /// Show only this key's value
    pub key: Option<String>,

    /// Show only the local config file
    #[arg(long = "local-only", conflicts_with = "global_only")]
    pub local_only: bool,

    /// Show only the global (user) config file
    #[arg(long = "global-only")]
    pub global_only: bool,
}

#[derive(clap::Args, Debug)]
pub struct SetArgs {
    /// Configuration key (e.g., api_url, email)
    pub key: String,

    /// Value to set
    pub value: String,

    /// Set in global (user) config instead of the local one
    #[arg(long, short = 'g')]
    pub global: bool,
}

#[derive(clap::Args, Debug)]
pub struct UnsetArgs {
    /// Configuration key to remove
    pub key: String,

    /// Remove from global (user) config instead of the local one
    #[arg(long, short = 'g')]
    pub global: bool,
}

#[derive(clap::Args, Debug)]
pub struct PathArgs {
    /// Show only the local config path
    #[arg(long = "local-only", conflicts_with = "global_only")]
    pub local_only: bool,

    /// Show only the global config path
    #[arg(long = "global-only")]
    pub global_only: bool,
}

/// Run a config subcommand
pub fn run(cmd: ConfigCommands, _global: &GlobalOpts) -> Result<()> {
    match cmd {
        ConfigCommands::Show(args) => run_show(args),
        ConfigCommands::Set(args) => run_set(args),
        ConfigCommands::Unset(args) => run_unset(args),
        ConfigCommands::Path(args) => run_path(args),
        ConfigCommands::Keys => run_keys(),
    }
}

fn run_show(args: ShowArgs) -> Result<()> {
    let config = Config::load();

    if let Some(key) = &args.key {
        if !Config::is_key(key) {
            return Err(miette::miette!(
                "Unknown key '{}' (see `ecopark config keys`)",
                key
            ));
        }
        return match config.get(key) {
            Some(v) => {
                println!("{}", v);
                Ok(())
            }
            None => Err(miette::miette!("Key '{}' is not set", key)),
        };
    }

    if args.local_only {
        return show_file("Local config:", &local_path()?);
    }
    if args.global_only {
        return show_file("Global config:", &global_path()?);
    }

    println!("{}", style("Effective Configuration").bold().underlined());
    println!();
    for (key, _) in KEYS {
        match config.get(key) {
            Some(v) => println!("  {}: {}", style(key).cyan(), style(v).yellow()),
            None => println!("  {}: {}", style(key).cyan(), style("(not set)").dim()),
        }
    }

    println!();
    println!("{}", style("Config Sources (in priority order):").dim());
    println!("  1. Command-line flags (--api-url, --offline, --seed)");
    println!("  2. Environment variables (ECOPARK_API_URL, ECOPARK_OFFLINE, ...)");
    println!("  3. Local config (.ecopark/config.yaml)");
    println!("  4. Global config (~/.config/ecopark/config.yaml)");

    Ok(())
}

fn run_set(args: SetArgs) -> Result<()> {
    let value = Config::typed_value(&args.key, &args.value).into_diagnostic()?;
    let path = target_path(args.global)?;

    let mut map = read_mapping(&path)?;
    map.insert(serde_yml::Value::String(args.key.clone()), value);

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).into_diagnostic()?;
    }
    let yaml = serde_yml::to_string(&map).into_diagnostic()?;
    fs::write(&path, yaml).into_diagnostic()?;

    println!(
        "{} Set {} {} {} in {} config",
        style("✓").green(),
        style(&args.key).cyan(),
        style("→").dim(),
        style(&args.value).yellow(),
        scope(args.global)
    );
    Ok(())
}

fn run_unset(args: UnsetArgs) -> Result<()> {
    let path = target_path(args.global)?;
    if !path.exists() {
        return Err(miette::miette!(
            "Config file does not exist: {}",
            path.display()
        ));
    }

    let mut map = read_mapping(&path)?;
    if map
        .remove(serde_yml::Value::String(args.key.clone()))
        .is_none()
    {
        return Err(miette::miette!("Key '{}' not found in config", args.key));
    }

    let yaml = serde_yml::to_string(&map).into_diagnostic()?;
    fs::write(&path, yaml).into_diagnostic()?;

    println!(
        "{} Removed {} from {} config",
        style("✓").green(),
        style(&args.key).cyan(),
        scope(args.global)
    );
    Ok(())
}

fn run_path(args: PathArgs) -> Result<()> {
    if args.local_only {
        println!("{}", local_path()?.display());
        return Ok(());
    }
    if args.global_only {
        println!("{}", global_path()?.display());
        return Ok(());
    }

    println!("{}", style("Configuration file paths:").bold());
    println!();
    for (label, path) in [("Global:", global_path()?), ("Local: ", local_path()?)] {
        let state = if path.exists() {
            style("(exists)").green()
        } else {
            style("(not created)").dim()
        };
        println!("  {} {} {}", style(label).cyan(), path.display(), state);
    }
    Ok(())
}

fn run_keys() -> Result<()> {
    println!("{}", style("Available configuration keys:").bold());
    println!();
    for (key, description) in KEYS {
        println!("  {:<16} {}", style(key).cyan(), style(description).dim());
    }
    println!();
    println!(
        "{}",
        style("Use 'ecopark config set <key> <value>' to set a value.").dim()
    );
    Ok(())
}

fn global_path() -> Result<PathBuf> {
    Config::global_path()
        .ok_or_else(|| miette::miette!("Could not determine global config directory"))
}

fn local_path() -> Result<PathBuf> {
    Config::local_path_for_write().into_diagnostic()
}

fn target_path(global: bool) -> Result<PathBuf> {
    if global {
        global_path()
    } else {
        local_path()
    }
}

fn scope(global: bool) -> &'static str {
    if global {
        "global"
    } else {
        "local"
    }
}

/// Existing file as a mapping; missing or empty files start empty
fn read_mapping(path: &Path) -> Result<serde_yml::Mapping> {
    if !path.exists() {
        return Ok(serde_yml::Mapping::new());
    }
    let content = fs::read_to_string(path).into_diagnostic()?;
    match serde_yml::from_str::<serde_yml::Value>(&content).into_diagnostic()? {
        serde_yml::Value::Mapping(map) => Ok(map),
        serde_yml::Value::Null => Ok(serde_yml::Mapping::new()),
        _ => Err(miette::miette!(
            "{} is not a key/value mapping",
            path.display()
        )),
    }
}

fn show_file(label: &str, path: &Path) -> Result<()> {
    println!("{} {}", style(label).bold(), style(path.display()).dim());
    println!();
    if path.exists() {
        print!("{}", fs::read_to_string(path).into_diagnostic()?);
    } else {
        println!("{}", style("(not created)").dim());
    }
    Ok(())
}
