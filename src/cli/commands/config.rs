//! `dxt config` command - Configuration management
//!
//! Provides commands to view and modify DXT configuration.

use clap::Subcommand;
use console::style;
use miette::{IntoDiagnostic, Result};
use std::fs;

use crate::cli::GlobalOpts;
use crate::core::Config;
use crate::host::preview::{MAX_PREVIEW_SIZE, MIN_PREVIEW_SIZE};

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Show current configuration values
    Show(ShowArgs),

    /// Set a configuration value
    Set(SetArgs),

    /// Unset (remove) a configuration value
    Unset(UnsetArgs),

    /// Show paths to the files DXT reads and writes
    Path,

    /// List all available configuration keys
    Keys,
}

#[derive(clap::Args, Debug)]
pub struct ShowArgs {
    /// Show only this key's value
    pub key: Option<String>,
}

#[derive(clap::Args, Debug)]
pub struct SetArgs {
    /// Configuration key (e.g., default_root, mesh_refinement)
    pub key: String,

    /// Value to set
    pub value: String,
}

#[derive(clap::Args, Debug)]
pub struct UnsetArgs {
    /// Configuration key to remove
    pub key: String,
}

/// Valid configuration keys
const VALID_KEYS: &[(&str, &str)] = &[
    ("data_dir", "Directory holding the context store"),
    (
        "default_root",
        "Base directory suggested when setting up a new project",
    ),
    (
        "mesh_refinement",
        "Tessellation quality for mesh exports (low, medium, high)",
    ),
    ("preview_size", "Preview image edge length in pixels (16-4096)"),
    (
        "auto_open",
        "Open the project folder after every export (true/false)",
    ),
];

/// Run a config subcommand
pub fn run(cmd: ConfigCommands, _global: &GlobalOpts) -> Result<()> {
    match cmd {
        ConfigCommands::Show(args) => run_show(args),
        ConfigCommands::Set(args) => run_set(args),
        ConfigCommands::Unset(args) => run_unset(args),
        ConfigCommands::Path => run_path(),
        ConfigCommands::Keys => run_keys(),
    }
}

fn run_show(args: ShowArgs) -> Result<()> {
    let config = Config::load();

    // If a specific key is requested, show just that value
    if let Some(key) = &args.key {
        match get_config_value(&config, key) {
            Some(v) => println!("{}", v),
            None => return Err(miette::miette!("Key '{}' is not set", key)),
        }
        return Ok(());
    }

    println!("{}", style("Effective Configuration").bold().underlined());
    println!();

    print_config_value(
        "data_dir",
        config.data_dir.as_ref().map(|p| p.display().to_string()),
    );
    print_config_value(
        "default_root",
        config.default_root.as_ref().map(|p| p.display().to_string()),
    );
    print_config_value(
        "mesh_refinement",
        config.mesh_refinement.map(|r| r.to_string()),
    );
    print_config_value("preview_size", config.preview_size.map(|n| n.to_string()));
    print_config_value("auto_open", config.auto_open.map(|b| b.to_string()));

    println!();
    println!("{}", style("Config Sources (in priority order):").dim());
    println!("  1. Environment variables (DXT_DATA_DIR, DXT_DEFAULT_ROOT)");
    println!("  2. Global config (~/.config/dxt/config.yaml)");
    println!("  3. Built-in defaults");

    Ok(())
}

fn run_set(args: SetArgs) -> Result<()> {
    let value = parse_value(&args.key, &args.value)?;
    let config_path = global_config_path()?;

    // Load existing config or start a fresh mapping
    let mut config_map: serde_yml::Value = if config_path.exists() {
        let content = fs::read_to_string(&config_path).into_diagnostic()?;
        let parsed: serde_yml::Value =
            serde_yml::from_str(&content).unwrap_or(serde_yml::Value::Mapping(Default::default()));
        if parsed.is_null() {
            serde_yml::Value::Mapping(Default::default())
        } else {
            parsed
        }
    } else {
        serde_yml::Value::Mapping(Default::default())
    };

    if let serde_yml::Value::Mapping(map) = &mut config_map {
        map.insert(args.key.clone(), value);
    }

    if let Some(parent) = config_path.parent() {
        fs::create_dir_all(parent).into_diagnostic()?;
    }
    let yaml = serde_yml::to_string(&config_map).into_diagnostic()?;
    fs::write(&config_path, yaml).into_diagnostic()?;

    println!(
        "{} Set {} = {}",
        style("✓").green(),
        style(&args.key).cyan(),
        style(&args.value).yellow()
    );

    Ok(())
}

fn run_unset(args: UnsetArgs) -> Result<()> {
    let config_path = global_config_path()?;
    if !config_path.exists() {
        return Err(miette::miette!(
            "Config file does not exist: {}",
            config_path.display()
        ));
    }

    let content = fs::read_to_string(&config_path).into_diagnostic()?;
    let mut config_map: serde_yml::Value =
        serde_yml::from_str(&content).unwrap_or(serde_yml::Value::Mapping(Default::default()));

    let removed = match &mut config_map {
        serde_yml::Value::Mapping(map) => map.remove(&args.key).is_some(),
        _ => false,
    };
    if !removed {
        return Err(miette::miette!("Key '{}' not found in config", args.key));
    }

    let yaml = serde_yml::to_string(&config_map).into_diagnostic()?;
    fs::write(&config_path, yaml).into_diagnostic()?;

    println!(
        "{} Removed {} from config",
        style("✓").green(),
        style(&args.key).cyan()
    );

    Ok(())
}

fn run_path() -> Result<()> {
    let config = Config::load();
    let config_path = global_config_path()?;
    let store_path = config.store_path();

    println!("{}", style("File paths:").bold());
    println!();
    println!("  {} {}", style("Config:").cyan(), config_path.display());
    if config_path.exists() {
        println!("          {}", style("(exists)").green());
    } else {
        println!("          {}", style("(not created)").dim());
    }
    println!();
    println!("  {} {}", style("Store:").cyan(), store_path.display());
    if store_path.exists() {
        println!("          {}", style("(exists)").green());
    } else {
        println!("          {}", style("(not created)").dim());
    }

    Ok(())
}

fn run_keys() -> Result<()> {
    println!("{}", style("Available configuration keys:").bold());
    println!();

    for (key, description) in VALID_KEYS {
        println!("  {:<20} {}", style(key).cyan(), style(description).dim());
    }

    println!();
    println!(
        "{}",
        style("Use 'dxt config set <key> <value>' to set a value.").dim()
    );

    Ok(())
}

// Helper functions

fn global_config_path() -> Result<std::path::PathBuf> {
    Config::global_config_path()
        .ok_or_else(|| miette::miette!("Could not determine global config directory"))
}

fn get_config_value(config: &Config, key: &str) -> Option<String> {
    match key {
        "data_dir" => config.data_dir.as_ref().map(|p| p.display().to_string()),
        "default_root" => config.default_root.as_ref().map(|p| p.display().to_string()),
        "mesh_refinement" => config.mesh_refinement.map(|r| r.to_string()),
        "preview_size" => config.preview_size.map(|n| n.to_string()),
        "auto_open" => config.auto_open.map(|b| b.to_string()),
        _ => None,
    }
}

fn print_config_value(key: &str, value: Option<String>) {
    if let Some(v) = value {
        println!("  {}: {}", style(key).cyan(), style(v).yellow());
    } else {
        println!("  {}: {}", style(key).cyan(), style("(not set)").dim());
    }
}

/// Parse a raw value into the YAML type the key expects
fn parse_value(key: &str, value: &str) -> Result<serde_yml::Value> {
    match key {
        "preview_size" => {
            let n: u32 = value.parse().map_err(|_| {
                miette::miette!("preview_size must be a number, got '{}'", value)
            })?;
            if !(MIN_PREVIEW_SIZE..=MAX_PREVIEW_SIZE).contains(&n) {
                return Err(miette::miette!(
                    "preview_size must be between {} and {} pixels, got {}",
                    MIN_PREVIEW_SIZE,
                    MAX_PREVIEW_SIZE,
                    n
                ));
            }
            Ok(serde_yml::Value::Number(serde_yml::Number::from(u64::from(
                n,
            ))))
        }
        "auto_open" => {
            let b: bool = value.parse().map_err(|_| {
                miette::miette!("auto_open must be true or false, got '{}'", value)
            })?;
            Ok(serde_yml::Value::Bool(b))
        }
        "mesh_refinement" => match value {
            "low" | "medium" | "high" => Ok(serde_yml::Value::String(value.to_string())),
            _ => Err(miette::miette!(
                "mesh_refinement must be low, medium or high, got '{}'",
                value
            )),
        },
        "data_dir" | "default_root" => Ok(serde_yml::Value::String(value.to_string())),
        _ => Err(miette::miette!(
            "Unknown configuration key '{}'. Run {} to list valid keys.",
            key,
            style("dxt config keys").yellow()
        )),
    }
}
