//! `docrec config`: inspect and edit the JSON configuration file.

use std::fs;
use std::path::{Path, PathBuf};

use clap::{Args, Subcommand};
use console::style;
use serde_json::Value;

use docrec_core::DocrecConfig;

#[derive(Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    action: ConfigAction,
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Print the effective configuration
    Show,

    /// Write the default configuration to the config path
    Init {
        /// Replace a file that already exists
        #[arg(long)]
        force: bool,
    },

    /// Print one value, e.g. `parsers.0.options.min_columns`
    Get { key: String },

    /// Change one value; the argument is parsed as JSON, falling back to a string
    Set { key: String, value: String },

    /// Load the config file and report whether it is valid
    Check,

    /// Print where the config file lives
    Path,
}

pub fn run(args: ConfigArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let path = config_path.map(PathBuf::from).unwrap_or_else(default_path);

    match args.action {
        ConfigAction::Show => {
            let config = load(&path)?;
            println!("{}", serde_json::to_string_pretty(&config)?);
        }
        ConfigAction::Init { force } => init(&path, force)?,
        ConfigAction::Get { key } => {
            let tree = serde_json::to_value(load(&path)?)?;
            let value = lookup(&tree, &key)
                .ok_or_else(|| anyhow::anyhow!("no configuration key '{}'", key))?;
            println!("{}", serde_json::to_string_pretty(value)?);
        }
        ConfigAction::Set { key, value } => set(&path, &key, &value)?,
        ConfigAction::Check => {
            DocrecConfig::from_file(&path)?;
            println!("{} {} is valid", style("✓").green(), path.display());
        }
        ConfigAction::Path => {
            let state = if path.exists() {
                style("present").green()
            } else {
                style("missing, run `docrec config init`").yellow()
            };
            println!("{} ({})", path.display(), state);
        }
    }
    Ok(())
}

fn default_path() -> PathBuf {
    let base = dirs::config_dir().unwrap_or_else(|| PathBuf::from("."));
    base.join("docrec").join("config.json")
}

/// The file's configuration, or the defaults when it does not exist yet.
fn load(path: &Path) -> anyhow::Result<DocrecConfig> {
    if !path.exists() {
        eprintln!(
            "{} {} not found, using defaults",
            style("ℹ").blue(),
            path.display()
        );
        return Ok(DocrecConfig::default());
    }
    Ok(DocrecConfig::from_file(path)?)
}

fn store(path: &Path, config: &DocrecConfig) -> anyhow::Result<()> {
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        fs::create_dir_all(dir)?;
    }
    config.save(path)?;
    Ok(())
}

fn init(path: &Path, force: bool) -> anyhow::Result<()> {
    if path.exists() && !force {
        anyhow::bail!("{} already exists (pass --force to replace it)", path.display());
    }
    store(path, &DocrecConfig::default())?;
    println!("{} Wrote default configuration to {}", style("✓").green(), path.display());
    Ok(())
}

/// Resolve one path segment: objects by name, arrays by index.
fn step<'a>(node: &'a Value, segment: &str) -> Option<&'a Value> {
    match node {
        Value::Array(items) => items.get(segment.parse::<usize>().ok()?),
        _ => node.get(segment),
    }
}

fn step_mut<'a>(node: &'a mut Value, segment: &str) -> Option<&'a mut Value> {
    match node {
        Value::Array(items) => items.get_mut(segment.parse::<usize>().ok()?),
        _ => node.get_mut(segment),
    }
}

fn lookup<'a>(root: &'a Value, key: &str) -> Option<&'a Value> {
    key.split('.').try_fold(root, step)
}

fn set(path: &Path, key: &str, raw: &str) -> anyhow::Result<()> {
    let value: Value = serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.into()));
    let mut tree = serde_json::to_value(load(path)?)?;

    let (parent, last) = key.rsplit_once('.').unwrap_or(("", key));
    let mut node = &mut tree;
    for segment in parent.split('.').filter(|s| !s.is_empty()) {
        node = step_mut(node, segment)
            .ok_or_else(|| anyhow::anyhow!("no configuration key '{}'", key))?;
    }

    match node {
        Value::Object(map) => {
            map.insert(last.to_string(), value.clone());
        }
        Value::Array(items) => {
            let slot = last
                .parse::<usize>()
                .ok()
                .and_then(|i| items.get_mut(i))
                .ok_or_else(|| anyhow::anyhow!("no configuration key '{}'", key))?;
            *slot = value.clone();
        }
        _ => anyhow::bail!("'{}' is not inside an object or list", key),
    }

    // Round-trip through the typed config so bad values are rejected before saving.
    let config: DocrecConfig = serde_json::from_value(tree)?;
    config.check()?;
    store(path, &config)?;

    println!("{} {} = {}", style("✓").green(), key, value);
    Ok(())
}
