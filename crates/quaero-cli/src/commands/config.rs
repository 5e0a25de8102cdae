//! Config command implementation.
//!
//! View and manage configuration settings.
//! Config file is located at ~/.config/quaero/config.toml.

use std::env;
use std::fs;
use std::path::PathBuf;

use directories::BaseDirs;
use quaero::Dialect;
use serde::{Deserialize, Serialize};

use super::{CommandContext, CommandError, Result};

/// Current config file version. Increment when making breaking changes to schema.
const CONFIG_VERSION: u32 = 1;

/// Prompt shown by the REPL when none is configured.
pub const DEFAULT_PROMPT: &str = "query> ";

/// Keys accepted by `config set`.
const VALID_KEYS: &str =
    "prompt, render.optimize, render.collapse_duplicates, render.dialects, output.color";

/// Default config file contents.
const DEFAULT_CONFIG: &str = r#"# quaero configuration

# Config schema version (do not modify)
version = 1

# Prompt shown by the interactive shell
# prompt = "query> "

[render]
# optimize = true               # Simplify filters before rendering
# collapse_duplicates = false   # Rewrite "x and x" / "x or x" to "x"
# dialects = ["graph", "ldap", "scim"]

[output]
# color = true                  # Enable colors (respects NO_COLOR env)
"#;

/// Configuration file structure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Config schema version for migrations.
    /// Defaults to current version when not present in file.
    #[serde(default = "default_version")]
    pub version: u32,

    /// REPL prompt.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prompt: Option<String>,

    /// Rendering settings.
    #[serde(default)]
    pub render: RenderConfig,

    /// Output settings.
    #[serde(default)]
    pub output: OutputConfig,
}

/// Returns the current config version (used by serde default).
fn default_version() -> u32 {
    CONFIG_VERSION
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: CONFIG_VERSION,
            prompt: None,
            render: RenderConfig::default(),
            output: OutputConfig::default(),
        }
    }
}

impl Config {
    /// Returns the configured prompt or the default one.
    pub fn prompt(&self) -> String {
        self.prompt
            .clone()
            .unwrap_or_else(|| DEFAULT_PROMPT.to_string())
    }

    /// Returns the configured dialects, or all of them if none are set.
    pub fn dialects(&self) -> Vec<Dialect> {
        match &self.render.dialects {
            Some(dialects) if !dialects.is_empty() => dialects.clone(),
            _ => Dialect::ALL.to_vec(),
        }
    }
}

/// Rendering configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RenderConfig {
    /// Optimize filters before rendering.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub optimize: Option<bool>,

    /// Collapse `x and x` and `x or x` while optimizing.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub collapse_duplicates: Option<bool>,

    /// Dialects to render, in order.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dialects: Option<Vec<Dialect>>,
}

/// Output configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Enable colors.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<bool>,
}

/// Gets the config file path.
///
/// `QUAERO_CONFIG` wins, then `$XDG_CONFIG_HOME/quaero/config.toml`, then
/// `~/.config/quaero/config.toml` on all platforms.
pub fn get_config_path() -> Result<PathBuf> {
    if let Ok(path) = env::var("QUAERO_CONFIG") {
        return Ok(PathBuf::from(path));
    }

    if let Ok(xdg_config) = env::var("XDG_CONFIG_HOME") {
        return Ok(PathBuf::from(xdg_config).join("quaero").join("config.toml"));
    }

    BaseDirs::new()
        .map(|dirs| {
            dirs.home_dir()
                .join(".config")
                .join("quaero")
                .join("config.toml")
        })
        .ok_or_else(|| CommandError::Config("Could not determine config directory".to_string()))
}

/// Loads the configuration from disk, or the defaults if there is no file.
pub fn load_config() -> Result<Config> {
    let path = get_config_path()?;

    if !path.exists() {
        tracing::debug!(path = %path.display(), "no config file, using defaults");
        return Ok(Config::default());
    }

    let content = fs::read_to_string(&path)
        .map_err(|e| CommandError::Config(format!("Failed to read config: {}", e)))?;

    let config: Config = toml::from_str(&content)
        .map_err(|e| CommandError::Config(format!("Failed to parse config: {}", e)))?;

    tracing::debug!(path = %path.display(), "loaded config");
    migrate_config(config)
}

/// Migrates config to current version if needed.
fn migrate_config(mut config: Config) -> Result<Config> {
    if config.version > CONFIG_VERSION {
        tracing::warn!(
            version = config.version,
            "config file is newer than this binary, unknown settings are ignored"
        );
    }
    config.version = CONFIG_VERSION;
    Ok(config)
}

/// Saves the configuration to disk, creating the directory if needed.
fn save_config(config: &Config) -> Result<()> {
    let path = get_config_path()?;
    ensure_parent_dir(&path)?;

    let content = toml::to_string_pretty(config)
        .map_err(|e| CommandError::Config(format!("Failed to serialize config: {}", e)))?;

    fs::write(&path, content)
        .map_err(|e| CommandError::Config(format!("Failed to write config: {}", e)))?;

    Ok(())
}

fn ensure_parent_dir(path: &std::path::Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| {
            CommandError::Config(format!("Failed to create config directory: {}", e))
        })?;
    }
    Ok(())
}

/// Executes the config show command.
pub fn execute_show(ctx: &CommandContext) -> Result<()> {
    let config = load_config()?;
    let path = get_config_path()?;

    if ctx.json_output {
        let output = serde_json::json!({
            "path": path.display().to_string(),
            "exists": path.exists(),
            "config": config,
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else if !ctx.quiet {
        use owo_colors::OwoColorize;

        let header = "Configuration";
        if ctx.use_colors {
            println!("{}\n", header.green().bold());
        } else {
            println!("{}\n", header);
        }

        println!("File: {}", path.display());
        println!("Exists: {}\n", path.exists());

        let dialects: Vec<&str> = config.dialects().iter().map(|d| d.as_str()).collect();
        println!("Settings:");
        println!("  prompt: {:?}", config.prompt());
        println!("\n[render]");
        println!("  optimize: {}", config.render.optimize.unwrap_or(true));
        println!(
            "  collapse_duplicates: {}",
            config.render.collapse_duplicates.unwrap_or(false)
        );
        println!("  dialects: {}", dialects.join(", "));
        println!("\n[output]");
        println!("  color: {}", config.output.color.unwrap_or(true));

        if !path.exists() {
            println!("\n(No config file exists. Run 'quaero config init' to create one.)");
        }
    }

    Ok(())
}

/// Executes the config init command.
pub fn execute_init(ctx: &CommandContext, force: bool) -> Result<()> {
    let path = get_config_path()?;

    if path.exists() && !force {
        return Err(CommandError::Config(format!(
            "Config file already exists at {} (use --force to overwrite)",
            path.display()
        )));
    }

    ensure_parent_dir(&path)?;
    fs::write(&path, DEFAULT_CONFIG)
        .map_err(|e| CommandError::Config(format!("Failed to create config file: {}", e)))?;

    if ctx.json_output {
        let output = serde_json::json!({
            "status": "success",
            "path": path.display().to_string(),
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else if !ctx.quiet {
        println!("Created default config at: {}", path.display());
    }

    Ok(())
}

/// Options for the config set command.
pub struct ConfigSetOptions {
    /// Configuration key.
    pub key: String,
    /// Configuration value.
    pub value: String,
}

/// Applies one `key = value` assignment to a config.
fn apply_setting(config: &mut Config, key: &str, value: &str) -> Result<()> {
    let (section, field) = match key.split_once('.') {
        Some((section, field)) => (Some(section), field),
        None => (None, key),
    };

    match (section, field) {
        (None, "prompt") => config.prompt = Some(value.to_string()),
        (Some("render"), "optimize") => config.render.optimize = Some(parse_bool(value)?),
        (Some("render"), "collapse_duplicates") => {
            config.render.collapse_duplicates = Some(parse_bool(value)?)
        }
        (Some("render"), "dialects") => config.render.dialects = Some(parse_dialects(value)?),
        (Some("output"), "color") => config.output.color = Some(parse_bool(value)?),
        _ => {
            return Err(CommandError::Config(format!(
                "Unknown config key '{}'. Valid keys: {}",
                key, VALID_KEYS
            )));
        }
    }
    Ok(())
}

/// Executes the config set command.
pub fn execute_set(ctx: &CommandContext, opts: &ConfigSetOptions) -> Result<()> {
    let mut config = load_config()?;
    let path = get_config_path()?;

    apply_setting(&mut config, &opts.key, &opts.value)?;
    save_config(&config)?;

    if ctx.json_output {
        let output = serde_json::json!({
            "status": "success",
            "key": opts.key,
            "value": opts.value,
            "path": path.display().to_string(),
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else if !ctx.quiet {
        println!("Set {} = {}", opts.key, opts.value);
    }

    Ok(())
}

/// Executes the config path command.
pub fn execute_path(ctx: &CommandContext) -> Result<()> {
    let path = get_config_path()?;

    if ctx.json_output {
        let output = serde_json::json!({
            "path": path.display().to_string(),
            "exists": path.exists(),
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        println!("{}", path.display());
    }

    Ok(())
}

/// Parses a boolean value from string.
fn parse_bool(s: &str) -> Result<bool> {
    match s.to_lowercase().as_str() {
        "true" | "yes" | "1" | "on" => Ok(true),
        "false" | "no" | "0" | "off" => Ok(false),
        _ => Err(CommandError::Config(format!(
            "Invalid boolean value '{}'. Use true/false, yes/no, 1/0, or on/off",
            s
        ))),
    }
}

/// Parses a comma-separated dialect list, dropping repeats.
fn parse_dialects(s: &str) -> Result<Vec<Dialect>> {
    let mut dialects = Vec::new();
    for part in s.split(',').filter(|p| !p.trim().is_empty()) {
        let dialect: Dialect = part
            .parse()
            .map_err(|e: quaero::render::ParseDialectError| CommandError::Config(e.to_string()))?;
        if !dialects.contains(&dialect) {
            dialects.push(dialect);
        }
    }
    if dialects.is_empty() {
        return Err(CommandError::Config(
            "render.dialects needs at least one of: graph, ldap, scim".to_string(),
        ));
    }
    Ok(dialects)
}
