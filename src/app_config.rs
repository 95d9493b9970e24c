//! Config file loading and merging with CLI arguments.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result, bail};
use docharvest_core::HarvestConfig;

use crate::cli::Args;

/// `key = value` file configuration; every field optional.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileConfig {
    /// Output directory for downloaded documents.
    pub output_dir: Option<PathBuf>,
    /// Download ledger path.
    pub ledger_path: Option<PathBuf>,
    /// Page cache directory.
    pub cache_dir: Option<PathBuf>,
    /// Page cache file name prefix.
    pub cache_prefix: Option<String>,
    /// Results API base URL.
    pub base_url: Option<String>,
    /// Highest page index to process.
    pub max_page_index: Option<u32>,
    /// Rate-limit cooldown in seconds.
    pub cooldown_secs: Option<u64>,
    /// Per-request timeout in seconds.
    pub timeout_secs: Option<u64>,
    /// Default verbosity mode.
    pub verbosity: Option<VerbositySetting>,
}

impl FileConfig {
    /// Validates config values against the same ranges the CLI enforces.
    pub fn validate(&self) -> Result<()> {
        if let Some(timeout) = self.timeout_secs
            && !(1..=3600).contains(&timeout)
        {
            bail!("Invalid config value for `timeout_secs`: {timeout}. Expected range: 1..=3600");
        }
        if let Some(cooldown) = self.cooldown_secs
            && cooldown > 3600
        {
            bail!("Invalid config value for `cooldown_secs`: {cooldown}. Expected range: 0..=3600");
        }
        if let Some(prefix) = &self.cache_prefix
            && !is_valid_cache_prefix(prefix)
        {
            bail!(
                "Invalid config value for `cache_prefix`: '{prefix}'. Expected a non-empty name without path separators"
            );
        }
        if let Some(base_url) = &self.base_url
            && !(base_url.starts_with("http://") || base_url.starts_with("https://"))
        {
            bail!("Invalid config value for `base_url`: '{base_url}'. Expected an http(s) URL");
        }
        Ok(())
    }
}

fn is_valid_cache_prefix(prefix: &str) -> bool {
    !prefix.is_empty() && !prefix.contains(['/', '\\']) && prefix != "." && prefix != ".."
}

/// Supported config verbosity labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerbositySetting {
    Default,
    Verbose,
    Quiet,
    Debug,
}

impl VerbositySetting {
    /// Filter directive used when neither `RUST_LOG` nor CLI flags decide.
    #[must_use]
    pub fn filter_directive(self) -> &'static str {
        match self {
            Self::Default => "info",
            Self::Verbose | Self::Debug => "debug",
            Self::Quiet => "error",
        }
    }
}

/// Resolves default config path.
///
/// Priority:
/// 1. `$XDG_CONFIG_HOME/docharvest/config.toml`
/// 2. `$HOME/.config/docharvest/config.toml`
#[must_use]
pub fn resolve_default_config_path() -> Option<PathBuf> {
    if let Some(xdg_config_home) = env_var_non_empty_os("XDG_CONFIG_HOME") {
        return Some(
            PathBuf::from(xdg_config_home)
                .join("docharvest")
                .join("config.toml"),
        );
    }

    let home = env_var_non_empty_os("HOME")?;
    Some(
        PathBuf::from(home)
            .join(".config")
            .join("docharvest")
            .join("config.toml"),
    )
}

fn env_var_non_empty_os(name: &str) -> Option<std::ffi::OsString> {
    let value = env::var_os(name)?;
    if value.is_empty() { None } else { Some(value) }
}

/// Loads the config file.
///
/// An explicit path must exist. The default location is optional.
pub fn load_file_config(explicit: Option<&Path>) -> Result<Option<FileConfig>> {
    if let Some(path) = explicit {
        return read_file_config(path).map(Some);
    }
    match resolve_default_config_path() {
        Some(path) if path.is_file() => read_file_config(&path).map(Some),
        _ => Ok(None),
    }
}

fn read_file_config(path: &Path) -> Result<FileConfig> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file '{}'", path.display()))?;
    parse_config_str(&raw)
        .with_context(|| format!("Failed to parse config file '{}'", path.display()))
}

/// Builds run settings: explicit CLI values, then file values, then defaults.
#[must_use]
pub fn resolve_harvest_config(args: &Args, file: Option<&FileConfig>) -> HarvestConfig {
    let file = file.cloned().unwrap_or_default();
    let defaults = HarvestConfig::default();

    HarvestConfig {
        output_dir: args
            .output_dir
            .clone()
            .or(file.output_dir)
            .unwrap_or(defaults.output_dir),
        ledger_path: args
            .ledger_path
            .clone()
            .or(file.ledger_path)
            .unwrap_or(defaults.ledger_path),
        cache_dir: args
            .cache_dir
            .clone()
            .or(file.cache_dir)
            .unwrap_or(defaults.cache_dir),
        cache_prefix: args
            .cache_prefix
            .clone()
            .or(file.cache_prefix)
            .unwrap_or(defaults.cache_prefix),
        base_url: args
            .base_url
            .clone()
            .or(file.base_url)
            .unwrap_or(defaults.base_url),
        max_page_index: args
            .max_page_index
            .or(file.max_page_index)
            .unwrap_or(defaults.max_page_index),
        cooldown: args
            .cooldown_secs
            .or(file.cooldown_secs)
            .map_or(defaults.cooldown, Duration::from_secs),
        request_timeout: args
            .timeout_secs
            .or(file.timeout_secs)
            .map_or(defaults.request_timeout, Duration::from_secs),
    }
}

fn parse_config_str(raw: &str) -> Result<FileConfig> {
    let mut cfg = FileConfig::default();
    for (line_index, raw_line) in raw.lines().enumerate() {
        let line = strip_inline_comment(raw_line).trim();
        if line.is_empty() {
            continue;
        }

        let Some((raw_key, raw_value)) = line.split_once('=') else {
            bail!(
                "Invalid config syntax on line {}: expected key = value",
                line_index + 1
            );
        };

        let key = raw_key.trim();
        let value = raw_value.trim();
        let line_no = line_index + 1;

        match key {
            "output_dir" | "ledger_path" | "cache_dir" => {
                let parsed = parse_string_literal(value)
                    .with_context(|| format!("Invalid `{key}` value on line {line_no}"))?;
                let path = Some(PathBuf::from(parsed));
                match key {
                    "output_dir" => cfg.output_dir = path,
                    "ledger_path" => cfg.ledger_path = path,
                    _ => cfg.cache_dir = path,
                }
            }
            "cache_prefix" => {
                let parsed = parse_string_literal(value)
                    .with_context(|| format!("Invalid `cache_prefix` value on line {line_no}"))?;
                cfg.cache_prefix = Some(parsed);
            }
            "base_url" => {
                let parsed = parse_string_literal(value)
                    .with_context(|| format!("Invalid `base_url` value on line {line_no}"))?;
                cfg.base_url = Some(parsed);
            }
            "max_page_index" => {
                let parsed = parse_integer_u64(value)
                    .with_context(|| format!("Invalid `max_page_index` value on line {line_no}"))?;
                let n = u32::try_from(parsed)
                    .map_err(|_| anyhow::anyhow!("max_page_index out of range for u32"))?;
                cfg.max_page_index = Some(n);
            }
            "cooldown_secs" => {
                let parsed = parse_integer_u64(value)
                    .with_context(|| format!("Invalid `cooldown_secs` value on line {line_no}"))?;
                cfg.cooldown_secs = Some(parsed);
            }
            "timeout_secs" => {
                let parsed = parse_integer_u64(value)
                    .with_context(|| format!("Invalid `timeout_secs` value on line {line_no}"))?;
                cfg.timeout_secs = Some(parsed);
            }
            "verbosity" => {
                let parsed = parse_string_literal(value)
                    .with_context(|| format!("Invalid `verbosity` value on line {line_no}"))?;
                cfg.verbosity = Some(parse_verbosity(&parsed).with_context(|| {
                    format!("Invalid `verbosity` value '{parsed}' on line {line_no}")
                })?);
            }
            unknown => {
                bail!("Unknown configuration key: '{unknown}' on line {line_no}");
            }
        }
    }
    cfg.validate()?;
    Ok(cfg)
}

fn strip_inline_comment(line: &str) -> &str {
    let mut in_string = false;
    for (index, ch) in line.char_indices() {
        match ch {
            '"' => in_string = !in_string,
            '#' if !in_string => return &line[..index],
            _ => {}
        }
    }
    line
}

fn parse_string_literal(raw_value: &str) -> Result<String> {
    if raw_value.len() < 2 || !raw_value.starts_with('"') || !raw_value.ends_with('"') {
        bail!("Expected double-quoted string");
    }
    Ok(raw_value[1..raw_value.len() - 1].to_string())
}

fn parse_integer_u64(raw_value: &str) -> Result<u64> {
    let token = raw_value.trim();
    if token.is_empty() {
        bail!("Expected integer value");
    }
    let value = token.parse::<i128>()?;
    if value < 0 {
        bail!("Expected non-negative integer");
    }
    u64::try_from(value).map_err(|_| anyhow::anyhow!("Integer value out of range for u64"))
}

fn parse_verbosity(value: &str) -> Result<VerbositySetting> {
    match value {
        "default" => Ok(VerbositySetting::Default),
        "verbose" => Ok(VerbositySetting::Verbose),
        "quiet" => Ok(VerbositySetting::Quiet),
        "debug" => Ok(VerbositySetting::Debug),
        _ => bail!("Expected one of: default, verbose, quiet, debug"),
    }
}
