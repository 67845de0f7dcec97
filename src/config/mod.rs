/// Configuration system for botdash.
///
/// Provides a layered configuration hierarchy:
///
/// 1. **Built-in defaults** — hardcoded in [`schema::BotdashConfig::default()`]
/// 2. **User global config** — `~/.botdash/config.toml`
/// 3. **Project local config** — `.botdash.toml` in the current working directory
/// 4. **Environment variables** — `BOTDASH_*` overrides (highest precedence)
///
/// Later layers override earlier ones. Missing sections in a TOML file fall
/// back to built-in defaults.
///
/// # Usage
///
/// ```rust,ignore
/// use botdash::config;
///
/// let cfg = config::load();
/// let client = DashboardClient::from_config(&cfg.dashboard);
/// ```
pub mod schema;

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};

pub use schema::BotdashConfig;

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Load the fully resolved botdash configuration.
///
/// Merges all layers in order: defaults → global TOML → project TOML → env
/// vars.
pub fn load() -> BotdashConfig {
    let layers = [global_config_path(), project_config_path()]
        .into_iter()
        .filter_map(load_toml_file);
    let mut config = resolve_layers(layers);

    apply_overrides(&mut config, |key| std::env::var(key).ok());

    config
}

/// Load a TOML config file from the given path (if it exists).
///
/// Returns `None` if the path is `None`, the file doesn't exist, or the
/// content is malformed. Malformed files are ignored so a typo never keeps
/// the dashboard from starting.
fn load_toml_file(path: Option<PathBuf>) -> Option<toml::Table> {
    let path = path?;
    let content = fs::read_to_string(&path).ok()?;
    parse_layer(&content)
}

/// Parse one config file as a raw table, keeping only the keys it sets.
///
/// The layer must also deserialize on its own, so a wrongly typed value
/// discards the file rather than the merged result.
fn parse_layer(content: &str) -> Option<toml::Table> {
    toml::from_str::<BotdashConfig>(content).ok()?;
    toml::from_str(content).ok()
}

/// Stack file layers over the built-in defaults.
///
/// Later layers replace only the keys they set; everything else keeps the
/// value from the layer below.
fn resolve_layers(layers: impl IntoIterator<Item = toml::Table>) -> BotdashConfig {
    let mut merged = toml::Table::new();
    for layer in layers {
        merge_tables(&mut merged, layer);
    }
    toml::Value::Table(merged).try_into().unwrap_or_default()
}

/// Merge `overlay` into `base`, recursing into nested tables.
fn merge_tables(base: &mut toml::Table, overlay: toml::Table) {
    for (key, value) in overlay {
        if let toml::Value::Table(incoming) = value {
            if let Some(toml::Value::Table(existing)) = base.get_mut(&key) {
                merge_tables(existing, incoming);
                continue;
            }
            base.insert(key, toml::Value::Table(incoming));
        } else {
            base.insert(key, value);
        }
    }
}

// ---------------------------------------------------------------------------
// File paths
// ---------------------------------------------------------------------------

/// Path to the user global config: `~/.botdash/config.toml`.
fn global_config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".botdash").join("config.toml"))
}

/// Path to the project local config: `.botdash.toml` in the current directory.
fn project_config_path() -> Option<PathBuf> {
    std::env::current_dir()
        .ok()
        .map(|cwd| cwd.join(".botdash.toml"))
}

/// Return the path to the global config file for display/init purposes.
pub fn global_config_file() -> Option<PathBuf> {
    global_config_path()
}

/// Return the path to the project config file for display purposes.
pub fn project_config_file() -> Option<PathBuf> {
    project_config_path()
}

// ---------------------------------------------------------------------------
// Environment variable overrides
// ---------------------------------------------------------------------------

/// Apply environment overrides (highest precedence layer).
///
/// `lookup` returns the value of a variable if set. Supported variables:
/// - `BOTDASH_URL` — dashboard server base URL
/// - `BOTDASH_TIMEOUT_MS` — one-shot request timeout
/// - `BOTDASH_SERVER_ADDR` — listen address for `botdash serve`
/// - `BOTDASH_LOG_FILE` — activity log path for `botdash serve`
/// - `BOTDASH_VIEW_CHART` — show the chart region (`1`/`true`/`yes`/`on`)
/// - `BOTDASH_VIEW_LOGS` — show the log region
pub fn apply_overrides(config: &mut BotdashConfig, lookup: impl Fn(&str) -> Option<String>) {
    if let Some(val) = lookup("BOTDASH_URL")
        && !val.is_empty()
    {
        config.dashboard.url = val;
    }
    if let Some(val) = lookup("BOTDASH_TIMEOUT_MS")
        && let Ok(ms) = val.parse::<u64>()
    {
        config.dashboard.timeout_ms = ms;
    }
    if let Some(val) = lookup("BOTDASH_SERVER_ADDR")
        && !val.is_empty()
    {
        config.server.addr = val;
    }
    if let Some(val) = lookup("BOTDASH_LOG_FILE")
        && !val.is_empty()
    {
        config.server.log_file = val;
    }
    if let Some(val) = lookup("BOTDASH_VIEW_CHART") {
        config.view.chart = is_truthy(&val);
    }
    if let Some(val) = lookup("BOTDASH_VIEW_LOGS") {
        config.view.logs = is_truthy(&val);
    }
}

/// Check if a string value represents a truthy boolean.
fn is_truthy(val: &str) -> bool {
    matches!(
        val.to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

// ---------------------------------------------------------------------------
// Config init / set / reset
// ---------------------------------------------------------------------------

/// Write the default annotated config to `~/.botdash/config.toml`.
///
/// Creates the `~/.botdash/` directory if it doesn't exist. Returns an error
/// if the file already exists (use `force = true` to overwrite).
pub fn init_config(force: bool) -> Result<PathBuf> {
    let path = global_config_path().context("could not determine home directory")?;

    if path.exists() && !force {
        anyhow::bail!(
            "config file already exists at {}. Use --force to overwrite.",
            path.display()
        );
    }

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).context("failed to create ~/.botdash/ directory")?;
    }

    fs::write(&path, BotdashConfig::default_toml()).context("failed to write config file")?;

    Ok(path)
}

/// Set a single config key to a value in the global config file.
///
/// Reads the current global config (or defaults), updates the specified key,
/// and writes the result back. Supports dotted keys like `view.chart`.
pub fn set_config_value(key: &str, value: &str) -> Result<()> {
    let path = global_config_path().context("could not determine home directory")?;

    let content = if path.exists() {
        fs::read_to_string(&path).context("failed to read config file")?
    } else {
        toml::to_string_pretty(&BotdashConfig::default())
            .context("failed to serialize default config")?
    };

    let mut value_table: toml::Value =
        toml::from_str(&content).context("failed to parse config as TOML value")?;
    set_toml_value(&mut value_table, key, value)?;

    let output =
        toml::to_string_pretty(&value_table).context("failed to serialize updated config")?;

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).context("failed to create config directory")?;
    }
    fs::write(&path, output).context("failed to write config file")?;

    Ok(())
}

/// Set a value in a TOML value tree using a dotted key path.
///
/// The new value takes the type of the value it replaces; unknown leaves
/// are stored as strings.
fn set_toml_value(root: &mut toml::Value, key: &str, raw_value: &str) -> Result<()> {
    let parts: Vec<&str> = key.split('.').collect();
    if parts.iter().any(|p| p.is_empty()) {
        anyhow::bail!("invalid config key: '{key}'");
    }

    let mut current = root;
    for &part in &parts[..parts.len() - 1] {
        current = current
            .get_mut(part)
            .with_context(|| format!("config key not found: section '{part}' in '{key}'"))?;
    }

    let leaf = parts[parts.len() - 1];

    let table = current.as_table_mut().with_context(|| {
        format!(
            "expected table at '{}'",
            key.rsplit_once('.').map(|(s, _)| s).unwrap_or("")
        )
    })?;

    let new_value = match table.get(leaf) {
        Some(toml::Value::Boolean(_)) => toml::Value::Boolean(is_truthy(raw_value)),
        Some(toml::Value::Integer(_)) => {
            let n: i64 = raw_value
                .parse()
                .with_context(|| format!("expected integer for '{key}', got '{raw_value}'"))?;
            toml::Value::Integer(n)
        }
        Some(toml::Value::Array(_)) => toml::Value::Array(
            raw_value
                .split(',')
                .map(|s| toml::Value::String(s.trim().to_string()))
                .collect(),
        ),
        _ => toml::Value::String(raw_value.to_string()),
    };

    table.insert(leaf.to_string(), new_value);
    Ok(())
}

/// Reset the global config to defaults (overwrite the file).
pub fn reset_config() -> Result<PathBuf> {
    init_config(true)
}

/// Show the effective (fully resolved) config as TOML.
pub fn show_effective_config() -> Result<String> {
    let config = load();
    toml::to_string_pretty(&config).context("failed to serialize effective config")
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
