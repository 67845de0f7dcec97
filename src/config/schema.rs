/// Configuration schema and defaults for botdash.
///
/// Defines the TOML-serializable configuration structure with three
/// sections: `[dashboard]` (where the client connects), `[view]` (which
/// regions the terminal dashboard shows), and `[server]` (how `botdash serve`
/// supervises the bot and where it keeps its files).
///
/// Every field has a built-in default. Users only need to set the values
/// they want to override.
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

/// Top-level botdash configuration.
///
/// Maps directly to the `~/.botdash/config.toml` and `.botdash.toml` file
/// schemas.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BotdashConfig {
    pub dashboard: DashboardConfig,
    pub view: ViewConfig,
    pub server: ServerConfig,
}

// ---------------------------------------------------------------------------
// [dashboard]
// ---------------------------------------------------------------------------

/// Client connection settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DashboardConfig {
    /// Base URL of the bot-management server.
    pub url: String,
    /// Timeout for one-shot requests (milliseconds). The log stream has no
    /// overall timeout.
    pub timeout_ms: u64,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            url: "http://127.0.0.1:5000".to_string(),
            timeout_ms: 10_000,
        }
    }
}

// ---------------------------------------------------------------------------
// [view]
// ---------------------------------------------------------------------------

/// Terminal dashboard layout.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewConfig {
    /// Show the command usage chart region.
    pub chart: bool,
    /// Show the live log region.
    pub logs: bool,
    /// Number of log lines visible at once.
    pub viewport_lines: usize,
    /// Seconds before an alert banner is dismissed.
    pub alert_dismiss_secs: u64,
}

impl Default for ViewConfig {
    fn default() -> Self {
        Self {
            chart: true,
            logs: true,
            viewport_lines: 20,
            alert_dismiss_secs: 5,
        }
    }
}

// ---------------------------------------------------------------------------
// [server]
// ---------------------------------------------------------------------------

/// Settings for `botdash serve`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Listen address.
    pub addr: String,
    /// Program and arguments used to start the bot.
    pub bot_command: Vec<String>,
    /// Activity log shared with the bot and streamed to subscribers.
    pub log_file: String,
    /// Where submitted bot credentials are stored.
    pub settings_file: String,
    /// How often the log tail checks for new lines (milliseconds).
    pub poll_interval_ms: u64,
    /// Regex with one capture group naming the command on a log line.
    pub command_pattern: String,
    /// Commands always listed in usage stats, in this order.
    pub tracked_commands: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            addr: "127.0.0.1:5000".to_string(),
            bot_command: vec!["python".to_string(), "bot.py".to_string()],
            log_file: "bot.log".to_string(),
            settings_file: "bot-settings.toml".to_string(),
            poll_interval_ms: 250,
            command_pattern: r"(?i)\bcommand:?\s+/(\w+)".to_string(),
            tracked_commands: ["balance", "transfer", "help", "call"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }
}

// ---------------------------------------------------------------------------
// Default TOML
// ---------------------------------------------------------------------------

impl BotdashConfig {
    /// Annotated default config written by `botdash config init`.
    pub fn default_toml() -> String {
        let defaults = Self::default();
        format!(
            r#"# botdash configuration
# Values here override built-in defaults. `.botdash.toml` in the current
# directory and BOTDASH_* environment variables override this file.

[dashboard]
# Base URL of the bot-management server
url = "{url}"
# Timeout for one-shot requests (ms)
timeout_ms = {timeout_ms}

[view]
# Regions shown by `botdash dashboard`
chart = {chart}
logs = {logs}
# Visible log lines
viewport_lines = {viewport}
# Seconds before an alert is dismissed
alert_dismiss_secs = {dismiss}

[server]
addr = "{addr}"
bot_command = [{bot_command}]
log_file = "{log_file}"
settings_file = "{settings_file}"
poll_interval_ms = {poll}
command_pattern = '{pattern}'
tracked_commands = [{tracked}]
"#,
            url = defaults.dashboard.url,
            timeout_ms = defaults.dashboard.timeout_ms,
            chart = defaults.view.chart,
            logs = defaults.view.logs,
            viewport = defaults.view.viewport_lines,
            dismiss = defaults.view.alert_dismiss_secs,
            addr = defaults.server.addr,
            bot_command = quoted_list(&defaults.server.bot_command),
            log_file = defaults.server.log_file,
            settings_file = defaults.server.settings_file,
            poll = defaults.server.poll_interval_ms,
            pattern = defaults.server.command_pattern,
            tracked = quoted_list(&defaults.server.tracked_commands),
        )
    }
}

fn quoted_list(items: &[String]) -> String {
    items
        .iter()
        .map(|s| format!("\"{s}\""))
        .collect::<Vec<_>>()
        .join(", ")
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_toml_parses_to_defaults() {
        let parsed: BotdashConfig = toml::from_str(&BotdashConfig::default_toml()).unwrap();
        let defaults = BotdashConfig::default();
        assert_eq!(parsed.dashboard.url, defaults.dashboard.url);
        assert_eq!(parsed.view.viewport_lines, defaults.view.viewport_lines);
        assert_eq!(parsed.server.bot_command, defaults.server.bot_command);
        assert_eq!(parsed.server.command_pattern, defaults.server.command_pattern);
        assert_eq!(parsed.server.tracked_commands, defaults.server.tracked_commands);
    }

    #[test]
    fn partial_toml_fills_missing_fields() {
        let cfg: BotdashConfig = toml::from_str(
            r#"
[dashboard]
url = "http://bots.local:8080"
"#,
        )
        .unwrap();
        assert_eq!(cfg.dashboard.url, "http://bots.local:8080");
        assert_eq!(cfg.dashboard.timeout_ms, 10_000);
        assert!(cfg.view.logs);
        assert_eq!(cfg.server.poll_interval_ms, 250);
    }

    #[test]
    fn default_command_pattern_compiles() {
        let re = regex::Regex::new(&ServerConfig::default().command_pattern).unwrap();
        let caps = re
            .captures("2024-05-01 10:00:00,000 - bot - INFO - Command /balance from 42")
            .unwrap();
        assert_eq!(&caps[1], "balance");
    }
}
