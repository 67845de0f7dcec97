//! CLI command implementations for botdash.
//!
//! Provides subcommand handlers for:
//! - `botdash toggle` — start or stop the bot
//! - `botdash stats` — command usage chart (or JSON/CSV)
//! - `botdash save-config` — submit bot credentials
//! - `botdash show-settings` — the credentials the server has saved
//! - `botdash logs` — follow the live log stream
//! - `botdash dashboard` — status, chart and live logs on one screen
//! - `botdash serve` — run the bot-management server
//! - `botdash config show|init|set|reset` — configuration management

use std::io::{self, Write};
use std::sync::mpsc::RecvTimeoutError;
use std::time::{Duration, Instant};

use anyhow::Result;
use colored::Colorize;

use crate::alert::{self, AlertKind};
use crate::chart;
use crate::client::{CommandStats, DashboardClient};
use crate::config;
use crate::panel::escape_controls;
use crate::server;
use crate::settings::BotSettings;
use crate::stream;
use crate::view::{Layout, View};

/// How often the dashboard wakes up to dismiss expired alerts.
const ALERT_TICK: Duration = Duration::from_millis(500);

/// Output format for `botdash stats` and `botdash show-settings`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Table,
    Json,
    Csv,
}

impl OutputFormat {
    pub fn from_str_opt(s: Option<&str>) -> Self {
        match s {
            Some("json") => Self::Json,
            Some("csv") => Self::Csv,
            _ => Self::Table,
        }
    }
}

fn client() -> DashboardClient {
    DashboardClient::from_config(&config::load().dashboard)
}

// ---------------------------------------------------------------------------
// botdash toggle
// ---------------------------------------------------------------------------

/// Start the bot if it is stopped, stop it if it is running.
pub fn run_toggle() -> Result<()> {
    let outcome = client().toggle_bot()?;

    let layout = Layout {
        indicator: true,
        ..Layout::empty()
    };
    let mut view = View::new(io::stdout(), &layout).without_clear();
    view.set_status(outcome.status);

    if outcome.success {
        view.alert(format!("Bot {}", outcome.status), AlertKind::Success);
    } else {
        view.alert("Bot could not be toggled", AlertKind::Danger);
    }
    view.render()
}

// ---------------------------------------------------------------------------
// botdash stats
// ---------------------------------------------------------------------------

/// Show command usage.
pub fn run_stats(format: OutputFormat) -> Result<()> {
    let stats = client().command_stats()?;

    match format {
        OutputFormat::Json => print_stats_json(&stats)?,
        OutputFormat::Csv => print_stats_csv(&stats),
        OutputFormat::Table => print!("{}", chart::render_bar_chart(&stats, 40)),
    }

    Ok(())
}

fn print_stats_json(stats: &CommandStats) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(stats)?);
    Ok(())
}

fn print_stats_csv(stats: &CommandStats) {
    println!("command,count");
    for (label, value) in stats.pairs() {
        println!("{},{}", csv_field(label), value);
    }
}

/// Quote a CSV field when it contains a separator, quote or line break.
fn csv_field(s: &str) -> String {
    if s.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", s.replace('"', "\"\""))
    } else {
        s.to_string()
    }
}

// ---------------------------------------------------------------------------
// botdash save-config
// ---------------------------------------------------------------------------

/// Submit bot credentials and show the result banner.
pub fn run_save_config(settings: &BotSettings) -> Result<()> {
    let outcome = client().save_config(settings)?;

    let (message, kind) = alert::save_result_alert(outcome.success);
    let mut view = View::new(io::stdout(), &Layout::empty()).without_clear();
    view.alert(message, kind);
    view.render()?;

    if let Some(error) = outcome.error {
        println!("  {}", error.dimmed());
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// botdash show-settings
// ---------------------------------------------------------------------------

/// Print the credentials the server has saved.
pub fn run_show_settings(format: OutputFormat) -> Result<()> {
    let settings = client().settings()?;

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&settings)?),
        OutputFormat::Csv => {
            println!("field,value");
            for (name, value) in settings.form_fields() {
                println!("{},{}", name, csv_field(value));
            }
        }
        OutputFormat::Table => print!("{}", settings_table(&settings)),
    }

    Ok(())
}

fn settings_table(settings: &BotSettings) -> String {
    let fields = settings.form_fields();
    let width = fields.iter().map(|(name, _)| name.len()).max().unwrap_or(0);

    let mut out = format!("{}\n", "Bot Settings".bold().cyan());
    for (name, value) in fields {
        let value = if value.is_empty() {
            "(not set)".dimmed().to_string()
        } else {
            escape_controls(value)
        };
        out.push_str(&format!("  {name:<width$}  {value}\n"));
    }
    out
}

// ---------------------------------------------------------------------------
// botdash logs / dashboard
// ---------------------------------------------------------------------------

/// Follow the log stream in a log-only view.
pub fn run_logs() -> Result<()> {
    let cfg = config::load();
    let client = DashboardClient::from_config(&cfg.dashboard);
    let mut view = View::new(io::stdout(), &Layout::logs_only(cfg.view.viewport_lines));

    let Some(subscription) = stream::initialize(&view, &client)? else {
        return Ok(());
    };
    view.render()?;
    subscription.drive(&mut view)?;

    Ok(())
}

/// Full dashboard: bot status, command chart, live logs.
///
/// Regions disabled in `[view]` are simply absent. Request failures on
/// status or stats become alerts; the log stream ending just stops updates.
pub fn run_dashboard() -> Result<()> {
    let cfg = config::load();
    let client = DashboardClient::from_config(&cfg.dashboard);
    let mut view = View::new(io::stdout(), &Layout::from_config(&cfg.view));

    load_view(&mut view, &client);
    view.render()?;

    let Some(subscription) = stream::initialize(&view, &client)? else {
        return Ok(());
    };

    loop {
        match subscription.recv_timeout(ALERT_TICK) {
            Ok(line) => {
                view.push_log(line);
                view.expire_alerts(Instant::now());
                view.render()?;
            }
            Err(RecvTimeoutError::Timeout) => {
                if view.expire_alerts(Instant::now()) {
                    view.render()?;
                }
            }
            Err(RecvTimeoutError::Disconnected) => break,
        }
    }

    Ok(())
}

/// One-shot page-load requests: bot status and, if charted, command stats.
fn load_view<W: Write>(view: &mut View<W>, client: &DashboardClient) {
    if view.indicator().is_some() {
        match client.status() {
            Ok(report) => view.set_status(report.status),
            Err(e) => view.alert(format!("Status unavailable: {e:#}"), AlertKind::Warning),
        }
    }

    if view.has_chart_region() {
        match client.command_stats() {
            Ok(stats) => view.set_chart(stats),
            Err(e) => view.alert(format!("Command stats unavailable: {e:#}"), AlertKind::Warning),
        }
    }
}

// ---------------------------------------------------------------------------
// botdash serve
// ---------------------------------------------------------------------------

/// Run the bot-management server.
pub fn run_serve(addr: Option<String>) -> Result<()> {
    let mut cfg = config::load().server;
    if let Some(addr) = addr {
        cfg.addr = addr;
    }
    server::serve(&cfg)
}

// ---------------------------------------------------------------------------
// botdash config show | init | set | reset
// ---------------------------------------------------------------------------

/// Show the effective (merged) configuration as TOML.
pub fn run_config_show() -> Result<()> {
    let toml_str = config::show_effective_config()?;
    println!("{}", "Effective botdash Configuration".bold().cyan());
    println!("{}", "=".repeat(50));
    println!();
    println!("{toml_str}");

    let global_exists = config::global_config_file()
        .map(|p| p.exists())
        .unwrap_or(false);
    let project_exists = config::project_config_file()
        .map(|p| p.exists())
        .unwrap_or(false);
    println!("{}", "Sources (highest priority last):".dimmed());
    println!("  {} built-in defaults", "·".dimmed());
    print_source("~/.botdash/config.toml", global_exists);
    print_source(".botdash.toml", project_exists);
    println!(
        "  {} {}",
        "·".dimmed(),
        "BOTDASH_* environment variables".dimmed()
    );

    Ok(())
}

fn print_source(name: &str, exists: bool) {
    if exists {
        println!("  {} {}", "✓".green(), name.dimmed());
    } else {
        println!("  {} {}", "·".dimmed(), format!("{name} (not found)").dimmed());
    }
}

/// Initialize a default config file at `~/.botdash/config.toml`.
pub fn run_config_init(force: bool) -> Result<()> {
    let path = config::init_config(force)?;
    println!(
        "{} Config written to {}",
        "✓".green().bold(),
        path.display()
    );
    Ok(())
}

/// Set a single configuration value in the global config file.
pub fn run_config_set(key: &str, value: &str) -> Result<()> {
    config::set_config_value(key, value)?;
    println!("{} Set {} = {}", "✓".green().bold(), key.bold(), value);
    Ok(())
}

/// Reset configuration to defaults.
pub fn run_config_reset() -> Result<()> {
    let path = config::reset_config()?;
    println!(
        "{} Config reset to defaults at {}",
        "✓".green().bold(),
        path.display()
    );
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
