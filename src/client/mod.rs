/// HTTP client for the bot-management server.
///
/// Uses the synchronous `ureq` client. Each call is an isolated
/// request/response operation with a typed result; none of them share state
/// with the log panel. The log stream is the one long-lived request and is
/// exposed through [`LogSource`].
use std::sync::mpsc::Receiver;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::config::schema::DashboardConfig;
use crate::settings::BotSettings;
use crate::stream::{self, LogSource};

// ---------------------------------------------------------------------------
// Response types
// ---------------------------------------------------------------------------

/// Whether the bot process is up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BotStatus {
    Running,
    Stopped,
}

impl BotStatus {
    pub fn from_running(running: bool) -> Self {
        if running { Self::Running } else { Self::Stopped }
    }

    pub fn is_running(self) -> bool {
        self == Self::Running
    }
}

impl std::fmt::Display for BotStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Running => write!(f, "running"),
            Self::Stopped => write!(f, "stopped"),
        }
    }
}

/// Body of `GET /status`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusReport {
    pub running: bool,
    pub status: BotStatus,
}

impl StatusReport {
    pub fn new(status: BotStatus) -> Self {
        Self {
            running: status.is_running(),
            status,
        }
    }
}

/// Body of `POST /toggle_bot`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToggleOutcome {
    /// Whether the start/stop attempt succeeded. Older servers omit it.
    #[serde(default = "default_true")]
    pub success: bool,
    /// State after the attempt.
    pub status: BotStatus,
}

fn default_true() -> bool {
    true
}

/// Body of `GET /command_stats`: chart labels with their counts.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CommandStats {
    pub labels: Vec<String>,
    pub values: Vec<f64>,
}

impl CommandStats {
    /// Label/value pairs. Items beyond the shorter of the two lists are
    /// ignored.
    pub fn pairs(&self) -> impl Iterator<Item = (&str, f64)> {
        self.labels
            .iter()
            .map(String::as_str)
            .zip(self.values.iter().copied())
    }
}

/// Body of `POST /save_config`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SaveOutcome {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

/// Synchronous client for one dashboard server.
#[derive(Debug, Clone)]
pub struct DashboardClient {
    base_url: String,
    timeout: Duration,
}

impl DashboardClient {
    /// Build a client from the resolved config.
    pub fn from_config(config: &DashboardConfig) -> Self {
        Self::new(&config.url, Duration::from_millis(config.timeout_ms))
    }

    pub fn new(base_url: &str, timeout: Duration) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            timeout,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// `GET /status` — current bot state.
    pub fn status(&self) -> Result<StatusReport> {
        ureq::get(&self.url("/status"))
            .timeout(self.timeout)
            .call()
            .context("status request failed")?
            .into_json()
            .context("failed to parse status response")
    }

    /// `POST /toggle_bot` — start the bot if stopped, stop it if running.
    pub fn toggle_bot(&self) -> Result<ToggleOutcome> {
        ureq::post(&self.url("/toggle_bot"))
            .timeout(self.timeout)
            .call()
            .context("toggle request failed")?
            .into_json()
            .context("failed to parse toggle response")
    }

    /// `GET /command_stats` — command usage for the chart.
    pub fn command_stats(&self) -> Result<CommandStats> {
        ureq::get(&self.url("/command_stats"))
            .timeout(self.timeout)
            .call()
            .context("command stats request failed")?
            .into_json()
            .context("failed to parse command stats response")
    }

    /// `GET /config` — the credentials the server has saved.
    pub fn settings(&self) -> Result<BotSettings> {
        ureq::get(&self.url("/config"))
            .timeout(self.timeout)
            .call()
            .context("config request failed")?
            .into_json()
            .context("failed to parse config response")
    }

    /// `POST /save_config` — submit bot credentials as a form.
    pub fn save_config(&self, settings: &BotSettings) -> Result<SaveOutcome> {
        ureq::post(&self.url("/save_config"))
            .timeout(self.timeout)
            .send_form(&settings.form_fields())
            .context("save config request failed")?
            .into_json()
            .context("failed to parse save config response")
    }
}

impl LogSource for DashboardClient {
    /// `GET /log_stream` — open the event stream.
    ///
    /// Only connecting is bounded by the client timeout; once established
    /// the stream may stay idle indefinitely. The stream is not reopened
    /// after it ends.
    fn subscribe(&self) -> Result<Receiver<String>> {
        let agent = ureq::AgentBuilder::new()
            .timeout_connect(self.timeout)
            .build();
        let resp = agent
            .get(&self.url("/log_stream"))
            .set("Accept", "text/event-stream")
            .set("Cache-Control", "no-cache")
            .call()
            .context("log stream request failed")?;

        Ok(stream::spawn_reader(resp.into_reader()))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
