//! Transient alert banners.
//!
//! New alerts go on top of the stack and each one is dismissed a fixed time
//! after it was shown. Time is passed in explicitly so expiry is
//! deterministic.

use std::time::{Duration, Instant};

use colored::{ColoredString, Colorize};

use crate::panel::escape_controls;

/// Default lifetime of a banner.
pub const DEFAULT_DISMISS_AFTER: Duration = Duration::from_secs(5);

pub const CONFIG_SAVED: &str = "Configuration saved successfully!";
pub const CONFIG_SAVE_FAILED: &str = "Error saving configuration";

/// Banner style.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlertKind {
    Success,
    Danger,
    Warning,
    Info,
}

impl AlertKind {
    fn paint(self, text: &str) -> ColoredString {
        match self {
            Self::Success => text.green().bold(),
            Self::Danger => text.red().bold(),
            Self::Warning => text.yellow().bold(),
            Self::Info => text.blue().bold(),
        }
    }

    fn marker(self) -> &'static str {
        match self {
            Self::Success => "✓",
            Self::Danger => "✗",
            Self::Warning => "!",
            Self::Info => "i",
        }
    }
}

#[derive(Debug, Clone)]
pub struct Alert {
    pub message: String,
    pub kind: AlertKind,
    shown_at: Instant,
}

impl Alert {
    /// One-line banner text.
    pub fn render(&self) -> String {
        format!(
            "{} {}",
            self.kind.paint(self.kind.marker()),
            self.kind.paint(&escape_controls(&self.message))
        )
    }
}

/// Visible alerts, newest first.
#[derive(Debug, Clone)]
pub struct AlertStack {
    alerts: Vec<Alert>,
    dismiss_after: Duration,
}

impl AlertStack {
    pub fn new(dismiss_after: Duration) -> Self {
        Self {
            alerts: Vec::new(),
            dismiss_after,
        }
    }

    /// Show a banner above all current ones.
    pub fn show(&mut self, message: impl Into<String>, kind: AlertKind) {
        self.show_at(message, kind, Instant::now());
    }

    pub fn show_at(&mut self, message: impl Into<String>, kind: AlertKind, now: Instant) {
        self.alerts.insert(
            0,
            Alert {
                message: message.into(),
                kind,
                shown_at: now,
            },
        );
    }

    /// Drop banners whose lifetime has passed. Returns how many were removed.
    pub fn prune(&mut self, now: Instant) -> usize {
        let before = self.alerts.len();
        let dismiss_after = self.dismiss_after;
        self.alerts
            .retain(|a| now.saturating_duration_since(a.shown_at) < dismiss_after);
        before - self.alerts.len()
    }

    pub fn alerts(&self) -> &[Alert] {
        &self.alerts
    }

    pub fn is_empty(&self) -> bool {
        self.alerts.is_empty()
    }
}

impl Default for AlertStack {
    fn default() -> Self {
        Self::new(DEFAULT_DISMISS_AFTER)
    }
}

/// The banner shown after a configuration save attempt.
pub fn save_result_alert(success: bool) -> (&'static str, AlertKind) {
    if success {
        (CONFIG_SAVED, AlertKind::Success)
    } else {
        (CONFIG_SAVE_FAILED, AlertKind::Danger)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
