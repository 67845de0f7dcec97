//! Terminal dashboard page.
//!
//! A [`View`] is composed of optional regions — bot indicator, command
//! chart, live log panel — plus an alert stack. Which regions exist is fixed
//! when the view is built; operations aimed at a missing region do nothing.
//! [`View::render`] redraws everything that is present.

use std::io::Write;
use std::sync::LazyLock;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use colored::Colorize;
use regex::Regex;

use crate::alert::{AlertKind, AlertStack};
use crate::chart;
use crate::client::{BotStatus, CommandStats};
use crate::config::schema::ViewConfig;
use crate::panel::{CAPACITY, LogEntry, LogPanel};

/// Cursor home + clear screen.
const CLEAR_SCREEN: &str = "\x1b[H\x1b[2J";

/// Width of the longest chart bar.
const CHART_WIDTH: usize = 40;

/// Matches the level column of `time - target - LEVEL - message` lines.
static LEVEL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\s-\s(DEBUG|INFO|WARNING|WARN|ERROR|CRITICAL)\s-\s")
        .expect("level regex must compile")
});

// ---------------------------------------------------------------------------
// Layout
// ---------------------------------------------------------------------------

/// Which regions a view has.
#[derive(Debug, Clone)]
pub struct Layout {
    pub indicator: bool,
    pub chart: bool,
    pub logs: bool,
    pub viewport_lines: usize,
    pub alert_dismiss_after: Duration,
}

impl Layout {
    /// Full dashboard layout from config.
    pub fn from_config(config: &ViewConfig) -> Self {
        Self {
            indicator: true,
            chart: config.chart,
            logs: config.logs,
            viewport_lines: config.viewport_lines,
            alert_dismiss_after: Duration::from_secs(config.alert_dismiss_secs),
        }
    }

    /// Just the log region.
    pub fn logs_only(viewport_lines: usize) -> Self {
        Self {
            indicator: false,
            chart: false,
            logs: true,
            viewport_lines,
            alert_dismiss_after: crate::alert::DEFAULT_DISMISS_AFTER,
        }
    }

    /// No regions at all.
    pub fn empty() -> Self {
        Self {
            indicator: false,
            chart: false,
            logs: false,
            viewport_lines: 1,
            alert_dismiss_after: crate::alert::DEFAULT_DISMISS_AFTER,
        }
    }
}

// ---------------------------------------------------------------------------
// Bot indicator
// ---------------------------------------------------------------------------

/// Running/stopped marker with the matching action label.
#[derive(Debug, Clone, Default)]
pub struct BotIndicator {
    status: Option<BotStatus>,
}

impl BotIndicator {
    pub fn set(&mut self, status: BotStatus) {
        self.status = Some(status);
    }

    pub fn status(&self) -> Option<BotStatus> {
        self.status
    }

    /// The action the toggle would perform next.
    pub fn action_label(&self) -> &'static str {
        match self.status {
            Some(BotStatus::Running) => "Stop Bot",
            _ => "Start Bot",
        }
    }

    pub fn render(&self) -> String {
        let marker = match self.status {
            Some(BotStatus::Running) => format!("{} running", "●".green()),
            Some(BotStatus::Stopped) => format!("{} stopped", "●".red()),
            None => format!("{} unknown", "●".dimmed()),
        };
        format!(
            "{} {}  {}",
            "Bot:".bold(),
            marker,
            format!("[{}]", self.action_label()).dimmed()
        )
    }
}

// ---------------------------------------------------------------------------
// View
// ---------------------------------------------------------------------------

/// A dashboard page drawn to `out`.
pub struct View<W: Write> {
    out: W,
    indicator: Option<BotIndicator>,
    chart: Option<Option<CommandStats>>,
    log: Option<LogPanel>,
    alerts: AlertStack,
    clear_screen: bool,
}

impl<W: Write> View<W> {
    pub fn new(out: W, layout: &Layout) -> Self {
        Self {
            out,
            indicator: layout.indicator.then(BotIndicator::default),
            chart: layout.chart.then_some(None),
            log: layout.logs.then(|| LogPanel::new(layout.viewport_lines)),
            alerts: AlertStack::new(layout.alert_dismiss_after),
            clear_screen: true,
        }
    }

    /// Append frames instead of redrawing in place.
    pub fn without_clear(mut self) -> Self {
        self.clear_screen = false;
        self
    }

    pub fn has_log_region(&self) -> bool {
        self.log.is_some()
    }

    pub fn has_chart_region(&self) -> bool {
        self.chart.is_some()
    }

    pub fn log_panel(&self) -> Option<&LogPanel> {
        self.log.as_ref()
    }

    pub fn indicator(&self) -> Option<&BotIndicator> {
        self.indicator.as_ref()
    }

    pub fn alerts(&self) -> &AlertStack {
        &self.alerts
    }

    /// Feed one stream line to the log panel. Returns `false` when the view
    /// has no log region.
    pub fn push_log(&mut self, line: impl Into<String>) -> bool {
        match self.log.as_mut() {
            Some(panel) => {
                panel.push(line);
                true
            }
            None => false,
        }
    }

    pub fn set_status(&mut self, status: BotStatus) {
        if let Some(indicator) = self.indicator.as_mut() {
            indicator.set(status);
        }
    }

    pub fn set_chart(&mut self, stats: CommandStats) {
        if let Some(chart) = self.chart.as_mut() {
            *chart = Some(stats);
        }
    }

    pub fn alert(&mut self, message: impl Into<String>, kind: AlertKind) {
        self.alerts.show(message, kind);
    }

    /// Dismiss expired alerts. Returns `true` if any were removed.
    pub fn expire_alerts(&mut self, now: Instant) -> bool {
        self.alerts.prune(now) > 0
    }

    /// Redraw every present region.
    pub fn render(&mut self) -> Result<()> {
        let frame = self.frame();
        self.out
            .write_all(frame.as_bytes())
            .context("failed writing dashboard frame")?;
        self.out.flush().context("failed flushing dashboard frame")
    }

    fn frame(&self) -> String {
        let mut frame = String::new();
        if self.clear_screen {
            frame.push_str(CLEAR_SCREEN);
        }

        for alert in self.alerts.alerts() {
            frame.push_str(&alert.render());
            frame.push('\n');
        }

        if let Some(indicator) = &self.indicator {
            frame.push_str(&indicator.render());
            frame.push_str("\n\n");
        }

        if let Some(chart) = &self.chart {
            match chart {
                Some(stats) => frame.push_str(&chart::render_bar_chart(stats, CHART_WIDTH)),
                None => frame.push_str(&format!(
                    "{}\n  {}\n",
                    chart::TITLE.bold().cyan(),
                    "loading…".dimmed()
                )),
            }
            frame.push('\n');
        }

        if let Some(panel) = &self.log {
            frame.push_str(&format!(
                "{} {}\n",
                "Logs".bold().cyan(),
                format!("({}/{})", panel.len(), CAPACITY).dimmed()
            ));
            for entry in panel.visible() {
                frame.push_str(&paint_entry(entry));
                frame.push('\n');
            }
        }

        frame
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

/// Colour a log line by its level without changing its text.
fn paint_entry(entry: &LogEntry) -> String {
    let text = entry.display_text();
    match LEVEL_RE
        .captures(entry.text())
        .and_then(|c| c.get(1))
        .map(|m| m.as_str())
    {
        Some("ERROR" | "CRITICAL") => text.red().to_string(),
        Some("WARNING" | "WARN") => text.yellow().to_string(),
        Some("DEBUG") => text.dimmed().to_string(),
        _ => text,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn rendered(view: View<Vec<u8>>) -> String {
        String::from_utf8(view.into_inner()).unwrap()
    }

    #[test]
    fn indicator_labels_follow_status() {
        let mut indicator = BotIndicator::default();
        assert_eq!(indicator.action_label(), "Start Bot");
        indicator.set(BotStatus::Running);
        assert_eq!(indicator.action_label(), "Stop Bot");
        assert!(indicator.render().contains("running"));
        indicator.set(BotStatus::Stopped);
        assert_eq!(indicator.action_label(), "Start Bot");
        assert!(indicator.render().contains("stopped"));
    }

    #[test]
    fn missing_regions_ignore_updates() {
        let mut view = View::new(Vec::new(), &Layout::empty());
        assert!(!view.push_log("ignored"));
        view.set_status(BotStatus::Running);
        view.set_chart(CommandStats::default());
        assert!(view.log_panel().is_none());
        assert!(view.indicator().is_none());
        assert!(rendered(view).is_empty());
    }

    #[test]
    fn render_shows_visible_log_window() {
        let mut view = View::new(Vec::new(), &Layout::logs_only(2)).without_clear();
        view.push_log("first");
        view.push_log("second");
        view.push_log("third");
        view.render().unwrap();
        let out = rendered(view);
        assert!(!out.contains("first"));
        assert!(out.contains("second"));
        assert!(out.contains("third"));
        assert!(out.contains("3/100"));
    }

    #[test]
    fn render_escapes_terminal_control_sequences() {
        let mut view = View::new(Vec::new(), &Layout::logs_only(5)).without_clear();
        view.push_log("\x1b[2Jwipe");
        view.render().unwrap();
        let out = rendered(view);
        assert!(out.contains("\\u{1b}[2Jwipe"));
        assert!(!out.contains("\x1b[2Jwipe"));
    }

    #[test]
    fn render_clears_screen_by_default() {
        let mut view = View::new(Vec::new(), &Layout::logs_only(5));
        view.render().unwrap();
        assert!(rendered(view).starts_with(CLEAR_SCREEN));
    }

    #[test]
    fn chart_region_shows_loading_until_stats_arrive() {
        let layout = Layout::from_config(&ViewConfig::default());
        let mut view = View::new(Vec::new(), &layout).without_clear();
        view.render().unwrap();
        view.set_chart(CommandStats {
            labels: vec!["Balance".into()],
            values: vec![45.0],
        });
        view.render().unwrap();
        let out = rendered(view);
        assert!(out.contains("loading"));
        assert!(out.contains("Balance"));
    }

    #[test]
    fn level_detection_keeps_text() {
        let entry = LogEntry::new("2024-05-01 10:00:00,000 - bot - ERROR - Failed to send SMS");
        assert!(paint_entry(&entry).contains("Failed to send SMS"));
        assert_eq!(
            LEVEL_RE
                .captures(entry.text())
                .and_then(|c| c.get(1))
                .map(|m| m.as_str()),
            Some("ERROR")
        );
    }

    #[test]
    fn expired_alerts_leave_the_frame() {
        let mut view = View::new(Vec::new(), &Layout::empty());
        view.alert("Bot started", AlertKind::Success);
        assert!(!view.expire_alerts(Instant::now()));
        assert!(view.expire_alerts(Instant::now() + Duration::from_secs(6)));
        assert!(view.alerts().is_empty());
    }
}
