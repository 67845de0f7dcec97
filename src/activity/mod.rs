use std::fs::{OpenOptions, create_dir_all};
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::Result;
use chrono::Local;

// ---------------------------------------------------------------------------
// Activity log
// ---------------------------------------------------------------------------

/// Severity column of an activity line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Info,
    Warning,
    Error,
}

impl Level {
    fn as_str(self) -> &'static str {
        match self {
            Self::Info => "INFO",
            Self::Warning => "WARNING",
            Self::Error => "ERROR",
        }
    }
}

/// Append-only text log shared with the bot process.
///
/// Lines use the `time - target - LEVEL - message` layout the bot itself
/// writes, so the log stream carries both sources uniformly. Every line is
/// mirrored to stderr. Writes are best-effort: a failed append never fails
/// the operation being logged.
#[derive(Debug, Clone)]
pub struct ActivityLog {
    path: PathBuf,
    target: String,
}

impl ActivityLog {
    pub fn new(path: impl Into<PathBuf>, target: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            target: target.into(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn info(&self, message: &str) {
        self.log(Level::Info, message);
    }

    pub fn warning(&self, message: &str) {
        self.log(Level::Warning, message);
    }

    pub fn error(&self, message: &str) {
        self.log(Level::Error, message);
    }

    pub fn log(&self, level: Level, message: &str) {
        let line = format_line(&self.target, level, message);
        eprintln!("{line}");
        let _ = self.append(&line);
    }

    fn append(&self, line: &str) -> Result<()> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            create_dir_all(parent)?;
        }
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        writeln!(file, "{line}")?;
        Ok(())
    }
}

/// `2024-05-01 10:00:00,123 - target - INFO - message`
fn format_line(target: &str, level: Level, message: &str) -> String {
    format!(
        "{} - {} - {} - {}",
        Local::now().format("%Y-%m-%d %H:%M:%S,%3f"),
        target,
        level.as_str(),
        message
    )
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_line_has_four_columns() {
        let line = format_line("botdash.server", Level::Warning, "slow start");
        let columns: Vec<_> = line.split(" - ").collect();
        assert_eq!(columns.len(), 4);
        assert_eq!(columns[1], "botdash.server");
        assert_eq!(columns[2], "WARNING");
        assert_eq!(columns[3], "slow start");
        // "2024-05-01 10:00:00,123"
        assert_eq!(columns[0].len(), 23);
        assert_eq!(&columns[0][19..20], ",");
    }

    #[test]
    fn log_appends_lines() {
        let dir = std::env::temp_dir().join(format!("botdash-activity-{}", std::process::id()));
        let log = ActivityLog::new(dir.join("bot.log"), "test");
        log.info("Bot started");
        log.error("Error stopping bot: gone");
        let content = std::fs::read_to_string(log.path()).unwrap();
        let lines: Vec<_> = content.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].ends_with(" - test - INFO - Bot started"));
        assert!(lines[1].contains(" - ERROR - "));
        let _ = std::fs::remove_dir_all(&dir);
    }
}
