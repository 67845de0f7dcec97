//! Bot child-process supervision.

use std::process::{Child, Command};

use anyhow::{Context, Result};

use crate::activity::ActivityLog;
use crate::client::{BotStatus, ToggleOutcome};

/// Starts, stops and polls the bot process.
#[derive(Debug)]
pub struct BotProcess {
    command: Vec<String>,
    child: Option<Child>,
}

impl BotProcess {
    pub fn new(command: Vec<String>) -> Self {
        Self {
            command,
            child: None,
        }
    }

    /// Whether the child is alive. Reaps it if it has exited on its own.
    pub fn is_running(&mut self) -> bool {
        let Some(child) = self.child.as_mut() else {
            return false;
        };
        match child.try_wait() {
            Ok(None) => true,
            Ok(Some(_)) | Err(_) => {
                self.child = None;
                false
            }
        }
    }

    pub fn status(&mut self) -> BotStatus {
        BotStatus::from_running(self.is_running())
    }

    pub fn start(&mut self) -> Result<()> {
        let (program, args) = self
            .command
            .split_first()
            .context("bot command is empty")?;
        let child = Command::new(program)
            .args(args)
            .spawn()
            .with_context(|| format!("failed to spawn {}", self.command.join(" ")))?;
        self.child = Some(child);
        Ok(())
    }

    pub fn stop(&mut self) -> Result<()> {
        let Some(mut child) = self.child.take() else {
            return Ok(());
        };
        child.kill().context("failed to kill bot process")?;
        child.wait().context("failed to reap bot process")?;
        Ok(())
    }

    /// Stop the bot if it is running, start it otherwise.
    ///
    /// `success` reports whether the attempted transition worked; `status`
    /// is read back afterwards, so a bot that exits immediately after
    /// starting reports `stopped`.
    pub fn toggle(&mut self, log: &ActivityLog) -> ToggleOutcome {
        let success = if self.is_running() {
            match self.stop() {
                Ok(()) => {
                    log.info("Bot stopped");
                    true
                }
                Err(e) => {
                    log.error(&format!("Error stopping bot: {e:#}"));
                    false
                }
            }
        } else {
            match self.start() {
                Ok(()) => {
                    log.info("Bot started");
                    true
                }
                Err(e) => {
                    log.error(&format!("Error starting bot: {e:#}"));
                    false
                }
            }
        };

        ToggleOutcome {
            success,
            status: self.status(),
        }
    }
}

impl Drop for BotProcess {
    fn drop(&mut self) {
        let _ = self.stop();
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_log(name: &str) -> ActivityLog {
        ActivityLog::new(
            std::env::temp_dir().join(format!("botdash-bot-{}-{name}.log", std::process::id())),
            "test",
        )
    }

    #[test]
    fn empty_command_fails_to_start() {
        let mut bot = BotProcess::new(Vec::new());
        assert!(bot.start().is_err());
        let outcome = bot.toggle(&temp_log("empty"));
        assert!(!outcome.success);
        assert_eq!(outcome.status, BotStatus::Stopped);
    }

    #[test]
    fn missing_program_reports_failure() {
        let mut bot = BotProcess::new(vec!["botdash-no-such-program".into()]);
        let outcome = bot.toggle(&temp_log("missing"));
        assert!(!outcome.success);
        assert_eq!(outcome.status, BotStatus::Stopped);
    }

    #[cfg(unix)]
    #[test]
    fn toggle_starts_then_stops() {
        let log = temp_log("toggle");
        let mut bot = BotProcess::new(vec!["sleep".into(), "30".into()]);

        let started = bot.toggle(&log);
        assert!(started.success);
        assert_eq!(started.status, BotStatus::Running);

        let stopped = bot.toggle(&log);
        assert!(stopped.success);
        assert_eq!(stopped.status, BotStatus::Stopped);

        let _ = std::fs::remove_file(log.path());
    }

    #[test]
    fn stop_without_child_is_ok() {
        let mut bot = BotProcess::new(vec!["true".into()]);
        assert!(bot.stop().is_ok());
        assert!(!bot.is_running());
    }
}
