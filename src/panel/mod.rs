//! Bounded log panel — the live, auto-following list of log lines.
//!
//! A [`LogPanel`] holds at most [`CAPACITY`] entries in arrival order. It is
//! mutated through a single entry point, [`LogPanel::push`], which appends
//! the new line, scrolls to the bottom, and evicts the oldest lines until the
//! capacity holds again. Nothing else touches the entry list, so the panel
//! needs no locking: the stream consumer is its only writer.

use std::collections::VecDeque;

/// Maximum number of entries the panel retains.
pub const CAPACITY: usize = 100;

// ---------------------------------------------------------------------------
// Log entry
// ---------------------------------------------------------------------------

/// One line of log text, kept exactly as received.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogEntry {
    text: String,
}

impl LogEntry {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }

    /// The text as received.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// The text made safe to write to a terminal.
    ///
    /// Control characters (other than tab) are written as escapes so that a
    /// log line can never move the cursor, clear the screen, or inject colour
    /// codes. Printable text, markup included, is left alone.
    pub fn display_text(&self) -> String {
        escape_controls(&self.text)
    }
}

/// Replace control characters other than tab with their escaped form, so
/// text from the network cannot drive the terminal.
pub fn escape_controls(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        if c.is_control() && c != '\t' {
            out.extend(c.escape_default());
        } else {
            out.push(c);
        }
    }
    out
}

// ---------------------------------------------------------------------------
// Panel state
// ---------------------------------------------------------------------------

/// Capped, chronologically ordered log lines with a scroll position.
///
/// The scroll position is the index of the first visible entry. Its maximum
/// is `len - viewport` (or zero when everything fits), and every push leaves
/// it there.
#[derive(Debug, Clone)]
pub struct LogPanel {
    entries: VecDeque<LogEntry>,
    viewport: usize,
    scroll_top: usize,
}

impl LogPanel {
    /// An empty panel showing `viewport` lines at a time.
    pub fn new(viewport: usize) -> Self {
        Self {
            entries: VecDeque::with_capacity(CAPACITY + 1),
            viewport: viewport.max(1),
            scroll_top: 0,
        }
    }

    /// Apply one stream event.
    ///
    /// Appends `text` at the tail, moves the scroll position to its maximum
    /// whether or not it was already there, then removes the oldest entries
    /// one at a time while the panel is over capacity. Returns the number of
    /// entries evicted.
    pub fn push(&mut self, text: impl Into<String>) -> usize {
        self.entries.push_back(LogEntry::new(text));
        self.scroll_to_bottom();

        let mut evicted = 0;
        while self.entries.len() > CAPACITY {
            self.entries.pop_front();
            evicted += 1;
        }

        // Removing rows shrinks the scroll range; stay pinned to the bottom.
        self.scroll_top = self.scroll_top.min(self.max_scroll());
        evicted
    }

    fn scroll_to_bottom(&mut self) {
        self.scroll_top = self.max_scroll();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn viewport(&self) -> usize {
        self.viewport
    }

    /// Current scroll position (index of the first visible entry).
    pub fn scroll_top(&self) -> usize {
        self.scroll_top
    }

    /// Largest valid scroll position.
    pub fn max_scroll(&self) -> usize {
        self.entries.len().saturating_sub(self.viewport)
    }

    /// All retained entries, oldest first.
    pub fn entries(&self) -> impl Iterator<Item = &LogEntry> {
        self.entries.iter()
    }

    /// Retained texts, oldest first.
    pub fn texts(&self) -> Vec<&str> {
        self.entries.iter().map(LogEntry::text).collect()
    }

    /// The entries inside the viewport at the current scroll position.
    pub fn visible(&self) -> impl Iterator<Item = &LogEntry> {
        self.entries.iter().skip(self.scroll_top).take(self.viewport)
    }
}

impl Default for LogPanel {
    fn default() -> Self {
        Self::new(20)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
