//! `text/event-stream` decoding.
//!
//! Reads server-sent events from any [`BufRead`]. Follows the event-stream
//! field rules closely enough for log streaming: `data:` lines accumulate,
//! a blank line dispatches, `:` lines are comments, and an event still open
//! at end of stream is discarded. Bytes that are not UTF-8 are replaced
//! with U+FFFD, so one bad payload never ends the stream.

use std::io::BufRead;

use anyhow::{Context, Result};

/// Event type used when the stream does not name one.
pub const DEFAULT_EVENT: &str = "message";

/// One dispatched server-sent event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SseEvent {
    pub event: String,
    pub data: String,
}

impl SseEvent {
    /// Whether this is a plain `message` event.
    pub fn is_message(&self) -> bool {
        self.event == DEFAULT_EVENT
    }
}

/// Iterator of [`SseEvent`]s decoded from a byte stream.
pub struct SseDecoder<R> {
    reader: R,
    line: Vec<u8>,
    data: String,
    event: String,
}

impl<R: BufRead> SseDecoder<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            line: Vec::new(),
            data: String::new(),
            event: String::new(),
        }
    }

    /// Read the next event. `Ok(None)` means the stream ended.
    pub fn next_event(&mut self) -> Result<Option<SseEvent>> {
        loop {
            self.line.clear();
            let n = self
                .reader
                .read_until(b'\n', &mut self.line)
                .context("failed reading event stream")?;
            if n == 0 {
                return Ok(None);
            }

            let text = String::from_utf8_lossy(&self.line).into_owned();
            let line = text.trim_end_matches(['\n', '\r']);
            if line.is_empty() {
                if let Some(event) = self.dispatch() {
                    return Ok(Some(event));
                }
                continue;
            }

            if line.starts_with(':') {
                continue;
            }

            let (field, value) = match line.split_once(':') {
                Some((field, value)) => (field, value.strip_prefix(' ').unwrap_or(value)),
                None => (line, ""),
            };

            match field {
                "data" => {
                    self.data.push_str(value);
                    self.data.push('\n');
                }
                "event" => self.event = value.to_string(),
                // `id` and `retry` only matter for reconnection, which the
                // log stream does not do.
                _ => {}
            }
        }
    }

    fn dispatch(&mut self) -> Option<SseEvent> {
        let event = std::mem::take(&mut self.event);
        if self.data.is_empty() {
            return None;
        }
        let mut data = std::mem::take(&mut self.data);
        data.pop();
        Some(SseEvent {
            event: if event.is_empty() {
                DEFAULT_EVENT.to_string()
            } else {
                event
            },
            data,
        })
    }
}

impl<R: BufRead> Iterator for SseDecoder<R> {
    type Item = Result<SseEvent>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_event().transpose()
    }
}

/// Encode one line of text as a `message` event.
///
/// Embedded line breaks become separate `data:` lines so the receiver
/// reassembles the original text.
pub fn encode_data(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 8);
    for part in text.split('\n') {
        out.push_str("data: ");
        out.push_str(part.strip_suffix('\r').unwrap_or(part));
        out.push('\n');
    }
    out.push('\n');
    out
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn decode(input: &str) -> Vec<SseEvent> {
        SseDecoder::new(input.as_bytes())
            .collect::<Result<Vec<_>>>()
            .unwrap()
    }

    #[test]
    fn decodes_single_data_events() {
        let events = decode("data: line1\n\ndata: line2\n\n");
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].data, "line1");
        assert_eq!(events[1].data, "line2");
        assert!(events.iter().all(SseEvent::is_message));
    }

    #[test]
    fn joins_multiple_data_lines() {
        let events = decode("data: first\ndata: second\n\n");
        assert_eq!(events[0].data, "first\nsecond");
    }

    #[test]
    fn accepts_crlf_line_endings() {
        let events = decode("data: windows\r\n\r\n");
        assert_eq!(events[0].data, "windows");
    }

    #[test]
    fn strips_only_one_leading_space() {
        let events = decode("data:  indented\n\ndata:tight\n\n");
        assert_eq!(events[0].data, " indented");
        assert_eq!(events[1].data, "tight");
    }

    #[test]
    fn skips_comments_and_unknown_fields() {
        let events = decode(": keep-alive\nid: 7\nretry: 3000\ndata: payload\n\n");
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].data, "payload");
    }

    #[test]
    fn blank_lines_without_data_dispatch_nothing() {
        let events = decode("\n\n\ndata: a\n\n\n");
        assert_eq!(events.len(), 1);
    }

    #[test]
    fn empty_data_field_dispatches_empty_text() {
        let events = decode("data:\n\n");
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].data, "");
    }

    #[test]
    fn named_events_are_not_messages() {
        let events = decode("event: heartbeat\ndata: ping\n\ndata: real\n\n");
        assert_eq!(events[0].event, "heartbeat");
        assert!(!events[0].is_message());
        assert!(events[1].is_message());
    }

    #[test]
    fn unterminated_event_is_dropped_at_eof() {
        let events = decode("data: complete\n\ndata: partial\n");
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].data, "complete");
    }

    #[test]
    fn payload_is_literal_text() {
        let events = decode("data: <script>alert(1)</script> {not json\n\n");
        assert_eq!(events[0].data, "<script>alert(1)</script> {not json");
    }

    #[test]
    fn encode_data_splits_line_breaks() {
        assert_eq!(encode_data("hello"), "data: hello\n\n");
        assert_eq!(encode_data("a\r\nb"), "data: a\ndata: b\n\n");
        let events = decode(&encode_data("x\ny"));
        assert_eq!(events[0].data, "x\ny");
    }

    #[test]
    fn invalid_utf8_payload_is_replaced_not_fatal() {
        let body: &[u8] = b"data: one\n\ndata: caf\xe9\n\ndata: three\n\n";
        let events: Vec<SseEvent> = SseDecoder::new(body).map(|e| e.unwrap()).collect();
        let data: Vec<&str> = events.iter().map(|e| e.data.as_str()).collect();
        assert_eq!(data, ["one", "caf\u{fffd}", "three"]);
    }
}
