//! Live log subscription.
//!
//! A [`LogSource`] turns the server's log stream into a single-consumer
//! channel of text lines. [`initialize`] opens that subscription only when
//! the view actually has a log region, and [`Subscription`] hands lines to
//! the consumer one at a time, in arrival order.

pub mod sse;

use std::io::{BufRead, Read};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::thread;
use std::time::Duration;

use anyhow::Result;

use crate::view::View;

use self::sse::SseDecoder;

// ---------------------------------------------------------------------------
// Source seam
// ---------------------------------------------------------------------------

/// Something that can open the log stream.
pub trait LogSource {
    /// Open one long-lived subscription. Lines arrive on the returned
    /// channel; the channel closes when the stream ends or fails.
    fn subscribe(&self) -> Result<Receiver<String>>;
}

/// Decode `message` events from `reader` and forward their payloads.
///
/// Returns when the stream ends, a read fails, or the receiver is gone.
/// Failures are not reported: the consumer just stops receiving lines.
pub fn forward_events<R: BufRead>(reader: R, tx: &Sender<String>) {
    for event in SseDecoder::new(reader) {
        let Ok(event) = event else {
            break;
        };
        if event.is_message() && tx.send(event.data).is_err() {
            break;
        }
    }
}

/// Spawn a reader thread that decodes `body` into a line channel.
pub fn spawn_reader<R: Read + Send + 'static>(body: R) -> Receiver<String> {
    let (tx, rx) = mpsc::channel();
    thread::spawn(move || {
        forward_events(std::io::BufReader::new(body), &tx);
    });
    rx
}

// ---------------------------------------------------------------------------
// Subscription
// ---------------------------------------------------------------------------

/// The consuming end of a log stream.
#[derive(Debug)]
pub struct Subscription {
    rx: Receiver<String>,
}

impl Subscription {
    pub fn new(rx: Receiver<String>) -> Self {
        Self { rx }
    }

    /// Block for the next line. `None` once the stream has ended.
    pub fn recv(&self) -> Option<String> {
        self.rx.recv().ok()
    }

    /// Wait up to `timeout` for the next line.
    pub fn recv_timeout(&self, timeout: Duration) -> Result<String, RecvTimeoutError> {
        self.rx.recv_timeout(timeout)
    }

    /// Apply every line to the view's log panel until the stream ends.
    ///
    /// Each line is pushed and rendered before the next is taken, so events
    /// are handled strictly one after another. Returns the number of lines
    /// applied.
    pub fn drive<W: std::io::Write>(&self, view: &mut View<W>) -> Result<usize> {
        let mut applied = 0;
        while let Some(line) = self.recv() {
            view.push_log(line);
            view.render()?;
            applied += 1;
        }
        Ok(applied)
    }
}

/// Open the log stream for `view`, if it has a log region.
///
/// Without a log region this does nothing and returns `Ok(None)`: no
/// subscription is opened and the view is left untouched.
pub fn initialize<W, S>(view: &View<W>, source: &S) -> Result<Option<Subscription>>
where
    W: std::io::Write,
    S: LogSource + ?Sized,
{
    if !view.has_log_region() {
        return Ok(None);
    }
    let rx = source.subscribe()?;
    Ok(Some(Subscription::new(rx)))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
