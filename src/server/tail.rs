//! `GET /log_stream` — tail the activity log as server-sent events.
//!
//! Each subscriber gets its own thread. The file is read from the start and
//! then polled for growth; only complete lines are sent. Bytes that are not
//! UTF-8 are replaced rather than ending the stream. While the log is idle a
//! keep-alive comment goes out now and then, so a subscriber that has gone
//! away is noticed and its thread ends.

use std::fs::File;
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use std::thread;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use tiny_http::Request;

use crate::stream::sse;

const STREAM_HEADERS: &str = "HTTP/1.1 200 OK\r\n\
Content-Type: text/event-stream\r\n\
Cache-Control: no-cache\r\n\
Connection: close\r\n\
\r\n";

/// Idle time after which a keep-alive comment is written.
pub const KEEP_ALIVE: Duration = Duration::from_secs(15);

const KEEP_ALIVE_COMMENT: &[u8] = b": keep-alive\n\n";

/// Serve `request` from a new thread.
pub fn spawn(request: Request, log_file: PathBuf, poll: Duration) {
    thread::spawn(move || {
        let mut writer = request.into_writer();
        let _ = stream_file(&mut writer, &log_file, poll, KEEP_ALIVE, || true);
    });
}

/// Write the stream headers, then every line of `path` as an event.
///
/// Keeps following the file while `keep_going` returns `true` at each idle
/// poll. A missing file is waited for rather than treated as an error.
/// After `keep_alive` without output a comment is written; a failed write
/// means the subscriber is gone and ends the stream with an error.
pub fn stream_file<W, F>(
    out: &mut W,
    path: &Path,
    poll: Duration,
    keep_alive: Duration,
    mut keep_going: F,
) -> Result<()>
where
    W: Write + ?Sized,
    F: FnMut() -> bool,
{
    out.write_all(STREAM_HEADERS.as_bytes())
        .context("failed writing stream headers")?;
    out.flush().context("failed flushing stream headers")?;
    let mut last_write = Instant::now();

    let file = loop {
        match File::open(path) {
            Ok(file) => break file,
            Err(_) if keep_going() => {
                idle(out, &mut last_write, keep_alive)?;
                thread::sleep(poll);
            }
            Err(_) => return Ok(()),
        }
    };

    let mut reader = BufReader::new(file);
    let mut pending = Vec::new();
    loop {
        let n = reader
            .read_until(b'\n', &mut pending)
            .context("failed reading log file")?;

        if n > 0 && pending.ends_with(b"\n") {
            let text = String::from_utf8_lossy(&pending);
            let line = text.trim_end_matches(['\n', '\r']);
            send(out, sse::encode_data(line).as_bytes())?;
            last_write = Instant::now();
            pending.clear();
            continue;
        }

        // At end of file, possibly holding half a line.
        if !keep_going() {
            return Ok(());
        }
        idle(out, &mut last_write, keep_alive)?;
        thread::sleep(poll);
    }
}

/// Write a keep-alive comment once the stream has been quiet long enough.
fn idle<W>(out: &mut W, last_write: &mut Instant, keep_alive: Duration) -> Result<()>
where
    W: Write + ?Sized,
{
    if last_write.elapsed() >= keep_alive {
        send(out, KEEP_ALIVE_COMMENT)?;
        *last_write = Instant::now();
    }
    Ok(())
}

fn send<W: Write + ?Sized>(out: &mut W, bytes: &[u8]) -> Result<()> {
    out.write_all(bytes).context("subscriber disconnected")?;
    out.flush().context("subscriber disconnected")
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_file(name: &str, content: impl AsRef<[u8]>) -> PathBuf {
        let path =
            std::env::temp_dir().join(format!("botdash-tail-{}-{name}.log", std::process::id()));
        std::fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn streams_complete_lines_as_events() {
        let path = temp_file("complete", "first\nsecond\npartial");
        let mut out = Vec::new();
        stream_file(&mut out, &path, Duration::from_millis(1), KEEP_ALIVE, || false).unwrap();
        let body = String::from_utf8(out).unwrap();

        assert!(body.starts_with("HTTP/1.1 200 OK\r\n"));
        assert!(body.contains("Content-Type: text/event-stream"));
        let events = body.split_once("\r\n\r\n").unwrap().1;
        assert_eq!(events, "data: first\n\ndata: second\n\n");
        let _ = std::fs::remove_file(path);
    }

    #[test]
    fn picks_up_lines_appended_while_following() {
        let path = temp_file("follow", "one\n");
        let mut out = Vec::new();
        let mut polls = 0;
        stream_file(&mut out, &path, Duration::from_millis(1), KEEP_ALIVE, || {
            polls += 1;
            if polls == 1 {
                use std::io::Write as _;
                let mut f = std::fs::OpenOptions::new().append(true).open(&path).unwrap();
                writeln!(f, "two").unwrap();
            }
            polls < 3
        })
        .unwrap();
        let body = String::from_utf8(out).unwrap();
        assert!(body.ends_with("data: one\n\ndata: two\n\n"));
        let _ = std::fs::remove_file(path);
    }

    #[test]
    fn missing_file_ends_quietly_when_stopped() {
        let path = std::env::temp_dir().join("botdash-tail-definitely-missing.log");
        let mut out = Vec::new();
        stream_file(&mut out, &path, Duration::from_millis(1), KEEP_ALIVE, || false).unwrap();
        assert!(String::from_utf8(out).unwrap().ends_with("\r\n\r\n"));
    }

    #[test]
    fn invalid_utf8_is_replaced_and_later_lines_still_sent() {
        let path = temp_file("latin1", b"before\ncaf\xe9 latin1\nafter\n");
        let mut out = Vec::new();
        stream_file(&mut out, &path, Duration::from_millis(1), KEEP_ALIVE, || false).unwrap();
        let body = String::from_utf8(out).unwrap();
        let events = body.split_once("\r\n\r\n").unwrap().1;
        assert_eq!(
            events,
            "data: before\n\ndata: caf\u{fffd} latin1\n\ndata: after\n\n"
        );
        let _ = std::fs::remove_file(path);
    }

    /// Accepts the stream headers, then fails like a closed socket.
    struct HungUp {
        writes: usize,
    }

    impl Write for HungUp {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.writes += 1;
            if self.writes == 1 {
                Ok(buf.len())
            } else {
                Err(std::io::ErrorKind::BrokenPipe.into())
            }
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn idle_stream_ends_once_subscriber_is_gone() {
        let path = temp_file("idle", "");
        let mut out = HungUp { writes: 0 };
        let result =
            stream_file(&mut out, &path, Duration::from_millis(1), Duration::ZERO, || true);
        assert!(result.is_err());
        let _ = std::fs::remove_file(path);
    }

    #[test]
    fn waiting_for_missing_file_ends_once_subscriber_is_gone() {
        let path = std::env::temp_dir().join("botdash-tail-never-created.log");
        let mut out = HungUp { writes: 0 };
        let result =
            stream_file(&mut out, &path, Duration::from_millis(1), Duration::ZERO, || true);
        assert!(result.is_err());
    }

    #[test]
    fn idle_stream_sends_keep_alive_comments() {
        let path = temp_file("keepalive", "");
        let mut out = Vec::new();
        let mut polls = 0;
        stream_file(&mut out, &path, Duration::from_millis(1), Duration::ZERO, || {
            polls += 1;
            polls < 2
        })
        .unwrap();
        let body = String::from_utf8(out).unwrap();
        assert!(body.ends_with(": keep-alive\n\n"));
        let _ = std::fs::remove_file(path);
    }
}
