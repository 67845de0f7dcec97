//! JSON API handlers for the dashboard server.
//!
//! Each handler corresponds to an endpoint and returns a
//! `Response<Cursor<Vec<u8>>>` with JSON content.

use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader, Cursor};
use std::path::Path;

use anyhow::{Context, Result};
use regex::Regex;
use serde::Serialize;
use tiny_http::{Response, StatusCode};

use crate::client::{CommandStats, SaveOutcome, StatusReport};
use crate::settings::BotSettings;

use super::{ServerState, content_type_json};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Build a JSON success response.
fn json_response<T: Serialize>(data: &T) -> Result<Response<Cursor<Vec<u8>>>> {
    let body = serde_json::to_string(data).context("failed to serialize JSON response")?;
    Ok(Response::from_data(body.into_bytes())
        .with_header(content_type_json())
        .with_status_code(StatusCode(200)))
}

/// Decode an `application/x-www-form-urlencoded` body into ordered pairs.
///
/// `+` is a space and `%XX` a byte; malformed escapes are kept literally and
/// invalid UTF-8 is replaced.
pub fn parse_form(body: &str) -> Vec<(String, String)> {
    body.split('&')
        .filter(|pair| !pair.is_empty())
        .map(|pair| {
            let (k, v) = pair.split_once('=').unwrap_or((pair, ""));
            (percent_decode(k), percent_decode(v))
        })
        .collect()
}

fn percent_decode(s: &str) -> String {
    let bytes = s.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'+' => out.push(b' '),
            b'%' => match bytes.get(i + 1..i + 3).and_then(|h| hex_pair(h[0], h[1])) {
                Some(b) => {
                    out.push(b);
                    i += 2;
                }
                None => out.push(b'%'),
            },
            b => out.push(b),
        }
        i += 1;
    }
    String::from_utf8_lossy(&out).into_owned()
}

fn hex_pair(hi: u8, lo: u8) -> Option<u8> {
    let hi = (hi as char).to_digit(16)?;
    let lo = (lo as char).to_digit(16)?;
    Some((hi * 16 + lo) as u8)
}

/// Count command mentions in `lines`.
///
/// Tracked commands come first in their configured order, with zero counts
/// when unseen. Other commands follow in first-seen order. Matching against
/// tracked names ignores case.
pub fn tally_commands<I, S>(lines: I, pattern: &Regex, tracked: &[String]) -> CommandStats
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut labels: Vec<String> = tracked.to_vec();
    let mut counts: Vec<u64> = vec![0; labels.len()];
    let mut index: HashMap<String, usize> = labels
        .iter()
        .enumerate()
        .map(|(i, l)| (l.to_ascii_lowercase(), i))
        .collect();

    for line in lines {
        for caps in pattern.captures_iter(line.as_ref()) {
            let Some(name) = caps.get(1) else {
                continue;
            };
            let key = name.as_str().to_ascii_lowercase();
            let slot = *index.entry(key).or_insert_with(|| {
                labels.push(name.as_str().to_string());
                counts.push(0);
                labels.len() - 1
            });
            counts[slot] += 1;
        }
    }

    CommandStats {
        labels,
        values: counts.into_iter().map(|c| c as f64).collect(),
    }
}

fn read_log_lines(path: &Path) -> Vec<String> {
    let Ok(file) = File::open(path) else {
        return Vec::new();
    };
    BufReader::new(file)
        .split(b'\n')
        .map_while(Result::ok)
        .map(|line| String::from_utf8_lossy(&line).trim_end_matches('\r').to_string())
        .collect()
}

// ---------------------------------------------------------------------------
// API Handlers
// ---------------------------------------------------------------------------

/// `GET /status` — whether the bot is running.
pub fn get_status(state: &mut ServerState) -> Result<Response<Cursor<Vec<u8>>>> {
    json_response(&StatusReport::new(state.bot.status()))
}

/// `POST /toggle_bot` — start or stop the bot.
pub fn post_toggle_bot(state: &mut ServerState) -> Result<Response<Cursor<Vec<u8>>>> {
    let outcome = state.bot.toggle(&state.log);
    json_response(&outcome)
}

/// `GET /command_stats` — command usage tallied from the activity log.
pub fn get_command_stats(state: &ServerState) -> Result<Response<Cursor<Vec<u8>>>> {
    let lines = read_log_lines(state.log.path());
    let stats = tally_commands(&lines, &state.command_pattern, &state.tracked_commands);
    json_response(&stats)
}

/// `GET /config` — the saved bot credentials, or empty ones if none were
/// saved yet.
pub fn get_config(state: &ServerState) -> Result<Response<Cursor<Vec<u8>>>> {
    let settings = if state.settings_file.exists() {
        BotSettings::load(&state.settings_file)?
    } else {
        BotSettings::default()
    };
    json_response(&settings)
}

/// `POST /save_config` — persist bot credentials from a form body.
///
/// Failures are reported in the body (`success: false`) rather than as an
/// HTTP error, so the form can always show a result.
pub fn post_save_config(state: &ServerState, body: &str) -> Result<Response<Cursor<Vec<u8>>>> {
    let outcome = match BotSettings::from_form(&parse_form(body)) {
        Ok(settings) => match settings.save(&state.settings_file) {
            Ok(()) => {
                state.log.info("Configuration saved");
                SaveOutcome {
                    success: true,
                    error: None,
                }
            }
            Err(e) => {
                state.log.error(&format!("Error saving config: {e:#}"));
                SaveOutcome {
                    success: false,
                    error: Some(format!("{e:#}")),
                }
            }
        },
        Err(e) => {
            state.log.warning(&format!("Rejected config form: {e:#}"));
            SaveOutcome {
                success: false,
                error: Some(e.to_string()),
            }
        }
    };
    json_response(&outcome)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
