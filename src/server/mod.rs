//! Bot-management HTTP server.
//!
//! Provides a lightweight HTTP server (sync, via `tiny_http`) that serves
//! the endpoints the dashboard consumes:
//! - bot status and start/stop toggling
//! - command usage stats tallied from the activity log
//! - bot credential storage from a form submission, and reading it back
//! - the activity log as a live server-sent-event stream
//!
//! Launched via `botdash serve` (default: `http://127.0.0.1:5000`).

pub mod api;
pub mod bot;
pub mod tail;

use std::io::{Cursor, Read};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use regex::Regex;
use tiny_http::{Header, Method, Request, Response, Server, StatusCode};

use crate::activity::ActivityLog;
use crate::config::schema::ServerConfig;

use self::bot::BotProcess;

/// Target column used in activity log lines written by the server.
const LOG_TARGET: &str = "botdash.server";

// ---------------------------------------------------------------------------
// Server state
// ---------------------------------------------------------------------------

/// Everything the handlers share. Only the request loop touches it.
pub struct ServerState {
    pub bot: BotProcess,
    pub log: ActivityLog,
    pub settings_file: PathBuf,
    pub poll_interval: Duration,
    pub command_pattern: Regex,
    pub tracked_commands: Vec<String>,
}

impl ServerState {
    pub fn from_config(config: &ServerConfig) -> Result<Self> {
        let command_pattern = Regex::new(&config.command_pattern)
            .with_context(|| format!("invalid command_pattern: {}", config.command_pattern))?;
        if command_pattern.captures_len() < 2 {
            anyhow::bail!("command_pattern must have a capture group naming the command");
        }

        Ok(Self {
            bot: BotProcess::new(config.bot_command.clone()),
            log: ActivityLog::new(&config.log_file, LOG_TARGET),
            settings_file: PathBuf::from(&config.settings_file),
            poll_interval: Duration::from_millis(config.poll_interval_ms.max(1)),
            command_pattern,
            tracked_commands: config.tracked_commands.clone(),
        })
    }
}

// ---------------------------------------------------------------------------
// Server entry point
// ---------------------------------------------------------------------------

/// A bound server, ready to run.
pub struct DashboardServer {
    server: Server,
    state: ServerState,
}

impl DashboardServer {
    /// Bind the listen address from `config`.
    pub fn bind(config: &ServerConfig) -> Result<Self> {
        let state = ServerState::from_config(config)?;
        let server = Server::http(&config.addr).map_err(|e| {
            anyhow::anyhow!("failed to start HTTP server on {}: {e}", config.addr)
        })?;
        Ok(Self { server, state })
    }

    /// The bound TCP address (useful when binding port 0).
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.server.server_addr().to_ip()
    }

    /// Serve requests until the listener closes.
    ///
    /// Blocks the current thread. Requests are handled sequentially except
    /// for log streams, which each get their own thread. A failing handler
    /// answers 500 without stopping the server.
    pub fn run(mut self) -> Result<()> {
        for request in self.server.incoming_requests() {
            handle(&mut self.state, request);
        }
        Ok(())
    }
}

/// Bind and run a server from `config`, printing where it listens.
pub fn serve(config: &ServerConfig) -> Result<()> {
    let server = DashboardServer::bind(config)?;
    println!("botdash server running at http://{}", config.addr);
    println!("Press Ctrl+C to stop.\n");
    server.run()
}

fn handle(state: &mut ServerState, mut request: Request) {
    let method = request.method().clone();
    let url = request.url().to_string();
    let path = url.split('?').next().unwrap_or(&url).to_string();

    access_log(&method, &url);

    if method == Method::Get && path == "/log_stream" {
        tail::spawn(request, state.log.path().to_path_buf(), state.poll_interval);
        return;
    }

    let body = if matches!(method, Method::Put | Method::Post | Method::Patch) {
        let mut buf = Vec::new();
        if let Err(e) = request.as_reader().read_to_end(&mut buf) {
            let resp = error_response(400, &format!("failed reading request body: {e}"));
            let _ = request.respond(resp);
            return;
        }
        Some(String::from_utf8_lossy(&buf).into_owned())
    } else {
        None
    };

    let resp = dispatch(state, &method, &path, body.as_deref())
        .unwrap_or_else(|e| error_response(500, &format!("{e:#}")));
    let _ = request.respond(resp);
}

/// Brief access log line.
fn access_log(method: &Method, url: &str) {
    println!(
        "{} {} {}",
        method,
        url,
        chrono::Local::now().format("%H:%M:%S")
    );
}

// ---------------------------------------------------------------------------
// Router
// ---------------------------------------------------------------------------

/// Dispatch a request to the matching handler.
fn dispatch(
    state: &mut ServerState,
    method: &Method,
    path: &str,
    body: Option<&str>,
) -> Result<Response<Cursor<Vec<u8>>>> {
    match (method, path) {
        (&Method::Get, "/status") => api::get_status(state),
        (&Method::Post, "/toggle_bot") => api::post_toggle_bot(state),
        (&Method::Get, "/command_stats") => api::get_command_stats(state),
        (&Method::Get, "/config") => api::get_config(state),
        (&Method::Post, "/save_config") => api::post_save_config(state, body.unwrap_or("")),
        _ => Ok(not_found()),
    }
}

// ---------------------------------------------------------------------------
// Response helpers
// ---------------------------------------------------------------------------

/// JSON `{"error": ...}` with the given status.
fn error_response(status: u16, message: &str) -> Response<Cursor<Vec<u8>>> {
    let body = serde_json::json!({ "error": message }).to_string();
    Response::from_data(body.into_bytes())
        .with_header(content_type_json())
        .with_status_code(StatusCode(status))
}

/// 404 response.
fn not_found() -> Response<Cursor<Vec<u8>>> {
    let body = r#"{"error": "not found"}"#;
    Response::from_data(body.as_bytes().to_vec())
        .with_header(content_type_json())
        .with_status_code(StatusCode(404))
}

/// JSON content type header.
pub(crate) fn content_type_json() -> Header {
    Header::from_bytes("Content-Type", "application/json; charset=utf-8")
        .expect("static header is valid")
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
