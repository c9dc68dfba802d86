//! WebSocket live reload channel.
//!
//! The dev server injects a small embedded client into every served HTML
//! document; the watcher broadcasts a `{"type":"reload"}` message whenever
//! a change requires the browser to discard in-memory state and reload
//! from scratch. There is deliberately no finer-grained protocol: the
//! pipeline never hot-patches a data-driven fragment in place.

use anyhow::Result;
use parking_lot::Mutex;
use serde::Serialize;
use std::{
    net::{TcpListener, TcpStream},
    sync::LazyLock,
};
use tungstenite::{Message, WebSocket};

/// Maximum port retry attempts
const MAX_PORT_RETRIES: u16 = 10;

/// Live reload client script (embedded at compile time)
const CLIENT_SCRIPT: &str = include_str!("embed/reload.js");

/// Connected dev clients.
static CLIENTS: LazyLock<Mutex<Vec<WebSocket<TcpStream>>>> =
    LazyLock::new(|| Mutex::new(Vec::new()));

// ============================================================================
// Message Protocol
// ============================================================================

/// Message sent over the reload channel.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ReloadMessage {
    /// Full page reload; the client discards all in-memory state.
    Reload {
        #[serde(skip_serializing_if = "Option::is_none")]
        reason: Option<String>,
    },

    /// Connection established.
    Connected { version: String },
}

impl ReloadMessage {
    /// Create a reload message with reason.
    pub fn reload(reason: impl Into<String>) -> Self {
        Self::Reload {
            reason: Some(reason.into()),
        }
    }

    /// Create a connected message.
    pub fn connected() -> Self {
        Self::Connected {
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }

    /// Serialize to JSON string.
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| r#"{"type":"reload"}"#.to_string())
    }
}

// ============================================================================
// Server
// ============================================================================

/// Start the reload WebSocket server.
///
/// Binds with port retry, then accepts clients on a background thread.
/// Returns the actual port bound, which the served client script must use.
pub fn start(base_port: u16) -> Result<u16> {
    let (listener, actual_port) = try_bind_port(base_port, MAX_PORT_RETRIES)?;

    std::thread::spawn(move || {
        for stream in listener.incoming() {
            match stream {
                Ok(stream) => accept_client(stream),
                Err(e) => crate::log!("reload"; "accept error: {e}"),
            }
        }
    });

    Ok(actual_port)
}

/// Perform the WebSocket handshake and register the client.
fn accept_client(stream: TcpStream) {
    match tungstenite::accept(stream) {
        Ok(mut ws) => {
            let hello = ReloadMessage::connected().to_json();
            if let Err(e) = ws.send(Message::Text(hello.into())) {
                crate::log!("reload"; "failed to greet client: {e}");
                return;
            }
            CLIENTS.lock().push(ws);
        }
        Err(e) => crate::log!("reload"; "handshake failed: {e}"),
    }
}

/// Broadcast a full-reload message to every connected client.
///
/// Clients whose send fails are dropped from the list.
pub fn broadcast(reason: &str) {
    let json = ReloadMessage::reload(reason).to_json();

    let mut clients = CLIENTS.lock();
    clients.retain_mut(|ws| ws.send(Message::Text(json.clone().into())).is_ok());
}

/// Number of currently connected clients.
pub fn client_count() -> usize {
    CLIENTS.lock().len()
}

/// Client script with the actual reload port substituted in.
pub fn client_script(port: u16) -> String {
    CLIENT_SCRIPT.replace("__RELOAD_PORT__", &port.to_string())
}

// ============================================================================
// Helpers
// ============================================================================

/// Try binding to port, retry with incremented port if in use
fn try_bind_port(base_port: u16, max_retries: u16) -> Result<(TcpListener, u16)> {
    let mut last_error = None;

    for offset in 0..max_retries {
        let port = base_port.saturating_add(offset);
        match TcpListener::bind(format!("127.0.0.1:{port}")) {
            Ok(listener) => {
                let actual_port = listener.local_addr()?.port();
                return Ok((listener, actual_port));
            }
            Err(e) => {
                last_error = Some(e);
                continue;
            }
        }
    }

    Err(anyhow::anyhow!(
        "Failed to bind reload server after {} attempts: {}",
        max_retries,
        last_error.map(|e| e.to_string()).unwrap_or_default()
    ))
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reload_message_json() {
        let json = ReloadMessage::reload("data changed").to_json();

        assert!(json.contains(r#""type":"reload""#));
        assert!(json.contains(r#""reason":"data changed""#));
    }

    #[test]
    fn test_reload_message_without_reason_omits_field() {
        let json = ReloadMessage::Reload { reason: None }.to_json();

        assert_eq!(json, r#"{"type":"reload"}"#);
    }

    #[test]
    fn test_connected_message_carries_version() {
        let json = ReloadMessage::connected().to_json();

        assert!(json.contains(r#""type":"connected""#));
        assert!(json.contains(env!("CARGO_PKG_VERSION")));
    }

    #[test]
    fn test_client_script_substitutes_port() {
        let script = client_script(40123);

        assert!(script.contains(":40123"));
        assert!(!script.contains("__RELOAD_PORT__"));
    }

    #[test]
    fn test_try_bind_port_retries_past_taken_port() {
        let taken = TcpListener::bind("127.0.0.1:0").unwrap();
        let taken_port = taken.local_addr().unwrap().port();

        let (_listener, port) = try_bind_port(taken_port, MAX_PORT_RETRIES).unwrap();
        assert_ne!(port, taken_port);
    }
}
