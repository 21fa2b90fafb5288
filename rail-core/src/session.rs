//! Per-connection session context shared by every channel handler.
//!
//! The context is created by whoever owns the RDP connection and handed
//! to channel handlers by reference. It carries the settings the
//! RemoteApp handshake reads, the owning client's abort hook, and the
//! lock that serializes outbound writes across all channels.

use std::fmt;
use std::sync::Arc;

use parking_lot::{Mutex, MutexGuard};
use serde::{Deserialize, Serialize};

// ── SessionSettings ──────────────────────────────────────────────

/// Connection settings consumed by the RemoteApp handshake.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionSettings {
    /// Desktop width in pixels.
    pub width: u16,
    /// Desktop height in pixels.
    pub height: u16,
    /// Program (or `||alias`) to launch on the server.
    pub remote_app: String,
    /// Working directory for the program.
    pub remote_app_dir: String,
    /// Command-line arguments for the program.
    pub remote_app_args: String,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            width: 1024,
            height: 768,
            remote_app: String::new(),
            remote_app_dir: String::new(),
            remote_app_args: String::new(),
        }
    }
}

// ── AbortStatus ──────────────────────────────────────────────────

/// Status reported to the session's consumer when the session is aborted.
#[repr(u16)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AbortStatus {
    /// The client itself failed.
    ServerError = 0x0200,
    /// The remote desktop server did not respond in time.
    UpstreamTimeout = 0x0202,
    /// The remote desktop server reported an error.
    UpstreamError = 0x0203,
    /// The remote desktop server is up but cannot serve the request.
    UpstreamUnavailable = 0x0208,
}

impl fmt::Display for AbortStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AbortStatus::ServerError => write!(f, "server error"),
            AbortStatus::UpstreamTimeout => write!(f, "upstream timeout"),
            AbortStatus::UpstreamError => write!(f, "upstream error"),
            AbortStatus::UpstreamUnavailable => write!(f, "upstream unavailable"),
        }
    }
}

// ── SessionClient ────────────────────────────────────────────────

/// The client that owns the RDP connection.
///
/// Outlives every channel handler; handlers only ever hold an `Arc`.
pub trait SessionClient: Send + Sync {
    /// Terminate the session, reporting `status` and `message` to whoever
    /// consumes it.
    fn abort(&self, status: AbortStatus, message: &str);
}

// ── SessionContext ───────────────────────────────────────────────

/// Shared state for one RDP connection.
pub struct SessionContext {
    client: Arc<dyn SessionClient>,
    settings: SessionSettings,
    write_lock: Mutex<()>,
}

impl SessionContext {
    pub fn new(client: Arc<dyn SessionClient>, settings: SessionSettings) -> Self {
        Self {
            client,
            settings,
            write_lock: Mutex::new(()),
        }
    }

    pub fn settings(&self) -> &SessionSettings {
        &self.settings
    }

    /// Abort the owning client session.
    pub fn abort(&self, status: AbortStatus, message: &str) {
        self.client.abort(status, message);
    }

    /// Run `f` while holding the outbound-write lock.
    ///
    /// Every write to the shared connection, from any channel, goes
    /// through here. Hold it for one PDU send at a time. On return the
    /// lock passes straight to the longest-waiting writer, so a caller
    /// re-entering for its next send queues behind other channels.
    pub fn with_write_lock<T>(&self, f: impl FnOnce() -> T) -> T {
        let guard = self.write_lock.lock();
        let out = f();
        MutexGuard::unlock_fair(guard);
        out
    }
}

impl fmt::Debug for SessionContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionContext")
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}

// ── Tests ────────────────────────────────────────────────────────
