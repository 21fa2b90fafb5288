//! Domain-specific error types for the RAIL channel.
//!
//! All fallible operations return `Result<T, RailError>`.
//! Malformed peer input never panics; every failure is typed.

use thiserror::Error;

use crate::pdu::OrderType;

/// The canonical error type for RemoteApp channel handling.
#[derive(Debug, Error)]
pub enum RailError {
    // ── Wire Errors ──────────────────────────────────────────────
    /// The buffer ended before a complete field could be read.
    #[error("truncated {what}: need {needed} bytes, have {available}")]
    Truncated {
        what: &'static str,
        needed: usize,
        available: usize,
    },

    /// The order header announced a length outside the valid range.
    #[error("invalid order length: {0}")]
    InvalidOrderLength(usize),

    /// A string field does not fit in its wire-level limit.
    #[error("{field} too long: {size} bytes (max {max})")]
    FieldTooLong {
        field: &'static str,
        size: usize,
        max: usize,
    },

    /// A UTF-16 string received from the peer could not be decoded.
    #[error("invalid utf-16 in {0}")]
    InvalidUtf16(&'static str),

    // ── Channel Errors ───────────────────────────────────────────
    /// A send primitive reported a non-success channel status.
    #[error("{order} send failed with channel status {code:#x}")]
    Transport { order: OrderType, code: u32 },

    /// The underlying byte stream reported an error.
    #[error("connection error: {0}")]
    Connection(#[from] std::io::Error),

    /// No channel with the given name is connected.
    #[error("unknown channel: {0}")]
    UnknownChannel(String),

    /// A phase transition was attempted from the wrong state.
    #[error("protocol violation: {0}")]
    ProtocolViolation(&'static str),

    // ── Plugin Errors ────────────────────────────────────────────
    /// The host could not load support for the named channel.
    #[error("plugin {0} could not be loaded")]
    PluginLoad(String),
}

impl RailError {
    /// Channel status code to hand back to the transport.
    ///
    /// `Transport` errors carry the code the send primitive reported;
    /// everything else maps to the generic `ERROR_INTERNAL_ERROR` value.
    pub fn channel_status(&self) -> u32 {
        match self {
            Self::Transport { code, .. } => *code,
            _ => ERROR_INTERNAL_ERROR,
        }
    }
}

/// Win32 `ERROR_INTERNAL_ERROR`, used by channel plugins as a generic failure.
pub const ERROR_INTERNAL_ERROR: u32 = 0x54F;
