//! Lifecycle of a RemoteApp channel.
//!
//! ```text
//!  Disconnected ──► ChannelConnected ──► AwaitingHandshake ──► HandshakeInFlight ──► Running
//!                                                                   ▲                 │
//!                                                                   └── re-handshake ─┘
//!  any ──► Terminated(Failed)        Running ──► Terminated(Closed)
//! ```

use std::fmt;
use std::time::Instant;

use crate::error::RailError;

/// Why a channel stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Termination {
    /// A send failed or the server refused to launch the program.
    Failed,
    /// The connection was torn down.
    Closed,
}

/// Current phase of the RemoteApp channel.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum RailPhase {
    #[default]
    Disconnected,

    /// The transport announced the `rail` channel.
    ChannelConnected,

    /// Callbacks are installed; nothing may be sent until the server
    /// handshake arrives.
    AwaitingHandshake,

    /// Handshake, client status, system parameters and execute are being sent.
    HandshakeInFlight,

    /// The execute request went out.
    Running {
        since: Instant,
    },

    Terminated(Termination),
}

impl fmt::Display for RailPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Disconnected => write!(f, "Disconnected"),
            Self::ChannelConnected => write!(f, "ChannelConnected"),
            Self::AwaitingHandshake => write!(f, "AwaitingHandshake"),
            Self::HandshakeInFlight => write!(f, "HandshakeInFlight"),
            Self::Running { .. } => write!(f, "Running"),
            Self::Terminated(Termination::Failed) => write!(f, "Terminated(Failed)"),
            Self::Terminated(Termination::Closed) => write!(f, "Terminated(Closed)"),
        }
    }
}

impl RailPhase {
    pub fn is_running(&self) -> bool {
        matches!(self, Self::Running { .. })
    }

    pub fn is_terminated(&self) -> bool {
        matches!(self, Self::Terminated(_))
    }

    // ── Transitions ──────────────────────────────────────────────

    /// Valid from: `Disconnected`.
    pub fn connect(&mut self) -> Result<(), RailError> {
        match self {
            Self::Disconnected => {
                *self = Self::ChannelConnected;
                Ok(())
            }
            _ => Err(RailError::ProtocolViolation(
                "cannot connect: channel not in Disconnected state",
            )),
        }
    }

    /// Valid from: `ChannelConnected`.
    pub fn await_handshake(&mut self) -> Result<(), RailError> {
        match self {
            Self::ChannelConnected => {
                *self = Self::AwaitingHandshake;
                Ok(())
            }
            _ => Err(RailError::ProtocolViolation(
                "cannot await handshake: channel not in ChannelConnected state",
            )),
        }
    }

    /// Valid from: `AwaitingHandshake`, `Running` (server re-sent its handshake).
    pub fn begin_handshake(&mut self) -> Result<(), RailError> {
        match self {
            Self::AwaitingHandshake | Self::Running { .. } => {
                *self = Self::HandshakeInFlight;
                Ok(())
            }
            _ => Err(RailError::ProtocolViolation(
                "cannot handshake: channel not awaiting a handshake",
            )),
        }
    }

    /// Valid from: `HandshakeInFlight`.
    pub fn complete_handshake(&mut self) -> Result<(), RailError> {
        match self {
            Self::HandshakeInFlight => {
                *self = Self::Running {
                    since: Instant::now(),
                };
                Ok(())
            }
            _ => Err(RailError::ProtocolViolation(
                "cannot complete handshake: no handshake in flight",
            )),
        }
    }

    /// Force `Terminated(Failed)` from any state.
    pub fn fail(&mut self) {
        *self = Self::Terminated(Termination::Failed);
    }

    /// Mark the channel closed. A failure already recorded is kept.
    pub fn close(&mut self) {
        if !matches!(self, Self::Terminated(Termination::Failed)) {
            *self = Self::Terminated(Termination::Closed);
        }
    }
}
