//! # rail-core
//!
//! RemoteApp (RAIL, MS-RDPERP) channel support for an RDP client session.
//!
//! This crate contains:
//! - **PDUs**: RAIL order records and their little-endian wire encoding
//! - **Codec**: `RailCodec` for framed stream I/O via `tokio_util`
//! - **Session**: `SessionContext`, the per-connection settings and write lock
//! - **Channel**: `ChannelContext`, `ChannelManager` and the transport/event traits
//! - **RemoteApp**: plugin entry point, handshake sequencer, execute-result handling
//! - **Transport**: `StreamTransport` for running the channel over a byte stream
//! - **Error**: `RailError`, a typed `thiserror` error hierarchy

pub mod channel;
pub mod codec;
pub mod error;
pub mod pdu;
pub mod remote_app;
pub mod session;
pub mod transport;

#[cfg(test)]
mod testing;

// ── Re-exports for ergonomic usage ───────────────────────────────

pub use channel::{
    ChannelConnectedEvent, ChannelConnectedHandler, ChannelContext, ChannelHost, ChannelManager,
    RAIL_CHANNEL_NAME, RailEvents, RailPhase, RailTransport, Termination,
};
pub use codec::RailCodec;
pub use error::RailError;
pub use pdu::{OrderType, ServerOrder};
pub use remote_app::{RemoteAppHandler, complete_handshake, load_plugin, on_execute_result};
pub use session::{AbortStatus, SessionClient, SessionContext, SessionSettings};
pub use transport::{StreamTransport, drive};
