//! RemoteApp (MS-RDPERP) orders and their wire encoding.
//!
//! Every order on the `rail` static virtual channel starts with the same
//! four-byte header:
//!
//! ```text
//! ┌──────────────┬───────────────┬──────────────────────────┐
//! │ orderType u16│ orderLength u16│ body (orderLength - 4)  │
//! └──────────────┴───────────────┴──────────────────────────┘
//! ```
//!
//! All integers are little-endian. Strings are UTF-16LE.

use std::fmt;

pub mod orders;
pub mod wire;

pub use orders::{
    CLIENT_BUILD_NUMBER, ClientStatusFlags, ClientStatusOrder, ExecFlags, ExecOrder, ExecResult,
    ExecResultOrder, HandshakeExFlags, HandshakeExOrder, HandshakeOrder, HighContrast,
    HighContrastFlags, Rect16, ServerOrder, SysParamMask, SysParamOrder,
};

/// Size of the order header that precedes every RAIL PDU.
pub const ORDER_HEADER_SIZE: usize = 4;

/// Largest order length representable in the 16-bit header field.
pub const MAX_ORDER_LENGTH: usize = u16::MAX as usize;

// ── OrderType ────────────────────────────────────────────────────

/// RAIL order types this channel sends or understands.
#[repr(u16)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OrderType {
    /// Client Execute PDU.
    Exec = 0x0001,
    /// Client System Parameters Update PDU.
    SysParam = 0x0003,
    /// Handshake PDU (sent by both sides).
    Handshake = 0x0005,
    /// Client Information PDU.
    ClientStatus = 0x000B,
    /// Server HandshakeEx PDU.
    HandshakeEx = 0x0013,
    /// Server Execute Result PDU.
    ExecResult = 0x0080,
}

impl OrderType {
    /// Map a wire value to a known order type.
    pub fn from_wire(value: u16) -> Option<Self> {
        match value {
            0x0001 => Some(Self::Exec),
            0x0003 => Some(Self::SysParam),
            0x0005 => Some(Self::Handshake),
            0x000B => Some(Self::ClientStatus),
            0x0013 => Some(Self::HandshakeEx),
            0x0080 => Some(Self::ExecResult),
            _ => None,
        }
    }
}

impl fmt::Display for OrderType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OrderType::Exec => write!(f, "Exec"),
            OrderType::SysParam => write!(f, "SysParam"),
            OrderType::Handshake => write!(f, "Handshake"),
            OrderType::ClientStatus => write!(f, "ClientStatus"),
            OrderType::HandshakeEx => write!(f, "HandshakeEx"),
            OrderType::ExecResult => write!(f, "ExecResult"),
        }
    }
}
