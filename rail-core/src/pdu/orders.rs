//! Order records exchanged on the RAIL channel.
//!
//! Client records are built fresh for every send and never mutated
//! afterwards. Server records are produced by [`wire`](super::wire).

use bitflags::bitflags;
use bytes::Bytes;

/// Build number advertised in the client Handshake PDU.
///
/// 7600 is Windows 7 / RDP 7.0 compatibility, the same value other
/// RemoteApp clients send.
pub const CLIENT_BUILD_NUMBER: u32 = 7600;

// ── Flag sets ────────────────────────────────────────────────────

bitflags! {
    /// `TS_HIGHCONTRAST` flags (Win32 `HCF_*`).
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct HighContrastFlags: u32 {
        const HIGH_CONTRAST_ON = 0x0000_0001;
        const AVAILABLE = 0x0000_0002;
        const HOTKEY_ACTIVE = 0x0000_0004;
        const CONFIRM_HOTKEY = 0x0000_0008;
        const HOTKEY_SOUND = 0x0000_0010;
        const INDICATOR = 0x0000_0020;
        const HOTKEY_AVAILABLE = 0x0000_0040;
    }
}

bitflags! {
    /// Which fields of a [`SysParamOrder`] the peer should apply.
    ///
    /// Each set bit becomes one System Parameters Update PDU.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct SysParamMask: u32 {
        const DRAG_FULL_WINDOWS = 0x0000_0001;
        const KEYBOARD_CUES = 0x0000_0002;
        const KEYBOARD_PREF = 0x0000_0004;
        const MOUSE_BUTTON_SWAP = 0x0000_0008;
        const WORK_AREA = 0x0000_0010;
        const HIGH_CONTRAST = 0x0000_0080;
    }
}

bitflags! {
    /// Client Execute PDU flags (`TS_RAIL_EXEC_FLAG_*`).
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct ExecFlags: u16 {
        const EXPAND_WORKING_DIRECTORY = 0x0001;
        const TRANSLATE_FILES = 0x0002;
        const FILE = 0x0004;
        const EXPAND_ARGUMENTS = 0x0008;
        const APP_USER_MODEL_ID = 0x0010;
    }
}

bitflags! {
    /// Client Information PDU flags (`TS_RAIL_CLIENTSTATUS_*`).
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct ClientStatusFlags: u32 {
        const ALLOW_LOCAL_MOVE_SIZE = 0x0000_0001;
        const AUTO_RECONNECT = 0x0000_0002;
        const ZORDER_SYNC = 0x0000_0004;
        const WINDOW_RESIZE_MARGIN_SUPPORTED = 0x0000_0010;
        const HIGH_DPI_ICONS_SUPPORTED = 0x0000_0020;
        const APPBAR_REMOTING_SUPPORTED = 0x0000_0040;
        const POWER_DISPLAY_REQUEST_SUPPORTED = 0x0000_0080;
        const BIDIRECTIONAL_CLOAK_SUPPORTED = 0x0000_0200;
    }
}

bitflags! {
    /// Server HandshakeEx flags (`TS_RAIL_ORDER_HANDSHAKEEX_FLAGS_*`).
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct HandshakeExFlags: u32 {
        const HIDEF = 0x0000_0001;
        const EXTENDED_SPI_SUPPORTED = 0x0000_0002;
        const SNAP_ARRANGE_SUPPORTED = 0x0000_0004;
        const TEXT_SCALE_SUPPORTED = 0x0000_0008;
        const CARET_BLINK_SUPPORTED = 0x0000_0010;
        const EXTENDED_SPI_2_SUPPORTED = 0x0000_0020;
    }
}

// ── Handshake ────────────────────────────────────────────────────

/// Handshake PDU body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HandshakeOrder {
    pub build_number: u32,
}

impl HandshakeOrder {
    /// The handshake this client answers with.
    pub fn client() -> Self {
        Self {
            build_number: CLIENT_BUILD_NUMBER,
        }
    }
}

/// Server HandshakeEx PDU body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HandshakeExOrder {
    pub build_number: u32,
    pub flags: HandshakeExFlags,
}

// ── Client status ────────────────────────────────────────────────

/// Client Information PDU body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClientStatusOrder {
    pub flags: ClientStatusFlags,
}

impl Default for ClientStatusOrder {
    fn default() -> Self {
        Self {
            flags: ClientStatusFlags::empty(),
        }
    }
}

// ── System parameters ────────────────────────────────────────────

/// `TS_HIGHCONTRAST` structure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HighContrast {
    pub flags: HighContrastFlags,
    /// Color scheme name; empty means none.
    pub color_scheme: String,
}

/// `TS_RECTANGLE_16`: exclusive right/bottom edges.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Rect16 {
    pub left: u16,
    pub top: u16,
    pub right: u16,
    pub bottom: u16,
}

/// Client system parameters, split into one PDU per field on the wire.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SysParamOrder {
    pub params: SysParamMask,
    pub drag_full_windows: bool,
    pub high_contrast: HighContrast,
    pub keyboard_cues: bool,
    pub keyboard_pref: bool,
    pub mouse_button_swap: bool,
    pub work_area: Rect16,
}

impl SysParamOrder {
    /// The fixed parameter set announced for a desktop of the given size.
    pub fn for_desktop(width: u16, height: u16) -> Self {
        Self {
            params: SysParamMask::DRAG_FULL_WINDOWS
                | SysParamMask::HIGH_CONTRAST
                | SysParamMask::KEYBOARD_CUES
                | SysParamMask::KEYBOARD_PREF
                | SysParamMask::MOUSE_BUTTON_SWAP
                | SysParamMask::WORK_AREA,
            drag_full_windows: false,
            high_contrast: HighContrast {
                flags: HighContrastFlags::AVAILABLE
                    | HighContrastFlags::CONFIRM_HOTKEY
                    | HighContrastFlags::HOTKEY_ACTIVE
                    | HighContrastFlags::HOTKEY_AVAILABLE
                    | HighContrastFlags::HOTKEY_SOUND
                    | HighContrastFlags::INDICATOR,
                color_scheme: String::new(),
            },
            keyboard_cues: false,
            keyboard_pref: false,
            mouse_button_swap: false,
            work_area: Rect16 {
                left: 0,
                top: 0,
                right: width,
                bottom: height,
            },
        }
    }
}

// ── Execute ──────────────────────────────────────────────────────

/// Client Execute PDU body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecOrder {
    pub flags: ExecFlags,
    pub program: String,
    pub working_dir: String,
    pub arguments: String,
}

/// Outcome code carried by the server Execute Result PDU.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExecResult {
    Ok,
    HookNotLoaded,
    DecodeFailed,
    NotInAllowList,
    FileNotFound,
    Fail,
    SessionLocked,
    Unknown(u16),
}

impl ExecResult {
    pub fn is_success(self) -> bool {
        matches!(self, ExecResult::Ok)
    }
}

impl From<u16> for ExecResult {
    fn from(value: u16) -> Self {
        match value {
            0x0000 => ExecResult::Ok,
            0x0001 => ExecResult::HookNotLoaded,
            0x0002 => ExecResult::DecodeFailed,
            0x0003 => ExecResult::NotInAllowList,
            0x0005 => ExecResult::FileNotFound,
            0x0006 => ExecResult::Fail,
            0x0007 => ExecResult::SessionLocked,
            other => ExecResult::Unknown(other),
        }
    }
}

impl From<ExecResult> for u16 {
    fn from(value: ExecResult) -> Self {
        match value {
            ExecResult::Ok => 0x0000,
            ExecResult::HookNotLoaded => 0x0001,
            ExecResult::DecodeFailed => 0x0002,
            ExecResult::NotInAllowList => 0x0003,
            ExecResult::FileNotFound => 0x0005,
            ExecResult::Fail => 0x0006,
            ExecResult::SessionLocked => 0x0007,
            ExecResult::Unknown(other) => other,
        }
    }
}

/// Server Execute Result PDU body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecResultOrder {
    pub flags: ExecFlags,
    pub exec_result: ExecResult,
    /// Win32 error code from the server's launch attempt.
    pub raw_result: u32,
    pub program: String,
}

// ── ServerOrder ──────────────────────────────────────────────────

/// A decoded server-to-client RAIL PDU.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServerOrder {
    Handshake(HandshakeOrder),
    HandshakeEx(HandshakeExOrder),
    ExecResult(ExecResultOrder),
    /// Any order this channel does not interpret.
    Other { order_type: u16, body: Bytes },
}
