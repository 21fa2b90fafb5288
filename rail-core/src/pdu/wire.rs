//! Little-endian wire encoding of RAIL orders.
//!
//! Client orders encode to complete PDUs (header included). Server
//! orders decode from one complete PDU; the framing codec is responsible
//! for splitting the byte stream at order boundaries.

use bytes::{Buf, BufMut, Bytes, BytesMut};

use crate::error::RailError;
use crate::pdu::orders::{
    ClientStatusOrder, ExecFlags, ExecOrder, ExecResult, ExecResultOrder, HandshakeExFlags,
    HandshakeExOrder, HandshakeOrder, HighContrast, Rect16, ServerOrder, SysParamMask,
    SysParamOrder,
};
use crate::pdu::{MAX_ORDER_LENGTH, ORDER_HEADER_SIZE, OrderType};

// ── Limits ───────────────────────────────────────────────────────

/// Maximum encoded size of the program and working directory fields.
pub const MAX_EXEC_PATH_BYTES: usize = 520;

/// Maximum encoded size of the arguments field.
pub const MAX_EXEC_ARGS_BYTES: usize = 16_000;

/// Maximum encoded size of a high-contrast color scheme name, excluding
/// the terminator (256 UTF-16 code units).
pub const MAX_COLOR_SCHEME_BYTES: usize = 512;

// ── System parameter identifiers ─────────────────────────────────

pub const SPI_SET_DRAG_FULL_WINDOWS: u32 = 0x0000_0025;
pub const SPI_SET_HIGH_CONTRAST: u32 = 0x0000_0043;
pub const SPI_SET_KEYBOARD_CUES: u32 = 0x0000_100B;
pub const SPI_SET_KEYBOARD_PREF: u32 = 0x0000_0045;
pub const SPI_SET_MOUSE_BUTTON_SWAP: u32 = 0x0000_0021;
pub const SPI_SET_WORK_AREA: u32 = 0x0000_002F;

// ── Helpers ──────────────────────────────────────────────────────

/// Prefix `body` with an order header.
///
/// Callers keep bodies well under the 16-bit length limit.
fn frame(order_type: OrderType, body: &[u8]) -> Bytes {
    let len = ORDER_HEADER_SIZE + body.len();
    debug_assert!(len <= MAX_ORDER_LENGTH);
    let mut buf = BytesMut::with_capacity(len);
    buf.put_u16_le(order_type as u16);
    buf.put_u16_le(len as u16);
    buf.put_slice(body);
    buf.freeze()
}

fn utf16_bytes(s: &str) -> Vec<u8> {
    s.encode_utf16().flat_map(u16::to_le_bytes).collect()
}

fn bounded_utf16(field: &'static str, s: &str, max: usize) -> Result<Vec<u8>, RailError> {
    let bytes = utf16_bytes(s);
    if bytes.len() > max {
        return Err(RailError::FieldTooLong {
            field,
            size: bytes.len(),
            max,
        });
    }
    Ok(bytes)
}

fn decode_utf16(what: &'static str, bytes: &[u8]) -> Result<String, RailError> {
    if bytes.len() % 2 != 0 {
        return Err(RailError::InvalidUtf16(what));
    }
    let units: Vec<u16> = bytes
        .chunks_exact(2)
        .map(|c| u16::from_le_bytes([c[0], c[1]]))
        .collect();
    let s = String::from_utf16(&units).map_err(|_| RailError::InvalidUtf16(what))?;
    Ok(s.trim_end_matches('\0').to_string())
}

fn need(buf: &[u8], needed: usize, what: &'static str) -> Result<(), RailError> {
    if buf.len() < needed {
        return Err(RailError::Truncated {
            what,
            needed,
            available: buf.len(),
        });
    }
    Ok(())
}

/// Order length announced by the header at the start of `buf`, if the
/// header is complete.
pub fn peek_order_length(buf: &[u8]) -> Option<usize> {
    if buf.len() < ORDER_HEADER_SIZE {
        return None;
    }
    Some(u16::from_le_bytes([buf[2], buf[3]]) as usize)
}

// ── Client orders ────────────────────────────────────────────────

impl HandshakeOrder {
    pub fn encode(&self) -> Bytes {
        frame(OrderType::Handshake, &self.build_number.to_le_bytes())
    }
}

impl HandshakeExOrder {
    pub fn encode(&self) -> Bytes {
        let mut body = BytesMut::with_capacity(8);
        body.put_u32_le(self.build_number);
        body.put_u32_le(self.flags.bits());
        frame(OrderType::HandshakeEx, &body)
    }
}

impl ClientStatusOrder {
    pub fn encode(&self) -> Bytes {
        frame(OrderType::ClientStatus, &self.flags.bits().to_le_bytes())
    }
}

fn sysparam_pdu(param: u32, value: &[u8]) -> Bytes {
    let mut body = BytesMut::with_capacity(4 + value.len());
    body.put_u32_le(param);
    body.put_slice(value);
    frame(OrderType::SysParam, &body)
}

fn high_contrast_value(hc: &HighContrast) -> Result<Vec<u8>, RailError> {
    let mut scheme = bounded_utf16("color scheme", &hc.color_scheme, MAX_COLOR_SCHEME_BYTES)?;
    scheme.extend_from_slice(&[0, 0]);
    let mut value = BytesMut::with_capacity(8 + scheme.len());
    value.put_u32_le(hc.flags.bits());
    value.put_u32_le(scheme.len() as u32);
    value.put_slice(&scheme);
    Ok(value.to_vec())
}

fn rect_value(r: &Rect16) -> [u8; 8] {
    let mut out = [0u8; 8];
    out[0..2].copy_from_slice(&r.left.to_le_bytes());
    out[2..4].copy_from_slice(&r.top.to_le_bytes());
    out[4..6].copy_from_slice(&r.right.to_le_bytes());
    out[6..8].copy_from_slice(&r.bottom.to_le_bytes());
    out
}

impl SysParamOrder {
    /// Encode one System Parameters Update PDU per field in `params`.
    ///
    /// PDUs come out in a fixed order: high contrast, mouse button swap,
    /// keyboard preference, drag full windows, keyboard cues, work area.
    pub fn encode(&self) -> Result<Vec<Bytes>, RailError> {
        let mut pdus = Vec::with_capacity(self.params.bits().count_ones() as usize);

        if self.params.contains(SysParamMask::HIGH_CONTRAST) {
            let value = high_contrast_value(&self.high_contrast)?;
            pdus.push(sysparam_pdu(SPI_SET_HIGH_CONTRAST, &value));
        }
        if self.params.contains(SysParamMask::MOUSE_BUTTON_SWAP) {
            pdus.push(sysparam_pdu(
                SPI_SET_MOUSE_BUTTON_SWAP,
                &[self.mouse_button_swap as u8],
            ));
        }
        if self.params.contains(SysParamMask::KEYBOARD_PREF) {
            pdus.push(sysparam_pdu(SPI_SET_KEYBOARD_PREF, &[self.keyboard_pref as u8]));
        }
        if self.params.contains(SysParamMask::DRAG_FULL_WINDOWS) {
            pdus.push(sysparam_pdu(
                SPI_SET_DRAG_FULL_WINDOWS,
                &[self.drag_full_windows as u8],
            ));
        }
        if self.params.contains(SysParamMask::KEYBOARD_CUES) {
            pdus.push(sysparam_pdu(SPI_SET_KEYBOARD_CUES, &[self.keyboard_cues as u8]));
        }
        if self.params.contains(SysParamMask::WORK_AREA) {
            pdus.push(sysparam_pdu(SPI_SET_WORK_AREA, &rect_value(&self.work_area)));
        }

        Ok(pdus)
    }
}

impl ExecOrder {
    /// Encode the Client Execute PDU, enforcing the per-field size limits.
    pub fn encode(&self) -> Result<Bytes, RailError> {
        let program = bounded_utf16("program", &self.program, MAX_EXEC_PATH_BYTES)?;
        let working_dir =
            bounded_utf16("working directory", &self.working_dir, MAX_EXEC_PATH_BYTES)?;
        let arguments = bounded_utf16("arguments", &self.arguments, MAX_EXEC_ARGS_BYTES)?;

        let mut body =
            BytesMut::with_capacity(8 + program.len() + working_dir.len() + arguments.len());
        body.put_u16_le(self.flags.bits());
        body.put_u16_le(program.len() as u16);
        body.put_u16_le(working_dir.len() as u16);
        body.put_u16_le(arguments.len() as u16);
        body.put_slice(&program);
        body.put_slice(&working_dir);
        body.put_slice(&arguments);
        Ok(frame(OrderType::Exec, &body))
    }
}

impl ExecResultOrder {
    pub fn encode(&self) -> Result<Bytes, RailError> {
        let program = bounded_utf16("program", &self.program, MAX_EXEC_PATH_BYTES)?;
        let mut body = BytesMut::with_capacity(12 + program.len());
        body.put_u16_le(self.flags.bits());
        body.put_u16_le(self.exec_result.into());
        body.put_u32_le(self.raw_result);
        body.put_u16_le(0); // padding
        body.put_u16_le(program.len() as u16);
        body.put_slice(&program);
        Ok(frame(OrderType::ExecResult, &body))
    }
}

// ── Server orders ────────────────────────────────────────────────

/// Decode one complete server PDU.
pub fn decode_server_order(pdu: &[u8]) -> Result<ServerOrder, RailError> {
    need(pdu, ORDER_HEADER_SIZE, "order header")?;
    let mut header = &pdu[..ORDER_HEADER_SIZE];
    let order_type = header.get_u16_le();
    let order_length = header.get_u16_le() as usize;

    if order_length < ORDER_HEADER_SIZE {
        return Err(RailError::InvalidOrderLength(order_length));
    }
    need(pdu, order_length, "order body")?;
    let mut body = &pdu[ORDER_HEADER_SIZE..order_length];

    match OrderType::from_wire(order_type) {
        Some(OrderType::Handshake) => {
            need(body, 4, "handshake")?;
            Ok(ServerOrder::Handshake(HandshakeOrder {
                build_number: body.get_u32_le(),
            }))
        }
        Some(OrderType::HandshakeEx) => {
            need(body, 8, "handshake ex")?;
            let build_number = body.get_u32_le();
            let flags = HandshakeExFlags::from_bits_retain(body.get_u32_le());
            Ok(ServerOrder::HandshakeEx(HandshakeExOrder {
                build_number,
                flags,
            }))
        }
        Some(OrderType::ExecResult) => {
            need(body, 12, "exec result")?;
            let flags = ExecFlags::from_bits_retain(body.get_u16_le());
            let exec_result: ExecResult = body.get_u16_le().into();
            let raw_result = body.get_u32_le();
            let _padding = body.get_u16_le();
            let exe_len = body.get_u16_le() as usize;
            need(body, exe_len, "exec result program")?;
            let program = decode_utf16("exec result program", &body[..exe_len])?;
            Ok(ServerOrder::ExecResult(ExecResultOrder {
                flags,
                exec_result,
                raw_result,
                program,
            }))
        }
        _ => Ok(ServerOrder::Other {
            order_type,
            body: Bytes::copy_from_slice(body),
        }),
    }
}

// ── Tests ────────────────────────────────────────────────────────
