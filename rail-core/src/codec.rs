//! Framing for a byte stream carrying RAIL orders back to back.

use bytes::{Bytes, BytesMut};
use tokio_util::codec::{Decoder, Encoder};

use crate::error::RailError;
use crate::pdu::wire::{decode_server_order, peek_order_length};
use crate::pdu::{ORDER_HEADER_SIZE, ServerOrder};

/// Splits an inbound stream at order boundaries and decodes server
/// orders; writes pre-encoded client PDUs unchanged.
#[derive(Debug, Default)]
pub struct RailCodec {}

impl Decoder for RailCodec {
    type Item = ServerOrder;
    type Error = RailError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        let Some(len) = peek_order_length(src) else {
            return Ok(None);
        };
        if len < ORDER_HEADER_SIZE {
            return Err(RailError::InvalidOrderLength(len));
        }
        if src.len() < len {
            src.reserve(len - src.len());
            return Ok(None);
        }

        let pdu = src.split_to(len);
        decode_server_order(&pdu).map(Some)
    }
}

impl Encoder<Bytes> for RailCodec {
    type Error = RailError;

    fn encode(&mut self, item: Bytes, dst: &mut BytesMut) -> Result<(), Self::Error> {
        dst.extend_from_slice(&item);
        Ok(())
    }
}
