//! RAIL channel carried over a plain byte stream.
//!
//! [`StreamTransport`] implements the client send primitives by encoding
//! each record and queueing the resulting PDUs; [`drive`] owns the stream,
//! writing queued PDUs out and feeding decoded server orders to the
//! [`ChannelManager`].
//!
//! ```text
//!  handler ──send──► StreamTransport ──mpsc──► drive ──► stream ──► peer
//!  handler ◄─dispatch── ChannelManager ◄──── drive ◄── stream ◄── peer
//! ```

use std::sync::Arc;

use bytes::Bytes;
use futures::{SinkExt, StreamExt};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::sync::mpsc;
use tokio_util::codec::Framed;
use tracing::{debug, trace, warn};

use crate::channel::{ChannelManager, RailTransport};
use crate::codec::RailCodec;
use crate::error::RailError;
use crate::pdu::{ClientStatusOrder, ExecOrder, HandshakeOrder, OrderType, SysParamOrder};

/// FreeRDP `CHANNEL_RC_NOT_CONNECTED`: the channel has no open stream.
pub const CHANNEL_RC_NOT_CONNECTED: u32 = 4;

/// Outbound half of a stream-backed RAIL channel.
#[derive(Debug, Clone)]
pub struct StreamTransport {
    tx: mpsc::UnboundedSender<Bytes>,
}

impl StreamTransport {
    /// Create a transport and the receiver [`drive`] drains.
    pub fn new() -> (Self, mpsc::UnboundedReceiver<Bytes>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    fn queue(
        &self,
        order: OrderType,
        pdus: impl IntoIterator<Item = Bytes>,
    ) -> Result<(), RailError> {
        for pdu in pdus {
            trace!(%order, len = pdu.len(), "queueing PDU");
            self.tx.send(pdu).map_err(|_| RailError::Transport {
                order,
                code: CHANNEL_RC_NOT_CONNECTED,
            })?;
        }
        Ok(())
    }
}

impl RailTransport for StreamTransport {
    fn client_handshake(&self, order: &HandshakeOrder) -> Result<(), RailError> {
        self.queue(OrderType::Handshake, [order.encode()])
    }

    fn client_information(&self, order: &ClientStatusOrder) -> Result<(), RailError> {
        self.queue(OrderType::ClientStatus, [order.encode()])
    }

    fn client_system_param(&self, order: &SysParamOrder) -> Result<(), RailError> {
        self.queue(OrderType::SysParam, order.encode()?)
    }

    fn client_execute(&self, order: &ExecOrder) -> Result<(), RailError> {
        self.queue(OrderType::Exec, [order.encode()?])
    }
}

/// Run the channel over `stream` until the peer closes it.
///
/// Server orders are dispatched to `channel` on `manager`. A callback
/// error is fatal for the stream and is returned, as is any I/O or decode
/// error.
pub async fn drive<S>(
    stream: S,
    mut outbound: mpsc::UnboundedReceiver<Bytes>,
    manager: Arc<ChannelManager>,
    channel: &str,
) -> Result<(), RailError>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let (mut sink, mut source) = Framed::new(stream, RailCodec::default()).split();

    loop {
        tokio::select! {
            pdu = outbound.recv() => match pdu {
                Some(pdu) => sink.send(pdu).await?,
                None => {
                    debug!(channel, "outbound queue closed");
                    return Ok(());
                }
            },
            order = source.next() => match order {
                Some(Ok(order)) => {
                    if let Err(e) = manager.dispatch(channel, &order) {
                        warn!(
                            channel,
                            error = %e,
                            status = e.channel_status(),
                            "server order handling failed"
                        );
                        // Flush whatever the handler managed to queue.
                        while let Ok(pdu) = outbound.try_recv() {
                            sink.send(pdu).await?;
                        }
                        return Err(e);
                    }
                }
                Some(Err(e)) => return Err(e),
                None => {
                    debug!(channel, "peer closed the stream");
                    // Deliver anything still queued before giving up the stream.
                    while let Ok(pdu) = outbound.try_recv() {
                        sink.send(pdu).await?;
                    }
                    return Ok(());
                }
            },
        }
    }
}

// ── Tests ────────────────────────────────────────────────────────
