//! Channel-side plumbing: the per-channel context, the transport's send
//! primitives, and the peer-event callbacks a channel handler installs.
//!
//! | Item                 | Owned by   | Purpose                                    |
//! |----------------------|------------|--------------------------------------------|
//! | [`ChannelContext`]   | transport  | back-reference + callback slots per channel |
//! | [`RailTransport`]    | transport  | the four client send primitives             |
//! | [`RailEvents`]       | handler    | server Handshake / HandshakeEx / ExecResult |
//! | [`ChannelHost`]      | transport  | plugin loading and connect notifications    |
//! | [`ChannelManager`]   | transport  | in-process implementation of the above      |

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::trace;

use crate::error::RailError;
use crate::pdu::{
    ClientStatusOrder, ExecOrder, ExecResultOrder, HandshakeExOrder, HandshakeOrder, ServerOrder,
    SysParamOrder,
};
use crate::session::SessionContext;

pub mod manager;
pub mod phase;

pub use manager::ChannelManager;
pub use phase::{RailPhase, Termination};

/// Static virtual channel name of the RemoteApp channel.
pub const RAIL_CHANNEL_NAME: &str = "rail";

// ── Transport primitives ─────────────────────────────────────────

/// Client-to-server send primitives of the RAIL channel.
///
/// Each call either queues the complete record or fails; the transport
/// does not serialize concurrent callers itself.
pub trait RailTransport: Send + Sync {
    fn client_handshake(&self, order: &HandshakeOrder) -> Result<(), RailError>;
    fn client_information(&self, order: &ClientStatusOrder) -> Result<(), RailError>;
    fn client_system_param(&self, order: &SysParamOrder) -> Result<(), RailError>;
    fn client_execute(&self, order: &ExecOrder) -> Result<(), RailError>;
}

// ── Peer events ──────────────────────────────────────────────────

/// Callbacks invoked on the transport's dispatch thread when the server
/// sends a RAIL order.
pub trait RailEvents: Send + Sync {
    fn server_handshake(
        &self,
        channel: &ChannelContext,
        order: &HandshakeOrder,
    ) -> Result<(), RailError>;

    fn server_handshake_ex(
        &self,
        channel: &ChannelContext,
        order: &HandshakeExOrder,
    ) -> Result<(), RailError>;

    fn server_execute_result(
        &self,
        channel: &ChannelContext,
        order: &ExecResultOrder,
    ) -> Result<(), RailError>;
}

// ── ChannelContext ───────────────────────────────────────────────

/// Per-channel state created by the transport when a channel connects.
///
/// Handlers never own it; they fill in the session back-reference and
/// the event callbacks during the connect notification.
pub struct ChannelContext {
    name: String,
    transport: Arc<dyn RailTransport>,
    session: Option<Arc<SessionContext>>,
    events: Option<Arc<dyn RailEvents>>,
    phase: Mutex<RailPhase>,
}

impl ChannelContext {
    pub fn new(name: impl Into<String>, transport: Arc<dyn RailTransport>) -> Self {
        Self {
            name: name.into(),
            transport,
            session: None,
            events: None,
            phase: Mutex::new(RailPhase::Disconnected),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn transport(&self) -> &dyn RailTransport {
        self.transport.as_ref()
    }

    /// Session this channel belongs to, once a handler attached it.
    pub fn session(&self) -> Option<&Arc<SessionContext>> {
        self.session.as_ref()
    }

    pub fn attach_session(&mut self, session: Arc<SessionContext>) {
        self.session = Some(session);
    }

    /// Install the peer-event callbacks and start waiting for the handshake.
    ///
    /// Installing on a context still in `Disconnected` counts as its
    /// connect event. If the phase cannot reach `AwaitingHandshake`
    /// nothing is installed and the phase is left as it was.
    pub fn install_events(&mut self, events: Arc<dyn RailEvents>) -> Result<(), RailError> {
        let phase = self.phase.get_mut().unwrap_or_else(PoisonError::into_inner);
        let mut next = phase.clone();
        if next == RailPhase::Disconnected {
            next.connect()?;
        }
        next.await_handshake()?;

        *phase = next;
        self.events = Some(events);
        Ok(())
    }

    pub fn has_events(&self) -> bool {
        self.events.is_some()
    }

    pub fn phase(&self) -> RailPhase {
        self.lock_phase().clone()
    }

    /// Apply a phase transition.
    pub fn with_phase<T>(&self, f: impl FnOnce(&mut RailPhase) -> T) -> T {
        let mut phase = self.lock_phase();
        f(&mut *phase)
    }

    fn lock_phase(&self) -> MutexGuard<'_, RailPhase> {
        self.phase.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Route a server order to the installed callbacks.
    ///
    /// Orders arriving before any callbacks are installed, and order types
    /// this channel does not handle, are dropped.
    pub fn dispatch(&self, order: &ServerOrder) -> Result<(), RailError> {
        let Some(events) = &self.events else {
            trace!(channel = %self.name, "no callbacks installed; dropping {order:?}");
            return Ok(());
        };
        match order {
            ServerOrder::Handshake(hs) => events.server_handshake(self, hs),
            ServerOrder::HandshakeEx(hs) => events.server_handshake_ex(self, hs),
            ServerOrder::ExecResult(r) => events.server_execute_result(self, r),
            ServerOrder::Other { order_type, .. } => {
                trace!(channel = %self.name, "ignoring order type {order_type:#06x}");
                Ok(())
            }
        }
    }
}

impl std::fmt::Debug for ChannelContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChannelContext")
            .field("name", &self.name)
            .field("session", &self.session.is_some())
            .field("events", &self.events.is_some())
            .field("phase", &self.phase())
            .finish()
    }
}

// ── Host interface ───────────────────────────────────────────────

/// Notification published when the transport connects a channel.
pub struct ChannelConnectedEvent<'a> {
    pub context: &'a mut ChannelContext,
}

impl ChannelConnectedEvent<'_> {
    pub fn name(&self) -> &str {
        self.context.name()
    }
}

/// Subscriber to channel-connected notifications.
pub type ChannelConnectedHandler = Arc<dyn Fn(&mut ChannelConnectedEvent<'_>) + Send + Sync>;

/// What a channel handler needs from the connection that hosts it.
pub trait ChannelHost {
    /// Load transport-side support for a channel.
    fn load_plugin(&self, name: &str) -> Result<(), RailError>;

    /// Receive every future channel-connected notification.
    fn subscribe_channel_connected(&self, handler: ChannelConnectedHandler);
}

// ── Tests ────────────────────────────────────────────────────────
