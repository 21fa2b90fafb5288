//! # RemoteApp (RAIL) support
//!
//! ```text
//!  load_plugin ──► host.load_plugin("rail")
//!       │
//!       └──► subscribe(on_channel_connected)
//!                     │  "rail" connects
//!                     ▼
//!            attach session + install RemoteAppHandler
//!                     │  server Handshake / HandshakeEx
//!                     ▼
//!            complete_handshake: Handshake → ClientStatus → SysParam → Exec
//!                     │  server ExecResult
//!                     ▼
//!            on_execute_result: failure ⇒ abort session (upstream unavailable)
//! ```
//!
//! | Module      | Purpose                                           |
//! |-------------|---------------------------------------------------|
//! | `listener`  | filters connect events for the `rail` channel      |
//! | `handshake` | the four-order initialization sequence             |
//! | `exec`      | maps a failed launch to session termination        |

use std::sync::Arc;

use tracing::{debug, warn};

use crate::channel::{
    ChannelConnectedEvent, ChannelContext, ChannelHost, RAIL_CHANNEL_NAME, RailEvents, RailPhase,
};
use crate::error::RailError;
use crate::pdu::{ExecResultOrder, HandshakeExOrder, HandshakeOrder};
use crate::session::SessionContext;

pub mod exec;
pub mod handshake;
pub mod listener;

pub use exec::{EXEC_FAILED_MESSAGE, on_execute_result};
pub use handshake::complete_handshake;
pub use listener::on_channel_connected;

// ── Entry point ──────────────────────────────────────────────────

/// Load RemoteApp support for the connection behind `host`.
///
/// Returns `false` if the host could not load the `rail` plugin; the
/// connection carries on without RemoteApp in that case.
pub fn load_plugin(host: &dyn ChannelHost, session: Arc<SessionContext>) -> bool {
    if let Err(e) = host.load_plugin(RAIL_CHANNEL_NAME) {
        warn!(
            error = %e,
            "Support for the RAIL channel (RemoteApp) could not be loaded. \
             Lacking this support, RemoteApp will not work."
        );
        return false;
    }

    host.subscribe_channel_connected(Arc::new(
        move |event: &mut ChannelConnectedEvent<'_>| on_channel_connected(&session, event),
    ));

    debug!("Support for RAIL (RemoteApp) registered. Awaiting channel connection.");
    true
}

// ── RemoteAppHandler ─────────────────────────────────────────────

/// Callbacks installed on the `rail` channel.
///
/// Holds no state of its own: both handshake variants run the same
/// sequence from the session settings, so a repeated handshake simply
/// sends everything again.
#[derive(Debug, Default, Clone, Copy)]
pub struct RemoteAppHandler;

impl RemoteAppHandler {
    fn handshake(&self, channel: &ChannelContext) -> Result<(), RailError> {
        channel.with_phase(RailPhase::begin_handshake)?;
        match complete_handshake(channel) {
            Ok(()) => channel.with_phase(RailPhase::complete_handshake),
            Err(e) => {
                channel.with_phase(RailPhase::fail);
                warn!(error = %e, "RemoteApp handshake failed");
                Err(e)
            }
        }
    }
}

impl RailEvents for RemoteAppHandler {
    fn server_handshake(
        &self,
        channel: &ChannelContext,
        order: &HandshakeOrder,
    ) -> Result<(), RailError> {
        debug!(build = order.build_number, "server Handshake received");
        self.handshake(channel)
    }

    fn server_handshake_ex(
        &self,
        channel: &ChannelContext,
        order: &HandshakeExOrder,
    ) -> Result<(), RailError> {
        debug!(
            build = order.build_number,
            flags = ?order.flags,
            "server HandshakeEx received"
        );
        self.handshake(channel)
    }

    fn server_execute_result(
        &self,
        channel: &ChannelContext,
        order: &ExecResultOrder,
    ) -> Result<(), RailError> {
        on_execute_result(channel, order)
    }
}

// ── Tests ────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channel::{ChannelManager, Termination};
    use crate::pdu::{ExecFlags, ExecResult, HandshakeExFlags, OrderType, ServerOrder};
    use crate::session::{AbortStatus, SessionSettings};
    use crate::testing::{RecordingClient, RecordingTransport, session_with};

    fn loaded_manager() -> (ChannelManager, Arc<RecordingClient>) {
        let manager = ChannelManager::new([RAIL_CHANNEL_NAME, "cliprdr"]);
        let (session, client) = session_with(SessionSettings {
            remote_app: "||calc".into(),
            ..Default::default()
        });
        assert!(load_plugin(&manager, session));
        (manager, client)
    }

    #[test]
    fn load_failure_is_not_fatal() {
        let manager = ChannelManager::new(["cliprdr"]);
        let (session, _) = session_with(SessionSettings::default());
        assert!(!load_plugin(&manager, session));
        assert!(!manager.is_loaded(RAIL_CHANNEL_NAME));
    }

    #[test]
    fn unrelated_channel_not_armed() {
        let (manager, _) = loaded_manager();
        manager.load_plugin("cliprdr").unwrap();
        let transport = Arc::new(RecordingTransport::default());
        let ctx = manager.connect_channel("cliprdr", transport.clone()).unwrap();

        assert!(!ctx.has_events());
        assert!(ctx.session().is_none());
        assert!(transport.sent().is_empty());
    }

    #[test]
    fn handshake_runs_sequence_and_reaches_running() {
        let (manager, _) = loaded_manager();
        let transport = Arc::new(RecordingTransport::default());
        let ctx = manager
            .connect_channel(RAIL_CHANNEL_NAME, transport.clone())
            .unwrap();
        assert_eq!(ctx.phase(), RailPhase::AwaitingHandshake);
        assert!(transport.sent().is_empty());

        manager
            .dispatch(
                RAIL_CHANNEL_NAME,
                &ServerOrder::Handshake(HandshakeOrder { build_number: 9600 }),
            )
            .unwrap();

        assert_eq!(transport.order_types().len(), 4);
        assert!(ctx.phase().is_running());
    }

    #[test]
    fn handshake_ex_matches_plain_handshake() {
        let (manager, _) = loaded_manager();
        let plain = Arc::new(RecordingTransport::default());
        manager
            .connect_channel(RAIL_CHANNEL_NAME, plain.clone())
            .unwrap();
        manager
            .dispatch(
                RAIL_CHANNEL_NAME,
                &ServerOrder::Handshake(HandshakeOrder { build_number: 9600 }),
            )
            .unwrap();

        let extended = Arc::new(RecordingTransport::default());
        manager
            .connect_channel(RAIL_CHANNEL_NAME, extended.clone())
            .unwrap();
        manager
            .dispatch(
                RAIL_CHANNEL_NAME,
                &ServerOrder::HandshakeEx(HandshakeExOrder {
                    build_number: 9600,
                    flags: HandshakeExFlags::HIDEF,
                }),
            )
            .unwrap();

        assert_eq!(plain.sent(), extended.sent());
    }

    #[test]
    fn failed_send_terminates_channel() {
        let (manager, client) = loaded_manager();
        let transport = Arc::new(RecordingTransport::failing(OrderType::SysParam, 31));
        let ctx = manager
            .connect_channel(RAIL_CHANNEL_NAME, transport.clone())
            .unwrap();

        let err = manager
            .dispatch(
                RAIL_CHANNEL_NAME,
                &ServerOrder::Handshake(HandshakeOrder { build_number: 1 }),
            )
            .unwrap_err();

        assert_eq!(err.channel_status(), 31);
        assert_eq!(ctx.phase(), RailPhase::Terminated(Termination::Failed));
        assert!(client.aborts().is_empty());
        assert!(!transport.order_types().contains(&OrderType::Exec));
    }

    #[test]
    fn exec_failure_aborts_through_dispatch() {
        let (manager, client) = loaded_manager();
        manager
            .connect_channel(RAIL_CHANNEL_NAME, Arc::new(RecordingTransport::default()))
            .unwrap();
        manager
            .dispatch(
                RAIL_CHANNEL_NAME,
                &ServerOrder::Handshake(HandshakeOrder { build_number: 1 }),
            )
            .unwrap();

        let result = ServerOrder::ExecResult(ExecResultOrder {
            flags: ExecFlags::EXPAND_ARGUMENTS,
            exec_result: ExecResult::NotInAllowList,
            raw_result: 0,
            program: "||calc".into(),
        });
        assert!(manager.dispatch(RAIL_CHANNEL_NAME, &result).is_ok());
        assert_eq!(client.aborts().len(), 1);
        assert_eq!(client.aborts()[0].0, AbortStatus::UpstreamUnavailable);
    }
}
