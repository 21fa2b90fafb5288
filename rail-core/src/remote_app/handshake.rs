//! Client side of the RemoteApp initialization exchange.
//!
//! Once the server's Handshake (or HandshakeEx) arrives, the client must
//! answer with, in order:
//!
//! 1. Handshake PDU
//! 2. Client Information PDU
//! 3. Client System Parameters Update PDU(s)
//! 4. Client Execute PDU
//!
//! None of these may go out before the server handshake, and the program
//! does not launch unless all four are sent.

use tracing::debug;

use crate::channel::ChannelContext;
use crate::error::RailError;
use crate::pdu::{ClientStatusOrder, ExecFlags, ExecOrder, HandshakeOrder, SysParamOrder};

/// Send the four initialization orders on `channel`.
///
/// The session's write lock is taken separately for each send, so other
/// channels may write between steps but never during one. The first
/// failing send ends the sequence and its error is returned unchanged.
pub fn complete_handshake(channel: &ChannelContext) -> Result<(), RailError> {
    let session = channel
        .session()
        .ok_or(RailError::ProtocolViolation("rail channel has no session attached"))?;
    let transport = channel.transport();
    let settings = session.settings();

    let handshake = HandshakeOrder::client();
    session.with_write_lock(|| transport.client_handshake(&handshake))?;

    let client_status = ClientStatusOrder::default();
    session.with_write_lock(|| transport.client_information(&client_status))?;

    let sysparam = SysParamOrder::for_desktop(settings.width, settings.height);
    session.with_write_lock(|| transport.client_system_param(&sysparam))?;

    let exec = ExecOrder {
        flags: ExecFlags::EXPAND_ARGUMENTS,
        program: settings.remote_app.clone(),
        working_dir: settings.remote_app_dir.clone(),
        arguments: settings.remote_app_args.clone(),
    };
    session.with_write_lock(|| transport.client_execute(&exec))?;

    debug!(
        build = handshake.build_number,
        program = %exec.program,
        "RemoteApp handshake completed; execute requested"
    );
    Ok(())
}

// ── Tests ────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::channel::RAIL_CHANNEL_NAME;
    use crate::pdu::{OrderType, Rect16};
    use crate::session::SessionSettings;
    use crate::testing::{RecordingTransport, Sent, session_with};

    fn channel(transport: Arc<RecordingTransport>, settings: SessionSettings) -> ChannelContext {
        let (session, _) = session_with(settings);
        let mut ctx = ChannelContext::new(RAIL_CHANNEL_NAME, transport);
        ctx.attach_session(session);
        ctx
    }

    fn notepad() -> SessionSettings {
        SessionSettings {
            width: 1024,
            height: 768,
            remote_app: "/usr/bin/notepad".into(),
            remote_app_dir: "/home/user".into(),
            remote_app_args: "--readonly".into(),
        }
    }

    #[test]
    fn sends_four_orders_in_order() {
        let transport = Arc::new(RecordingTransport::default());
        let ctx = channel(transport.clone(), notepad());

        complete_handshake(&ctx).unwrap();

        assert_eq!(
            transport.order_types(),
            vec![
                OrderType::Handshake,
                OrderType::ClientStatus,
                OrderType::SysParam,
                OrderType::Exec,
            ]
        );
    }

    #[test]
    fn records_carry_session_settings() {
        let transport = Arc::new(RecordingTransport::default());
        let ctx = channel(transport.clone(), notepad());
        complete_handshake(&ctx).unwrap();

        let sent = transport.sent();
        assert_eq!(sent[0], Sent::Handshake(HandshakeOrder { build_number: 7600 }));
        assert_eq!(sent[1], Sent::ClientStatus(ClientStatusOrder::default()));

        let Sent::SysParam(sysparam) = &sent[2] else {
            panic!("expected system parameters, got {:?}", sent[2]);
        };
        assert_eq!(
            sysparam.work_area,
            Rect16 {
                left: 0,
                top: 0,
                right: 1024,
                bottom: 768
            }
        );

        let Sent::Exec(exec) = &sent[3] else {
            panic!("expected execute, got {:?}", sent[3]);
        };
        assert_eq!(exec.program, "/usr/bin/notepad");
        assert_eq!(exec.working_dir, "/home/user");
        assert_eq!(exec.arguments, "--readonly");
        assert_eq!(exec.flags, ExecFlags::EXPAND_ARGUMENTS);
    }

    #[test]
    fn failing_step_short_circuits() {
        let steps = [
            OrderType::Handshake,
            OrderType::ClientStatus,
            OrderType::SysParam,
            OrderType::Exec,
        ];
        for (k, failing) in steps.iter().enumerate() {
            let transport = Arc::new(RecordingTransport::failing(*failing, 0x10 + k as u32));
            let ctx = channel(transport.clone(), notepad());

            let err = complete_handshake(&ctx).unwrap_err();

            match err {
                RailError::Transport { order, code } => {
                    assert_eq!(order, *failing);
                    assert_eq!(code, 0x10 + k as u32);
                }
                other => panic!("unexpected error {other:?}"),
            }
            assert_eq!(transport.order_types(), steps[..=k].to_vec());
        }
    }

    #[test]
    fn missing_session_sends_nothing() {
        let transport = Arc::new(RecordingTransport::default());
        let ctx = ChannelContext::new(RAIL_CHANNEL_NAME, transport.clone());
        assert!(matches!(
            complete_handshake(&ctx),
            Err(RailError::ProtocolViolation(_))
        ));
        assert!(transport.sent().is_empty());
    }

    #[test]
    fn repeated_handshake_resends_identically() {
        let transport = Arc::new(RecordingTransport::default());
        let ctx = channel(transport.clone(), notepad());
        complete_handshake(&ctx).unwrap();
        complete_handshake(&ctx).unwrap();

        let sent = transport.sent();
        assert_eq!(sent.len(), 8);
        assert_eq!(sent[..4], sent[4..]);
    }
}
