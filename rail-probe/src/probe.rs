//! One RemoteApp launch attempt over an established byte stream.

use std::sync::{Arc, Mutex, PoisonError};

use rail_core::{
    AbortStatus, ChannelManager, RAIL_CHANNEL_NAME, RailError, SessionClient, SessionContext,
    SessionSettings, StreamTransport, drive, load_plugin,
};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::sync::Notify;
use tracing::{error, info};

/// How a probe run ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProbeOutcome {
    /// The peer closed the stream without aborting the session.
    Completed,
    /// The session was aborted.
    Aborted { status: AbortStatus, message: String },
}

/// Session owner for the probe: records the first abort and wakes the run.
#[derive(Debug, Default)]
pub struct ProbeClient {
    abort: Mutex<Option<(AbortStatus, String)>>,
    notify: Notify,
}

impl ProbeClient {
    /// Resolves once the session has been aborted.
    pub async fn aborted(&self) {
        self.notify.notified().await;
    }

    pub fn outcome(&self) -> ProbeOutcome {
        match &*self.abort.lock().unwrap_or_else(PoisonError::into_inner) {
            Some((status, message)) => ProbeOutcome::Aborted {
                status: *status,
                message: message.clone(),
            },
            None => ProbeOutcome::Completed,
        }
    }
}

impl SessionClient for ProbeClient {
    fn abort(&self, status: AbortStatus, message: &str) {
        error!(%status, code = status as u16, "{message}");
        let mut slot = self.abort.lock().unwrap_or_else(PoisonError::into_inner);
        if slot.is_none() {
            *slot = Some((status, message.to_string()));
        }
        self.notify.notify_one();
    }
}

/// Run RemoteApp over `stream` until the peer closes it or the session is
/// aborted.
pub async fn run_probe<S>(stream: S, settings: SessionSettings) -> Result<ProbeOutcome, RailError>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let client = Arc::new(ProbeClient::default());
    let session = Arc::new(SessionContext::new(client.clone(), settings));
    let manager = Arc::new(ChannelManager::new([RAIL_CHANNEL_NAME]));
    if !load_plugin(manager.as_ref(), session) {
        return Err(RailError::PluginLoad(RAIL_CHANNEL_NAME.into()));
    }

    let (transport, outbound) = StreamTransport::new();
    manager.connect_channel(RAIL_CHANNEL_NAME, Arc::new(transport))?;
    info!("rail channel connected, waiting for server handshake");

    tokio::select! {
        result = drive(stream, outbound, Arc::clone(&manager), RAIL_CHANNEL_NAME) => result?,
        () = client.aborted() => {}
    }
    manager.disconnect_channel(RAIL_CHANNEL_NAME);

    Ok(client.outcome())
}

// ── Tests ────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use rail_core::pdu::{ExecFlags, ExecResult, ExecResultOrder, HandshakeOrder};
    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    #[test]
    fn first_abort_wins() {
        let client = ProbeClient::default();
        client.abort(AbortStatus::UpstreamUnavailable, "first");
        client.abort(AbortStatus::ServerError, "second");
        assert_eq!(
            client.outcome(),
            ProbeOutcome::Aborted {
                status: AbortStatus::UpstreamUnavailable,
                message: "first".into()
            }
        );
    }

    #[tokio::test]
    async fn peer_close_completes() {
        let (local, peer) = tokio::io::duplex(4096);
        drop(peer);
        let outcome = run_probe(local, SessionSettings::default()).await.unwrap();
        assert_eq!(outcome, ProbeOutcome::Completed);
    }

    #[tokio::test]
    async fn failed_launch_stops_run() {
        let (local, mut peer) = tokio::io::duplex(64 * 1024);
        let settings = SessionSettings {
            remote_app: "||missing".into(),
            ..Default::default()
        };
        let run = tokio::spawn(run_probe(local, settings));

        peer.write_all(&HandshakeOrder { build_number: 9200 }.encode())
            .await
            .unwrap();
        // Handshake header tells us the client answered.
        let mut header = [0u8; 4];
        peer.read_exact(&mut header).await.unwrap();
        assert_eq!(&header[..2], &[0x05, 0x00]);

        let failed = ExecResultOrder {
            flags: ExecFlags::EXPAND_ARGUMENTS,
            exec_result: ExecResult::FileNotFound,
            raw_result: 2,
            program: "||missing".into(),
        };
        peer.write_all(&failed.encode().unwrap()).await.unwrap();

        // The peer stays open; the abort alone must end the run.
        let outcome = tokio::time::timeout(std::time::Duration::from_secs(5), run)
            .await
            .expect("timeout")
            .unwrap()
            .unwrap();
        assert!(matches!(
            outcome,
            ProbeOutcome::Aborted {
                status: AbortStatus::UpstreamUnavailable,
                ..
            }
        ));
        drop(peer);
    }
}
