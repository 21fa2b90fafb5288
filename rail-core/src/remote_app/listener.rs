//! Channel-connected subscriber that wires RemoteApp handling into the
//! `rail` channel.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::channel::{ChannelConnectedEvent, RAIL_CHANNEL_NAME};
use crate::remote_app::RemoteAppHandler;
use crate::session::SessionContext;

/// Attach `session` and the RemoteApp callbacks to the channel if it is
/// the `rail` channel. Any other channel is left untouched.
pub fn on_channel_connected(session: &Arc<SessionContext>, event: &mut ChannelConnectedEvent<'_>) {
    if event.name() != RAIL_CHANNEL_NAME {
        return;
    }

    let context = &mut *event.context;
    if let Err(e) = context.install_events(Arc::new(RemoteAppHandler)) {
        warn!(error = %e, phase = %context.phase(), "could not arm RAIL channel");
        return;
    }
    context.attach_session(Arc::clone(session));

    debug!("RAIL (RemoteApp) channel connected.");
}
