//! In-process channel host: plugin registry, connect notifications and
//! server-order routing for the channels of one connection.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::{debug, warn};

use crate::channel::{
    ChannelConnectedEvent, ChannelConnectedHandler, ChannelContext, ChannelHost, RailPhase,
    RailTransport,
};
use crate::error::RailError;
use crate::pdu::ServerOrder;

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Channel multiplexer for one connection.
///
/// Channels can only connect once their plugin has been loaded, and only
/// plugins this manager was built with can be loaded.
#[derive(Default)]
pub struct ChannelManager {
    available: Vec<String>,
    loaded: Mutex<Vec<String>>,
    subscribers: Mutex<Vec<ChannelConnectedHandler>>,
    channels: Mutex<HashMap<String, Arc<ChannelContext>>>,
}

impl ChannelManager {
    /// Create a manager able to load the named plugins.
    pub fn new<I, S>(available: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            available: available.into_iter().map(Into::into).collect(),
            ..Default::default()
        }
    }

    pub fn is_loaded(&self, name: &str) -> bool {
        lock(&self.loaded).iter().any(|n| n == name)
    }

    /// Connect a channel and publish the notification to every subscriber.
    ///
    /// Subscribers run synchronously on the calling thread, before the
    /// channel becomes reachable through [`dispatch`](Self::dispatch).
    pub fn connect_channel(
        &self,
        name: &str,
        transport: Arc<dyn RailTransport>,
    ) -> Result<Arc<ChannelContext>, RailError> {
        if !self.is_loaded(name) {
            return Err(RailError::UnknownChannel(name.to_string()));
        }

        let mut context = ChannelContext::new(name, transport);
        context.with_phase(RailPhase::connect)?;

        // Snapshot so a subscriber may subscribe again without deadlocking.
        let subscribers: Vec<ChannelConnectedHandler> = lock(&self.subscribers).clone();
        let mut event = ChannelConnectedEvent {
            context: &mut context,
        };
        for subscriber in &subscribers {
            subscriber(&mut event);
        }

        let context = Arc::new(context);
        lock(&self.channels).insert(name.to_string(), Arc::clone(&context));
        debug!(channel = name, "channel connected");
        Ok(context)
    }

    /// Tear down a channel. Returns `false` if it was not connected.
    pub fn disconnect_channel(&self, name: &str) -> bool {
        match lock(&self.channels).remove(name) {
            Some(context) => {
                context.with_phase(RailPhase::close);
                debug!(channel = name, "channel disconnected");
                true
            }
            None => false,
        }
    }

    pub fn channel(&self, name: &str) -> Option<Arc<ChannelContext>> {
        lock(&self.channels).get(name).cloned()
    }

    /// Hand a server order to the named channel's callbacks.
    pub fn dispatch(&self, name: &str, order: &ServerOrder) -> Result<(), RailError> {
        let context = self
            .channel(name)
            .ok_or_else(|| RailError::UnknownChannel(name.to_string()))?;
        context.dispatch(order)
    }
}

impl ChannelHost for ChannelManager {
    fn load_plugin(&self, name: &str) -> Result<(), RailError> {
        if !self.available.iter().any(|n| n == name) {
            warn!(plugin = name, "no such channel plugin");
            return Err(RailError::PluginLoad(name.to_string()));
        }
        let mut loaded = lock(&self.loaded);
        if !loaded.iter().any(|n| n == name) {
            loaded.push(name.to_string());
        }
        Ok(())
    }

    fn subscribe_channel_connected(&self, handler: ChannelConnectedHandler) {
        lock(&self.subscribers).push(handler);
    }
}

impl std::fmt::Debug for ChannelManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChannelManager")
            .field("available", &self.available)
            .field("loaded", &*lock(&self.loaded))
            .field("subscribers", &lock(&self.subscribers).len())
            .field("channels", &lock(&self.channels).len())
            .finish()
    }
}

// ── Tests ────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::channel::{RAIL_CHANNEL_NAME, Termination};
    use crate::pdu::HandshakeOrder;
    use crate::testing::RecordingTransport;

    #[test]
    fn unknown_plugin_fails_to_load() {
        let manager = ChannelManager::new(["cliprdr"]);
        assert!(matches!(
            manager.load_plugin(RAIL_CHANNEL_NAME),
            Err(RailError::PluginLoad(_))
        ));
        assert!(!manager.is_loaded(RAIL_CHANNEL_NAME));
    }

    #[test]
    fn connect_requires_loaded_plugin() {
        let manager = ChannelManager::new([RAIL_CHANNEL_NAME]);
        let transport = Arc::new(RecordingTransport::default());
        assert!(matches!(
            manager.connect_channel(RAIL_CHANNEL_NAME, transport),
            Err(RailError::UnknownChannel(_))
        ));
    }

    #[test]
    fn subscribers_see_every_connect() {
        let manager = ChannelManager::new([RAIL_CHANNEL_NAME, "cliprdr"]);
        manager.load_plugin(RAIL_CHANNEL_NAME).unwrap();
        manager.load_plugin("cliprdr").unwrap();

        let seen = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&seen);
        manager.subscribe_channel_connected(Arc::new(
            move |event: &mut ChannelConnectedEvent<'_>| {
                assert_eq!(event.context.phase(), RailPhase::ChannelConnected);
                counter.fetch_add(1, Ordering::SeqCst);
            },
        ));

        let transport = Arc::new(RecordingTransport::default());
        manager.connect_channel("cliprdr", transport.clone()).unwrap();
        manager.connect_channel(RAIL_CHANNEL_NAME, transport).unwrap();
        assert_eq!(seen.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn dispatch_to_unknown_channel_fails() {
        let manager = ChannelManager::new([RAIL_CHANNEL_NAME]);
        let order = ServerOrder::Handshake(HandshakeOrder { build_number: 1 });
        assert!(matches!(
            manager.dispatch(RAIL_CHANNEL_NAME, &order),
            Err(RailError::UnknownChannel(_))
        ));
    }

    #[test]
    fn disconnect_closes_channel() {
        let manager = ChannelManager::new([RAIL_CHANNEL_NAME]);
        manager.load_plugin(RAIL_CHANNEL_NAME).unwrap();
        let ctx = manager
            .connect_channel(RAIL_CHANNEL_NAME, Arc::new(RecordingTransport::default()))
            .unwrap();

        assert!(manager.disconnect_channel(RAIL_CHANNEL_NAME));
        assert!(!manager.disconnect_channel(RAIL_CHANNEL_NAME));
        assert_eq!(ctx.phase(), RailPhase::Terminated(Termination::Closed));
        assert!(manager.channel(RAIL_CHANNEL_NAME).is_none());
    }
}
