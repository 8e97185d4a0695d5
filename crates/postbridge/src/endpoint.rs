//! Endpoint registry — resolves inbound messages to bridge instances.
//!
//! The transport identifies senders only by an opaque channel handle; the
//! protocol's own `sourceId` is the durable identity, established lazily on
//! first contact. A bridge starts out *unidentified* (keyed by its target
//! channel) and is *promoted* the first time a message arriving on that
//! channel claims a `sourceId`. Promotion is irreversible and removes the
//! bridge from the unidentified set, so it cannot be matched twice.

use crate::bridge::Bridge;
use crate::transport::ChannelId;

use dashmap::DashMap;
use std::sync::Mutex;
use tracing::debug;

/// Maps claimed remote identities to local bridge instances.
#[derive(Default)]
pub struct EndpointRegistry {
    /// Confirmed `sourceId` → bridge mappings; permanent once created.
    identified: DashMap<String, Bridge>,
    /// Bridges awaiting their first inbound message, in construction order.
    unidentified: Mutex<Vec<Bridge>>,
}

impl EndpointRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a freshly constructed bridge as an unidentified endpoint.
    pub(crate) fn add_unidentified(&self, bridge: Bridge) {
        let mut unidentified = self.unidentified.lock().unwrap_or_else(|e| e.into_inner());
        unidentified.push(bridge);
    }

    /// Resolve an inbound message to the bridge that claims it.
    ///
    /// An identified `source_id` dispatches directly. Otherwise the first
    /// unidentified bridge whose target channel matches the message's sender
    /// is promoted under `source_id`. `None` means nobody claims the
    /// message and the gateway drops it.
    pub fn resolve(&self, source_id: &str, sender: ChannelId) -> Option<Bridge> {
        if let Some(bridge) = self.identified.get(source_id) {
            return Some(bridge.value().clone());
        }

        let mut unidentified = self.unidentified.lock().unwrap_or_else(|e| e.into_inner());
        let index = unidentified.iter().position(|b| b.channel_id() == sender)?;
        let bridge = unidentified.remove(index);
        drop(unidentified);

        debug!(source_id, "endpoint identified");
        self.identified.insert(source_id.to_string(), bridge.clone());
        Some(bridge)
    }

    /// Number of confirmed remote identities.
    pub fn identified_count(&self) -> usize {
        self.identified.len()
    }

    /// Number of bridges still awaiting first contact.
    pub fn unidentified_count(&self) -> usize {
        let unidentified = self.unidentified.lock().unwrap_or_else(|e| e.into_inner());
        unidentified.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bridge::BridgeOptions;
    use crate::local::LocalHub;
    use crate::methods::MethodRegistry;
    use std::sync::Arc;

    fn bridge_to(hub: &Arc<LocalHub>, target: &Arc<LocalHub>) -> Bridge {
        Bridge::new(
            target.handle_from(hub),
            BridgeOptions::default(),
            "ctx-local".to_string(),
            MethodRegistry::new(),
        )
    }

    #[test]
    fn test_promotion_on_first_contact() {
        let local = LocalHub::new("a");
        let remote = LocalHub::new("b");
        let registry = EndpointRegistry::new();
        registry.add_unidentified(bridge_to(&local, &remote));

        // The remote's reply handle carries the remote hub's channel id,
        // which equals our bridge's target channel id.
        let resolved = registry.resolve("ctx-remote", remote.handle_from(&local).id());
        assert!(resolved.is_some());
        assert_eq!(registry.identified_count(), 1);
        assert_eq!(registry.unidentified_count(), 0);
    }

    #[test]
    fn test_identified_endpoint_skips_the_scan() {
        let local = LocalHub::new("a");
        let remote = LocalHub::new("b");
        let registry = EndpointRegistry::new();
        registry.add_unidentified(bridge_to(&local, &remote));

        let sender = remote.handle_from(&local).id();
        registry.resolve("ctx-remote", sender).unwrap();

        // Second resolution hits the identified map; the sender channel no
        // longer matters and the unidentified set stays empty.
        let resolved = registry.resolve("ctx-remote", ChannelId::next());
        assert!(resolved.is_some());
        assert_eq!(registry.unidentified_count(), 0);
    }

    #[test]
    fn test_unmatched_sender_is_dropped() {
        let local = LocalHub::new("a");
        let remote = LocalHub::new("b");
        let registry = EndpointRegistry::new();
        registry.add_unidentified(bridge_to(&local, &remote));

        assert!(registry.resolve("ctx-unknown", ChannelId::next()).is_none());
        assert_eq!(registry.unidentified_count(), 1);
    }

    #[test]
    fn test_first_match_wins_on_shared_channel() {
        let local = LocalHub::new("a");
        let remote = LocalHub::new("b");
        let registry = EndpointRegistry::new();
        registry.add_unidentified(bridge_to(&local, &remote));
        registry.add_unidentified(bridge_to(&local, &remote));

        let sender = remote.handle_from(&local).id();
        registry.resolve("ctx-one", sender).unwrap();
        // The first bridge is claimed; the second remains for a different identity.
        assert_eq!(registry.unidentified_count(), 1);
        registry.resolve("ctx-two", sender).unwrap();
        assert_eq!(registry.unidentified_count(), 0);
        assert_eq!(registry.identified_count(), 2);
    }
}
