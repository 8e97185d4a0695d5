//! The transport collaborator seam.
//!
//! The protocol core never opens a channel itself. It relies on an external
//! transport providing exactly two primitives: posting a payload toward one
//! remote endpoint, and a subscription delivering every inbound payload on
//! the shared channel (including traffic that has nothing to do with this
//! protocol — the gateway filters).

use async_trait::async_trait;
use serde_json::Value;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;

static NEXT_CHANNEL_ID: AtomicU64 = AtomicU64::new(1);

/// Opaque identity of a transport-level channel handle.
///
/// The transport identifies senders only by handle, not by application-level
/// identity; two handles reaching the same remote context share one id. The
/// endpoint registry matches on this before the remote's `sourceId` is known.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ChannelId(u64);

impl ChannelId {
    /// Allocate a fresh, process-unique channel id.
    pub fn next() -> Self {
        Self(NEXT_CHANNEL_ID.fetch_add(1, Ordering::Relaxed))
    }
}

/// A handle for sending payloads to one remote endpoint.
#[async_trait]
pub trait MessageChannel: Send + Sync {
    /// The opaque identity of the remote context this handle reaches.
    fn id(&self) -> ChannelId;

    /// Best-effort delivery of one payload. `target_origin` restricts where
    /// the payload may land (`"*"` = anywhere); a mismatch drops it
    /// silently. No delivery confirmation exists.
    async fn post(&self, payload: Value, target_origin: &str);
}

/// One inbound delivery from the shared channel.
#[derive(Clone)]
pub struct Inbound {
    /// Raw payload; may be foreign traffic.
    pub payload: Value,
    /// The origin the payload came from.
    pub origin: String,
    /// A handle usable to send a reply back to the exact sender.
    pub reply_to: Arc<dyn MessageChannel>,
}

/// The inbound side of the transport collaborator.
pub trait Transport {
    /// Subscribe to every payload arriving on the shared channel. Dropping
    /// the receiver unsubscribes.
    fn subscribe(&self) -> mpsc::UnboundedReceiver<Inbound>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_channel_ids_are_unique() {
        let a = ChannelId::next();
        let b = ChannelId::next();
        assert_ne!(a, b);
        assert_eq!(a, a);
    }
}
