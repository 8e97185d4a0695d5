//! In-process transport.
//!
//! A [`LocalHub`] is one execution context's inbound side of the shared
//! channel. Handles created with [`LocalHub::handle_from`] post into a hub
//! and stamp each delivery with the sending hub's origin plus a reply handle
//! wired back to it, mirroring how a cross-document message event exposes
//! its source. Used by the integration tests and by embedders that co-locate
//! both endpoints in one process.

use crate::transport::{ChannelId, Inbound, MessageChannel, Transport};

use async_trait::async_trait;
use serde_json::Value;
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;
use tracing::trace;

/// One context's end of the shared in-process channel.
pub struct LocalHub {
    id: ChannelId,
    origin: String,
    subscribers: Mutex<Vec<mpsc::UnboundedSender<Inbound>>>,
}

impl LocalHub {
    /// Create a hub answering to the given origin.
    pub fn new(origin: impl Into<String>) -> Arc<Self> {
        Arc::new(Self {
            id: ChannelId::next(),
            origin: origin.into(),
            subscribers: Mutex::new(Vec::new()),
        })
    }

    /// The origin this hub answers to.
    pub fn origin(&self) -> &str {
        &self.origin
    }

    /// A channel handle that delivers into this hub. Replies to those
    /// deliveries are routed back to `from`.
    pub fn handle_from(self: &Arc<Self>, from: &Arc<LocalHub>) -> Arc<dyn MessageChannel> {
        Arc::new(LocalHandle {
            target: Arc::clone(self),
            reply_hub: Arc::clone(from),
        })
    }

    /// Fan a delivery out to all live subscribers, pruning closed ones.
    fn deliver(&self, inbound: Inbound) {
        let mut subscribers = self.subscribers.lock().unwrap_or_else(|e| e.into_inner());
        subscribers.retain(|tx| tx.send(inbound.clone()).is_ok());
    }
}

impl Transport for LocalHub {
    fn subscribe(&self) -> mpsc::UnboundedReceiver<Inbound> {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut subscribers = self.subscribers.lock().unwrap_or_else(|e| e.into_inner());
        subscribers.push(tx);
        rx
    }
}

/// Handle posting into one hub on behalf of another.
struct LocalHandle {
    target: Arc<LocalHub>,
    reply_hub: Arc<LocalHub>,
}

#[async_trait]
impl MessageChannel for LocalHandle {
    fn id(&self) -> ChannelId {
        self.target.id
    }

    async fn post(&self, payload: Value, target_origin: &str) {
        if target_origin != "*" && target_origin != self.target.origin {
            trace!(
                target_origin,
                hub_origin = %self.target.origin,
                "payload dropped by origin filter"
            );
            return;
        }
        let inbound = Inbound {
            payload,
            origin: self.reply_hub.origin.clone(),
            reply_to: self.reply_hub.handle_from(&self.target),
        };
        self.target.deliver(inbound);
    }
}
