//! Bridge instance — one local endpoint's connection to one remote target.
//!
//! A [`Bridge`] owns the outbound side (`call`, `request`) and the inbound
//! dispatch for messages the gateway resolves to it. Cloning a bridge is
//! cheap and yields another handle to the same instance; the endpoint
//! registry and the application can hold one each.

use crate::error::BridgeError;
use crate::message::{Envelope, MessageKind};
use crate::methods::MethodRegistry;
use crate::pending::PendingRequests;
use crate::transport::{ChannelId, MessageChannel};

use serde_json::Value;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, trace};

/// Default window a request waits for its response.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(20);

/// Per-bridge configuration.
///
/// Passed verbatim to handlers as their second argument, so applications can
/// key behavior off the origin a bridge is restricted to.
#[derive(Debug, Clone)]
pub struct BridgeOptions {
    /// Restricts where outbound messages may land. `"*"` allows any origin.
    pub origin: String,
    /// How long `request` waits before giving up. The wire protocol is
    /// unaffected by this value; two endpoints need not agree on it.
    pub timeout: Duration,
}

impl Default for BridgeOptions {
    fn default() -> Self {
        Self {
            origin: "*".to_string(),
            timeout: REQUEST_TIMEOUT,
        }
    }
}

impl BridgeOptions {
    /// Options restricted to a single origin.
    pub fn for_origin(origin: impl Into<String>) -> Self {
        Self {
            origin: origin.into(),
            ..Self::default()
        }
    }
}

struct BridgeInner {
    /// Where outbound calls and requests are posted.
    target: Arc<dyn MessageChannel>,
    options: BridgeOptions,
    /// The owning context's identity, stamped on every outbound envelope.
    source_id: String,
    /// Correlation ids start at 1 and increment per outgoing request.
    next_uid: AtomicU64,
    pending: PendingRequests,
    methods: MethodRegistry,
}

/// One side of a bridged endpoint pair.
#[derive(Clone)]
pub struct Bridge {
    inner: Arc<BridgeInner>,
}

impl Bridge {
    pub(crate) fn new(
        target: Arc<dyn MessageChannel>,
        options: BridgeOptions,
        source_id: String,
        methods: MethodRegistry,
    ) -> Self {
        Self {
            inner: Arc::new(BridgeInner {
                target,
                options,
                source_id,
                next_uid: AtomicU64::new(1),
                pending: PendingRequests::new(),
                methods,
            }),
        }
    }

    /// The transport identity of this bridge's target channel.
    pub fn channel_id(&self) -> ChannelId {
        self.inner.target.id()
    }

    /// This bridge's configuration.
    pub fn options(&self) -> &BridgeOptions {
        &self.inner.options
    }

    /// Number of requests still awaiting a response.
    pub fn pending_requests(&self) -> usize {
        self.inner.pending.len()
    }

    /// Fire-and-forget invocation of a remote method.
    ///
    /// No acknowledgement exists; if the remote has no matching handler the
    /// message is simply dropped there.
    pub async fn call(&self, method: &str, params: Value) -> Result<(), BridgeError> {
        let envelope = Envelope::call(&self.inner.source_id, method, params);
        let payload = serde_json::to_value(&envelope)?;
        trace!(method, "posting call");
        self.inner.target.post(payload, &self.inner.options.origin).await;
        Ok(())
    }

    /// Invoke a remote method and await its result.
    ///
    /// Resolves with the handler's value, or fails with
    /// [`BridgeError::Timeout`] once the configured window elapses — which
    /// is also the only signal that the remote has no such method. Exactly
    /// one of the two outcomes occurs and the pending entry is removed on
    /// both paths.
    pub async fn request(&self, method: &str, params: Value) -> Result<Value, BridgeError> {
        let uid = self.inner.next_uid.fetch_add(1, Ordering::Relaxed);
        let rx = self.inner.pending.insert(uid);

        let envelope = Envelope::request(&self.inner.source_id, uid, method, params);
        let payload = match serde_json::to_value(&envelope) {
            Ok(payload) => payload,
            Err(e) => {
                self.inner.pending.abandon(uid);
                return Err(e.into());
            }
        };

        trace!(method, uid, "posting request");
        let started = Instant::now();
        self.inner.target.post(payload, &self.inner.options.origin).await;

        match tokio::time::timeout(self.inner.options.timeout, rx).await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(_)) => {
                self.inner.pending.abandon(uid);
                Err(BridgeError::ChannelClosed)
            }
            Err(_) => {
                self.inner.pending.abandon(uid);
                debug!(method, uid, "request timed out");
                Err(BridgeError::Timeout {
                    elapsed: started.elapsed(),
                })
            }
        }
    }

    /// Dispatch an inbound envelope, invoked by the gateway after endpoint
    /// resolution.
    ///
    /// Handlers run on spawned tasks so dispatch never blocks on them; a
    /// request's response is posted back to `reply_to`/`reply_origin`
    /// whenever the handler completes. Dispatch follows delivery order, but
    /// handler *execution* is unordered across spawned tasks — two
    /// back-to-back calls may run their handlers in either order. A
    /// panicking handler is absorbed by its task and never produces a
    /// response, so the requester observes a timeout.
    pub(crate) async fn receive(
        &self,
        envelope: Envelope,
        reply_to: Arc<dyn MessageChannel>,
        reply_origin: &str,
    ) {
        match envelope.kind {
            MessageKind::Call => {
                let Some(handler) = self.inner.methods.lookup(&envelope.method) else {
                    trace!(method = %envelope.method, "call for unregistered method dropped");
                    return;
                };
                let params = envelope.params.unwrap_or(Value::Null);
                let options = self.inner.options.clone();
                tokio::spawn(async move {
                    handler(params, options).await;
                });
            }
            MessageKind::Request => {
                let Some(uid) = envelope.uid else {
                    trace!(method = %envelope.method, "request without uid dropped");
                    return;
                };
                let Some(handler) = self.inner.methods.lookup(&envelope.method) else {
                    // No response is ever sent; the requester times out.
                    trace!(method = %envelope.method, uid, "request for unregistered method dropped");
                    return;
                };
                let params = envelope.params.unwrap_or(Value::Null);
                let options = self.inner.options.clone();
                let source_id = self.inner.source_id.clone();
                let requester = envelope.source_id;
                let method = envelope.method;
                let reply_origin = reply_origin.to_string();
                tokio::spawn(async move {
                    let value = handler(params, options).await;
                    let response = Envelope::response(&source_id, &requester, uid, &method, value);
                    match serde_json::to_value(&response) {
                        Ok(payload) => reply_to.post(payload, &reply_origin).await,
                        Err(e) => debug!(error = %e, method = %method, "failed to serialize response"),
                    }
                });
            }
            MessageKind::Response => {
                if envelope.dest_id.as_deref() != Some(self.inner.source_id.as_str()) {
                    trace!(dest_id = ?envelope.dest_id, "response addressed elsewhere ignored");
                    return;
                }
                let Some(uid) = envelope.uid else {
                    trace!("response without uid ignored");
                    return;
                };
                let value = envelope.value.unwrap_or(Value::Null);
                if !self.inner.pending.complete(uid, value) {
                    trace!(uid, "response for expired or unknown request ignored");
                }
            }
        }
    }
}
