//! Bridge context and the inbound message gateway.
//!
//! A [`BridgeContext`] owns everything one execution context shares across
//! its bridges: the context identity, the method registry and the endpoint
//! registry. Starting a context takes the single transport subscription and
//! spawns one demux task — however many bridges are created later, exactly
//! one listener exists.

use crate::bridge::{Bridge, BridgeOptions};
use crate::endpoint::EndpointRegistry;
use crate::message::Envelope;
use crate::methods::{MethodHandler, MethodRegistry};
use crate::transport::{Inbound, MessageChannel, Transport};

use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, trace};

/// Generate a fresh context identity.
fn generate_source_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// Shared protocol state for one execution context.
///
/// Explicitly constructed rather than process-global, so independent
/// contexts can coexist in one process and tests need no global reset.
pub struct BridgeContext {
    /// This context's identity, generated once at start and immutable.
    source_id: String,
    methods: MethodRegistry,
    endpoints: EndpointRegistry,
}

impl BridgeContext {
    /// Start a context on the given transport: generate its identity,
    /// take the single inbound subscription and spawn the gateway task.
    pub fn start(transport: &dyn Transport) -> Arc<Self> {
        let ctx = Arc::new(Self {
            source_id: generate_source_id(),
            methods: MethodRegistry::new(),
            endpoints: EndpointRegistry::new(),
        });
        debug!(source_id = %ctx.source_id, "bridge context started");

        let inbox = transport.subscribe();
        tokio::spawn(run_gateway(Arc::clone(&ctx), inbox));
        ctx
    }

    /// This context's identity.
    pub fn source_id(&self) -> &str {
        &self.source_id
    }

    /// Create a bridge toward one remote target and register it as an
    /// unidentified endpoint.
    pub fn bridge(&self, target: Arc<dyn MessageChannel>, options: BridgeOptions) -> Bridge {
        debug!(origin = %options.origin, "bridge created");
        let bridge = Bridge::new(target, options, self.source_id.clone(), self.methods.clone());
        self.endpoints.add_unidentified(bridge.clone());
        bridge
    }

    /// The method registry shared by this context's bridges.
    pub fn methods(&self) -> &MethodRegistry {
        &self.methods
    }

    /// Merge handlers into the shared registry; last write wins.
    pub fn register_methods<I, S>(&self, entries: I)
    where
        I: IntoIterator<Item = (S, MethodHandler)>,
        S: Into<String>,
    {
        self.methods.register(entries);
    }

    /// Remove handlers from the shared registry.
    pub fn unregister_methods<I, S>(&self, names: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.methods.unregister(names);
    }

    /// The endpoint registry for this context.
    pub fn endpoints(&self) -> &EndpointRegistry {
        &self.endpoints
    }
}

/// The single per-context inbound demux loop.
///
/// Filters by protocol tag, resolves the target bridge and forwards.
/// Everything unresolvable is dropped; the process continues regardless of
/// any single message's fate.
async fn run_gateway(ctx: Arc<BridgeContext>, mut inbox: mpsc::UnboundedReceiver<Inbound>) {
    while let Some(inbound) = inbox.recv().await {
        let Some(envelope) = Envelope::from_value(&inbound.payload) else {
            trace!(origin = %inbound.origin, "non-protocol payload ignored");
            continue;
        };
        let Some(bridge) = ctx
            .endpoints
            .resolve(&envelope.source_id, inbound.reply_to.id())
        else {
            trace!(source_id = %envelope.source_id, "no endpoint claims message, dropped");
            continue;
        };
        bridge
            .receive(envelope, inbound.reply_to, &inbound.origin)
            .await;
    }
    debug!(source_id = %ctx.source_id, "transport subscription closed, gateway stopped");
}
