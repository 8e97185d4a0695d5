//! postbridge — correlated RPC over an unordered broadcast message channel.
//!
//! Two endpoints sharing an asynchronous, unordered channel (such as a
//! parent document and an embedded child document) invoke named methods on
//! each other, fire-and-forget or with a correlated return value, without
//! either side knowing the other's internal structure.
//!
//! ## Architecture
//!
//! - **Envelope**: the flat JSON wire record tagged `call`/`request`/`response`
//! - **BridgeContext**: per-context shared state plus the single gateway task
//! - **Bridge**: one local endpoint's connection to one remote target
//! - **MethodRegistry**: named handlers shared by a context's bridges
//! - **EndpointRegistry**: lazy `sourceId` → bridge identity resolution
//! - **LocalHub**: in-process transport implementing the channel contract

pub mod bridge;
pub mod endpoint;
pub mod error;
pub mod gateway;
pub mod local;
pub mod message;
pub mod methods;
pub mod pending;
pub mod transport;

pub use bridge::{Bridge, BridgeOptions, REQUEST_TIMEOUT};
pub use error::BridgeError;
pub use gateway::BridgeContext;
pub use local::LocalHub;
pub use message::{Envelope, MessageKind, PROTOCOL_TAG};
pub use methods::{handler, sync_handler, MethodHandler, MethodRegistry};
pub use transport::{ChannelId, Inbound, MessageChannel, Transport};
