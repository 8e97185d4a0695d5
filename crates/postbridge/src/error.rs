//! Errors surfaced by the protocol layer.

use std::time::Duration;
use thiserror::Error;

/// Errors from the bridge layer.
///
/// Routing failures (foreign traffic, unresolvable endpoints, unknown
/// methods, spurious responses) are absorbed and logged, never returned;
/// [`BridgeError::Timeout`] is the only failure application code observes
/// through the protocol itself.
#[derive(Debug, Error)]
pub enum BridgeError {
    /// The request was not answered within the configured window. Also the
    /// sole signal for "remote has no such method".
    #[error("request timed out after {elapsed:?}")]
    Timeout {
        /// How long the requester waited.
        elapsed: Duration,
    },

    /// The pending entry was dropped without settling. Not reachable through
    /// normal protocol operation.
    #[error("response channel closed before a value arrived")]
    ChannelClosed,

    /// An envelope could not be converted to a JSON payload.
    #[error("JSON error: {0}")]
    Serialize(#[from] serde_json::Error),
}
