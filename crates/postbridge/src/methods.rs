//! Method registry — named handlers shared by every bridge in a context.
//!
//! A deliberately simple mutable configuration surface: register merges
//! entries with last-write-wins, unregistering a missing name is a no-op,
//! and nothing validates a handler beyond its signature. Both synchronous
//! and asynchronous application functions are supported through the
//! [`sync_handler`] / [`handler`] adaptors; dispatch always treats the
//! result as a deferred value.

use crate::bridge::BridgeOptions;

use dashmap::DashMap;
use futures::future::BoxFuture;
use futures::FutureExt;
use serde_json::Value;
use std::future::Future;
use std::sync::Arc;

/// A registered method handler. Invoked with the message `params` and the
/// receiving bridge's options.
pub type MethodHandler = Arc<dyn Fn(Value, BridgeOptions) -> BoxFuture<'static, Value> + Send + Sync>;

/// Wrap an asynchronous function as a [`MethodHandler`].
pub fn handler<F, Fut>(f: F) -> MethodHandler
where
    F: Fn(Value, BridgeOptions) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Value> + Send + 'static,
{
    Arc::new(move |params, options| f(params, options).boxed())
}

/// Wrap a synchronous function as a [`MethodHandler`].
pub fn sync_handler<F>(f: F) -> MethodHandler
where
    F: Fn(Value, BridgeOptions) -> Value + Send + Sync + 'static,
{
    Arc::new(move |params, options| futures::future::ready(f(params, options)).boxed())
}

/// Thread-safe mapping of method name to handler.
///
/// Cloning yields another handle to the same underlying map, so all bridges
/// created from one context observe every registration.
#[derive(Clone, Default)]
pub struct MethodRegistry {
    handlers: Arc<DashMap<String, MethodHandler>>,
}

impl MethodRegistry {
    /// Create a new empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Merge entries into the registry; last write wins for duplicates.
    pub fn register<I, S>(&self, entries: I)
    where
        I: IntoIterator<Item = (S, MethodHandler)>,
        S: Into<String>,
    {
        for (name, handler) in entries {
            self.handlers.insert(name.into(), handler);
        }
    }

    /// Remove entries by name. Missing names are no-ops.
    pub fn unregister<I, S>(&self, names: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for name in names {
            self.handlers.remove(name.as_ref());
        }
    }

    /// Look up a handler by name.
    pub fn lookup(&self, name: &str) -> Option<MethodHandler> {
        self.handlers.get(name).map(|entry| Arc::clone(entry.value()))
    }

    /// Number of registered methods.
    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    /// Whether no methods are registered.
    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}
