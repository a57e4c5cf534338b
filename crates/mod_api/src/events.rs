//! Host-wide publish/subscribe bus and the mod lifecycle events.
//!
//! Events are addressed by string keys in two namespaces:
//!
//! - `core:<event>` for host events, including the lifecycle stages
//! - `mod:<mod id>:<event>` for events a mod publishes for other mods
//!
//! Payloads travel as JSON so that handlers compiled into a different
//! dynamic library than the emitter never share in-memory layouts.

use crate::version::Version;
use dashmap::DashMap;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::any::Any;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, error};

/// Event key suffix of the pre-initialization broadcast.
pub const MOD_PRE_INIT: &str = "mod_pre_init";
/// Event key suffix of the initialization broadcast.
pub const MOD_INIT: &str = "mod_init";
/// Event key suffix of the post-initialization broadcast.
pub const MOD_POST_INIT: &str = "mod_post_init";

/// Errors raised while publishing or handling events.
#[derive(Debug, thiserror::Error)]
pub enum EventError {
    /// Serialization failed when converting event to bytes
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    /// Deserialization failed when converting bytes to event
    #[error("Deserialization error: {0}")]
    Deserialization(serde_json::Error),
    /// Handler execution failed during event processing
    #[error("Handler execution error: {0}")]
    HandlerExecution(String),
}

impl EventError {
    pub fn handler(message: impl Into<String>) -> Self {
        Self::HandlerExecution(message.into())
    }
}

/// Anything that can travel over the bus.
///
/// Implemented automatically for every serde-serializable type.
pub trait Event: Send + Sync + Any + std::fmt::Debug {
    fn type_name() -> &'static str
    where
        Self: Sized;

    fn serialize(&self) -> Result<Vec<u8>, EventError>;

    fn deserialize(data: &[u8]) -> Result<Self, EventError>
    where
        Self: Sized;
}

impl<T> Event for T
where
    T: Serialize + DeserializeOwned + Send + Sync + Any + std::fmt::Debug + 'static,
{
    fn type_name() -> &'static str {
        std::any::type_name::<T>()
    }

    fn serialize(&self) -> Result<Vec<u8>, EventError> {
        serde_json::to_vec(self).map_err(EventError::Serialization)
    }

    fn deserialize(data: &[u8]) -> Result<Self, EventError> {
        serde_json::from_slice(data).map_err(EventError::Deserialization)
    }
}

/// Type-erased handler stored on the bus.
pub trait EventHandler: Send + Sync {
    fn handle(&self, data: &[u8]) -> Result<(), EventError>;

    fn handler_name(&self) -> &str;
}

/// Bridges a closure over a concrete event type to [`EventHandler`].
pub struct TypedEventHandler<T, F>
where
    T: Event,
    F: Fn(T) -> Result<(), EventError> + Send + Sync,
{
    handler: F,
    name: String,
    _phantom: std::marker::PhantomData<fn(T)>,
}

impl<T, F> TypedEventHandler<T, F>
where
    T: Event,
    F: Fn(T) -> Result<(), EventError> + Send + Sync,
{
    pub fn new(name: String, handler: F) -> Self {
        Self {
            handler,
            name,
            _phantom: std::marker::PhantomData,
        }
    }
}

impl<T, F> EventHandler for TypedEventHandler<T, F>
where
    T: Event,
    F: Fn(T) -> Result<(), EventError> + Send + Sync,
{
    fn handle(&self, data: &[u8]) -> Result<(), EventError> {
        let event = T::deserialize(data)?;
        (self.handler)(event)
    }

    fn handler_name(&self) -> &str {
        &self.name
    }
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct EventBusStats {
    /// Total number of registered event handlers
    pub total_handlers: usize,
    /// Total number of events emitted since the bus was created
    pub events_emitted: u64,
}

/// The host-wide event bus.
///
/// Dispatch is synchronous: `emit_*` runs every handler registered for the
/// key, in registration order, before returning. The first handler error
/// stops the dispatch and is returned to the emitter.
///
/// ```rust
/// use mod_api::EventBus;
///
/// let events = EventBus::new();
/// events
///     .on_core("world_ready", |event: serde_json::Value| {
///         println!("world ready: {event}");
///         Ok(())
///     })
///     .unwrap();
/// events.emit_core("world_ready", &serde_json::json!({ "seed": 7 })).unwrap();
/// ```
#[derive(Default)]
pub struct EventBus {
    handlers: DashMap<String, Vec<Arc<dyn EventHandler>>>,
    events_emitted: AtomicU64,
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus")
            .field("handlers", &self.handler_count())
            .field("events_emitted", &self.events_emitted.load(Ordering::Relaxed))
            .finish()
    }
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a handler for a host event.
    pub fn on_core<T, F>(&self, event_name: &str, handler: F) -> Result<(), EventError>
    where
        T: Event + 'static,
        F: Fn(T) -> Result<(), EventError> + Send + Sync + 'static,
    {
        self.register_typed_handler(core_key(event_name), event_name, handler)
    }

    /// Registers a handler for an event published by the mod `mod_id`.
    pub fn on_mod<T, F>(&self, mod_id: &str, event_name: &str, handler: F) -> Result<(), EventError>
    where
        T: Event + 'static,
        F: Fn(T) -> Result<(), EventError> + Send + Sync + 'static,
    {
        self.register_typed_handler(mod_key(mod_id, event_name), event_name, handler)
    }

    fn register_typed_handler<T, F>(
        &self,
        event_key: String,
        event_name: &str,
        handler: F,
    ) -> Result<(), EventError>
    where
        T: Event + 'static,
        F: Fn(T) -> Result<(), EventError> + Send + Sync + 'static,
    {
        let handler_name = format!("{}::{}", event_key, T::type_name());
        let typed_handler = TypedEventHandler::new(handler_name, handler);
        self.handlers
            .entry(event_key.clone())
            .or_default()
            .push(Arc::new(typed_handler));
        debug!("Registered handler for {} ({})", event_key, event_name);
        Ok(())
    }

    /// Publishes a host event.
    pub fn emit_core<T>(&self, event_name: &str, event: &T) -> Result<(), EventError>
    where
        T: Event,
    {
        self.emit_event(&core_key(event_name), event)
    }

    /// Publishes an event in the namespace of the mod `mod_id`.
    pub fn emit_mod<T>(&self, mod_id: &str, event_name: &str, event: &T) -> Result<(), EventError>
    where
        T: Event,
    {
        self.emit_event(&mod_key(mod_id, event_name), event)
    }

    fn emit_event<T>(&self, event_key: &str, event: &T) -> Result<(), EventError>
    where
        T: Event,
    {
        let data = event.serialize()?;
        // Snapshot so handlers may register further handlers while running.
        let handlers: Vec<Arc<dyn EventHandler>> = match self.handlers.get(event_key) {
            Some(entry) => entry.value().clone(),
            None => Vec::new(),
        };
        self.events_emitted.fetch_add(1, Ordering::Relaxed);

        if handlers.is_empty() {
            debug!("No handlers for event: {}", event_key);
            return Ok(());
        }

        debug!("Emitting {} to {} handler(s)", event_key, handlers.len());
        for handler in handlers {
            if let Err(e) = handler.handle(&data) {
                error!("Handler {} failed: {}", handler.handler_name(), e);
                return Err(e);
            }
        }
        Ok(())
    }

    pub fn handler_count(&self) -> usize {
        self.handlers.iter().map(|entry| entry.value().len()).sum()
    }

    pub fn get_stats(&self) -> EventBusStats {
        EventBusStats {
            total_handlers: self.handler_count(),
            events_emitted: self.events_emitted.load(Ordering::Relaxed),
        }
    }
}

fn core_key(event_name: &str) -> String {
    format!("core:{}", event_name)
}

fn mod_key(mod_id: &str, event_name: &str) -> String {
    format!("mod:{}:{}", mod_id.to_lowercase(), event_name)
}

// ============================================================================
// Lifecycle Events
// ============================================================================

/// Published on `core:mod_pre_init` once every mod is constructed and wired.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModPreInitEvent {
    pub host_version: Version,
    pub mod_count: usize,
}

/// Published on `core:mod_init` after pre-initialization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModInitEvent {
    pub host_version: Version,
    pub mod_count: usize,
}

/// Published on `core:mod_post_init` after initialization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModPostInitEvent {
    pub host_version: Version,
    pub mod_count: usize,
}
