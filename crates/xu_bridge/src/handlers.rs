//! Payload handlers consulted when a failed status is raised.
//!
//! Each handler is keyed by the payload slot it understands. A status is
//! handed to a handler only when that slot is its one and only payload.

use std::sync::Arc;

use ahash::RandomState;
use hashbrown::HashMap;
use hashbrown::hash_map::Entry;
use parking_lot::RwLock;
use xu_status::{Payload, Status};

use crate::bridge::ExceptionBridge;
use crate::errors::{BridgeError, HandlerError};
use crate::exception::Exception;

pub type FastHashMap<K, V> = HashMap<K, V, RandomState>;

pub trait PayloadHandler: Send + Sync {
    /// Builds the exception to raise. `payload` has already been removed
    /// from `status`.
    fn handle(
        &self,
        bridge: &ExceptionBridge,
        payload: Payload,
        status: &Status,
    ) -> Result<Exception, BridgeError>;
}

impl<F> PayloadHandler for F
where
    F: Fn(&ExceptionBridge, Payload, &Status) -> Result<Exception, BridgeError> + Send + Sync,
{
    fn handle(
        &self,
        bridge: &ExceptionBridge,
        payload: Payload,
        status: &Status,
    ) -> Result<Exception, BridgeError> {
        self(bridge, payload, status)
    }
}

pub struct PayloadHandlerRegistry {
    handlers: RwLock<FastHashMap<String, Arc<dyn PayloadHandler>>>,
}

impl PayloadHandlerRegistry {
    pub fn new() -> Self {
        Self {
            handlers: RwLock::new(HashMap::with_hasher(RandomState::new())),
        }
    }

    /// Table holding `entries`; a later entry replaces an earlier one with
    /// the same key.
    pub(crate) fn with_entries<I>(entries: I) -> Self
    where
        I: IntoIterator<Item = (String, Arc<dyn PayloadHandler>)>,
    {
        let mut handlers: FastHashMap<String, Arc<dyn PayloadHandler>> =
            HashMap::with_hasher(RandomState::new());
        handlers.extend(entries);
        Self {
            handlers: RwLock::new(handlers),
        }
    }

    /// Adds a handler; each key can be registered once.
    pub fn register(
        &self,
        key: impl Into<String>,
        handler: Arc<dyn PayloadHandler>,
    ) -> Result<(), HandlerError> {
        let mut handlers = self.handlers.write();
        match handlers.entry(key.into()) {
            Entry::Occupied(e) => Err(HandlerError::AlreadyRegistered(e.key().clone())),
            Entry::Vacant(e) => {
                e.insert(handler);
                Ok(())
            }
        }
    }

    pub fn get(&self, key: &str) -> Option<Arc<dyn PayloadHandler>> {
        self.handlers.read().get(key).cloned()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.handlers.read().contains_key(key)
    }

    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.handlers.read().keys().cloned().collect();
        keys.sort();
        keys
    }
}

impl Default for PayloadHandlerRegistry {
    fn default() -> Self {
        Self::new()
    }
}
