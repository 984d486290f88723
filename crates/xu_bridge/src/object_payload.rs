//! Objects riding along in status payload slots.
//!
//! A slot written here holds token bytes plus a [`TokenOwner`] that owns the
//! registry reference. Overwriting or erasing the slot, or dropping the last
//! clone of the status, drops the owner and releases the reference. Token
//! bytes copied into another slot without the owner are not honoured.

use std::any::Any;
use std::sync::Arc;

use xu_status::{Payload, Status};

use crate::errors::{BridgeError, HandleError};
use crate::registry::{Handle, ObjectRegistry, SharedObject, downcast, type_mismatch};
use crate::token;

/// Owns one registry reference on behalf of a payload slot.
pub(crate) struct TokenOwner {
    registry: Arc<ObjectRegistry>,
    handle: Option<Handle>,
}

impl TokenOwner {
    fn handle(&self) -> Option<Handle> {
        self.handle
    }

    fn into_object(mut self) -> Result<SharedObject, HandleError> {
        match self.handle.take() {
            Some(handle) => self.registry.release_and_fetch(handle),
            None => Err(HandleError::Detached),
        }
    }
}

impl Drop for TokenOwner {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.take() {
            if let Err(err) = self.registry.release(handle) {
                tracing::debug!(%err, "token owner released an unknown handle");
            }
        }
    }
}

/// Registers `object` and returns a payload naming it.
pub fn token_payload(registry: &Arc<ObjectRegistry>, object: SharedObject) -> Payload {
    let handle = registry.store(object);
    let owner = TokenOwner {
        registry: Arc::clone(registry),
        handle: Some(handle),
    };
    Payload::with_owner(token::encode(handle), Arc::new(owner))
}

/// Writes `object` to the slot at `key`; `None` erases the slot.
pub fn write_object_to_payload<T: Any + Send + Sync>(
    registry: &Arc<ObjectRegistry>,
    status: &mut Status,
    key: &str,
    object: Option<Arc<T>>,
) {
    write_shared_to_payload(registry, status, key, object.map(|o| o as SharedObject));
}

pub fn write_shared_to_payload(
    registry: &Arc<ObjectRegistry>,
    status: &mut Status,
    key: &str,
    object: Option<SharedObject>,
) {
    match object {
        Some(object) => status.set_payload(key, token_payload(registry, object)),
        None => {
            status.erase_payload(key);
        }
    }
}

/// Checks that `payload` carries a live token together with its owner and
/// returns the handle.
fn owned_handle(registry: &ObjectRegistry, payload: &Payload) -> Result<Handle, BridgeError> {
    let handle = token::decode(registry, payload.as_bytes())?;
    let owner = payload
        .owner()
        .and_then(|o| o.downcast_ref::<TokenOwner>())
        .ok_or(HandleError::Detached)?;
    if owner.handle() != Some(handle) {
        return Err(HandleError::Detached.into());
    }
    Ok(handle)
}

/// Reads the object at `key` without releasing it. An absent slot is
/// `Ok(None)`.
pub fn read_object_from_payload<T: Any + Send + Sync>(
    registry: &ObjectRegistry,
    status: &Status,
    key: &str,
) -> Result<Option<Arc<T>>, BridgeError> {
    let Some(payload) = status.payload(key) else {
        return Ok(None);
    };
    let handle = owned_handle(registry, payload)?;
    Ok(Some(registry.borrow_as::<T>(handle)?))
}

/// Removes the slot at `key` and returns its object. On any error,
/// including a type mismatch, the slot and its reference stay in place.
pub fn take_object_from_payload<T: Any + Send + Sync>(
    registry: &ObjectRegistry,
    status: &mut Status,
    key: &str,
) -> Result<Option<Arc<T>>, BridgeError> {
    let Some(payload) = status.payload(key) else {
        return Ok(None);
    };
    let handle = owned_handle(registry, payload)?;
    if !registry.borrow(handle)?.is::<T>() {
        return Err(type_mismatch::<T>().into());
    }
    let Some(payload) = status.take_payload(key) else {
        return Ok(None);
    };
    let object = consume_payload(registry, payload)?;
    Ok(Some(downcast::<T>(object)?))
}

/// Consumes a token payload. When this payload held the last clone of the
/// owner the registry reference is released and fetched; otherwise the
/// object is borrowed and the remaining clones keep the reference alive.
pub fn consume_payload(registry: &ObjectRegistry, payload: Payload) -> Result<SharedObject, BridgeError> {
    let handle = owned_handle(registry, &payload)?;
    let owner = payload
        .into_owner()
        .and_then(|o| o.downcast::<TokenOwner>().ok())
        .ok_or(HandleError::Detached)?;
    match Arc::try_unwrap(owner) {
        Ok(owner) => Ok(owner.into_object()?),
        Err(shared) => {
            let object = registry.borrow(handle)?;
            drop(shared);
            Ok(object)
        }
    }
}

/// Sends `object` through a token and back.
pub fn pass_through<T: Any + Send + Sync>(
    registry: &Arc<ObjectRegistry>,
    object: Arc<T>,
) -> Result<Arc<T>, BridgeError> {
    let payload = token_payload(registry, object);
    let object = consume_payload(registry, payload)?;
    Ok(downcast::<T>(object)?)
}
