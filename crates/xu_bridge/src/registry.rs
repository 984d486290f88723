//! Registry of objects referenced from status payloads.
//!
//! A payload slot can only carry bytes, so objects that ride along in a
//! status are parked here and named by a [`Handle`]. The registry keeps one
//! strong reference per live handle. Slots are recycled through a free list
//! and every slot carries a generation counter; the generation in force when
//! a handle was minted is its nonce, so a handle to a released slot never
//! resolves to whatever was stored there afterwards.

use std::any::Any;
use std::fmt;
use std::hash::BuildHasher;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use ahash::RandomState;
use once_cell::sync::Lazy;
use parking_lot::Mutex;

use crate::errors::HandleError;

/// An object owned by the registry.
pub type SharedObject = Arc<dyn Any + Send + Sync>;

/// Identity of one registry instance.
///
/// The high half is random per process, the low half counts instances.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct RegistryId(pub u64);

impl fmt::Display for RegistryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#018x}", self.0)
    }
}

/// Names one registered reference.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Handle {
    pub registry: RegistryId,
    pub slot: u64,
    pub nonce: u64,
}

static PROCESS_TAG: Lazy<u64> = Lazy::new(|| {
    let seed = RandomState::new();
    BuildHasher::hash_one(&seed, std::process::id()) & 0xFFFF_FFFF_0000_0000
});

static INSTANCE_COUNTER: AtomicU64 = AtomicU64::new(1);

static GLOBAL: Lazy<Arc<ObjectRegistry>> = Lazy::new(|| Arc::new(ObjectRegistry::new()));

fn next_registry_id() -> RegistryId {
    let n = INSTANCE_COUNTER.fetch_add(1, Ordering::Relaxed);
    RegistryId(*PROCESS_TAG | (n & 0xFFFF_FFFF))
}

struct Slot {
    generation: u64,
    object: Option<SharedObject>,
}

struct Table {
    slots: Vec<Slot>,
    free_list: Vec<usize>,
    live: usize,
}

impl Table {
    fn locate(&self, id: RegistryId, handle: Handle) -> Result<usize, HandleError> {
        if handle.registry != id {
            return Err(HandleError::ForeignRegistry {
                expected: id,
                found: handle.registry,
            });
        }
        let stale = HandleError::Stale {
            slot: handle.slot,
            nonce: handle.nonce,
        };
        let Ok(idx) = usize::try_from(handle.slot) else {
            return Err(stale);
        };
        match self.slots.get(idx) {
            Some(slot) if slot.generation == handle.nonce && slot.object.is_some() => Ok(idx),
            _ => Err(stale),
        }
    }

    fn take(&mut self, idx: usize) -> Option<SharedObject> {
        let slot = &mut self.slots[idx];
        let object = slot.object.take()?;
        slot.generation = next_generation(slot.generation);
        self.free_list.push(idx);
        self.live -= 1;
        Some(object)
    }
}

fn next_generation(generation: u64) -> u64 {
    // Zero is never a valid nonce.
    match generation.wrapping_add(1) {
        0 => 1,
        g => g,
    }
}

pub struct ObjectRegistry {
    id: RegistryId,
    table: Mutex<Table>,
}

impl ObjectRegistry {
    pub fn new() -> Self {
        Self {
            id: next_registry_id(),
            table: Mutex::new(Table {
                slots: Vec::new(),
                free_list: Vec::new(),
                live: 0,
            }),
        }
    }

    /// The process-wide instance.
    pub fn global() -> Arc<ObjectRegistry> {
        Arc::clone(&GLOBAL)
    }

    #[inline]
    pub fn id(&self) -> RegistryId {
        self.id
    }

    /// Registers one more strong reference to `object`.
    pub fn store(&self, object: SharedObject) -> Handle {
        let mut table = self.table.lock();
        let idx = match table.free_list.pop() {
            Some(idx) => {
                table.slots[idx].object = Some(object);
                idx
            }
            None => {
                table.slots.push(Slot {
                    generation: 1,
                    object: Some(object),
                });
                table.slots.len() - 1
            }
        };
        table.live += 1;
        let handle = Handle {
            registry: self.id,
            slot: idx as u64,
            nonce: table.slots[idx].generation,
        };
        tracing::trace!(slot = handle.slot, nonce = handle.nonce, "registry store");
        handle
    }

    pub fn store_arc<T: Any + Send + Sync>(&self, object: Arc<T>) -> Handle {
        self.store(object)
    }

    /// Checks that `handle` names a live entry of this registry.
    pub fn validate(&self, handle: Handle) -> Result<(), HandleError> {
        let table = self.table.lock();
        table.locate(self.id, handle).map(|_| ()).inspect_err(|err| {
            tracing::debug!(%err, "registry rejected handle");
        })
    }

    pub fn contains(&self, handle: Handle) -> bool {
        let table = self.table.lock();
        table.locate(self.id, handle).is_ok()
    }

    /// Resolves `handle` without giving up the registry's reference.
    pub fn borrow(&self, handle: Handle) -> Result<SharedObject, HandleError> {
        let table = self.table.lock();
        let idx = table.locate(self.id, handle).inspect_err(|err| {
            tracing::debug!(%err, "registry rejected handle");
        })?;
        match &table.slots[idx].object {
            Some(object) => Ok(Arc::clone(object)),
            None => Err(HandleError::Stale {
                slot: handle.slot,
                nonce: handle.nonce,
            }),
        }
    }

    pub fn borrow_as<T: Any + Send + Sync>(&self, handle: Handle) -> Result<Arc<T>, HandleError> {
        downcast(self.borrow(handle)?)
    }

    /// Resolves `handle` and drops the registry's reference to it.
    pub fn release_and_fetch(&self, handle: Handle) -> Result<SharedObject, HandleError> {
        let mut table = self.table.lock();
        let idx = table.locate(self.id, handle).inspect_err(|err| {
            tracing::debug!(%err, "registry rejected handle");
        })?;
        let object = table.take(idx).ok_or(HandleError::Stale {
            slot: handle.slot,
            nonce: handle.nonce,
        })?;
        tracing::trace!(slot = handle.slot, nonce = handle.nonce, "registry release");
        Ok(object)
    }

    /// Like [`Self::release_and_fetch`], but leaves the entry in place when
    /// the object is not a `T`.
    pub fn release_and_fetch_as<T: Any + Send + Sync>(
        &self,
        handle: Handle,
    ) -> Result<Arc<T>, HandleError> {
        {
            let table = self.table.lock();
            let idx = table.locate(self.id, handle)?;
            if !table.slots[idx].object.as_ref().is_some_and(|o| o.is::<T>()) {
                return Err(type_mismatch::<T>());
            }
        }
        downcast(self.release_and_fetch(handle)?)
    }

    /// Drops the registry's reference to `handle`.
    pub fn release(&self, handle: Handle) -> Result<(), HandleError> {
        // The object is dropped after the lock is gone: it may own tokens of
        // its own.
        let object = self.release_and_fetch(handle)?;
        drop(object);
        Ok(())
    }

    pub fn live_count(&self) -> usize {
        self.table.lock().live
    }
}

impl Default for ObjectRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ObjectRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObjectRegistry")
            .field("id", &self.id)
            .field("live", &self.live_count())
            .finish()
    }
}

pub(crate) fn type_mismatch<T>() -> HandleError {
    HandleError::TypeMismatch {
        expected: std::any::type_name::<T>(),
    }
}

pub(crate) fn downcast<T: Any + Send + Sync>(object: SharedObject) -> Result<Arc<T>, HandleError> {
    object.downcast::<T>().map_err(|_| type_mismatch::<T>())
}
