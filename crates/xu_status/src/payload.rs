//! Payload slot values.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

/// Opaque keep-alive attached to payload bytes.
///
/// Whatever the bytes refer to stays alive while any clone of the payload
/// holds the owner. Dropping the last clone drops the owner.
pub type PayloadOwner = Arc<dyn Any + Send + Sync>;

/// Bytes stored in a status payload slot, plus an optional owner.
#[derive(Clone)]
pub struct Payload {
    bytes: Arc<[u8]>,
    owner: Option<PayloadOwner>,
}

impl Payload {
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            bytes: Arc::from(bytes.into()),
            owner: None,
        }
    }

    pub fn with_owner(bytes: impl Into<Vec<u8>>, owner: PayloadOwner) -> Self {
        Self {
            bytes: Arc::from(bytes.into()),
            owner: Some(owner),
        }
    }

    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn owner(&self) -> Option<&PayloadOwner> {
        self.owner.as_ref()
    }

    pub fn has_owner(&self) -> bool {
        self.owner.is_some()
    }

    /// Same bytes, no owner.
    pub fn detached(&self) -> Payload {
        Payload {
            bytes: Arc::clone(&self.bytes),
            owner: None,
        }
    }

    pub fn into_owner(self) -> Option<PayloadOwner> {
        self.owner
    }
}

impl PartialEq for Payload {
    fn eq(&self, other: &Self) -> bool {
        self.bytes == other.bytes
    }
}

impl Eq for Payload {}

impl fmt::Debug for Payload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Payload")
            .field("bytes", &self.bytes.escape_ascii().to_string())
            .field("owned", &self.owner.is_some())
            .finish()
    }
}

impl From<Vec<u8>> for Payload {
    fn from(bytes: Vec<u8>) -> Self {
        Payload::new(bytes)
    }
}

impl From<&[u8]> for Payload {
    fn from(bytes: &[u8]) -> Self {
        Payload::new(bytes)
    }
}

impl From<&str> for Payload {
    fn from(s: &str) -> Self {
        Payload::new(s.as_bytes())
    }
}

impl From<String> for Payload {
    fn from(s: String) -> Self {
        Payload::new(s.into_bytes())
    }
}
