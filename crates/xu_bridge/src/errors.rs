//! Error types raised by the bridge itself.
//!
//! These are distinct from the application exceptions the bridge carries:
//! a `HandleError` always means the bridge could not resolve a token, never
//! that the bridged code failed.

use thiserror::Error;

use crate::exception::Exception;
use crate::registry::RegistryId;

pub mod messages {
    pub const MISSING_DELIMITERS: &str = "missing <xu_object:...> delimiters";
    pub const MISSING_FIELD_PREFIX: &str = "expected ':0x' before a field";
    pub const SHORT_FIELD: &str = "field shorter than 16 hex digits";
    pub const BAD_HEX_DIGIT: &str = "non-hex digit in field";
    pub const TRAILING_BYTES: &str = "unexpected bytes after the last field";
}

/// Token bytes that do not follow the `<xu_object:0x..:0x..:0x..>` grammar.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TokenFormatError {
    #[error("invalid <xu_object> token: {len} bytes exceeds the {max}-byte limit")]
    TooLong { len: usize, max: usize },

    #[error("invalid <xu_object> token: {0}")]
    Malformed(&'static str),
}

/// A well-formed handle that does not resolve to a live object.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HandleError {
    #[error("handle was minted by registry {found}, not by registry {expected}")]
    ForeignRegistry {
        expected: RegistryId,
        found: RegistryId,
    },

    #[error("no live object at slot {slot} with nonce {nonce:#x}")]
    Stale { slot: u64, nonce: u64 },

    #[error("token bytes are not owned by the payload slot that carries them")]
    Detached,

    #[error("registered object is not a {expected}")]
    TypeMismatch { expected: &'static str },
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HandlerError {
    #[error("status handler for payload key {0:?} is already registered")]
    AlreadyRegistered(String),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BridgeError {
    #[error(transparent)]
    Token(#[from] TokenFormatError),

    #[error(transparent)]
    Handle(#[from] HandleError),
}

/// Outcome of raising a failed status: either the reconstructed exception
/// or a failure of the bridge while reconstructing it.
#[derive(Error, Debug, Clone)]
pub enum Raised {
    #[error(transparent)]
    Exception(#[from] Exception),

    #[error(transparent)]
    Bridge(#[from] BridgeError),
}

impl Raised {
    pub fn exception(&self) -> Option<&Exception> {
        match self {
            Raised::Exception(e) => Some(e),
            Raised::Bridge(_) => None,
        }
    }

    pub fn into_exception(self) -> Option<Exception> {
        match self {
            Raised::Exception(e) => Some(e),
            Raised::Bridge(_) => None,
        }
    }
}
