//! Exception bridge for the Xu native boundary.
//!
//! Native calls report failure through a [`Status`]. This crate lets a
//! status carry host exceptions, with their cause and context chains, and
//! rebuilds them on the other side:
//! - `registry` - owns objects referenced from payload slots
//! - `token` - textual handle embedded in a payload slot
//! - `mapping` - status codes and exception kinds
//! - `bridge` - capture and reconstruction

pub mod bridge;
pub mod chain;
pub mod config;
pub mod errors;
pub mod exception;
pub mod handlers;
pub mod mapping;
pub mod object_payload;
pub mod registry;
pub mod token;

pub use xu_status::{Payload, Status, StatusCode};

pub use bridge::{Dispatch, EXCEPTION_CAUSE_KEY, ExceptionBridge, PayloadSlot, RAW_EXCEPTION_KEY};
pub use chain::{ChainBuilder, ChainLink};
pub use config::{BridgeConfig, UnresolvedToken};
pub use errors::{BridgeError, HandleError, HandlerError, Raised, TokenFormatError};
pub use exception::{Exception, Frame};
pub use handlers::{PayloadHandler, PayloadHandlerRegistry};
pub use mapping::{ErrorKind, KindInfo, format_status_message};
pub use object_payload::{
    pass_through, read_object_from_payload, take_object_from_payload, write_object_to_payload,
};
pub use registry::{Handle, ObjectRegistry, RegistryId, SharedObject};
