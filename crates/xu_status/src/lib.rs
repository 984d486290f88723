//! Status values for the Xu native boundary.
//!
//! - `StatusCode` - canonical outcome codes
//! - `Status` - code, message and named payload slots
//! - `Payload` - slot bytes with an optional keep-alive owner

mod code;
mod payload;
mod status;

pub use code::StatusCode;
pub use payload::{Payload, PayloadOwner};
pub use status::Status;
