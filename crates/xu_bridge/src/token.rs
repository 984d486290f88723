//! Textual form of a registry handle.
//!
//!   <xu_object:0x{registry}:0x{slot}:0x{nonce}>
//!
//! Each field is exactly 16 hex digits. Tokens only mean something inside
//! the process and registry instance that minted them.

use crate::errors::{BridgeError, TokenFormatError, messages};
use crate::registry::{Handle, ObjectRegistry, RegistryId};

pub const TOKEN_TAG: &str = "xu_object";

/// Upper bound on token length; longer input is rejected before parsing.
pub const TOKEN_MAX_LEN: usize = 80;

const FIELD_DIGITS: usize = 16;

pub fn encode(handle: Handle) -> Vec<u8> {
    format!(
        "<{TOKEN_TAG}:0x{:016x}:0x{:016x}:0x{:016x}>",
        handle.registry.0, handle.slot, handle.nonce
    )
    .into_bytes()
}

/// Structural decoding only; nothing is resolved.
pub fn parse(bytes: &[u8]) -> Result<Handle, TokenFormatError> {
    if bytes.len() > TOKEN_MAX_LEN {
        return Err(TokenFormatError::TooLong {
            len: bytes.len(),
            max: TOKEN_MAX_LEN,
        });
    }
    let body = bytes
        .strip_prefix(b"<")
        .and_then(|b| b.strip_prefix(TOKEN_TAG.as_bytes()))
        .and_then(|b| b.strip_suffix(b">"))
        .ok_or(TokenFormatError::Malformed(messages::MISSING_DELIMITERS))?;

    let mut fields = [0u64; 3];
    let mut rest = body;
    for field in &mut fields {
        rest = rest
            .strip_prefix(b":0x")
            .ok_or(TokenFormatError::Malformed(messages::MISSING_FIELD_PREFIX))?;
        if rest.len() < FIELD_DIGITS {
            return Err(TokenFormatError::Malformed(messages::SHORT_FIELD));
        }
        let (digits, tail) = rest.split_at(FIELD_DIGITS);
        *field = parse_hex(digits)?;
        rest = tail;
    }
    if !rest.is_empty() {
        return Err(TokenFormatError::Malformed(messages::TRAILING_BYTES));
    }

    let [registry, slot, nonce] = fields;
    Ok(Handle {
        registry: RegistryId(registry),
        slot,
        nonce,
    })
}

fn parse_hex(digits: &[u8]) -> Result<u64, TokenFormatError> {
    digits.iter().try_fold(0u64, |acc, &b| {
        let d = char::from(b)
            .to_digit(16)
            .ok_or(TokenFormatError::Malformed(messages::BAD_HEX_DIGIT))?;
        Ok((acc << 4) | u64::from(d))
    })
}

/// Parses `bytes` and checks the handle against `registry`.
pub fn decode(registry: &ObjectRegistry, bytes: &[u8]) -> Result<Handle, BridgeError> {
    let handle = parse(bytes)?;
    registry.validate(handle)?;
    Ok(handle)
}
