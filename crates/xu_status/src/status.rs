//! The status value returned by every fallible native call.

use std::fmt;

use indexmap::IndexMap;

use crate::{Payload, StatusCode};

/// A code, a message and an ordered set of named payload slots.
///
/// The code is fixed at construction. Message and payload slots may be
/// rewritten; replacing or erasing a slot drops its previous value (and
/// with it, any owner the old bytes carried).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Status {
    code: StatusCode,
    message: String,
    payload: IndexMap<String, Payload>,
}

impl Status {
    /// An `OK` code discards `message`: success carries no text.
    pub fn new(code: StatusCode, message: impl Into<String>) -> Self {
        let message = if code.is_ok() {
            String::new()
        } else {
            message.into()
        };
        Self {
            code,
            message,
            payload: IndexMap::new(),
        }
    }

    pub fn ok_status() -> Self {
        Self::new(StatusCode::Ok, "")
    }

    #[inline]
    pub fn is_ok(&self) -> bool {
        self.code.is_ok()
    }

    #[inline]
    pub fn code(&self) -> StatusCode {
        self.code
    }

    #[inline]
    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn set_message(&mut self, message: impl Into<String>) {
        if !self.code.is_ok() {
            self.message = message.into();
        }
    }

    /// Inserts or overwrites the slot at `key`. An existing slot keeps its
    /// position in the iteration order.
    pub fn set_payload(&mut self, key: impl Into<String>, payload: impl Into<Payload>) {
        self.payload.insert(key.into(), payload.into());
    }

    pub fn erase_payload(&mut self, key: &str) -> bool {
        self.payload.shift_remove(key).is_some()
    }

    pub fn take_payload(&mut self, key: &str) -> Option<Payload> {
        self.payload.shift_remove(key)
    }

    pub fn payload(&self, key: &str) -> Option<&Payload> {
        self.payload.get(key)
    }

    pub fn get_payload(&self, key: &str) -> Option<&[u8]> {
        self.payload.get(key).map(Payload::as_bytes)
    }

    pub fn payloads(&self) -> impl Iterator<Item = (&str, &Payload)> {
        self.payload.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn payload_keys(&self) -> impl Iterator<Item = &str> {
        self.payload.keys().map(String::as_str)
    }

    #[inline]
    pub fn payload_len(&self) -> usize {
        self.payload.len()
    }

    /// Snapshot of every slot's bytes, in insertion order. Owners are not
    /// part of the snapshot.
    pub fn all_payloads(&self) -> IndexMap<String, Vec<u8>> {
        self.payload
            .iter()
            .map(|(k, v)| (k.clone(), v.as_bytes().to_vec()))
            .collect()
    }
}

impl Default for Status {
    fn default() -> Self {
        Self::ok_status()
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_ok() {
            return f.write_str("OK");
        }
        write!(f, "{}: {}", self.code, self.message)?;
        for (key, payload) in &self.payload {
            write!(f, " [{}='{}']", key, payload.as_bytes().escape_ascii())?;
        }
        Ok(())
    }
}
