//! Moving exceptions through statuses and back.
//!
//! Capture parks the exception in the registry and names it from a
//! well-known payload slot. Raising a failed status looks at its payload:
//! exactly one slot with a registered handler selects that handler; no
//! recognized slot, or a recognized slot next to any other slot, falls back
//! to an exception built from code and message alone.

use std::sync::Arc;

use once_cell::sync::Lazy;
use xu_status::{Payload, Status, StatusCode};

use crate::config::{BridgeConfig, UnresolvedToken};
use crate::errors::{BridgeError, HandlerError, Raised};
use crate::exception::Exception;
use crate::handlers::{PayloadHandler, PayloadHandlerRegistry};
use crate::mapping::{ErrorKind, format_status_message};
use crate::object_payload::{consume_payload, write_shared_to_payload};
use crate::registry::ObjectRegistry;

/// Slot holding an exception to re-raise as is.
pub const RAW_EXCEPTION_KEY: &str = "xu.bridge.exception";

/// Slot holding the cause of an exception synthesized from the status.
pub const EXCEPTION_CAUSE_KEY: &str = "xu.bridge.exception_cause";

/// The well-known exception slots.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PayloadSlot {
    Raw,
    CausedBy,
}

impl PayloadSlot {
    pub const ALL: [PayloadSlot; 2] = [PayloadSlot::Raw, PayloadSlot::CausedBy];

    pub fn key(self) -> &'static str {
        match self {
            PayloadSlot::Raw => RAW_EXCEPTION_KEY,
            PayloadSlot::CausedBy => EXCEPTION_CAUSE_KEY,
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|slot| slot.key() == key)
    }
}

/// How a failed status will be raised.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Dispatch {
    /// No slot with a registered handler.
    Plain,
    /// The status's only slot has a handler.
    Handler(String),
    /// A handled slot shares the payload with other slots.
    Ambiguous,
}

struct RawExceptionHandler;

impl PayloadHandler for RawExceptionHandler {
    fn handle(
        &self,
        bridge: &ExceptionBridge,
        payload: Payload,
        _status: &Status,
    ) -> Result<Exception, BridgeError> {
        bridge.take_exception(payload)
    }
}

struct ExceptionCauseHandler;

impl PayloadHandler for ExceptionCauseHandler {
    fn handle(
        &self,
        bridge: &ExceptionBridge,
        payload: Payload,
        status: &Status,
    ) -> Result<Exception, BridgeError> {
        let cause = bridge.take_exception(payload)?;
        Ok(bridge.default_exception(status).caused_by(cause))
    }
}

static GLOBAL: Lazy<ExceptionBridge> = Lazy::new(|| ExceptionBridge::new(ObjectRegistry::global()));

pub struct ExceptionBridge {
    registry: Arc<ObjectRegistry>,
    handlers: PayloadHandlerRegistry,
    config: BridgeConfig,
}

impl ExceptionBridge {
    pub fn new(registry: Arc<ObjectRegistry>) -> Self {
        Self::with_config(registry, BridgeConfig::default())
    }

    pub fn with_config(registry: Arc<ObjectRegistry>, config: BridgeConfig) -> Self {
        let builtin: [(PayloadSlot, Arc<dyn PayloadHandler>); 2] = [
            (PayloadSlot::Raw, Arc::new(RawExceptionHandler)),
            (PayloadSlot::CausedBy, Arc::new(ExceptionCauseHandler)),
        ];
        let handlers = PayloadHandlerRegistry::with_entries(
            builtin
                .into_iter()
                .map(|(slot, handler)| (slot.key().to_owned(), handler)),
        );
        Self {
            registry,
            handlers,
            config,
        }
    }

    /// Bridge over the process-wide registry.
    pub fn global() -> &'static ExceptionBridge {
        &GLOBAL
    }

    pub fn registry(&self) -> &Arc<ObjectRegistry> {
        &self.registry
    }

    pub fn config(&self) -> &BridgeConfig {
        &self.config
    }

    pub fn handlers(&self) -> &PayloadHandlerRegistry {
        &self.handlers
    }

    pub fn register_handler(
        &self,
        key: impl Into<String>,
        handler: Arc<dyn PayloadHandler>,
    ) -> Result<(), HandlerError> {
        self.handlers.register(key, handler)
    }

    /// Status carrying `exception` for verbatim re-raise. Code and message
    /// come from the exception's kind and text.
    pub fn capture(&self, exception: &Exception) -> Status {
        self.status_with_slot(
            exception.kind().status_code(),
            exception.message(),
            PayloadSlot::Raw,
            Some(exception.clone()),
        )
    }

    /// Status that re-raises `exception` as is. `None` means nothing
    /// failed and yields `OK`.
    pub fn status_with_raw(
        &self,
        code: StatusCode,
        message: &str,
        exception: Option<Exception>,
    ) -> Status {
        self.status_with_slot(code, message, PayloadSlot::Raw, exception)
    }

    /// Status whose exception is built from `code` and `message` and raised
    /// from `exception`. `None` yields `OK`.
    pub fn status_caused_by(
        &self,
        code: StatusCode,
        message: &str,
        exception: Option<Exception>,
    ) -> Status {
        self.status_with_slot(code, message, PayloadSlot::CausedBy, exception)
    }

    fn status_with_slot(
        &self,
        code: StatusCode,
        message: &str,
        slot: PayloadSlot,
        exception: Option<Exception>,
    ) -> Status {
        let Some(exception) = exception else {
            return Status::ok_status();
        };
        if code.is_ok() {
            tracing::debug!(%exception, "exception dropped: an OK status carries no payload");
            return Status::ok_status();
        }
        let mut status = Status::new(code, message);
        write_shared_to_payload(&self.registry, &mut status, slot.key(), Some(exception.into_object()));
        status
    }

    /// Decides how `status` will be raised.
    pub fn classify(&self, status: &Status) -> Dispatch {
        let mut keys = status.payload_keys();
        match (keys.next(), keys.next()) {
            (Some(key), None) if self.handlers.contains(key) => Dispatch::Handler(key.to_owned()),
            (Some(_), Some(_)) if status.payload_keys().any(|k| self.handlers.contains(k)) => {
                Dispatch::Ambiguous
            }
            _ => Dispatch::Plain,
        }
    }

    /// Turns a failed status into the exception it stands for. `OK` yields
    /// `None`. Token slots are consumed; any other slot is dropped with the
    /// status.
    pub fn reconstruct(&self, mut status: Status) -> Result<Option<Exception>, BridgeError> {
        if status.is_ok() {
            return Ok(None);
        }
        match self.classify(&status) {
            Dispatch::Handler(key) => {
                let (Some(handler), Some(payload)) = (self.handlers.get(&key), status.take_payload(&key))
                else {
                    return Ok(Some(self.default_exception(&status)));
                };
                match handler.handle(self, payload, &status) {
                    Ok(exception) => Ok(Some(exception)),
                    Err(err) if self.config.on_unresolved_token == UnresolvedToken::Fallback => {
                        tracing::warn!(%err, key = %key, "unresolved payload, raising from status");
                        Ok(Some(self.default_exception(&status)))
                    }
                    Err(err) => Err(err),
                }
            }
            Dispatch::Ambiguous => {
                let keys: Vec<&str> = status.payload_keys().collect();
                tracing::debug!(?keys, "ambiguous payload ignored");
                Ok(Some(self.default_exception(&status)))
            }
            Dispatch::Plain => Ok(Some(self.default_exception(&status))),
        }
    }

    /// `Ok(())` for an `OK` status, otherwise the reconstructed exception.
    pub fn raise(&self, status: Status) -> Result<(), Raised> {
        match self.reconstruct(status)? {
            Some(exception) => Err(Raised::Exception(exception)),
            None => Ok(()),
        }
    }

    /// Exception built from code and message alone.
    pub fn default_exception(&self, status: &Status) -> Exception {
        let kind = ErrorKind::for_code(status.code()).unwrap_or(ErrorKind::DEFAULT);
        Exception::new(kind, self.format_message(status, kind))
    }

    pub fn format_message(&self, status: &Status, kind: ErrorKind) -> String {
        let message = if self.config.strip_message_whitespace {
            status.message().trim_ascii()
        } else {
            status.message()
        };
        format_status_message(status.code(), kind, message)
    }

    /// Resolves an exception token payload, releasing its reference.
    pub fn take_exception(&self, payload: Payload) -> Result<Exception, BridgeError> {
        let object = consume_payload(&self.registry, payload)?;
        Ok(Exception::from_object(object)?)
    }

    /// One hop of a "raised from" chain: the failure in `inner` becomes the
    /// cause of an exception of `kind`, and the result is captured for
    /// verbatim re-raise. An `OK` inner status is returned unchanged.
    pub fn chain_status(
        &self,
        inner: Status,
        kind: ErrorKind,
        message: &str,
    ) -> Result<Status, BridgeError> {
        if inner.is_ok() {
            return Ok(inner);
        }
        let exception = match self.reconstruct(inner)? {
            Some(cause) => Exception::new(kind, message).caused_by(cause),
            None => Exception::new(kind, message),
        };
        Ok(self.capture(&exception))
    }

    /// Like [`Self::chain_status`], but the outer exception is left to be
    /// built from `code` and `message` when the status is raised.
    pub fn wrap_status(
        &self,
        inner: Status,
        code: StatusCode,
        message: &str,
    ) -> Result<Status, BridgeError> {
        if inner.is_ok() {
            return Ok(inner);
        }
        let cause = self.reconstruct(inner)?;
        Ok(self.status_caused_by(code, message, cause))
    }
}
