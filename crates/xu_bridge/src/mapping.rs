//! Association between status codes and host exception kinds.

use std::fmt;

use xu_status::StatusCode;

/// Category of a host exception.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Value,
    NotFound,
    Type,
    Precondition,
    NotImplemented,
    Assertion,
    Generic,
}

/// One row of the kind table.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct KindInfo {
    pub kind: ErrorKind,
    /// Host-visible class name.
    pub name: &'static str,
    /// Code used when an exception of this kind is turned into a status.
    pub code: StatusCode,
    /// Whether `code` is the kind's own natural code. Only then is the code
    /// left out of a reconstructed message.
    pub native: bool,
}

// Indexed by `ErrorKind as usize`.
const KINDS: [KindInfo; 7] = [
    KindInfo {
        kind: ErrorKind::Value,
        name: "ValueError",
        code: StatusCode::InvalidArgument,
        native: true,
    },
    KindInfo {
        kind: ErrorKind::NotFound,
        name: "LookupError",
        code: StatusCode::NotFound,
        native: true,
    },
    KindInfo {
        kind: ErrorKind::Type,
        name: "TypeError",
        code: StatusCode::InvalidArgument,
        native: false,
    },
    KindInfo {
        kind: ErrorKind::Precondition,
        name: "PreconditionError",
        code: StatusCode::FailedPrecondition,
        native: true,
    },
    KindInfo {
        kind: ErrorKind::NotImplemented,
        name: "NotImplementedError",
        code: StatusCode::Unimplemented,
        native: true,
    },
    KindInfo {
        kind: ErrorKind::Assertion,
        name: "AssertionError",
        code: StatusCode::Internal,
        native: false,
    },
    KindInfo {
        kind: ErrorKind::Generic,
        name: "Exception",
        code: StatusCode::Unknown,
        native: false,
    },
];

static KIND_NAMES: phf::Map<&'static str, ErrorKind> = phf::phf_map! {
    "ValueError" => ErrorKind::Value,
    "LookupError" => ErrorKind::NotFound,
    "TypeError" => ErrorKind::Type,
    "PreconditionError" => ErrorKind::Precondition,
    "NotImplementedError" => ErrorKind::NotImplemented,
    "AssertionError" => ErrorKind::Assertion,
    "Exception" => ErrorKind::Generic,
};

impl ErrorKind {
    /// Kind raised for a failed status when nothing more specific is known.
    pub const DEFAULT: ErrorKind = ErrorKind::Value;

    pub const ALL: [ErrorKind; 7] = [
        ErrorKind::Value,
        ErrorKind::NotFound,
        ErrorKind::Type,
        ErrorKind::Precondition,
        ErrorKind::NotImplemented,
        ErrorKind::Assertion,
        ErrorKind::Generic,
    ];

    #[inline]
    pub fn info(self) -> &'static KindInfo {
        &KINDS[self as usize]
    }

    pub fn name(self) -> &'static str {
        self.info().name
    }

    pub fn from_name(name: &str) -> Option<Self> {
        KIND_NAMES.get(name).copied()
    }

    /// Code produced when an exception of this kind is captured.
    pub fn status_code(self) -> StatusCode {
        self.info().code
    }

    /// The code this kind implies on its own, if there is an obvious one.
    pub fn native_code(self) -> Option<StatusCode> {
        let info = self.info();
        info.native.then_some(info.code)
    }

    /// Default kind for a failed status. `OK` has none.
    pub fn for_code(code: StatusCode) -> Option<Self> {
        match code {
            StatusCode::Ok => None,
            StatusCode::Unimplemented => Some(ErrorKind::NotImplemented),
            _ => Some(Self::DEFAULT),
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Message of an exception of `kind` synthesized from a status.
///
/// The code is prefixed as `[CODE]` unless it is the kind's native code.
pub fn format_status_message(code: StatusCode, kind: ErrorKind, message: &str) -> String {
    let mut out = String::with_capacity(message.len() + 24);
    if kind.native_code() != Some(code) {
        out.push('[');
        out.push_str(code.name());
        out.push(']');
    }
    if !message.is_empty() {
        if !out.is_empty() {
            out.push(' ');
        }
        out.push_str(message);
    }
    out
}
