//! Canonical status codes.

use std::fmt;

/// Outcome category carried by every [`crate::Status`].
///
/// The numeric values are part of the wire shape shared with the native
/// evaluation core and must not be reordered.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(i32)]
pub enum StatusCode {
    Ok = 0,
    Cancelled = 1,
    Unknown = 2,
    InvalidArgument = 3,
    DeadlineExceeded = 4,
    NotFound = 5,
    AlreadyExists = 6,
    PermissionDenied = 7,
    ResourceExhausted = 8,
    FailedPrecondition = 9,
    Aborted = 10,
    OutOfRange = 11,
    Unimplemented = 12,
    Internal = 13,
    Unavailable = 14,
    DataLoss = 15,
    Unauthenticated = 16,
}

static CODE_NAMES: phf::Map<&'static str, StatusCode> = phf::phf_map! {
    "OK" => StatusCode::Ok,
    "CANCELLED" => StatusCode::Cancelled,
    "UNKNOWN" => StatusCode::Unknown,
    "INVALID_ARGUMENT" => StatusCode::InvalidArgument,
    "DEADLINE_EXCEEDED" => StatusCode::DeadlineExceeded,
    "NOT_FOUND" => StatusCode::NotFound,
    "ALREADY_EXISTS" => StatusCode::AlreadyExists,
    "PERMISSION_DENIED" => StatusCode::PermissionDenied,
    "RESOURCE_EXHAUSTED" => StatusCode::ResourceExhausted,
    "FAILED_PRECONDITION" => StatusCode::FailedPrecondition,
    "ABORTED" => StatusCode::Aborted,
    "OUT_OF_RANGE" => StatusCode::OutOfRange,
    "UNIMPLEMENTED" => StatusCode::Unimplemented,
    "INTERNAL" => StatusCode::Internal,
    "UNAVAILABLE" => StatusCode::Unavailable,
    "DATA_LOSS" => StatusCode::DataLoss,
    "UNAUTHENTICATED" => StatusCode::Unauthenticated,
};

impl StatusCode {
    /// Every code, indexed by its numeric value.
    pub const ALL: [StatusCode; 17] = [
        StatusCode::Ok,
        StatusCode::Cancelled,
        StatusCode::Unknown,
        StatusCode::InvalidArgument,
        StatusCode::DeadlineExceeded,
        StatusCode::NotFound,
        StatusCode::AlreadyExists,
        StatusCode::PermissionDenied,
        StatusCode::ResourceExhausted,
        StatusCode::FailedPrecondition,
        StatusCode::Aborted,
        StatusCode::OutOfRange,
        StatusCode::Unimplemented,
        StatusCode::Internal,
        StatusCode::Unavailable,
        StatusCode::DataLoss,
        StatusCode::Unauthenticated,
    ];

    pub fn name(self) -> &'static str {
        match self {
            StatusCode::Ok => "OK",
            StatusCode::Cancelled => "CANCELLED",
            StatusCode::Unknown => "UNKNOWN",
            StatusCode::InvalidArgument => "INVALID_ARGUMENT",
            StatusCode::DeadlineExceeded => "DEADLINE_EXCEEDED",
            StatusCode::NotFound => "NOT_FOUND",
            StatusCode::AlreadyExists => "ALREADY_EXISTS",
            StatusCode::PermissionDenied => "PERMISSION_DENIED",
            StatusCode::ResourceExhausted => "RESOURCE_EXHAUSTED",
            StatusCode::FailedPrecondition => "FAILED_PRECONDITION",
            StatusCode::Aborted => "ABORTED",
            StatusCode::OutOfRange => "OUT_OF_RANGE",
            StatusCode::Unimplemented => "UNIMPLEMENTED",
            StatusCode::Internal => "INTERNAL",
            StatusCode::Unavailable => "UNAVAILABLE",
            StatusCode::DataLoss => "DATA_LOSS",
            StatusCode::Unauthenticated => "UNAUTHENTICATED",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        CODE_NAMES.get(name).copied()
    }

    pub fn from_i32(value: i32) -> Option<Self> {
        let idx = usize::try_from(value).ok()?;
        Self::ALL.get(idx).copied()
    }

    #[inline]
    pub fn as_i32(self) -> i32 {
        self as i32
    }

    #[inline]
    pub fn is_ok(self) -> bool {
        self == StatusCode::Ok
    }
}

impl fmt::Display for StatusCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_and_numbers_agree() {
        for (idx, code) in StatusCode::ALL.iter().enumerate() {
            assert_eq!(code.as_i32() as usize, idx);
            assert_eq!(StatusCode::from_i32(code.as_i32()), Some(*code));
            assert_eq!(StatusCode::from_name(code.name()), Some(*code));
        }
        assert_eq!(CODE_NAMES.len(), StatusCode::ALL.len());
    }

    #[test]
    fn out_of_range_numbers_are_rejected() {
        assert_eq!(StatusCode::from_i32(-1), None);
        assert_eq!(StatusCode::from_i32(17), None);
        assert_eq!(StatusCode::from_name("not_found"), None);
    }
}
