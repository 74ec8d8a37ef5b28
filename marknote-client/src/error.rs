//! Error taxonomy for remote API calls.

use serde::Deserialize;
use std::fmt;
use thiserror::Error;

/// Error codes reported by the note service.
///
/// The numeric values are part of the wire protocol. `ObjectNotFound` is
/// special: the raw protocol signals a missing object through an
/// `identifier` field on the error payload rather than a distinct code, so
/// it is synthesized locally in [`ClientError::from_raw`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    Unknown,
    BadDataFormat,
    PermissionDenied,
    InternalError,
    DataRequired,
    LimitReached,
    QuotaReached,
    InvalidAuth,
    AuthExpired,
    DataConflict,
    Validation,
    ShardUnavailable,
    LenTooShort,
    LenTooLong,
    TooFew,
    TooMany,
    UnsupportedOperation,
    TakenDown,
    RateLimitReached,
    ObjectNotFound,
}

impl ErrorCode {
    pub fn from_code(code: u32) -> Self {
        match code {
            1 => ErrorCode::Unknown,
            2 => ErrorCode::BadDataFormat,
            3 => ErrorCode::PermissionDenied,
            4 => ErrorCode::InternalError,
            5 => ErrorCode::DataRequired,
            6 => ErrorCode::LimitReached,
            7 => ErrorCode::QuotaReached,
            8 => ErrorCode::InvalidAuth,
            9 => ErrorCode::AuthExpired,
            10 => ErrorCode::DataConflict,
            11 => ErrorCode::Validation,
            12 => ErrorCode::ShardUnavailable,
            13 => ErrorCode::LenTooShort,
            14 => ErrorCode::LenTooLong,
            15 => ErrorCode::TooFew,
            16 => ErrorCode::TooMany,
            17 => ErrorCode::UnsupportedOperation,
            18 => ErrorCode::TakenDown,
            19 => ErrorCode::RateLimitReached,
            100 => ErrorCode::ObjectNotFound,
            _ => ErrorCode::Unknown,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::Unknown => "UNKNOWN",
            ErrorCode::BadDataFormat => "BAD_DATA_FORMAT",
            ErrorCode::PermissionDenied => "PERMISSION_DENIED",
            ErrorCode::InternalError => "INTERNAL_ERROR",
            ErrorCode::DataRequired => "DATA_REQUIRED",
            ErrorCode::LimitReached => "LIMIT_REACHED",
            ErrorCode::QuotaReached => "QUOTA_REACHED",
            ErrorCode::InvalidAuth => "INVALID_AUTH",
            ErrorCode::AuthExpired => "AUTH_EXPIRED",
            ErrorCode::DataConflict => "DATA_CONFLICT",
            ErrorCode::Validation => "VALIDATION",
            ErrorCode::ShardUnavailable => "SHARD_UNAVAILABLE",
            ErrorCode::LenTooShort => "LEN_TOO_SHORT",
            ErrorCode::LenTooLong => "LEN_TOO_LONG",
            ErrorCode::TooFew => "TOO_FEW",
            ErrorCode::TooMany => "TOO_MANY",
            ErrorCode::UnsupportedOperation => "UNSUPPORTED_OPERATION",
            ErrorCode::TakenDown => "TAKEN_DOWN",
            ErrorCode::RateLimitReached => "RATE_LIMIT_REACHED",
            ErrorCode::ObjectNotFound => "OBJECT_NOT_FOUND",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error payload as the service puts it on the wire.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawApiError {
    #[serde(default)]
    pub code: Option<u32>,

    #[serde(default)]
    pub parameter: Option<String>,

    #[serde(default)]
    pub identifier: Option<String>,

    #[serde(default)]
    pub message: Option<String>,
}

/// A failed remote API call.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("note service error: {code}: {message}")]
pub struct ClientError {
    pub code: ErrorCode,
    pub parameter: Option<String>,
    pub message: String,
}

impl ClientError {
    /// Decode a wire error, synthesizing `ObjectNotFound` when the payload
    /// carries an identifier.
    pub fn from_raw(raw: RawApiError) -> Self {
        let mut code = raw.code.map(ErrorCode::from_code).unwrap_or(ErrorCode::Unknown);
        if raw.identifier.is_some() {
            code = ErrorCode::ObjectNotFound;
        }

        let mut message = code.as_str().to_string();
        if let Some(parameter) = &raw.parameter {
            message = format!("invalid parameter: {parameter}");
        }
        if let Some(raw_message) = &raw.message {
            message = raw_message.clone();
        }
        if let Some(identifier) = &raw.identifier {
            message = format!("object not found by identifier {identifier}");
        }

        Self {
            code,
            parameter: raw.parameter,
            message,
        }
    }

    /// A transport-level failure (connect, timeout, malformed response).
    ///
    /// Tagged `Unknown`: transient from the caller's point of view and
    /// never retried automatically.
    pub fn transport(err: impl fmt::Display) -> Self {
        Self {
            code: ErrorCode::Unknown,
            parameter: None,
            message: err.to_string(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.code == ErrorCode::ObjectNotFound
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_numeric_codes() {
        assert_eq!(ErrorCode::from_code(8), ErrorCode::InvalidAuth);
        assert_eq!(ErrorCode::from_code(19), ErrorCode::RateLimitReached);
        assert_eq!(ErrorCode::from_code(100), ErrorCode::ObjectNotFound);
        assert_eq!(ErrorCode::from_code(999), ErrorCode::Unknown);
    }

    #[test]
    fn identifier_synthesizes_object_not_found() {
        let err = ClientError::from_raw(RawApiError {
            code: Some(4),
            identifier: Some("abc-123".into()),
            ..Default::default()
        });

        assert_eq!(err.code, ErrorCode::ObjectNotFound);
        assert!(err.is_not_found());
        assert!(err.message.contains("abc-123"));
    }

    #[test]
    fn message_precedence() {
        let err = ClientError::from_raw(RawApiError {
            code: Some(11),
            parameter: Some("note.content".into()),
            message: Some("content is not valid markup".into()),
            ..Default::default()
        });

        assert_eq!(err.code, ErrorCode::Validation);
        assert_eq!(err.message, "content is not valid markup");
        assert_eq!(err.parameter.as_deref(), Some("note.content"));
    }

    #[test]
    fn missing_code_defaults_to_unknown() {
        let err = ClientError::from_raw(RawApiError::default());
        assert_eq!(err.code, ErrorCode::Unknown);
        assert_eq!(err.message, "UNKNOWN");
    }
}
