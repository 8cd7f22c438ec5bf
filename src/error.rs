//! Error taxonomy shared by the wizard engine and the API adapters.
//!
//! Adapter failures carry a code from a closed vocabulary; step definitions
//! map codes to transition directives as data, so no screen-specific error
//! branching lives in the engine.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Closed vocabulary of adapter-reported error codes.
///
/// Local validation failures never reach an adapter and therefore never
/// produce one of these; they only set the wizard's error message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// Session expired or credentials rejected (HTTP 401).
    Auth,
    /// A submitted value was rejected by the backend (HTTP 400).
    InvalidValue,
    /// The target record was already decided or used (HTTP 406).
    AlreadyDecided,
    /// A duplicate of an existing record (HTTP 409).
    Duplicate,
    /// Too many attempts (HTTP 429).
    RateLimited,
    /// Catch-all for anything the taxonomy does not name.
    Unknown,
}

impl ErrorCode {
    /// Map a backend wire code onto the taxonomy.
    ///
    /// The partner API reports string codes like `ERR-AUTH` or
    /// `ERR-IVD-VALUE`; anything unrecognized collapses to [`Unknown`](Self::Unknown).
    pub fn from_wire(code: &str) -> Self {
        match code {
            "ERR-AUTH" => ErrorCode::Auth,
            "ERR-IVD-VALUE" | "ERR-IVD-PARAM" => ErrorCode::InvalidValue,
            "ERR-ALREADY-DECIDED" | "ERR-ALREADY-USED" => ErrorCode::AlreadyDecided,
            "ERR-DUP-VALUE" => ErrorCode::Duplicate,
            "ERR-RETRY-EXCEED" => ErrorCode::RateLimited,
            _ => ErrorCode::Unknown,
        }
    }
}

/// A failed adapter call: human-readable message plus a taxonomy code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Error)]
#[error("{message}")]
pub struct Failure {
    pub code: ErrorCode,
    pub message: String,
}

impl Failure {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    /// Convenience constructor for the catch-all code.
    pub fn unknown(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Unknown, message)
    }
}

/// Problems constructing or loading a wizard definition.
#[derive(Debug, Error)]
pub enum DefinitionError {
    #[error("failed to parse wizard definition: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("invalid wizard definition: {}", .0.join("; "))]
    Invalid(Vec<String>),
    #[error("snapshot references unknown step '{0}'")]
    UnknownSnapshotStep(String),
    #[error("snapshot was taken from wizard '{snapshot}', not '{definition}'")]
    SnapshotMismatch { snapshot: String, definition: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_code_mapping() {
        assert_eq!(ErrorCode::from_wire("ERR-AUTH"), ErrorCode::Auth);
        assert_eq!(ErrorCode::from_wire("ERR-IVD-VALUE"), ErrorCode::InvalidValue);
        assert_eq!(ErrorCode::from_wire("ERR-IVD-PARAM"), ErrorCode::InvalidValue);
        assert_eq!(
            ErrorCode::from_wire("ERR-ALREADY-USED"),
            ErrorCode::AlreadyDecided
        );
        assert_eq!(ErrorCode::from_wire("ERR-DUP-VALUE"), ErrorCode::Duplicate);
        assert_eq!(ErrorCode::from_wire("ERR-RETRY-EXCEED"), ErrorCode::RateLimited);
        assert_eq!(ErrorCode::from_wire("ERR-SOMETHING-NEW"), ErrorCode::Unknown);
    }

    #[test]
    fn test_code_serializes_screaming_snake() {
        let json = serde_json::to_string(&ErrorCode::InvalidValue).unwrap();
        assert_eq!(json, "\"INVALID_VALUE\"");
        let json = serde_json::to_string(&ErrorCode::AlreadyDecided).unwrap();
        assert_eq!(json, "\"ALREADY_DECIDED\"");
    }

    #[test]
    fn test_failure_display_is_message() {
        let failure = Failure::new(ErrorCode::Auth, "Session expired.");
        assert_eq!(failure.to_string(), "Session expired.");
    }
}
