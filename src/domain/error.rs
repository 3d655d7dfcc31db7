//! Domain validation errors for session ledger types.
//!
//! These errors are returned when a stored or user-supplied value does not
//! satisfy a domain rule, such as an unknown status string or a
//! non-positive retention count.
//!
//! # Examples
//!
//! ```
//! use legbook::domain::error::DomainError;
//! use legbook::domain::session::SessionStatus;
//!
//! let result: Result<SessionStatus, _> = "PAUSED".parse();
//! assert!(matches!(result, Err(DomainError::UnknownVariant { .. })));
//! ```

use thiserror::Error;

/// Errors that occur when domain invariants are violated.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// A stored enumeration value is not one this crate knows.
    #[error("unknown {kind}: {value}")]
    UnknownVariant {
        /// Which enumeration was being parsed.
        kind: &'static str,
        /// The rejected text.
        value: String,
    },

    /// Keep-last retention needs at least one session to keep.
    #[error("retention count must be positive, got {count}")]
    NonPositiveRetention {
        /// The invalid count that was provided.
        count: i64,
    },

    /// Stored timestamp text is not RFC 3339.
    #[error("invalid timestamp: {value}")]
    InvalidTimestamp {
        /// The rejected text.
        value: String,
    },

    /// Stored date text is not `YYYY-MM-DD`.
    #[error("invalid date: {value}")]
    InvalidDate {
        /// The rejected text.
        value: String,
    },

    /// Index symbols partition retention and cannot be blank.
    #[error("index symbol cannot be empty")]
    EmptyIndexSymbol,
}
