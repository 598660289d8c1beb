//! Error types for the authorization engine.
//!
//! # Security Note
//! Error messages must balance providing useful information for debugging while
//! not leaking authorization details to callers. Detailed error information is
//! logged server-side; the HTTP layer only ever shows a generic message.

use thiserror::Error;

use crate::decision::DenyReason;

/// Errors that can occur while evaluating an authorization predicate.
///
/// Every variant is a *hard* failure: a predicate that returns one of these
/// denies the request no matter what its boolean result would have been.
/// A plain "not allowed" is never expressed as an error, it is `Ok(false)`.
#[derive(Debug, Error)]
pub enum AuthzError {
    /// A request parameter could not be parsed (e.g. a non-numeric id).
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// A referenced resource does not exist.
    ///
    /// Kept distinct from an ownership denial so callers can tell
    /// "doesn't exist" from "not yours".
    #[error("Resource not found: {0}")]
    NotFound(String),

    /// A predicate was configured with a resource kind it cannot handle.
    ///
    /// This is a programming error in the route wiring, not a user error.
    #[error("Invalid resource: {0}")]
    InvalidResource(String),

    /// An external lookup (session, role or resource store) failed.
    #[error("Lookup failed: {0}")]
    Lookup(String),

    /// The submitted form could not be decoded.
    #[error("Form decode failed: {0}")]
    FormDecode(String),

    /// Catch-all for unexpected failures that should be investigated.
    #[error("Internal authorization error: {0}")]
    Internal(String),
}

impl AuthzError {
    /// Classifies the error into the deny reason reported for the request.
    pub fn deny_reason(&self) -> DenyReason {
        match self {
            AuthzError::InvalidInput(_) => DenyReason::InvalidInput,
            AuthzError::NotFound(_) => DenyReason::NotFound,
            AuthzError::InvalidResource(_)
            | AuthzError::Lookup(_)
            | AuthzError::FormDecode(_)
            | AuthzError::Internal(_) => DenyReason::InternalError,
        }
    }
}

/// A specialized Result type for authorization operations.
pub type Result<T> = std::result::Result<T, AuthzError>;
