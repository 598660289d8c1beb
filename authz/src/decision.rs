//! The verdict produced by [`AuthzEngine::authorize`](crate::AuthzEngine::authorize).

use serde::Serialize;

use crate::error::AuthzError;
use crate::types::Identity;

/// Why a request was turned away.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DenyReason {
    /// No session credential, or the session is unknown or expired.
    Unauthenticated,
    /// Every check ran without error but at least one said no.
    Forbidden,
    /// Malformed request parameters.
    InvalidInput,
    /// A referenced resource does not exist.
    NotFound,
    /// A lookup failed or the gate was misconfigured.
    InternalError,
}

impl DenyReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            DenyReason::Unauthenticated => "unauthenticated",
            DenyReason::Forbidden => "forbidden",
            DenyReason::InvalidInput => "invalid_input",
            DenyReason::NotFound => "not_found",
            DenyReason::InternalError => "internal_error",
        }
    }
}

impl std::fmt::Display for DenyReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A denied request: the classified reason plus the hard error, if any.
///
/// `error` is `None` for `Unauthenticated` and `Forbidden`, which are
/// ordinary outcomes rather than failures.
#[derive(Debug)]
pub struct Denial {
    pub reason: DenyReason,
    pub error: Option<AuthzError>,
}

impl Denial {
    pub fn unauthenticated() -> Self {
        Self {
            reason: DenyReason::Unauthenticated,
            error: None,
        }
    }

    pub fn forbidden() -> Self {
        Self {
            reason: DenyReason::Forbidden,
            error: None,
        }
    }

    /// Builds a denial from a hard error, classifying it.
    pub fn from_error(error: AuthzError) -> Self {
        Self {
            reason: error.deny_reason(),
            error: Some(error),
        }
    }
}

/// Admit-or-deny outcome for one request.
#[derive(Debug)]
pub enum Decision {
    Admit(Identity),
    Deny(Denial),
}

impl Decision {
    pub fn is_admit(&self) -> bool {
        matches!(self, Decision::Admit(_))
    }

    /// Returns the deny reason, or `None` if the request was admitted.
    pub fn deny_reason(&self) -> Option<DenyReason> {
        match self {
            Decision::Admit(_) => None,
            Decision::Deny(denial) => Some(denial.reason),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::UserId;

    #[test]
    fn test_denial_from_error_keeps_error() {
        let denial = Denial::from_error(AuthzError::NotFound("submission 9".into()));
        assert_eq!(denial.reason, DenyReason::NotFound);
        assert!(matches!(denial.error, Some(AuthzError::NotFound(_))));
    }

    #[test]
    fn test_decision_helpers() {
        let admit = Decision::Admit(Identity::new(UserId(1)));
        assert!(admit.is_admit());
        assert_eq!(admit.deny_reason(), None);

        let deny = Decision::Deny(Denial::forbidden());
        assert!(!deny.is_admit());
        assert_eq!(deny.deny_reason(), Some(DenyReason::Forbidden));
    }

    #[test]
    fn test_deny_reason_serializes_snake_case() {
        let json = serde_json::to_string(&DenyReason::InternalError).unwrap();
        assert_eq!(json, "\"internal_error\"");
        assert_eq!(DenyReason::InvalidInput.to_string(), "invalid_input");
    }
}
