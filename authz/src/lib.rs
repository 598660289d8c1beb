//! Per-request authorization engine for the submission service.
//!
//! This crate decides, for each incoming request, whether the caller may
//! proceed. It combines an identity resolution step with an ordered list of
//! independent checks ([`Authorizer`]s) into a single [`Decision`].
//!
//! # Architecture Overview
//!
//! The authorization flow follows this pattern:
//!
//! 1. **Request arrives** at the API layer, which extracts the session secret
//!    and the request parameters
//! 2. **Identity resolution** turns the secret into an [`Identity`] through the
//!    [`SessionStore`](store::SessionStore)
//! 3. **Predicates** run in route order against that identity: role
//!    membership, ownership, quota, action permission
//! 4. **Decision** is made: admit with the identity attached, or deny with a
//!    [`DenyReason`]
//!
//! # Security Architecture
//!
//! - No predicate ever runs without a resolved identity.
//! - Deny by default: any predicate error denies, and so does any `false`.
//! - "Denied" and "failed" stay distinguishable: the [`Denial`] carries the
//!   error for failures and nothing for plain denials.
//! - The engine holds no mutable state. Role tables and groups are loaded once
//!   into [`config::AuthzConfig`] and shared read-only.

pub mod config;
pub mod decision;
pub mod error;
pub mod identity;
pub mod predicates;
pub mod roles;
pub mod store;
pub mod types;

use std::sync::Arc;
use tracing::{debug, error, warn};

pub use decision::{Decision, Denial, DenyReason};
pub use error::{AuthzError, Result};
pub use identity::IdentityResolver;
pub use predicates::{Authorizer, Authorizers, SharedAuthorizer};
pub use types::{Identity, RequestParams, ResourceKind, RoleSet, UserId};

use store::SessionStore;

/// Combines identity resolution with a route's checks into one verdict.
///
/// # Example
///
/// ```rust,ignore
/// let engine = AuthzEngine::new(sessions);
/// let checks = vec![authorizers.owns_resource(ResourceKind::Submission)];
///
/// match engine.authorize(Some(secret), &params, &checks).await {
///     Decision::Admit(identity) => println!("admitted {}", identity.user_id),
///     Decision::Deny(denial) => eprintln!("denied: {}", denial.reason),
/// }
/// ```
#[derive(Clone)]
pub struct AuthzEngine {
    resolver: IdentityResolver,
}

impl AuthzEngine {
    pub fn new(sessions: Arc<dyn SessionStore>) -> Self {
        Self {
            resolver: IdentityResolver::new(sessions),
        }
    }

    /// Decides whether the request may proceed.
    ///
    /// - no secret, or no live session for it: `Unauthenticated`
    /// - session lookup failure: `InternalError`
    /// - no predicates: admit any authenticated user
    /// - predicates run in order; the first error stops evaluation and is
    ///   classified into a deny reason, the first `false` stops evaluation
    ///   with `Forbidden`
    pub async fn authorize(
        &self,
        secret: Option<&str>,
        params: &RequestParams,
        predicates: &[SharedAuthorizer],
    ) -> Decision {
        let Some(secret) = secret else {
            debug!("No session credential presented");
            return Decision::Deny(Denial::unauthenticated());
        };

        let identity = match self.resolver.resolve(secret).await {
            Ok(Some(identity)) => identity,
            Ok(None) => {
                warn!("Session expired or unknown");
                return Decision::Deny(Denial::unauthenticated());
            }
            Err(e) => {
                error!("Failed to load session: {}", e);
                return Decision::Deny(Denial::from_error(e));
            }
        };

        let user_id = identity.user_id;

        for predicate in predicates {
            match predicate.evaluate(params, user_id).await {
                Ok(true) => {}
                Ok(false) => {
                    warn!(
                        user_id = %user_id,
                        check = predicate.name(),
                        "Unauthorized attempt"
                    );
                    return Decision::Deny(Denial::forbidden());
                }
                Err(e) => {
                    let denial = Denial::from_error(e);
                    match denial.reason {
                        DenyReason::InternalError => error!(
                            user_id = %user_id,
                            check = predicate.name(),
                            "Failed to verify authority: {}",
                            denial.error.as_ref().map(ToString::to_string).unwrap_or_default()
                        ),
                        reason => warn!(
                            user_id = %user_id,
                            check = predicate.name(),
                            reason = %reason,
                            "Request rejected: {}",
                            denial.error.as_ref().map(ToString::to_string).unwrap_or_default()
                        ),
                    }
                    return Decision::Deny(denial);
                }
            }
        }

        debug!(user_id = %user_id, checks = predicates.len(), "Access allowed");
        Decision::Admit(identity)
    }
}
