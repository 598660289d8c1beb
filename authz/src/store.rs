//! Lookup interfaces the engine consumes.
//!
//! The engine never owns persistence. Sessions, roles and submissions live in
//! external stores, reached through these traits. Implementations map their
//! own failures into [`AuthzError::Lookup`](crate::error::AuthzError::Lookup)
//! so the engine can tell a failed lookup from a negative answer.

use async_trait::async_trait;

#[cfg(any(test, feature = "mock"))]
use mockall::automock;

use crate::error::Result;
use crate::types::{ResourceOwnership, RoleSet, SubmissionsFilter, UserId};

/// Resolves session secrets to user ids.
#[cfg_attr(any(test, feature = "mock"), automock)]
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Returns `Ok(None)` when no live session matches `secret`, including
    /// sessions that exist but have expired.
    async fn get_uid_from_session(&self, secret: &str) -> Result<Option<UserId>>;
}

/// Retrieves the roles assigned to a user.
#[cfg_attr(any(test, feature = "mock"), automock)]
#[async_trait]
pub trait RoleStore: Send + Sync {
    /// A user with no roles yields an empty set, not an error.
    async fn get_user_roles(&self, user_id: UserId) -> Result<RoleSet>;
}

/// Retrieves ownership metadata for submissions and their files.
#[cfg_attr(any(test, feature = "mock"), automock)]
#[async_trait]
pub trait ResourceStore: Send + Sync {
    async fn search_submissions(&self, filter: SubmissionsFilter)
        -> Result<Vec<ResourceOwnership>>;

    /// Ids that do not exist are simply absent from the result.
    async fn get_submission_files(&self, ids: Vec<i64>) -> Result<Vec<ResourceOwnership>>;
}
