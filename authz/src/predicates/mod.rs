//! Composable authorization checks.
//!
//! Each check implements [`Authorizer`] and evaluates one dimension of a
//! request: role membership, resource ownership, quota or action permission.
//! Routes declare an ordered list of them; the engine admits the request only
//! if every one returns `Ok(true)`.
//!
//! A check answers `Ok(false)` for "no" and `Err(_)` for "could not decide".
//! The two are never conflated.

mod action;
mod ownership;
mod quota;
mod role;

pub use action::{can_perform_action, CanPerformAction};
pub use ownership::{owns_resource, OwnsResource};
pub use quota::{within_limit, WithinLimit};
pub use role::{has_all_roles, has_any_role, HasAllRoles, HasAnyRole};

use async_trait::async_trait;
use std::sync::Arc;

use crate::error::Result;
use crate::roles::ActionTable;
use crate::store::{ResourceStore, RoleStore};
use crate::types::{RequestParams, ResourceKind, RoleSet, UserId};

/// A single check contributing to an authorization decision.
#[async_trait]
pub trait Authorizer: Send + Sync {
    /// Short label used in logs.
    fn name(&self) -> &'static str;

    /// Whether the check reads the request's form body. The gate only
    /// buffers bodies for routes that carry such a check.
    fn reads_form(&self) -> bool {
        false
    }

    async fn evaluate(&self, params: &RequestParams, user_id: UserId) -> Result<bool>;
}

/// Shared handle to a check, as stored in a route's predicate list.
pub type SharedAuthorizer = Arc<dyn Authorizer>;

/// Builds checks wired to the stores and the action table.
///
/// Cheap to clone; routes call its methods while the router is assembled.
#[derive(Clone)]
pub struct Authorizers {
    roles: Arc<dyn RoleStore>,
    resources: Arc<dyn ResourceStore>,
    actions: Arc<ActionTable>,
}

impl Authorizers {
    pub fn new(
        roles: Arc<dyn RoleStore>,
        resources: Arc<dyn ResourceStore>,
        actions: ActionTable,
    ) -> Self {
        Self {
            roles,
            resources,
            actions: Arc::new(actions),
        }
    }

    pub fn has_all_roles(&self, required: RoleSet) -> SharedAuthorizer {
        Arc::new(HasAllRoles::new(self.roles.clone(), required))
    }

    pub fn has_any_role(&self, candidates: RoleSet) -> SharedAuthorizer {
        Arc::new(HasAnyRole::new(self.roles.clone(), candidates))
    }

    pub fn owns_resource(&self, kind: ResourceKind) -> SharedAuthorizer {
        Arc::new(OwnsResource::new(self.resources.clone(), kind))
    }

    pub fn within_limit(&self, kind: ResourceKind, max_count: usize) -> SharedAuthorizer {
        Arc::new(WithinLimit::new(self.resources.clone(), kind, max_count))
    }

    pub fn can_perform_action(&self) -> SharedAuthorizer {
        Arc::new(CanPerformAction::new(
            self.roles.clone(),
            self.actions.clone(),
        ))
    }
}
