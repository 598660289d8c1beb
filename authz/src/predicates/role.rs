use async_trait::async_trait;
use std::sync::Arc;
use tracing::debug;

use super::Authorizer;
use crate::error::Result;
use crate::store::RoleStore;
use crate::types::{RequestParams, RoleSet, UserId};

/// Admits users holding every role in `required`.
///
/// An empty `required` set admits anyone (after a successful lookup).
pub async fn has_all_roles(
    store: &dyn RoleStore,
    user_id: UserId,
    required: &RoleSet,
) -> Result<bool> {
    let user_roles = store.get_user_roles(user_id).await?;
    let ok = user_roles.is_superset(required);
    if !ok {
        debug!(user_id = %user_id, "User lacks one or more required roles");
    }
    Ok(ok)
}

/// Admits users holding at least one role in `candidates`.
pub async fn has_any_role(
    store: &dyn RoleStore,
    user_id: UserId,
    candidates: &RoleSet,
) -> Result<bool> {
    let user_roles = store.get_user_roles(user_id).await?;
    let ok = user_roles.intersects(candidates);
    if !ok {
        debug!(user_id = %user_id, "User holds none of the candidate roles");
    }
    Ok(ok)
}

pub struct HasAllRoles {
    store: Arc<dyn RoleStore>,
    required: RoleSet,
}

impl HasAllRoles {
    pub fn new(store: Arc<dyn RoleStore>, required: RoleSet) -> Self {
        Self { store, required }
    }
}

#[async_trait]
impl Authorizer for HasAllRoles {
    fn name(&self) -> &'static str {
        "has_all_roles"
    }

    async fn evaluate(&self, _params: &RequestParams, user_id: UserId) -> Result<bool> {
        has_all_roles(self.store.as_ref(), user_id, &self.required).await
    }
}

pub struct HasAnyRole {
    store: Arc<dyn RoleStore>,
    candidates: RoleSet,
}

impl HasAnyRole {
    pub fn new(store: Arc<dyn RoleStore>, candidates: RoleSet) -> Self {
        Self { store, candidates }
    }
}

#[async_trait]
impl Authorizer for HasAnyRole {
    fn name(&self) -> &'static str {
        "has_any_role"
    }

    async fn evaluate(&self, _params: &RequestParams, user_id: UserId) -> Result<bool> {
        has_any_role(self.store.as_ref(), user_id, &self.candidates).await
    }
}
