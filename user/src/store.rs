//! Engine-facing lookups backed by [`UserDatabase`].

use async_trait::async_trait;
use tracing::error;

use authz::store::{RoleStore, SessionStore};
use authz::{RoleSet, UserId};

use crate::database::UserDatabase;

#[async_trait]
impl SessionStore for UserDatabase {
    async fn get_uid_from_session(&self, secret: &str) -> authz::Result<Option<UserId>> {
        UserDatabase::get_uid_from_session(self, secret)
            .await
            .map_err(|e| {
                error!("Session lookup failed: {}", e);
                e.into()
            })
    }
}

#[async_trait]
impl RoleStore for UserDatabase {
    async fn get_user_roles(&self, user_id: UserId) -> authz::Result<RoleSet> {
        UserDatabase::get_user_roles(self, user_id)
            .await
            .map_err(|e| {
                error!(user_id = %user_id, "Role lookup failed: {}", e);
                e.into()
            })
    }
}
