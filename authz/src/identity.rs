//! Turns a session secret into an authenticated [`Identity`].

use std::sync::Arc;
use tracing::debug;

use crate::error::Result;
use crate::store::SessionStore;
use crate::types::Identity;

/// Resolves session secrets against the session store.
///
/// A missing or expired session is `Ok(None)`, an expected outcome. Only a
/// failing store produces an error.
#[derive(Clone)]
pub struct IdentityResolver {
    sessions: Arc<dyn SessionStore>,
}

impl IdentityResolver {
    pub fn new(sessions: Arc<dyn SessionStore>) -> Self {
        Self { sessions }
    }

    pub async fn resolve(&self, secret: &str) -> Result<Option<Identity>> {
        let uid = self.sessions.get_uid_from_session(secret).await?;
        match uid {
            Some(user_id) => {
                debug!(user_id = %user_id, "Session resolved");
                Ok(Some(Identity::new(user_id)))
            }
            None => {
                debug!("No live session for presented secret");
                Ok(None)
            }
        }
    }
}
