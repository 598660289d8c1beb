//! Login sessions: opaque secrets mapped to user ids with an expiry.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use chrono::{Duration, Utc};
use rand::RngCore;
use tracing::{debug, info};

use authz::UserId;

use crate::database::UserDatabase;
use crate::error::{Result, UserError};

/// Random bytes per session secret.
const SECRET_BYTES: usize = 32;

/// Session lifetime used when none is given.
pub const DEFAULT_SESSION_TTL_SECONDS: i64 = 60 * 60 * 24 * 30;

fn generate_secret() -> String {
    let mut bytes = [0u8; SECRET_BYTES];
    rand::thread_rng().fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

impl UserDatabase {
    /// Creates a session for `user_id` and returns its secret.
    ///
    /// Called once the login handshake has succeeded.
    pub async fn create_session(&self, user_id: UserId, ttl: Duration) -> Result<String> {
        if ttl <= Duration::zero() {
            return Err(UserError::Configuration(
                "session ttl must be positive".to_string(),
            ));
        }
        if !self.user_exists(user_id).await? {
            return Err(UserError::UserNotFound(user_id.0));
        }

        let secret = generate_secret();
        let expires_at = (Utc::now() + ttl).timestamp();

        sqlx::query("INSERT INTO sessions (secret, user_id, expires_at) VALUES (?, ?, ?)")
            .bind(&secret)
            .bind(user_id.0)
            .bind(expires_at)
            .execute(self.pool())
            .await?;

        info!(user_id = %user_id, "Session created");
        Ok(secret)
    }

    /// The user owning a live session, or `None` if the secret is unknown or expired.
    pub async fn get_uid_from_session(&self, secret: &str) -> Result<Option<UserId>> {
        let uid: Option<i64> =
            sqlx::query_scalar("SELECT user_id FROM sessions WHERE secret = ? AND expires_at > ?")
                .bind(secret)
                .bind(Utc::now().timestamp())
                .fetch_optional(self.pool())
                .await?;

        Ok(uid.map(UserId))
    }

    /// Logout. Revoking an unknown secret is not an error.
    pub async fn revoke_session(&self, secret: &str) -> Result<()> {
        let result = sqlx::query("DELETE FROM sessions WHERE secret = ?")
            .bind(secret)
            .execute(self.pool())
            .await?;

        debug!("Revoked {} session(s)", result.rows_affected());
        Ok(())
    }

    /// Deletes expired sessions, returning how many were removed.
    pub async fn cleanup_expired_sessions(&self) -> Result<u64> {
        let result = sqlx::query("DELETE FROM sessions WHERE expires_at <= ?")
            .bind(Utc::now().timestamp())
            .execute(self.pool())
            .await?;

        info!("Cleaned up {} expired session(s)", result.rows_affected());
        Ok(result.rows_affected())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn db_with_user() -> UserDatabase {
        let db = UserDatabase::in_memory().await.unwrap();
        db.create_user(UserId(7), "bob").await.unwrap();
        db
    }

    #[tokio::test]
    async fn test_session_resolves_to_user() {
        let db = db_with_user().await;
        let secret = db.create_session(UserId(7), Duration::hours(1)).await.unwrap();

        assert_eq!(
            db.get_uid_from_session(&secret).await.unwrap(),
            Some(UserId(7))
        );
    }

    #[tokio::test]
    async fn test_secrets_are_unique_and_url_safe() {
        let db = db_with_user().await;
        let a = db.create_session(UserId(7), Duration::hours(1)).await.unwrap();
        let b = db.create_session(UserId(7), Duration::hours(1)).await.unwrap();

        assert_ne!(a, b);
        assert!(a
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_'));
    }

    #[tokio::test]
    async fn test_unknown_secret_is_none() {
        let db = db_with_user().await;
        assert_eq!(db.get_uid_from_session("nope").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_expired_session_is_none_and_cleaned_up() {
        let db = db_with_user().await;
        sqlx::query("INSERT INTO sessions (secret, user_id, expires_at) VALUES ('old', 7, ?)")
            .bind(Utc::now().timestamp() - 10)
            .execute(db.pool())
            .await
            .unwrap();

        assert_eq!(db.get_uid_from_session("old").await.unwrap(), None);
        assert_eq!(db.cleanup_expired_sessions().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_revoked_session_is_none() {
        let db = db_with_user().await;
        let secret = db.create_session(UserId(7), Duration::hours(1)).await.unwrap();

        db.revoke_session(&secret).await.unwrap();
        assert_eq!(db.get_uid_from_session(&secret).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_session_for_unknown_user_rejected() {
        let db = db_with_user().await;
        let result = db.create_session(UserId(99), Duration::hours(1)).await;
        assert!(matches!(result, Err(UserError::UserNotFound(99))));
    }

    #[tokio::test]
    async fn test_non_positive_ttl_rejected() {
        let db = db_with_user().await;
        let result = db.create_session(UserId(7), Duration::zero()).await;
        assert!(matches!(result, Err(UserError::Configuration(_))));
    }
}
