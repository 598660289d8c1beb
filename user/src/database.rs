use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Pool, Sqlite};
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, info};

use authz::{RoleSet, UserId};

use crate::error::{Result, UserError};

/// Configuration for the user database
#[derive(Debug, Clone)]
pub struct UserDatabaseConfig {
    /// Path to the database file
    pub database_path: PathBuf,
    /// Maximum number of connections in the pool
    pub max_connections: u32,
    /// Connection timeout in seconds
    pub connection_timeout: u64,
}

impl Default for UserDatabaseConfig {
    fn default() -> Self {
        Self {
            database_path: PathBuf::from("data/users.db"),
            max_connections: 5,
            connection_timeout: 30,
        }
    }
}

/// Users, their roles and their login sessions.
#[derive(Debug, Clone)]
pub struct UserDatabase {
    pool: Pool<Sqlite>,
}

impl UserDatabase {
    /// Open (creating if needed) the database file and run migrations.
    pub async fn new(config: UserDatabaseConfig) -> Result<Self> {
        if let Some(parent) = config.database_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        info!(
            "Opening user database at: {}",
            config.database_path.display()
        );

        let pool = SqlitePoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(Duration::from_secs(config.connection_timeout))
            .connect_with(
                SqliteConnectOptions::new()
                    .filename(&config.database_path)
                    .create_if_missing(true),
            )
            .await
            .map_err(|e| UserError::Initialization(format!("Failed to open database: {}", e)))?;

        Self::from_pool(pool).await
    }

    /// Private in-memory database, used by tests and local tooling.
    pub async fn in_memory() -> Result<Self> {
        // Every connection to :memory: is its own database, so pin the pool to
        // one connection that never gets recycled.
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect("sqlite::memory:")
            .await?;

        Self::from_pool(pool).await
    }

    pub async fn from_pool(pool: Pool<Sqlite>) -> Result<Self> {
        let db = Self { pool };
        db.run_migrations().await?;
        info!("User database initialized successfully");
        Ok(db)
    }

    /// Run database migrations
    async fn run_migrations(&self) -> Result<()> {
        debug!("Running user database migrations");

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS users (
                id INTEGER PRIMARY KEY,
                username TEXT NOT NULL UNIQUE,
                created_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS user_roles (
                user_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                role TEXT NOT NULL,
                PRIMARY KEY (user_id, role)
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS sessions (
                secret TEXT PRIMARY KEY NOT NULL,
                user_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                expires_at INTEGER NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE INDEX IF NOT EXISTS idx_sessions_expiry
            ON sessions(expires_at)
            "#,
        )
        .execute(&self.pool)
        .await?;

        debug!("User database migrations completed");
        Ok(())
    }

    pub fn pool(&self) -> &Pool<Sqlite> {
        &self.pool
    }

    /// Insert a user with an explicit id, as handed out by the identity provider.
    pub async fn create_user(&self, user_id: UserId, username: &str) -> Result<()> {
        sqlx::query("INSERT INTO users (id, username) VALUES (?, ?)")
            .bind(user_id.0)
            .bind(username)
            .execute(&self.pool)
            .await?;

        info!(user_id = %user_id, "Created user {}", username);
        Ok(())
    }

    pub async fn user_exists(&self, user_id: UserId) -> Result<bool> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users WHERE id = ?")
            .bind(user_id.0)
            .fetch_one(&self.pool)
            .await?;
        Ok(count > 0)
    }

    /// Grant a role. Granting a role the user already has is a no-op.
    pub async fn assign_role(&self, user_id: UserId, role: &str) -> Result<()> {
        if !self.user_exists(user_id).await? {
            return Err(UserError::UserNotFound(user_id.0));
        }

        sqlx::query("INSERT OR IGNORE INTO user_roles (user_id, role) VALUES (?, ?)")
            .bind(user_id.0)
            .bind(role)
            .execute(&self.pool)
            .await?;

        info!(user_id = %user_id, role, "Role assigned");
        Ok(())
    }

    pub async fn revoke_role(&self, user_id: UserId, role: &str) -> Result<()> {
        sqlx::query("DELETE FROM user_roles WHERE user_id = ? AND role = ?")
            .bind(user_id.0)
            .bind(role)
            .execute(&self.pool)
            .await?;

        info!(user_id = %user_id, role, "Role revoked");
        Ok(())
    }

    /// All roles held by the user. Unknown users simply have none.
    pub async fn get_user_roles(&self, user_id: UserId) -> Result<RoleSet> {
        let roles: Vec<String> = sqlx::query_scalar("SELECT role FROM user_roles WHERE user_id = ?")
            .bind(user_id.0)
            .fetch_all(&self.pool)
            .await?;

        Ok(roles.into_iter().collect())
    }

    /// Close the database connection
    pub async fn close(self) {
        self.pool.close().await;
        info!("User database connection closed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_database_initialization() {
        let temp_dir = TempDir::new().unwrap();
        let db_path = temp_dir.path().join("nested").join("users.db");

        let config = UserDatabaseConfig {
            database_path: db_path.clone(),
            ..UserDatabaseConfig::default()
        };

        let db = UserDatabase::new(config).await.unwrap();
        assert!(db_path.exists());

        let tables: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name IN ('users', 'user_roles', 'sessions')",
        )
        .fetch_one(db.pool())
        .await
        .unwrap();
        assert_eq!(tables, 3);

        db.close().await;
    }

    #[tokio::test]
    async fn test_roles_roundtrip() {
        let db = UserDatabase::in_memory().await.unwrap();
        db.create_user(UserId(1), "alice").await.unwrap();

        db.assign_role(UserId(1), "Curator").await.unwrap();
        db.assign_role(UserId(1), "Tester").await.unwrap();
        db.assign_role(UserId(1), "Tester").await.unwrap();

        let roles = db.get_user_roles(UserId(1)).await.unwrap();
        assert_eq!(roles.len(), 2);
        assert!(roles.contains("Curator"));
        assert!(roles.contains("Tester"));

        db.revoke_role(UserId(1), "Curator").await.unwrap();
        let roles = db.get_user_roles(UserId(1)).await.unwrap();
        assert!(!roles.contains("Curator"));
    }

    #[tokio::test]
    async fn test_unknown_user_has_no_roles() {
        let db = UserDatabase::in_memory().await.unwrap();
        assert!(db.get_user_roles(UserId(404)).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_assign_role_to_unknown_user_fails() {
        let db = UserDatabase::in_memory().await.unwrap();
        let result = db.assign_role(UserId(404), "Curator").await;
        assert!(matches!(result, Err(UserError::UserNotFound(404))));
    }

    #[tokio::test]
    async fn test_duplicate_username_rejected() {
        let db = UserDatabase::in_memory().await.unwrap();
        db.create_user(UserId(1), "alice").await.unwrap();
        let result = db.create_user(UserId(2), "alice").await;
        assert!(matches!(result, Err(UserError::Database(_))));
    }
}
