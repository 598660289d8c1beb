//! User, role and session storage.
//!
//! Backs the engine's [`SessionStore`](authz::store::SessionStore) and
//! [`RoleStore`](authz::store::RoleStore) with SQLite. The login handshake
//! itself lives elsewhere; it only calls [`UserDatabase::create_session`] once
//! the identity provider has vouched for the user.

pub mod database;
pub mod error;
pub mod session;
mod store;

pub use database::{UserDatabase, UserDatabaseConfig};
pub use error::{Result as UserResult, UserError};
pub use session::DEFAULT_SESSION_TTL_SECONDS;
