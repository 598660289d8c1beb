use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing::info;

use api::credential::{SessionCookie, DEFAULT_COOKIE_NAME};
use api::{ApiConfig, AppState};
use authz::config::AuthzConfig;
use authz::UserId;
use user::{UserDatabase, UserDatabaseConfig, DEFAULT_SESSION_TTL_SECONDS};

mod logging;

/// Gatekeeper - submission service with per-request authorization
#[derive(Parser)]
#[command(name = "gatekeeper")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Directory holding the SQLite databases and logs
    #[arg(long, env = "GATEKEEPER_DATA_DIR", default_value = "./data", global = true)]
    data_dir: PathBuf,

    /// Role groups and limits (YAML). Defaults apply when the file is missing.
    #[arg(long, env = "GATEKEEPER_AUTHZ_CONFIG", default_value = "./config/authz.yaml", global = true)]
    authz_config: PathBuf,

    /// Name of the session cookie
    #[arg(long, env = "GATEKEEPER_COOKIE_NAME", default_value = DEFAULT_COOKIE_NAME, global = true)]
    cookie_name: String,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP server until Ctrl-C
    Serve {
        #[arg(long, env = "GATEKEEPER_HOST", default_value = "127.0.0.1")]
        host: String,

        #[arg(short, long, env = "GATEKEEPER_PORT", default_value_t = 3030)]
        port: u16,
    },

    /// Register a user under the id handed out by the identity provider
    CreateUser { user_id: i64, username: String },

    /// Grant a role to a user
    GrantRole { user_id: i64, role: String },

    /// Take a role away from a user
    RevokeRole { user_id: i64, role: String },

    /// Open a session and print its cookie
    CreateSession {
        user_id: i64,

        /// Lifetime in seconds
        #[arg(long, default_value_t = DEFAULT_SESSION_TTL_SECONDS)]
        ttl: i64,
    },

    /// Delete expired sessions
    CleanupSessions,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();
    let cli = Cli::parse();

    let log_level = if cli.verbose { "debug" } else { "info" };
    let _guard = logging::init_logging(&cli.data_dir.join("logs"), log_level)?;

    let users = open_users(&cli.data_dir).await?;

    match cli.command {
        Commands::Serve { host, port } => {
            let authz = AuthzConfig::load(&cli.authz_config).with_context(|| {
                format!("loading authorization config {}", cli.authz_config.display())
            })?;
            let db = database::Database::new(&cli.data_dir.join("submissions.db"))
                .await
                .context("opening submission database")?;

            let config = ApiConfig::new()
                .with_host(host)
                .with_port(port)
                .with_cookie_name(cli.cookie_name.clone());

            info!(
                submission_limit = authz.submission_limit,
                "Starting gatekeeper on {}",
                config.bind_addr()
            );
            api::start_server(AppState::new(users, db, authz, config))
                .await
                .map_err(|e| anyhow::anyhow!("server error: {}", e))?;
        }
        Commands::CreateUser { user_id, username } => {
            users.create_user(UserId(user_id), &username).await?;
            println!("created user {} ({})", user_id, username);
        }
        Commands::GrantRole { user_id, role } => {
            users.assign_role(UserId(user_id), &role).await?;
            println!("granted '{}' to user {}", role, user_id);
        }
        Commands::RevokeRole { user_id, role } => {
            users.revoke_role(UserId(user_id), &role).await?;
            println!("revoked '{}' from user {}", role, user_id);
        }
        Commands::CreateSession { user_id, ttl } => {
            let secret = users
                .create_session(UserId(user_id), chrono::Duration::seconds(ttl))
                .await?;
            println!("{}", SessionCookie::new(cli.cookie_name.clone()).to_cookie(&secret));
        }
        Commands::CleanupSessions => {
            let removed = users.cleanup_expired_sessions().await?;
            println!("removed {} expired session(s)", removed);
        }
    }

    logging::log_shutdown();
    Ok(())
}

async fn open_users(data_dir: &Path) -> Result<UserDatabase> {
    let config = UserDatabaseConfig {
        database_path: data_dir.join("users.db"),
        ..UserDatabaseConfig::default()
    };
    UserDatabase::new(config)
        .await
        .context("opening user database")
}
