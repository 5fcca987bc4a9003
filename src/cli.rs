//! CLI argument parsing, validation, and startup helpers.

use crate::ServerConfig;
use crate::db::{Database, Role};
use crate::rate_limit::RateLimitConfig;
use clap::Parser;
use tracing::{error, info};
use uuid::Uuid;

const MIN_SECRET_LENGTH: usize = 32;

#[derive(clap::ValueEnum, Clone, Debug, Default)]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
    Compact,
}

#[derive(Parser, Debug, Clone)]
#[command(
    name = "Scholar Stream",
    about = "Scholarship platform with role-scoped dashboards"
)]
pub struct Args {
    /// Port to listen on
    #[arg(short, long, default_value = "5180")]
    pub port: u16,

    /// Path to SQLite database file
    #[arg(short, long, default_value = "scholarstream.db")]
    pub database: String,

    /// Path to file containing the session-token secret.
    /// Prefer using the JWT_SECRET env var instead
    #[arg(long)]
    pub jwt_secret_file: Option<String>,

    /// Path to file containing the identity-provider secret.
    /// Prefer using the PROVIDER_SECRET env var instead
    #[arg(long)]
    pub provider_secret_file: Option<String>,

    /// Ensure this email holds the admin role on startup
    #[arg(long)]
    pub seed_admin: Option<String>,

    /// Log output format
    #[arg(short, long, default_value = "pretty")]
    pub log_format: LogFormat,
}

/// Initialize logging based on the specified format.
pub fn init_logging(format: &LogFormat) {
    match format {
        LogFormat::Pretty => tracing_subscriber::fmt::init(),
        LogFormat::Json => tracing_subscriber::fmt().json().init(),
        LogFormat::Compact => tracing_subscriber::fmt().compact().init(),
    }
}

/// Load a signing secret from an environment variable or file.
/// Returns None and logs an error if the secret cannot be loaded.
fn load_secret(env_var: &str, file: Option<&str>, flag: &str) -> Option<String> {
    let secret = if let Ok(secret) = std::env::var(env_var) {
        // Clear the environment variable to prevent leaking
        // SAFETY: We're single-threaded at this point during startup,
        // and no other code is reading this environment variable.
        unsafe { std::env::remove_var(env_var) };
        secret
    } else if let Some(path) = file {
        match std::fs::read_to_string(path) {
            Ok(content) => content.trim().to_string(),
            Err(e) => {
                error!(path = %path, error = %e, "Failed to read secret file");
                return None;
            }
        }
    } else {
        error!(
            "A signing secret is required. Set the {} environment variable (recommended) or use --{}",
            env_var, flag
        );
        return None;
    };

    if secret.len() < MIN_SECRET_LENGTH {
        error!(
            "Secret from {} is shorter than {} characters. Use a longer secret",
            env_var, MIN_SECRET_LENGTH
        );
        return None;
    }

    Some(secret)
}

/// Load the session-token secret (JWT_SECRET env var or file).
pub fn load_jwt_secret(jwt_secret_file: Option<&str>) -> Option<String> {
    load_secret("JWT_SECRET", jwt_secret_file, "jwt-secret-file")
}

/// Load the identity-provider secret (PROVIDER_SECRET env var or file).
/// Must differ from the session secret so the two token kinds stay in
/// separate trust domains.
pub fn load_provider_secret(provider_secret_file: Option<&str>) -> Option<String> {
    load_secret("PROVIDER_SECRET", provider_secret_file, "provider-secret-file")
}

/// Handle the --seed-admin flag: promote an existing profile or create one
/// holding the admin role.
pub async fn handle_seed_admin(db: &Database, email: &str) {
    match db.users().get_by_email(email).await {
        Ok(Some(existing)) => {
            if existing.role == Role::Admin {
                info!(email = %email, "Admin already present");
                return;
            }
            match db.users().set_role(existing.id, Role::Admin).await {
                Ok(_) => info!(email = %email, "Promoted to admin"),
                Err(e) => {
                    error!(error = %e, "Failed to promote admin");
                    std::process::exit(1);
                }
            }
        }
        Ok(None) => {
            let uuid = Uuid::new_v4().to_string();
            match db
                .users()
                .create(&uuid, "Administrator", email, Role::Admin)
                .await
            {
                Ok(_) => info!(email = %email, "Admin profile created"),
                Err(e) => {
                    error!(error = %e, "Failed to create admin profile");
                    std::process::exit(1);
                }
            }
        }
        Err(e) => {
            error!(error = %e, "Failed to check for existing admin");
            std::process::exit(1);
        }
    }
}

/// Build ServerConfig from validated arguments.
pub fn build_config(db: Database, jwt_secret: String, provider_secret: String) -> ServerConfig {
    ServerConfig {
        db,
        jwt_secret: jwt_secret.into_bytes(),
        provider_secret: provider_secret.into_bytes(),
        rate_limit: RateLimitConfig::new(),
    }
}

/// Open the database, logging errors if it fails.
pub async fn open_database(path: &str) -> Option<Database> {
    match Database::open(path).await {
        Ok(db) => {
            info!(path = %path, "Database opened");
            Some(db)
        }
        Err(e) => {
            error!(path = %path, error = %e, "Failed to open database");
            None
        }
    }
}
