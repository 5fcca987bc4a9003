//! Credential exchange.
//!
//! Swaps a provider credential for an app session token plus the enriched
//! profile, provisioning the profile on first contact. `BackendExchange`
//! carries the same semantics as the HTTP exchange endpoint so in-process
//! clients and remote ones behave identically.

use std::sync::Arc;

use crate::db::{Database, Profile, Role};
use crate::jwt::JwtConfig;

/// Errors from the exchange.
#[derive(Debug)]
pub enum ExchangeError {
    /// The credential failed validation (expired, forged, wrong type)
    InvalidCredential,
    /// The session token is unknown or revoked
    SessionRevoked,
    Backend(String),
}

impl std::fmt::Display for ExchangeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExchangeError::InvalidCredential => write!(f, "Invalid credential"),
            ExchangeError::SessionRevoked => write!(f, "Session has been revoked"),
            ExchangeError::Backend(msg) => write!(f, "Exchange backend error: {}", msg),
        }
    }
}

impl std::error::Error for ExchangeError {}

/// A freshly issued session.
#[derive(Debug, Clone)]
pub struct ExchangeResponse {
    pub token: String,
    pub expires_at: u64,
    pub profile: Profile,
}

/// The app side of the identity exchange.
pub trait ExchangeService: Send + Sync + 'static {
    /// Swap a provider credential for a session token and profile.
    fn exchange(
        &self,
        credential: &str,
    ) -> impl Future<Output = Result<ExchangeResponse, ExchangeError>> + Send;

    /// Check a stored session token and return the current profile.
    fn verify(&self, token: &str) -> impl Future<Output = Result<Profile, ExchangeError>> + Send;

    /// Revoke a session token. Best effort: revoking an unknown or expired
    /// token is not an error.
    fn revoke(&self, token: &str) -> impl Future<Output = ()> + Send;
}

/// Exchange service backed directly by the app database.
#[derive(Clone)]
pub struct BackendExchange {
    db: Database,
    jwt: Arc<JwtConfig>,
    provider_jwt: Arc<JwtConfig>,
}

impl BackendExchange {
    pub fn new(db: Database, jwt: Arc<JwtConfig>, provider_jwt: Arc<JwtConfig>) -> Self {
        Self {
            db,
            jwt,
            provider_jwt,
        }
    }

    async fn profile_for_email(
        &self,
        email: &str,
        name: &str,
    ) -> Result<Profile, ExchangeError> {
        if let Some(profile) = self
            .db
            .users()
            .get_by_email(email)
            .await
            .map_err(|e| ExchangeError::Backend(e.to_string()))?
        {
            return Ok(profile);
        }

        // First exchange provisions the profile with the student role
        let uuid = uuid::Uuid::new_v4().to_string();
        self.db
            .users()
            .create(&uuid, name, email, Role::Student)
            .await
            .map_err(|e| ExchangeError::Backend(e.to_string()))?;
        self.db
            .users()
            .get_by_uuid(&uuid)
            .await
            .map_err(|e| ExchangeError::Backend(e.to_string()))?
            .ok_or_else(|| ExchangeError::Backend("created profile not found".into()))
    }
}

impl ExchangeService for BackendExchange {
    fn exchange(
        &self,
        credential: &str,
    ) -> impl Future<Output = Result<ExchangeResponse, ExchangeError>> + Send {
        let credential = credential.to_string();
        let this = self.clone();
        async move {
            let claims = this
                .provider_jwt
                .validate_credential(&credential)
                .map_err(|_| ExchangeError::InvalidCredential)?;

            let profile = this.profile_for_email(&claims.email, &claims.name).await?;

            let result = this
                .jwt
                .generate_session_token(&profile.uuid, &profile.email, profile.role)
                .map_err(|e| ExchangeError::Backend(e.to_string()))?;

            this.db
                .sessions()
                .create(&result.jti, profile.id, result.issued_at, result.expires_at)
                .await
                .map_err(|e| ExchangeError::Backend(e.to_string()))?;

            Ok(ExchangeResponse {
                token: result.token,
                expires_at: result.expires_at,
                profile,
            })
        }
    }

    fn verify(&self, token: &str) -> impl Future<Output = Result<Profile, ExchangeError>> + Send {
        let token = token.to_string();
        let this = self.clone();
        async move {
            let claims = this
                .jwt
                .validate_session_token(&token)
                .map_err(|_| ExchangeError::InvalidCredential)?;

            let session = this
                .db
                .sessions()
                .get_by_jti(&claims.jti)
                .await
                .map_err(|e| ExchangeError::Backend(e.to_string()))?
                .ok_or(ExchangeError::SessionRevoked)?;

            this.db
                .users()
                .get_by_id(session.user_id)
                .await
                .map_err(|e| ExchangeError::Backend(e.to_string()))?
                .ok_or(ExchangeError::SessionRevoked)
        }
    }

    fn revoke(&self, token: &str) -> impl Future<Output = ()> + Send {
        let token = token.to_string();
        let this = self.clone();
        async move {
            if let Ok(claims) = this.jwt.validate_session_token(&token) {
                if let Err(e) = this.db.sessions().delete_by_jti(&claims.jti).await {
                    tracing::warn!("Failed to revoke session: {}", e);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn exchange_pair() -> (BackendExchange, Arc<JwtConfig>) {
        let db = Database::open(":memory:").await.unwrap();
        let jwt = Arc::new(JwtConfig::new(b"app-secret-for-testing"));
        let provider_jwt = Arc::new(JwtConfig::new(b"provider-secret-for-testing"));
        (
            BackendExchange::new(db, jwt, provider_jwt.clone()),
            provider_jwt,
        )
    }

    #[tokio::test]
    async fn test_first_exchange_provisions_student_profile() {
        let (exchange, provider_jwt) = exchange_pair().await;
        let credential = provider_jwt
            .generate_credential("uid-1", "alice@example.com", "Alice", true)
            .unwrap();

        let response = exchange.exchange(&credential).await.unwrap();
        assert_eq!(response.profile.email, "alice@example.com");
        assert_eq!(response.profile.role, Role::Student);
        assert!(!response.token.is_empty());
    }

    #[tokio::test]
    async fn test_second_exchange_reuses_profile() {
        let (exchange, provider_jwt) = exchange_pair().await;
        let credential = provider_jwt
            .generate_credential("uid-1", "alice@example.com", "Alice", true)
            .unwrap();

        let first = exchange.exchange(&credential).await.unwrap();
        let second = exchange.exchange(&credential).await.unwrap();
        assert_eq!(first.profile.uuid, second.profile.uuid);
        assert_ne!(first.token, second.token);
    }

    #[tokio::test]
    async fn test_garbage_credential_rejected() {
        let (exchange, _) = exchange_pair().await;
        let err = exchange.exchange("not-a-jwt").await.unwrap_err();
        assert!(matches!(err, ExchangeError::InvalidCredential));
    }

    #[tokio::test]
    async fn test_session_token_is_not_a_credential() {
        let (exchange, provider_jwt) = exchange_pair().await;
        let credential = provider_jwt
            .generate_credential("uid-1", "alice@example.com", "Alice", true)
            .unwrap();
        let response = exchange.exchange(&credential).await.unwrap();

        // Feeding the session token back as a credential must fail
        let err = exchange.exchange(&response.token).await.unwrap_err();
        assert!(matches!(err, ExchangeError::InvalidCredential));
    }

    #[tokio::test]
    async fn test_verify_and_revoke() {
        let (exchange, provider_jwt) = exchange_pair().await;
        let credential = provider_jwt
            .generate_credential("uid-1", "alice@example.com", "Alice", true)
            .unwrap();
        let response = exchange.exchange(&credential).await.unwrap();

        let profile = exchange.verify(&response.token).await.unwrap();
        assert_eq!(profile.email, "alice@example.com");

        exchange.revoke(&response.token).await;
        let err = exchange.verify(&response.token).await.unwrap_err();
        assert!(matches!(err, ExchangeError::SessionRevoked));

        // Revoking again is harmless
        exchange.revoke(&response.token).await;
    }

    #[tokio::test]
    async fn test_verify_reflects_role_changes() {
        let (exchange, provider_jwt) = exchange_pair().await;
        let credential = provider_jwt
            .generate_credential("uid-1", "alice@example.com", "Alice", true)
            .unwrap();
        let response = exchange.exchange(&credential).await.unwrap();

        // Promote after the token was minted
        exchange
            .db
            .users()
            .set_role(response.profile.id, Role::Moderator)
            .await
            .unwrap();

        let profile = exchange.verify(&response.token).await.unwrap();
        assert_eq!(profile.role, Role::Moderator);
    }
}
