//! Token generation and validation.
//!
//! Two token kinds live here, in separate trust domains:
//! - Session tokens: app-issued bearer tokens with a JTI tracked in the
//!   `sessions` table so logout can revoke them.
//! - Provider credentials: short-lived tokens minted by the identity
//!   provider at sign-in, accepted only by the exchange endpoint.

use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};

use crate::db::Role;

/// Token kind, embedded in claims so one can never stand in for the other.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenType {
    /// App-issued bearer token (1 week) - tracked in database with JTI
    Session,
    /// Identity-provider credential (5 minutes) - exchange endpoint only
    Credential,
}

/// Claims for app-issued session tokens.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionClaims {
    /// JWT ID (unique identifier for revocation tracking)
    pub jti: String,
    /// Subject (profile UUID)
    pub sub: String,
    /// Account email
    pub email: String,
    /// Profile role
    pub role: Role,
    /// Token type
    #[serde(rename = "typ")]
    pub token_type: TokenType,
    /// Issued at (Unix timestamp)
    pub iat: u64,
    /// Expiration time (Unix timestamp)
    pub exp: u64,
}

/// Claims for identity-provider credentials.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CredentialClaims {
    /// Subject (provider UID, opaque to the app)
    pub sub: String,
    /// Account email
    pub email: String,
    /// Display name as known to the provider
    pub name: String,
    /// Whether the provider has verified the email
    pub email_verified: bool,
    /// Token type
    #[serde(rename = "typ")]
    pub token_type: TokenType,
    /// Issued at (Unix timestamp)
    pub iat: u64,
    /// Expiration time (Unix timestamp)
    pub exp: u64,
}

/// Session token duration: 1 week
pub const SESSION_TOKEN_DURATION_SECS: u64 = 7 * 24 * 60 * 60;

/// Provider credential duration: 5 minutes
pub const CREDENTIAL_DURATION_SECS: u64 = 5 * 60;

/// Configuration for JWT operations over one signing secret.
#[derive(Clone)]
pub struct JwtConfig {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
}

/// Result of generating a session token.
#[derive(Debug, Clone)]
pub struct SessionTokenResult {
    /// The JWT token string
    pub token: String,
    /// JWT ID (unique identifier for database tracking)
    pub jti: String,
    /// Issued at timestamp (Unix seconds)
    pub issued_at: u64,
    /// Expiration timestamp (Unix seconds)
    pub expires_at: u64,
}

impl JwtConfig {
    /// Create a new JWT configuration with the given secret.
    pub fn new(secret: &[u8]) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
        }
    }

    /// Generate a session token for a profile.
    /// Session tokens are tracked in the database with a JTI for revocation.
    pub fn generate_session_token(
        &self,
        profile_uuid: &str,
        email: &str,
        role: Role,
    ) -> Result<SessionTokenResult, JwtError> {
        let now = unix_now()?;
        let jti = uuid::Uuid::new_v4().to_string();
        let exp = now + SESSION_TOKEN_DURATION_SECS;

        let claims = SessionClaims {
            jti: jti.clone(),
            sub: profile_uuid.to_string(),
            email: email.to_string(),
            role,
            token_type: TokenType::Session,
            iat: now,
            exp,
        };

        let token = jsonwebtoken::encode(&Header::default(), &claims, &self.encoding_key)
            .map_err(JwtError::Encoding)?;

        Ok(SessionTokenResult {
            token,
            jti,
            issued_at: now,
            expires_at: exp,
        })
    }

    /// Mint a short-lived provider credential for a principal.
    pub fn generate_credential(
        &self,
        uid: &str,
        email: &str,
        name: &str,
        email_verified: bool,
    ) -> Result<String, JwtError> {
        let now = unix_now()?;

        let claims = CredentialClaims {
            sub: uid.to_string(),
            email: email.to_string(),
            name: name.to_string(),
            email_verified,
            token_type: TokenType::Credential,
            iat: now,
            exp: now + CREDENTIAL_DURATION_SECS,
        };

        jsonwebtoken::encode(&Header::default(), &claims, &self.encoding_key)
            .map_err(JwtError::Encoding)
    }

    /// Validate and decode a session token.
    pub fn validate_session_token(&self, token: &str) -> Result<SessionClaims, JwtError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;

        let token_data =
            jsonwebtoken::decode::<SessionClaims>(token, &self.decoding_key, &validation)
                .map_err(JwtError::Decoding)?;

        if token_data.claims.token_type != TokenType::Session {
            return Err(JwtError::WrongTokenType);
        }

        Ok(token_data.claims)
    }

    /// Validate and decode a provider credential.
    pub fn validate_credential(&self, token: &str) -> Result<CredentialClaims, JwtError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;

        let token_data =
            jsonwebtoken::decode::<CredentialClaims>(token, &self.decoding_key, &validation)
                .map_err(JwtError::Decoding)?;

        if token_data.claims.token_type != TokenType::Credential {
            return Err(JwtError::WrongTokenType);
        }

        Ok(token_data.claims)
    }
}

fn unix_now() -> Result<u64, JwtError> {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .map_err(|_| JwtError::TimeError)
}

/// Errors that can occur during JWT operations.
#[derive(Debug)]
pub enum JwtError {
    /// Error encoding the token
    Encoding(jsonwebtoken::errors::Error),
    /// Error decoding the token
    Decoding(jsonwebtoken::errors::Error),
    /// System time error
    TimeError,
    /// Wrong token type (e.g., using a credential as a session token)
    WrongTokenType,
}

impl std::fmt::Display for JwtError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            JwtError::Encoding(e) => write!(f, "Failed to encode token: {}", e),
            JwtError::Decoding(e) => write!(f, "Failed to decode token: {}", e),
            JwtError::TimeError => write!(f, "System time error"),
            JwtError::WrongTokenType => write!(f, "Wrong token type"),
        }
    }
}

impl std::error::Error for JwtError {}
