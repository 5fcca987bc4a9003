//! Identity provider abstraction.
//!
//! The provider owns account credentials and announces sign-in state over a
//! broadcast channel. The session store never sees passwords; it receives a
//! principal and asks the provider for a short-lived credential to exchange.

use argon2::{
    Argon2, PasswordHash, PasswordHasher, PasswordVerifier, password_hash::SaltString,
};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio::sync::broadcast;

use crate::jwt::JwtConfig;

/// Provider-level identity, before the app has enriched it into a profile.
#[derive(Debug, Clone, PartialEq)]
pub struct Principal {
    /// Provider UID, opaque to the app
    pub uid: String,
    pub email: String,
    pub name: String,
    pub email_verified: bool,
}

/// Auth state changes announced by the provider.
#[derive(Debug, Clone)]
pub enum AuthEvent {
    SignedIn(Principal),
    SignedOut,
}

/// Errors from the identity provider.
#[derive(Debug)]
pub enum AuthError {
    InvalidCredentials,
    /// The user dismissed an interactive sign-in
    Cancelled,
    AccountExists,
    WeakPassword,
    Provider(String),
}

impl std::fmt::Display for AuthError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AuthError::InvalidCredentials => write!(f, "Invalid email or password"),
            AuthError::Cancelled => write!(f, "Sign-in was cancelled"),
            AuthError::AccountExists => write!(f, "An account with this email already exists"),
            AuthError::WeakPassword => write!(f, "Password does not meet requirements"),
            AuthError::Provider(msg) => write!(f, "Provider error: {}", msg),
        }
    }
}

impl std::error::Error for AuthError {}

/// An identity provider the session store can drive.
pub trait IdentityProvider: Send + Sync + 'static {
    /// Password sign-in. Broadcasts `SignedIn` on success.
    fn sign_in(
        &self,
        email: &str,
        password: &str,
    ) -> impl Future<Output = Result<Principal, AuthError>> + Send;

    /// Interactive federated sign-in (popup flow). Broadcasts `SignedIn` on
    /// success; `Cancelled` when the user backs out.
    fn sign_in_with_popup(&self) -> impl Future<Output = Result<Principal, AuthError>> + Send;

    /// Create an account and sign it in.
    fn register(
        &self,
        name: &str,
        email: &str,
        password: &str,
    ) -> impl Future<Output = Result<Principal, AuthError>> + Send;

    /// Drop provider-side sign-in state and broadcast `SignedOut`.
    fn sign_out(&self) -> impl Future<Output = ()> + Send;

    /// Mint a short-lived credential for the signed-in principal.
    fn credential_for(&self, principal: &Principal) -> Result<String, AuthError>;

    /// Subscribe to auth state changes.
    fn subscribe(&self) -> broadcast::Receiver<AuthEvent>;
}

struct LocalAccount {
    uid: String,
    name: String,
    password_hash: String,
    email_verified: bool,
}

/// In-process identity provider backed by argon2-hashed accounts.
///
/// Mints credentials with its own signing secret; the exchange side holds
/// the matching verification config.
#[derive(Clone)]
pub struct LocalIdentityProvider {
    inner: Arc<LocalProviderInner>,
}

struct LocalProviderInner {
    jwt: Arc<JwtConfig>,
    accounts: Mutex<HashMap<String, LocalAccount>>,
    /// Account returned by the popup flow, when configured
    popup_account: Mutex<Option<Principal>>,
    events: broadcast::Sender<AuthEvent>,
}

const MIN_PASSWORD_LEN: usize = 6;

impl LocalIdentityProvider {
    pub fn new(jwt: Arc<JwtConfig>) -> Self {
        let (events, _) = broadcast::channel(16);
        Self {
            inner: Arc::new(LocalProviderInner {
                jwt,
                accounts: Mutex::new(HashMap::new()),
                popup_account: Mutex::new(None),
                events,
            }),
        }
    }

    /// Configure the principal the popup flow signs in as. Without one, the
    /// popup behaves as if the user closed it.
    pub fn set_popup_account(&self, principal: Principal) {
        *self.inner.popup_account.lock().unwrap() = Some(principal);
    }

    fn hash_password(password: &str) -> Result<String, AuthError> {
        let mut salt_bytes = [0u8; 16];
        getrandom::getrandom(&mut salt_bytes)
            .map_err(|e| AuthError::Provider(format!("Failed to generate salt: {}", e)))?;
        let salt = SaltString::encode_b64(&salt_bytes)
            .map_err(|e| AuthError::Provider(format!("Failed to encode salt: {}", e)))?;

        Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map(|h| h.to_string())
            .map_err(|e| AuthError::Provider(format!("Failed to hash password: {}", e)))
    }

    fn verify_password(password: &str, hash: &str) -> bool {
        match PasswordHash::new(hash) {
            Ok(parsed) => Argon2::default()
                .verify_password(password.as_bytes(), &parsed)
                .is_ok(),
            Err(_) => false,
        }
    }

    fn announce(&self, event: AuthEvent) {
        // Nobody listening is fine
        let _ = self.inner.events.send(event);
    }
}

impl IdentityProvider for LocalIdentityProvider {
    fn sign_in(
        &self,
        email: &str,
        password: &str,
    ) -> impl Future<Output = Result<Principal, AuthError>> + Send {
        let email = email.to_lowercase();
        let password = password.to_string();
        let this = self.clone();
        async move {
            let principal = {
                let accounts = this.inner.accounts.lock().unwrap();
                let account = accounts.get(&email).ok_or(AuthError::InvalidCredentials)?;
                if !Self::verify_password(&password, &account.password_hash) {
                    return Err(AuthError::InvalidCredentials);
                }
                Principal {
                    uid: account.uid.clone(),
                    email: email.clone(),
                    name: account.name.clone(),
                    email_verified: account.email_verified,
                }
            };

            this.announce(AuthEvent::SignedIn(principal.clone()));
            Ok(principal)
        }
    }

    fn sign_in_with_popup(&self) -> impl Future<Output = Result<Principal, AuthError>> + Send {
        let this = self.clone();
        async move {
            let principal = this
                .inner
                .popup_account
                .lock()
                .unwrap()
                .clone()
                .ok_or(AuthError::Cancelled)?;

            this.announce(AuthEvent::SignedIn(principal.clone()));
            Ok(principal)
        }
    }

    fn register(
        &self,
        name: &str,
        email: &str,
        password: &str,
    ) -> impl Future<Output = Result<Principal, AuthError>> + Send {
        let name = name.to_string();
        let email = email.to_lowercase();
        let password = password.to_string();
        let this = self.clone();
        async move {
            if password.len() < MIN_PASSWORD_LEN {
                return Err(AuthError::WeakPassword);
            }

            let password_hash = Self::hash_password(&password)?;
            let principal = {
                let mut accounts = this.inner.accounts.lock().unwrap();
                if accounts.contains_key(&email) {
                    return Err(AuthError::AccountExists);
                }

                let uid = uuid::Uuid::new_v4().to_string();
                accounts.insert(
                    email.clone(),
                    LocalAccount {
                        uid: uid.clone(),
                        name: name.clone(),
                        password_hash,
                        email_verified: false,
                    },
                );
                Principal {
                    uid,
                    email,
                    name,
                    email_verified: false,
                }
            };

            this.announce(AuthEvent::SignedIn(principal.clone()));
            Ok(principal)
        }
    }

    fn sign_out(&self) -> impl Future<Output = ()> + Send {
        let this = self.clone();
        async move {
            this.announce(AuthEvent::SignedOut);
        }
    }

    fn credential_for(&self, principal: &Principal) -> Result<String, AuthError> {
        self.inner
            .jwt
            .generate_credential(
                &principal.uid,
                &principal.email,
                &principal.name,
                principal.email_verified,
            )
            .map_err(|e| AuthError::Provider(format!("Failed to mint credential: {}", e)))
    }

    fn subscribe(&self) -> broadcast::Receiver<AuthEvent> {
        self.inner.events.subscribe()
    }
}
