//! Client-side session state.
//!
//! The store observes the identity provider's auth events: every sign-in is
//! exchanged for an app session and committed to shared state, every
//! sign-out clears it. Consumers watch the state rather than polling.
//!
//! A generation counter guards against stale completions: sign-out bumps it,
//! and an exchange that finishes for an older generation is discarded so the
//! visible state always reflects the most recent auth action.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::{broadcast, watch};

use super::exchange::{ExchangeError, ExchangeService};
use super::provider::{AuthError, AuthEvent, IdentityProvider, Principal};
use super::storage::TokenStorage;
use crate::db::{Profile, Role};

/// The observable session state.
#[derive(Debug, Clone, Default)]
pub struct SessionState {
    pub profile: Option<Profile>,
    /// True until the persisted session has been checked
    pub is_loading: bool,
}

impl SessionState {
    pub fn is_signed_in(&self) -> bool {
        self.profile.is_some()
    }

    pub fn role(&self) -> Option<Role> {
        self.profile.as_ref().map(|p| p.role)
    }
}

/// Errors surfaced by session operations.
#[derive(Debug)]
pub enum SessionError {
    Auth(AuthError),
    Exchange(ExchangeError),
}

impl std::fmt::Display for SessionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SessionError::Auth(e) => write!(f, "{}", e),
            SessionError::Exchange(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for SessionError {}

impl From<AuthError> for SessionError {
    fn from(e: AuthError) -> Self {
        SessionError::Auth(e)
    }
}

impl From<ExchangeError> for SessionError {
    fn from(e: ExchangeError) -> Self {
        SessionError::Exchange(e)
    }
}

struct Inner<P, E, S> {
    provider: P,
    exchange: E,
    storage: S,
    state: watch::Sender<SessionState>,
    generation: AtomicU64,
}

/// Session store over a provider, an exchange and token storage.
pub struct SessionStore<P, E, S> {
    inner: Arc<Inner<P, E, S>>,
}

impl<P, E, S> Clone for SessionStore<P, E, S> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

/// Handle to the running auth event listener. Dropping it stops the
/// listener; the store's state stays as it was.
pub struct SessionSubscription {
    handle: tokio::task::JoinHandle<()>,
}

impl Drop for SessionSubscription {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

impl<P, E, S> SessionStore<P, E, S>
where
    P: IdentityProvider,
    E: ExchangeService,
    S: TokenStorage,
{
    pub fn new(provider: P, exchange: E, storage: S) -> Self {
        let (state, _) = watch::channel(SessionState {
            profile: None,
            is_loading: true,
        });
        Self {
            inner: Arc::new(Inner {
                provider,
                exchange,
                storage,
                state,
                generation: AtomicU64::new(0),
            }),
        }
    }

    /// Restore any persisted session, then start following the provider's
    /// auth events. State stays `is_loading` until restoration finishes.
    pub async fn initialize(&self) -> SessionSubscription {
        let events = self.inner.provider.subscribe();

        if let Some(token) = self.inner.storage.load() {
            match self.inner.exchange.verify(&token).await {
                Ok(profile) => {
                    self.inner.state.send_replace(SessionState {
                        profile: Some(profile),
                        is_loading: false,
                    });
                }
                Err(e) => {
                    tracing::debug!("Stored session rejected: {}", e);
                    self.inner.storage.clear();
                    self.inner.state.send_replace(SessionState::default());
                }
            }
        } else {
            self.inner.state.send_replace(SessionState::default());
        }

        let store = self.clone();
        let handle = tokio::spawn(async move {
            store.listen(events).await;
        });

        SessionSubscription { handle }
    }

    async fn listen(&self, mut events: broadcast::Receiver<AuthEvent>) {
        loop {
            match events.recv().await {
                Ok(AuthEvent::SignedIn(principal)) => {
                    self.handle_signed_in(principal).await;
                }
                Ok(AuthEvent::SignedOut) => {
                    // Provider-initiated sign-out (logout also lands here,
                    // after it has already cleared the state)
                    self.inner.storage.clear();
                    self.inner.state.send_modify(|s| {
                        s.profile = None;
                        s.is_loading = false;
                    });
                }
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    tracing::warn!("Auth event listener lagged by {} events", n);
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
    }

    async fn handle_signed_in(&self, principal: Principal) {
        let generation = self.inner.generation.load(Ordering::SeqCst);

        // The exchange is in flight from here until the state settles, so
        // guards see Pending instead of bouncing a signing-in user to login
        self.inner.state.send_modify(|s| s.is_loading = true);

        let credential = match self.inner.provider.credential_for(&principal) {
            Ok(c) => c,
            Err(e) => {
                tracing::error!("Failed to mint credential: {}", e);
                self.inner.state.send_modify(|s| s.is_loading = false);
                return;
            }
        };

        let response = match self.inner.exchange.exchange(&credential).await {
            Ok(r) => r,
            Err(e) => {
                tracing::error!("Identity exchange failed: {}", e);
                self.inner.storage.clear();
                self.inner.state.send_modify(|s| {
                    s.profile = None;
                    s.is_loading = false;
                });
                return;
            }
        };

        // Discard if a newer auth action superseded this sign-in
        if self.inner.generation.load(Ordering::SeqCst) != generation {
            tracing::debug!(email = %response.profile.email, "discarding stale sign-in");
            self.inner.state.send_modify(|s| s.is_loading = false);
            return;
        }

        self.inner.storage.store(&response.token);
        self.inner.state.send_replace(SessionState {
            profile: Some(response.profile),
            is_loading: false,
        });
    }

    /// Password sign-in. The session state updates asynchronously once the
    /// exchange completes; watch `subscribe()` for the result.
    pub async fn login(&self, email: &str, password: &str) -> Result<Principal, SessionError> {
        Ok(self.inner.provider.sign_in(email, password).await?)
    }

    /// Federated popup sign-in.
    pub async fn login_with_popup(&self) -> Result<Principal, SessionError> {
        Ok(self.inner.provider.sign_in_with_popup().await?)
    }

    /// Create an account at the provider and sign it in.
    pub async fn register(
        &self,
        name: &str,
        email: &str,
        password: &str,
    ) -> Result<Principal, SessionError> {
        Ok(self.inner.provider.register(name, email, password).await?)
    }

    /// Sign out. Never fails: the local session is gone no matter what the
    /// backend or provider say.
    pub async fn logout(&self) {
        // Invalidate any in-flight sign-in first
        self.inner.generation.fetch_add(1, Ordering::SeqCst);

        let token = self.inner.storage.load();
        self.inner.storage.clear();
        self.inner.state.send_replace(SessionState {
            profile: None,
            is_loading: false,
        });

        if let Some(token) = token {
            self.inner.exchange.revoke(&token).await;
        }
        self.inner.provider.sign_out().await;
    }

    /// Overlay a locally edited profile, e.g. after a successful profile
    /// save, without waiting for a re-verify.
    pub fn update_profile_locally(&self, profile: Profile) {
        self.inner.state.send_modify(|s| {
            if s.profile.is_some() {
                s.profile = Some(profile);
            }
        });
    }

    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.inner.state.subscribe()
    }

    pub fn snapshot(&self) -> SessionState {
        self.inner.state.borrow().clone()
    }
}
