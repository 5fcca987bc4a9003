//! End-to-end tests for the client-side session layer: provider sign-in,
//! credential exchange, persisted restoration, guarding and navigation.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use scholarstream::db::{Database, Profile, Role};
use scholarstream::jwt::JwtConfig;
use scholarstream::session::{
    AuthError, BackendExchange, ExchangeError, ExchangeResponse, ExchangeService, GuardDecision,
    IdentityProvider, LocalIdentityProvider, MemoryTokenStorage, Principal, SessionError,
    SessionState, SessionStore, TokenStorage, evaluate, menu_for,
};
use tokio::time::timeout;

const APP_SECRET: &[u8] = b"app-secret-for-session-tests";
const PROVIDER_SECRET: &[u8] = b"provider-secret-for-session-tests";

struct Harness {
    store: SessionStore<LocalIdentityProvider, BackendExchange, Arc<MemoryTokenStorage>>,
    provider: LocalIdentityProvider,
    exchange: BackendExchange,
    storage: Arc<MemoryTokenStorage>,
    db: Database,
}

async fn harness() -> Harness {
    let db = Database::open(":memory:").await.unwrap();
    let jwt = Arc::new(JwtConfig::new(APP_SECRET));
    let provider_jwt = Arc::new(JwtConfig::new(PROVIDER_SECRET));

    let provider = LocalIdentityProvider::new(provider_jwt.clone());
    let exchange = BackendExchange::new(db.clone(), jwt, provider_jwt);
    let storage = Arc::new(MemoryTokenStorage::new());

    let store = SessionStore::new(provider.clone(), exchange.clone(), storage.clone());

    Harness {
        store,
        provider,
        exchange,
        storage,
        db,
    }
}

async fn wait_signed_in(
    store: &SessionStore<impl IdentityProvider, impl ExchangeService, impl TokenStorage>,
) -> SessionState {
    let mut rx = store.subscribe();
    timeout(Duration::from_secs(5), rx.wait_for(|s| s.is_signed_in()))
        .await
        .expect("timed out waiting for sign-in")
        .unwrap()
        .clone()
}

async fn wait_signed_out(
    store: &SessionStore<impl IdentityProvider, impl ExchangeService, impl TokenStorage>,
) -> SessionState {
    let mut rx = store.subscribe();
    timeout(
        Duration::from_secs(5),
        rx.wait_for(|s| !s.is_signed_in() && !s.is_loading),
    )
    .await
    .expect("timed out waiting for sign-out")
    .unwrap()
    .clone()
}

#[tokio::test]
async fn test_state_is_loading_until_initialized() {
    let h = harness().await;
    assert!(h.store.snapshot().is_loading);

    let _sub = h.store.initialize().await;
    let state = h.store.snapshot();
    assert!(!state.is_loading);
    assert!(!state.is_signed_in());
}

#[tokio::test]
async fn test_register_signs_in_and_provisions_student() {
    let h = harness().await;
    let _sub = h.store.initialize().await;

    h.store
        .register("Alice", "alice@example.com", "hunter22")
        .await
        .unwrap();

    let state = wait_signed_in(&h.store).await;
    let profile = state.profile.unwrap();
    assert_eq!(profile.email, "alice@example.com");
    assert_eq!(profile.role, Role::Student);

    // The app-side profile was provisioned by the exchange
    assert!(
        h.db.users()
            .get_by_email("alice@example.com")
            .await
            .unwrap()
            .is_some()
    );
    // And the session token was persisted
    assert!(h.storage.load().is_some());
}

#[tokio::test]
async fn test_login_with_bad_password_leaves_state_untouched() {
    let h = harness().await;
    let _sub = h.store.initialize().await;
    h.store
        .register("Alice", "alice@example.com", "hunter22")
        .await
        .unwrap();
    wait_signed_in(&h.store).await;
    h.store.logout().await;
    wait_signed_out(&h.store).await;

    let err = h.store.login("alice@example.com", "wrong").await.unwrap_err();
    assert!(matches!(
        err,
        SessionError::Auth(AuthError::InvalidCredentials)
    ));

    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(!h.store.snapshot().is_signed_in());
}

#[tokio::test]
async fn test_logout_clears_state_and_revokes_token() {
    let h = harness().await;
    let _sub = h.store.initialize().await;

    h.store
        .register("Alice", "alice@example.com", "hunter22")
        .await
        .unwrap();
    wait_signed_in(&h.store).await;
    let token = h.storage.load().unwrap();

    h.store.logout().await;
    let state = wait_signed_out(&h.store).await;
    assert!(state.profile.is_none());
    assert!(h.storage.load().is_none());

    // The backend session is gone too
    let err = h.exchange.verify(&token).await.unwrap_err();
    assert!(matches!(err, ExchangeError::SessionRevoked));
}

#[tokio::test]
async fn test_logout_when_signed_out_is_harmless() {
    let h = harness().await;
    let _sub = h.store.initialize().await;

    h.store.logout().await;
    h.store.logout().await;
    assert!(!h.store.snapshot().is_signed_in());
}

#[tokio::test]
async fn test_session_restores_across_restart() {
    let h = harness().await;
    {
        let _sub = h.store.initialize().await;
        h.store
            .register("Alice", "alice@example.com", "hunter22")
            .await
            .unwrap();
        wait_signed_in(&h.store).await;
    }

    // New store over the same storage and backend, fresh provider state
    let store2 = SessionStore::new(
        LocalIdentityProvider::new(Arc::new(JwtConfig::new(PROVIDER_SECRET))),
        h.exchange.clone(),
        h.storage.clone(),
    );
    let _sub2 = store2.initialize().await;

    let state = store2.snapshot();
    assert!(!state.is_loading);
    assert_eq!(state.profile.unwrap().email, "alice@example.com");
}

#[tokio::test]
async fn test_restore_reflects_role_changes() {
    let h = harness().await;
    {
        let _sub = h.store.initialize().await;
        h.store
            .register("Alice", "alice@example.com", "hunter22")
            .await
            .unwrap();
        wait_signed_in(&h.store).await;
    }

    let profile = h
        .db
        .users()
        .get_by_email("alice@example.com")
        .await
        .unwrap()
        .unwrap();
    h.db.users().set_role(profile.id, Role::Moderator).await.unwrap();

    let store2 = SessionStore::new(
        LocalIdentityProvider::new(Arc::new(JwtConfig::new(PROVIDER_SECRET))),
        h.exchange.clone(),
        h.storage.clone(),
    );
    let _sub2 = store2.initialize().await;
    assert_eq!(store2.snapshot().role(), Some(Role::Moderator));
}

#[tokio::test]
async fn test_invalid_stored_token_is_discarded() {
    let h = harness().await;
    h.storage.store("garbage-token");

    let _sub = h.store.initialize().await;
    let state = h.store.snapshot();
    assert!(!state.is_loading);
    assert!(!state.is_signed_in());
    assert!(h.storage.load().is_none());
}

#[tokio::test]
async fn test_popup_sign_in() {
    let h = harness().await;
    let _sub = h.store.initialize().await;

    // Without a configured account the popup is a cancellation
    let err = h.store.login_with_popup().await.unwrap_err();
    assert!(matches!(err, SessionError::Auth(AuthError::Cancelled)));
    assert!(!h.store.snapshot().is_signed_in());

    h.provider.set_popup_account(Principal {
        uid: "google-uid-1".into(),
        email: "alice@gmail.example.com".into(),
        name: "Alice".into(),
        email_verified: true,
    });
    h.store.login_with_popup().await.unwrap();

    let state = wait_signed_in(&h.store).await;
    assert_eq!(state.profile.unwrap().email, "alice@gmail.example.com");
}

/// Exchange wrapper that delays completion, for racing sign-in against
/// sign-out.
#[derive(Clone)]
struct SlowExchange {
    inner: BackendExchange,
    delay: Duration,
}

impl ExchangeService for SlowExchange {
    fn exchange(
        &self,
        credential: &str,
    ) -> impl Future<Output = Result<ExchangeResponse, ExchangeError>> + Send {
        let this = self.clone();
        let credential = credential.to_string();
        async move {
            tokio::time::sleep(this.delay).await;
            this.inner.exchange(&credential).await
        }
    }

    fn verify(&self, token: &str) -> impl Future<Output = Result<Profile, ExchangeError>> + Send {
        let this = self.clone();
        let token = token.to_string();
        async move { this.inner.verify(&token).await }
    }

    fn revoke(&self, token: &str) -> impl Future<Output = ()> + Send {
        let this = self.clone();
        let token = token.to_string();
        async move { this.inner.revoke(&token).await }
    }
}

#[tokio::test]
async fn test_sign_in_completing_after_logout_is_discarded() {
    let db = Database::open(":memory:").await.unwrap();
    let jwt = Arc::new(JwtConfig::new(APP_SECRET));
    let provider_jwt = Arc::new(JwtConfig::new(PROVIDER_SECRET));

    let provider = LocalIdentityProvider::new(provider_jwt.clone());
    let exchange = SlowExchange {
        inner: BackendExchange::new(db, jwt, provider_jwt),
        delay: Duration::from_millis(200),
    };
    let storage = Arc::new(MemoryTokenStorage::new());
    let store = SessionStore::new(provider.clone(), exchange, storage.clone());
    let _sub = store.initialize().await;

    provider
        .register("Alice", "alice@example.com", "hunter22")
        .await
        .unwrap();
    // Let the listener pick up the sign-in and enter the slow exchange,
    // then sign out while it is still in flight
    tokio::time::sleep(Duration::from_millis(50)).await;
    store.logout().await;

    tokio::time::sleep(Duration::from_millis(500)).await;

    // The late completion must not resurrect the session
    assert!(!store.snapshot().is_signed_in());
    assert!(storage.load().is_none());
}

#[tokio::test]
async fn test_state_is_loading_while_exchange_in_flight() {
    let db = Database::open(":memory:").await.unwrap();
    let jwt = Arc::new(JwtConfig::new(APP_SECRET));
    let provider_jwt = Arc::new(JwtConfig::new(PROVIDER_SECRET));

    let provider = LocalIdentityProvider::new(provider_jwt.clone());
    let exchange = SlowExchange {
        inner: BackendExchange::new(db, jwt, provider_jwt),
        delay: Duration::from_millis(200),
    };
    let store = SessionStore::new(
        provider.clone(),
        exchange,
        Arc::new(MemoryTokenStorage::new()),
    );
    let _sub = store.initialize().await;

    store
        .register("Alice", "alice@example.com", "hunter22")
        .await
        .unwrap();
    tokio::time::sleep(Duration::from_millis(50)).await;

    // Mid-exchange the state reads as loading, so guards hold instead of
    // redirecting the signing-in user to login
    let state = store.snapshot();
    assert!(state.is_loading);
    assert!(!state.is_signed_in());
    assert_eq!(
        evaluate(&state, &[Role::Student], "/dashboard"),
        GuardDecision::Pending
    );

    let state = wait_signed_in(&store).await;
    assert!(!state.is_loading);
}

/// Exchange that refuses every credential.
#[derive(Clone)]
struct RejectingExchange {
    attempts: Arc<AtomicUsize>,
}

impl ExchangeService for RejectingExchange {
    fn exchange(
        &self,
        _credential: &str,
    ) -> impl Future<Output = Result<ExchangeResponse, ExchangeError>> + Send {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        async { Err(ExchangeError::InvalidCredential) }
    }

    fn verify(&self, _token: &str) -> impl Future<Output = Result<Profile, ExchangeError>> + Send {
        async { Err(ExchangeError::SessionRevoked) }
    }

    fn revoke(&self, _token: &str) -> impl Future<Output = ()> + Send {
        async {}
    }
}

#[tokio::test]
async fn test_rejected_exchange_leaves_user_signed_out() {
    let provider = LocalIdentityProvider::new(Arc::new(JwtConfig::new(PROVIDER_SECRET)));
    let attempts = Arc::new(AtomicUsize::new(0));
    let exchange = RejectingExchange {
        attempts: attempts.clone(),
    };
    let storage = Arc::new(MemoryTokenStorage::new());
    let store = SessionStore::new(provider.clone(), exchange, storage.clone());
    let _sub = store.initialize().await;

    store
        .register("Alice", "alice@example.com", "hunter22")
        .await
        .unwrap();

    // Wait until the rejection was processed and the state settled
    timeout(Duration::from_secs(5), async {
        while attempts.load(Ordering::SeqCst) == 0 || store.snapshot().is_loading {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("timed out waiting for the exchange to settle");

    let state = store.snapshot();
    assert!(state.profile.is_none());
    assert!(!state.is_loading);
    assert!(storage.load().is_none());
}

#[tokio::test]
async fn test_second_sign_in_wins() {
    let h = harness().await;
    let _sub = h.store.initialize().await;

    h.store
        .register("Alice", "alice@example.com", "hunter22")
        .await
        .unwrap();
    h.store
        .register("Bob", "bob@example.com", "hunter22")
        .await
        .unwrap();

    let mut rx = h.store.subscribe();
    let state = timeout(
        Duration::from_secs(5),
        rx.wait_for(|s| {
            s.profile.as_ref().map(|p| p.email.as_str()) == Some("bob@example.com")
        }),
    )
    .await
    .expect("timed out waiting for second sign-in")
    .unwrap()
    .clone();

    assert_eq!(state.profile.unwrap().name, "Bob");
}

#[tokio::test]
async fn test_update_profile_locally() {
    let h = harness().await;
    let _sub = h.store.initialize().await;

    h.store
        .register("Alice", "alice@example.com", "hunter22")
        .await
        .unwrap();
    wait_signed_in(&h.store).await;

    let mut profile = h.store.snapshot().profile.unwrap();
    profile.country = Some("Canada".into());
    h.store.update_profile_locally(profile);

    assert_eq!(
        h.store.snapshot().profile.unwrap().country.as_deref(),
        Some("Canada")
    );
}

#[tokio::test]
async fn test_guard_follows_session_lifecycle() {
    let h = harness().await;

    // Before initialization the guard holds
    assert_eq!(
        evaluate(&h.store.snapshot(), &[Role::Student], "/dashboard/my-applications"),
        GuardDecision::Pending
    );

    let _sub = h.store.initialize().await;
    assert_eq!(
        evaluate(&h.store.snapshot(), &[Role::Student], "/dashboard/my-applications"),
        GuardDecision::RedirectToLogin {
            return_to: "/dashboard/my-applications".to_string()
        }
    );

    h.store
        .register("Alice", "alice@example.com", "hunter22")
        .await
        .unwrap();
    wait_signed_in(&h.store).await;

    let state = h.store.snapshot();
    assert_eq!(
        evaluate(&state, &[Role::Student], "/dashboard/my-applications"),
        GuardDecision::Allow
    );
    assert_eq!(
        evaluate(&state, &[Role::Admin], "/dashboard/manage-users"),
        GuardDecision::RedirectToUnauthorized
    );

    // And the menu matches the role
    let menu = menu_for(state.role().unwrap());
    assert!(menu.iter().any(|i| i.path == "/dashboard/my-applications"));

    h.store.logout().await;
    assert!(matches!(
        evaluate(&h.store.snapshot(), &[Role::Student], "/dashboard"),
        GuardDecision::RedirectToLogin { .. }
    ));
}
