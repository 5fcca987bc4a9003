//! Client-side session layer.
//!
//! What a frontend embeds: an identity provider for credentials, an
//! exchange that turns provider credentials into app sessions, persistent
//! token storage, a watchable session store, and the route guard and menus
//! that consume it.

mod exchange;
mod guard;
mod nav;
mod provider;
mod storage;
mod store;

pub use exchange::{BackendExchange, ExchangeError, ExchangeResponse, ExchangeService};
pub use guard::{GuardDecision, evaluate, evaluate_signed_in};
pub use nav::{NavItem, menu_for};
pub use provider::{
    AuthError, AuthEvent, IdentityProvider, LocalIdentityProvider, Principal,
};
pub use storage::{FileTokenStorage, MemoryTokenStorage, TokenStorage};
pub use store::{SessionError, SessionState, SessionStore, SessionSubscription};
