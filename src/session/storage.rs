//! Persistent token storage.
//!
//! Holds the raw session token between runs so a restart can resume the
//! session without signing in again. Failures are swallowed: losing the
//! stored token only costs a re-login.

use std::path::PathBuf;
use std::sync::Mutex;

/// Where the session token lives between runs.
pub trait TokenStorage: Send + Sync + 'static {
    fn load(&self) -> Option<String>;
    fn store(&self, token: &str);
    fn clear(&self);
}

impl<T: TokenStorage> TokenStorage for std::sync::Arc<T> {
    fn load(&self) -> Option<String> {
        (**self).load()
    }

    fn store(&self, token: &str) {
        (**self).store(token)
    }

    fn clear(&self) {
        (**self).clear()
    }
}

/// Token storage in a plain file.
pub struct FileTokenStorage {
    path: PathBuf,
}

impl FileTokenStorage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl TokenStorage for FileTokenStorage {
    fn load(&self) -> Option<String> {
        let token = std::fs::read_to_string(&self.path).ok()?;
        let token = token.trim();
        if token.is_empty() {
            return None;
        }
        Some(token.to_string())
    }

    fn store(&self, token: &str) {
        if let Some(parent) = self.path.parent() {
            let _ = std::fs::create_dir_all(parent);
        }
        if let Err(e) = std::fs::write(&self.path, token) {
            tracing::warn!("Failed to persist session token: {}", e);
        }
    }

    fn clear(&self) {
        match std::fs::remove_file(&self.path) {
            Ok(_) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => tracing::warn!("Failed to clear session token: {}", e),
        }
    }
}

/// In-memory token storage for tests and ephemeral sessions.
#[derive(Default)]
pub struct MemoryTokenStorage {
    token: Mutex<Option<String>>,
}

impl MemoryTokenStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl TokenStorage for MemoryTokenStorage {
    fn load(&self) -> Option<String> {
        self.token.lock().unwrap().clone()
    }

    fn store(&self, token: &str) {
        *self.token.lock().unwrap() = Some(token.to_string());
    }

    fn clear(&self) {
        *self.token.lock().unwrap() = None;
    }
}
