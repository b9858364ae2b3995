// src/client/session.rs

//! Sessão do cliente: fonte única dos tokens, compartilhada entre clones.

use std::sync::{Arc, PoisonError, RwLock};

use crate::models::auth::TokenPair;

type InvalidateCallback = Arc<dyn Fn() + Send + Sync>;

#[derive(Default)]
struct SessionInner {
    tokens: RwLock<Option<TokenPair>>,
    on_invalidate: RwLock<Option<InvalidateCallback>>,
}

#[derive(Clone, Default)]
pub struct Session {
    inner: Arc<SessionInner>,
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session").field("authenticated", &self.is_authenticated()).finish()
    }
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_tokens(tokens: TokenPair) -> Self {
        let session = Self::new();
        session.set_tokens(tokens);
        session
    }

    pub fn set_tokens(&self, tokens: TokenPair) {
        *self.inner.tokens.write().unwrap_or_else(PoisonError::into_inner) = Some(tokens);
    }

    /// Troca só o access token (após refresh).
    pub fn set_access(&self, access: String) {
        let mut guard = self.inner.tokens.write().unwrap_or_else(PoisonError::into_inner);
        if let Some(tokens) = guard.as_mut() {
            tokens.access = access;
        }
    }

    pub fn access_token(&self) -> Option<String> {
        self.tokens().map(|t| t.access)
    }

    pub fn refresh_token(&self) -> Option<String> {
        self.tokens().map(|t| t.refresh)
    }

    pub fn tokens(&self) -> Option<TokenPair> {
        self.inner.tokens.read().unwrap_or_else(PoisonError::into_inner).clone()
    }

    pub fn is_authenticated(&self) -> bool {
        self.tokens().is_some()
    }

    /// Registra o callback chamado quando a sessão é invalidada.
    pub fn on_invalidate(&self, callback: impl Fn() + Send + Sync + 'static) {
        *self.inner.on_invalidate.write().unwrap_or_else(PoisonError::into_inner) = Some(Arc::new(callback));
    }

    /// Limpa os tokens e dispara o callback (logout ou 401).
    pub fn invalidate(&self) {
        let had_tokens = self.inner.tokens.write().unwrap_or_else(PoisonError::into_inner).take().is_some();
        let callback = self.inner.on_invalidate.read().unwrap_or_else(PoisonError::into_inner).clone();
        if had_tokens {
            tracing::debug!("Sessão invalidada");
        }
        if let Some(callback) = callback {
            callback();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn pair() -> TokenPair {
        TokenPair { access: "a".into(), refresh: "r".into() }
    }

    #[test]
    fn clones_share_tokens() {
        let session = Session::new();
        let clone = session.clone();
        session.set_tokens(pair());
        assert_eq!(clone.access_token().as_deref(), Some("a"));

        clone.set_access("b".into());
        assert_eq!(session.access_token().as_deref(), Some("b"));
        assert_eq!(session.refresh_token().as_deref(), Some("r"));
    }

    #[test]
    fn invalidate_clears_and_notifies() {
        let calls = Arc::new(AtomicUsize::new(0));
        let session = Session::with_tokens(pair());
        let counter = calls.clone();
        session.on_invalidate(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        session.clone().invalidate();
        assert!(!session.is_authenticated());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
