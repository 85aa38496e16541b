//! Ownership of the persisted token pair and the refresh state machine.

pub mod store;
pub mod token;

use std::future::Future;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use futures::lock::Mutex;

use crate::api::types::{AuthTokens, RefreshResponse};
use crate::config::{ACCESS_TOKEN_KEY, REFRESH_TOKEN_KEY};
use crate::error::ApiError;

pub use store::{default_store, MemoryStore, SessionStore};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// No access token stored.
    Anonymous,
    Authenticated,
    /// Valid, but inside the refresh window.
    Expiring,
    Refreshing,
    /// Past `exp` (or unreadable) with no refresh running.
    Expired,
}

/// A token read together with the refresh attempt counter it belongs to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessGrant {
    pub token: String,
    pub seen_attempt: u64,
}

#[derive(Default)]
struct RefreshSlot {
    attempt: u64,
    outcome: Option<Result<String, ApiError>>,
}

/// Lowered on drop, so a cancelled refresh does not leave it raised.
struct RefreshingFlag<'a>(&'a AtomicBool);

impl<'a> RefreshingFlag<'a> {
    fn raise(flag: &'a AtomicBool) -> Self {
        flag.store(true, Ordering::SeqCst);
        Self(flag)
    }
}

impl Drop for RefreshingFlag<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

pub struct SessionManager {
    store: Arc<dyn SessionStore>,
    slot: Mutex<RefreshSlot>,
    attempts: AtomicU64,
    refreshing: AtomicBool,
}

impl SessionManager {
    pub fn new(store: Arc<dyn SessionStore>) -> Self {
        Self {
            store,
            slot: Mutex::new(RefreshSlot::default()),
            attempts: AtomicU64::new(0),
            refreshing: AtomicBool::new(false),
        }
    }

    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryStore::new()))
    }

    pub fn access_token(&self) -> Result<Option<String>, ApiError> {
        Ok(self
            .store
            .get(ACCESS_TOKEN_KEY)?
            .filter(|t| !t.trim().is_empty()))
    }

    pub fn refresh_token(&self) -> Result<Option<String>, ApiError> {
        Ok(self
            .store
            .get(REFRESH_TOKEN_KEY)?
            .filter(|t| !t.trim().is_empty()))
    }

    /// Reads the counter before the token so that a refresh finishing in
    /// between is reused rather than repeated.
    pub fn grant(&self) -> Result<Option<AccessGrant>, ApiError> {
        let seen_attempt = self.attempts.load(Ordering::SeqCst);
        Ok(self.access_token()?.map(|token| AccessGrant {
            token,
            seen_attempt,
        }))
    }

    pub fn store_tokens(&self, tokens: &AuthTokens) -> Result<(), ApiError> {
        self.store.set(ACCESS_TOKEN_KEY, &tokens.access)?;
        self.store.set(REFRESH_TOKEN_KEY, &tokens.refresh)?;
        Ok(())
    }

    fn apply_refresh(&self, response: &RefreshResponse) -> Result<(), ApiError> {
        self.store.set(ACCESS_TOKEN_KEY, &response.access)?;
        if let Some(rotated) = response.refresh.as_deref().filter(|r| !r.is_empty()) {
            self.store.set(REFRESH_TOKEN_KEY, rotated)?;
        }
        Ok(())
    }

    /// Removes both tokens. Removal errors are logged; the caller is logging
    /// out either way.
    pub fn clear(&self) {
        for key in [ACCESS_TOKEN_KEY, REFRESH_TOKEN_KEY] {
            if let Err(err) = self.store.remove(key) {
                log::warn!("Failed to remove {} from session store: {}", key, err);
            }
        }
    }

    pub fn is_authenticated_at(&self, now: i64) -> bool {
        match self.access_token() {
            Ok(Some(t)) => token::is_valid_at(&t, now),
            _ => false,
        }
    }

    pub fn is_token_expiring_soon_at(&self, now: i64) -> bool {
        match self.access_token() {
            Ok(Some(t)) => token::is_expiring_at(&t, now),
            _ => true,
        }
    }

    pub fn state_at(&self, now: i64) -> SessionState {
        let Ok(Some(access)) = self.access_token() else {
            return SessionState::Anonymous;
        };
        if self.refreshing.load(Ordering::SeqCst) {
            SessionState::Refreshing
        } else if !token::is_valid_at(&access, now) {
            SessionState::Expired
        } else if token::is_expiring_at(&access, now) {
            SessionState::Expiring
        } else {
            SessionState::Authenticated
        }
    }

    /// Runs `exchange` with the stored refresh token, unless an attempt
    /// completed after `seen_attempt` was observed, in which case that
    /// attempt's outcome is returned. Callers queued behind an in-flight
    /// refresh therefore share it.
    ///
    /// `seen_attempt` is advanced to the attempt whose outcome is returned.
    pub async fn refresh_with<F, Fut>(
        &self,
        seen_attempt: &mut u64,
        exchange: F,
    ) -> Result<String, ApiError>
    where
        F: FnOnce(String) -> Fut,
        Fut: Future<Output = Result<RefreshResponse, ApiError>>,
    {
        let mut slot = self.slot.lock().await;
        if slot.attempt != *seen_attempt {
            if let Some(outcome) = slot.outcome.clone() {
                log::debug!("Reusing outcome of refresh attempt {}", slot.attempt);
                *seen_attempt = slot.attempt;
                return outcome;
            }
        }

        let outcome = {
            let _refreshing = RefreshingFlag::raise(&self.refreshing);
            self.exchange_refresh_token(exchange).await
        };

        slot.attempt += 1;
        slot.outcome = Some(outcome.clone());
        self.attempts.store(slot.attempt, Ordering::SeqCst);
        *seen_attempt = slot.attempt;
        outcome
    }

    async fn exchange_refresh_token<F, Fut>(&self, exchange: F) -> Result<String, ApiError>
    where
        F: FnOnce(String) -> Fut,
        Fut: Future<Output = Result<RefreshResponse, ApiError>>,
    {
        let refresh = self
            .refresh_token()?
            .ok_or_else(|| ApiError::RefreshFailed("No refresh token found".into()))?;
        let response = exchange(refresh).await?;
        self.apply_refresh(&response)?;
        log::debug!("Access token refreshed");
        Ok(response.access)
    }

    pub fn attempts(&self) -> u64 {
        self.attempts.load(Ordering::SeqCst)
    }
}

#[cfg(all(test, not(target_arch = "wasm32")))]
mod tests {
    use super::token::token_expiring_in;
    use super::*;
    use futures::{future, FutureExt};
    use std::cell::Cell;

    fn tokens(access: &str, refresh: &str) -> AuthTokens {
        AuthTokens {
            access: access.to_string(),
            refresh: refresh.to_string(),
        }
    }

    #[test]
    fn state_follows_token_lifecycle() {
        let session = SessionManager::in_memory();
        let now = token::now_secs();
        assert_eq!(session.state_at(now), SessionState::Anonymous);
        assert!(!session.is_authenticated_at(now));
        assert!(session.is_token_expiring_soon_at(now));

        session
            .store_tokens(&tokens(&token_expiring_in(3600), "r1"))
            .unwrap();
        assert_eq!(session.state_at(now), SessionState::Authenticated);

        session
            .store_tokens(&tokens(&token_expiring_in(120), "r1"))
            .unwrap();
        assert_eq!(session.state_at(now), SessionState::Expiring);

        session
            .store_tokens(&tokens(&token_expiring_in(-1), "r1"))
            .unwrap();
        assert_eq!(session.state_at(now), SessionState::Expired);

        session.clear();
        assert_eq!(session.state_at(now), SessionState::Anonymous);
        assert!(session.refresh_token().unwrap().is_none());
    }

    #[tokio::test]
    async fn state_is_refreshing_while_exchange_runs() {
        let session = SessionManager::in_memory();
        session
            .store_tokens(&tokens(&token_expiring_in(60), "r1"))
            .unwrap();
        let fresh = token_expiring_in(3600);
        let observed = Cell::new(None);

        let mut seen = session.attempts();
        session
            .refresh_with(&mut seen, |_| {
                observed.set(Some(session.state_at(token::now_secs())));
                let access = fresh.clone();
                async move {
                    Ok(RefreshResponse {
                        access,
                        refresh: None,
                    })
                }
            })
            .await
            .unwrap();

        assert_eq!(observed.get(), Some(SessionState::Refreshing));
        assert_eq!(
            session.state_at(token::now_secs()),
            SessionState::Authenticated
        );
    }

    #[tokio::test]
    async fn cancelled_refresh_clears_refreshing_state() {
        let session = SessionManager::in_memory();
        session
            .store_tokens(&tokens(&token_expiring_in(3600), "r1"))
            .unwrap();
        let now = token::now_secs();

        let mut seen = session.attempts();
        let mut pending = Box::pin(session.refresh_with(&mut seen, |_| {
            future::pending::<Result<RefreshResponse, ApiError>>()
        }));
        assert!((&mut pending).now_or_never().is_none());
        assert_eq!(session.state_at(now), SessionState::Refreshing);

        drop(pending);
        assert_eq!(session.state_at(now), SessionState::Authenticated);
        assert_eq!(session.attempts(), 0);

        // The refresh lock was released with the cancelled future.
        let mut seen = session.attempts();
        let refreshed = session
            .refresh_with(&mut seen, |_| async {
                Ok(RefreshResponse {
                    access: "new".into(),
                    refresh: None,
                })
            })
            .await
            .unwrap();
        assert_eq!(refreshed, "new");
        assert_eq!(session.attempts(), 1);
    }

    #[test]
    fn blank_tokens_count_as_missing() {
        let session = SessionManager::in_memory();
        session.store_tokens(&tokens("  ", "")).unwrap();
        assert!(session.access_token().unwrap().is_none());
        assert!(session.refresh_token().unwrap().is_none());
        assert!(session.grant().unwrap().is_none());
    }

    #[tokio::test]
    async fn refresh_persists_access_and_rotated_refresh_token() {
        let session = SessionManager::in_memory();
        session.store_tokens(&tokens("old", "r1")).unwrap();

        let mut seen = session.attempts();
        let fresh = session
            .refresh_with(&mut seen, |refresh| async move {
                assert_eq!(refresh, "r1");
                Ok(RefreshResponse {
                    access: "new".into(),
                    refresh: Some("r2".into()),
                })
            })
            .await
            .unwrap();

        assert_eq!(fresh, "new");
        assert_eq!(seen, 1);
        assert_eq!(session.access_token().unwrap().as_deref(), Some("new"));
        assert_eq!(session.refresh_token().unwrap().as_deref(), Some("r2"));
    }

    #[tokio::test]
    async fn refresh_without_rotation_keeps_refresh_token() {
        let session = SessionManager::in_memory();
        session.store_tokens(&tokens("old", "r1")).unwrap();

        let mut seen = session.attempts();
        session
            .refresh_with(&mut seen, |_| async {
                Ok(RefreshResponse {
                    access: "new".into(),
                    refresh: None,
                })
            })
            .await
            .unwrap();
        assert_eq!(session.refresh_token().unwrap().as_deref(), Some("r1"));
    }

    #[tokio::test]
    async fn refresh_without_refresh_token_fails_without_exchange() {
        let session = SessionManager::in_memory();
        let called = Cell::new(false);

        let mut seen = session.attempts();
        let err = session
            .refresh_with(&mut seen, |_| {
                called.set(true);
                async {
                    Ok(RefreshResponse {
                        access: "never".into(),
                        refresh: None,
                    })
                }
            })
            .await
            .unwrap_err();

        assert!(matches!(err, ApiError::RefreshFailed(_)));
        assert!(!called.get());
    }

    #[tokio::test]
    async fn completed_attempt_is_reused_by_stale_observers() {
        let session = SessionManager::in_memory();
        session.store_tokens(&tokens("old", "r1")).unwrap();
        let calls = Cell::new(0);

        let mut first = session.attempts();
        let mut second = session.attempts();

        let exchange = |_: String| {
            calls.set(calls.get() + 1);
            async {
                Ok(RefreshResponse {
                    access: "new".into(),
                    refresh: None,
                })
            }
        };
        assert_eq!(session.refresh_with(&mut first, exchange).await.unwrap(), "new");
        assert_eq!(session.refresh_with(&mut second, exchange).await.unwrap(), "new");
        assert_eq!(calls.get(), 1);
        assert_eq!(second, first);

        // An observer that is already current starts a new attempt.
        session.refresh_with(&mut second, exchange).await.unwrap();
        assert_eq!(calls.get(), 2);
        assert_eq!(session.attempts(), 2);
    }

    #[tokio::test]
    async fn failed_attempt_is_shared_then_retried_by_current_observer() {
        let session = SessionManager::in_memory();
        session.store_tokens(&tokens("old", "r1")).unwrap();

        let mut waiter = session.attempts();
        let mut owner = session.attempts();
        let err = session
            .refresh_with(&mut owner, |_| async {
                Err(ApiError::RefreshFailed("token_not_valid".into()))
            })
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::RefreshFailed(_)));

        let shared = session
            .refresh_with(&mut waiter, |_| async {
                Ok(RefreshResponse {
                    access: "unused".into(),
                    refresh: None,
                })
            })
            .await;
        assert!(matches!(shared, Err(ApiError::RefreshFailed(_))));

        let retried = session
            .refresh_with(&mut owner, |_| async {
                Ok(RefreshResponse {
                    access: "new".into(),
                    refresh: None,
                })
            })
            .await
            .unwrap();
        assert_eq!(retried, "new");
        assert_eq!(session.access_token().unwrap().as_deref(), Some("new"));
    }
}
