use std::{future::Future, sync::Arc};

use chrono::Utc;
use tokio::sync::Mutex;

// Tokens are refreshed this many seconds before they expire.
const EXPIRY_BUFFER_SECS: u64 = 240;

#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub access_token: String,
    /// Lifetime in seconds as reported by the provider. `None` means the
    /// token is kept until it is invalidated.
    pub expires_in: Option<u64>,
    pub obtained_at: u64,
}

impl Token {
    pub fn new(access_token: String, expires_in: Option<u64>) -> Self {
        Self {
            access_token,
            expires_in,
            obtained_at: Utc::now().timestamp() as u64,
        }
    }

    pub fn is_expired_at(&self, now: u64) -> bool {
        match self.expires_in {
            Some(expires_in) => {
                let buffer = EXPIRY_BUFFER_SECS.min(expires_in / 2);
                now >= self.obtained_at.saturating_add(expires_in - buffer)
            }
            None => false,
        }
    }

    fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now().timestamp() as u64)
    }
}

/// Owns the process-wide access token.
///
/// Clones share the same slot. The lock is held while a new token is fetched
/// so callers racing on an empty or stale slot trigger a single refresh.
#[derive(Debug, Clone, Default)]
pub struct TokenManager {
    slot: Arc<Mutex<Option<Token>>>,
}

impl TokenManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_token(token: Token) -> Self {
        Self {
            slot: Arc::new(Mutex::new(Some(token))),
        }
    }

    /// Returns the cached access token, or stores and returns the one
    /// produced by `refresh` when the slot is empty or stale.
    pub async fn get_or_refresh<F, Fut, E>(&self, refresh: F) -> Result<String, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Token, E>>,
    {
        let mut slot = self.slot.lock().await;
        if let Some(token) = slot.as_ref() {
            if !token.is_expired() {
                return Ok(token.access_token.clone());
            }
        }

        let token = refresh().await?;
        let access_token = token.access_token.clone();
        *slot = Some(token);
        Ok(access_token)
    }

    pub async fn invalidate(&self) {
        self.slot.lock().await.take();
    }

    /// Drops the cached token only while it is still `rejected`. Returns
    /// whether the slot was cleared; a token refreshed meanwhile is kept.
    pub async fn invalidate_if_current(&self, rejected: &str) -> bool {
        let mut slot = self.slot.lock().await;
        match slot.as_ref() {
            Some(token) if token.access_token == rejected => {
                slot.take();
                true
            }
            _ => false,
        }
    }

    pub async fn current_token(&self) -> Option<Token> {
        self.slot.lock().await.clone()
    }
}
