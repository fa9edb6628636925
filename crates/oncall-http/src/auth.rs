//! Token storage and auth payloads

use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

#[derive(Debug, Clone, Serialize)]
pub struct LoginRequest<'a> {
    pub email: &'a str,
    pub password: &'a str,
}

/// Token pair returned by the login endpoint
#[derive(Debug, Clone, Deserialize)]
pub struct TokenPair {
    pub access: String,
    pub refresh: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct RefreshRequest<'a> {
    pub refresh: &'a str,
}

/// Refresh response. Some deployments rotate the refresh token as well.
#[derive(Debug, Clone, Deserialize)]
pub struct RefreshResponse {
    pub access: String,
    #[serde(default)]
    pub refresh: Option<String>,
}

#[derive(Debug, Clone, Default)]
struct Tokens {
    access: Option<String>,
    refresh: Option<String>,
}

/// Access and refresh tokens shared by all requests of one client
#[derive(Debug, Default)]
pub struct TokenStore {
    tokens: RwLock<Tokens>,
}

impl TokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn access(&self) -> Option<String> {
        self.tokens.read().await.access.clone()
    }

    pub async fn refresh_token(&self) -> Option<String> {
        self.tokens.read().await.refresh.clone()
    }

    pub async fn set_pair(&self, pair: TokenPair) {
        let mut tokens = self.tokens.write().await;
        tokens.access = Some(pair.access);
        tokens.refresh = Some(pair.refresh);
    }

    pub async fn set_access(&self, access: String) {
        self.tokens.write().await.access = Some(access);
    }

    pub async fn apply_refresh(&self, response: RefreshResponse) {
        let mut tokens = self.tokens.write().await;
        tokens.access = Some(response.access);
        if let Some(refresh) = response.refresh {
            tokens.refresh = Some(refresh);
        }
    }

    pub async fn clear(&self) {
        *self.tokens.write().await = Tokens::default();
    }

    pub async fn is_authenticated(&self) -> bool {
        self.tokens.read().await.access.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn refresh_keeps_refresh_token_unless_rotated() {
        let store = TokenStore::new();
        store
            .set_pair(TokenPair {
                access: "a1".into(),
                refresh: "r1".into(),
            })
            .await;

        store
            .apply_refresh(RefreshResponse {
                access: "a2".into(),
                refresh: None,
            })
            .await;
        assert_eq!(store.access().await.as_deref(), Some("a2"));
        assert_eq!(store.refresh_token().await.as_deref(), Some("r1"));

        store
            .apply_refresh(RefreshResponse {
                access: "a3".into(),
                refresh: Some("r2".into()),
            })
            .await;
        assert_eq!(store.refresh_token().await.as_deref(), Some("r2"));

        store.clear().await;
        assert!(!store.is_authenticated().await);
        assert!(store.refresh_token().await.is_none());
    }
}
