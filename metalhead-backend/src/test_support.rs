//! Shared fixtures for unit and handler tests

use async_trait::async_trait;
use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use actix_web::web;

use crate::config::{Config, OAuth1Config, OAuth2Config};
use crate::cookies::CookieSigner;
use crate::db::Database;
use crate::error::AppError;
use crate::storage::ObjectCredentialStore;
use crate::twitter::{AccessToken, OAuth2Tokens, RequestToken, TwitterProvider};
use crate::AppState;

pub const TEST_SECRET: &str = "0123456789abcdef0123456789abcdef";

pub fn oauth1_config() -> OAuth1Config {
    OAuth1Config {
        consumer_key: "consumer-key".to_string(),
        consumer_secret: "consumer-secret".to_string(),
        callback_url: "http://localhost:8080/api/twitter/callback".to_string(),
    }
}

pub fn oauth2_config() -> OAuth2Config {
    OAuth2Config {
        client_id: "client-id".to_string(),
        client_secret: None,
        redirect_uri: "http://localhost:8080/api/twitter/oauth2/callback".to_string(),
    }
}

/// Config with both flows enabled and the object backend rooted at `bucket`
pub fn test_config(bucket: &Path) -> Config {
    let vars: HashMap<&str, String> = HashMap::from([
        ("SECRET_COOKIE_PASSWORD", TEST_SECRET.to_string()),
        ("APP_ORIGIN", "http://localhost:3000".to_string()),
        ("CREDENTIAL_BUCKET_DIR", bucket.display().to_string()),
    ]);
    let mut config = Config::from_lookup(|k| vars.get(k).cloned()).unwrap();
    config.oauth1 = Some(oauth1_config());
    config.oauth2 = Some(oauth2_config());
    config
}

pub fn test_state(config: Config, provider: Arc<StubProvider>) -> web::Data<AppState> {
    let db = Arc::new(Database::new(":memory:").unwrap());
    let credentials = Arc::new(ObjectCredentialStore::new(&config.credential_bucket_dir));
    web::Data::new(AppState {
        db,
        cookies: CookieSigner::new(&config.cookie_secret, config.production),
        config,
        twitter: provider,
        credentials,
    })
}

/// Provider double that counts calls and returns canned tokens
#[derive(Default)]
pub struct StubProvider {
    fail: bool,
    request_token_calls: AtomicUsize,
    exchange_verifier_calls: AtomicUsize,
    exchange_code_calls: AtomicUsize,
}

impl StubProvider {
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Default::default()
        }
    }

    pub fn request_token_calls(&self) -> usize {
        self.request_token_calls.load(Ordering::SeqCst)
    }

    pub fn exchange_verifier_calls(&self) -> usize {
        self.exchange_verifier_calls.load(Ordering::SeqCst)
    }

    pub fn exchange_code_calls(&self) -> usize {
        self.exchange_code_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TwitterProvider for StubProvider {
    async fn request_token(&self, _config: &OAuth1Config) -> Result<RequestToken, AppError> {
        let n = self.request_token_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(AppError::Upstream("stub failure".to_string()));
        }
        Ok(RequestToken {
            token: format!("req-token-{}", n),
            secret: format!("req-secret-{}", n),
        })
    }

    async fn exchange_verifier(
        &self,
        _config: &OAuth1Config,
        _request_token: &RequestToken,
        verifier: &str,
    ) -> Result<AccessToken, AppError> {
        self.exchange_verifier_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(AppError::Upstream("stub failure".to_string()));
        }
        Ok(AccessToken {
            token: format!("ACCESS-{}", verifier),
            secret: format!("SECRET-{}", verifier),
            user_id: Some("1".to_string()),
            screen_name: Some("metalhead".to_string()),
        })
    }

    async fn exchange_code(
        &self,
        _config: &OAuth2Config,
        _code: &str,
        _code_verifier: &str,
    ) -> Result<OAuth2Tokens, AppError> {
        self.exchange_code_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(AppError::Upstream("stub failure".to_string()));
        }
        Ok(OAuth2Tokens {
            access_token: "AT".to_string(),
            refresh_token: Some("RT".to_string()),
            expires_in: Some(7200),
            scope: Some("tweet.read users.read".to_string()),
        })
    }
}
