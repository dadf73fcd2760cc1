//! Twitter/X OAuth
//!
//! - `oauth1`: OAuth 1.0a request signing and response parsing
//! - `oauth2`: PKCE pairs, CSRF state and the authorization URL
//! - `client`: the live provider, one shared HTTP client
//! - `handshake`: the start/exchange state machines for both flows

pub mod client;
pub mod handshake;
pub mod oauth1;
pub mod oauth2;

use async_trait::async_trait;

use crate::config::{OAuth1Config, OAuth2Config};
use crate::error::AppError;

pub use client::TwitterClient;

/// Temporary credentials from the first OAuth 1.0a leg
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestToken {
    pub token: String,
    pub secret: String,
}

/// Durable OAuth 1.0a credentials
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessToken {
    pub token: String,
    pub secret: String,
    pub user_id: Option<String>,
    pub screen_name: Option<String>,
}

/// OAuth 2.0 token endpoint response
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OAuth2Tokens {
    pub access_token: String,
    pub refresh_token: Option<String>,
    pub expires_in: Option<i64>,
    pub scope: Option<String>,
}

/// Network calls to the provider. Everything else in the handshake is local.
#[async_trait]
pub trait TwitterProvider: Send + Sync {
    /// OAuth 1.0a: obtain a request token bound to the configured callback
    async fn request_token(&self, config: &OAuth1Config) -> Result<RequestToken, AppError>;

    /// OAuth 1.0a: trade request token + PIN/verifier for an access token
    async fn exchange_verifier(
        &self,
        config: &OAuth1Config,
        request_token: &RequestToken,
        verifier: &str,
    ) -> Result<AccessToken, AppError>;

    /// OAuth 2.0: trade an authorization code + PKCE verifier for tokens
    async fn exchange_code(
        &self,
        config: &OAuth2Config,
        code: &str,
        code_verifier: &str,
    ) -> Result<OAuth2Tokens, AppError>;
}
