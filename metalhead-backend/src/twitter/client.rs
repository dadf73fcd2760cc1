//! Live Twitter provider
//!
//! One `reqwest::Client` is built at startup and shared by every request.
//! Provider failures are surfaced as `UpstreamError` and never retried.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

use super::{oauth1, oauth2, AccessToken, OAuth2Tokens, RequestToken, TwitterProvider};
use crate::config::{OAuth1Config, OAuth2Config};
use crate::error::AppError;

#[derive(Clone)]
pub struct TwitterClient {
    client: Client,
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    refresh_token: Option<String>,
    expires_in: Option<i64>,
    scope: Option<String>,
}

impl TwitterClient {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    async fn post_signed(&self, url: &str, authorization: String) -> Result<String, AppError> {
        let response = self
            .client
            .post(url)
            .header("Authorization", authorization)
            .send()
            .await
            .map_err(|e| AppError::Upstream(format!("Twitter request failed: {}", e)))?;

        let status = response.status();
        let body = response.text().await.unwrap_or_default();

        if !status.is_success() {
            log::error!("[TWITTER] {} returned {}: {}", url, status, body);
            return Err(AppError::Upstream(format!(
                "Twitter rejected the request ({})",
                status
            )));
        }

        Ok(body)
    }
}

#[async_trait]
impl TwitterProvider for TwitterClient {
    async fn request_token(&self, config: &OAuth1Config) -> Result<RequestToken, AppError> {
        let header = oauth1::authorization_header(&oauth1::SigningRequest {
            method: "POST",
            url: oauth1::REQUEST_TOKEN_URL,
            consumer_key: &config.consumer_key,
            consumer_secret: &config.consumer_secret,
            token: None,
            oauth_extra: &[("oauth_callback", config.callback_url.as_str())],
            request_params: &[],
        });

        let body = self.post_signed(oauth1::REQUEST_TOKEN_URL, header).await?;
        oauth1::parse_request_token(&body)
    }

    async fn exchange_verifier(
        &self,
        config: &OAuth1Config,
        request_token: &RequestToken,
        verifier: &str,
    ) -> Result<AccessToken, AppError> {
        let header = oauth1::authorization_header(&oauth1::SigningRequest {
            method: "POST",
            url: oauth1::ACCESS_TOKEN_URL,
            consumer_key: &config.consumer_key,
            consumer_secret: &config.consumer_secret,
            token: Some((request_token.token.as_str(), request_token.secret.as_str())),
            oauth_extra: &[("oauth_verifier", verifier)],
            request_params: &[],
        });

        let body = self.post_signed(oauth1::ACCESS_TOKEN_URL, header).await?;
        oauth1::parse_access_token(&body)
    }

    async fn exchange_code(
        &self,
        config: &OAuth2Config,
        code: &str,
        code_verifier: &str,
    ) -> Result<OAuth2Tokens, AppError> {
        let mut params = vec![
            ("grant_type", "authorization_code"),
            ("code", code),
            ("redirect_uri", config.redirect_uri.as_str()),
            ("code_verifier", code_verifier),
        ];

        let mut request = self.client.post(oauth2::TOKEN_URL);
        match &config.client_secret {
            // Confidential client: authenticate with HTTP Basic
            Some(secret) => request = request.basic_auth(&config.client_id, Some(secret)),
            None => params.push(("client_id", config.client_id.as_str())),
        }

        let response = request
            .form(&params)
            .send()
            .await
            .map_err(|e| AppError::Upstream(format!("Token request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            log::error!("[TWITTER] Token exchange failed: {} - {}", status, error_text);
            return Err(AppError::Upstream(format!(
                "Token exchange failed ({})",
                status
            )));
        }

        let token_response: TokenResponse = response
            .json()
            .await
            .map_err(|e| AppError::Upstream(format!("Failed to parse token response: {}", e)))?;

        Ok(OAuth2Tokens {
            access_token: token_response.access_token,
            refresh_token: token_response.refresh_token,
            expires_in: token_response.expires_in,
            scope: token_response.scope,
        })
    }
}
