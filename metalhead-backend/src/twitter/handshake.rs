//! OAuth handshake state machines
//!
//! OAuth 1.0a: `start_oauth1` (request token) -> user approves on Twitter ->
//! `complete_oauth1` (PIN/verifier exchange, credential persisted).
//!
//! OAuth 2.0: `start_oauth2` (PKCE verifier + CSRF state) -> user approves ->
//! `complete_oauth2` (state check, code exchange, credential persisted).
//!
//! The `PendingAuth` produced by a start travels in the signed cookie and is
//! handed back to the matching completion. A missing or foreign pending state
//! is `SessionExpired`; a state mismatch is `CsrfMismatch` and stops before
//! any provider call.

use super::{oauth1, oauth2, TwitterProvider};
use crate::config::{OAuth1Config, OAuth2Config};
use crate::cookies::constant_time_eq;
use crate::error::AppError;
use crate::models::{Credential, PendingAuth};
use crate::storage::{validate_email, CredentialStore};

/// Result of a handshake start: where to send the user, and what to remember
#[derive(Debug, Clone)]
pub struct Started {
    pub authorization_url: String,
    pub pending: PendingAuth,
}

/// Query parameters Twitter appends to the OAuth 2.0 redirect
#[derive(Debug, Clone, Default)]
pub struct OAuth2Callback<'a> {
    pub code: Option<&'a str>,
    pub state: Option<&'a str>,
    pub error: Option<&'a str>,
    pub error_description: Option<&'a str>,
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

pub async fn start_oauth1(
    provider: &dyn TwitterProvider,
    config: &OAuth1Config,
    email: Option<&str>,
) -> Result<Started, AppError> {
    let pending_email = non_empty(email);
    if let Some(email) = pending_email {
        validate_email(email)?;
    }

    let request_token = provider.request_token(config).await?;
    log::info!("[TWITTER] Issued OAuth 1.0a request token");

    Ok(Started {
        authorization_url: oauth1::authorize_url(&request_token.token),
        pending: PendingAuth::OAuth1 {
            request_token: request_token.token,
            request_token_secret: request_token.secret,
            pending_email: pending_email.map(str::to_string),
        },
    })
}

/// Exchange the PIN/verifier for an access token and persist it.
///
/// `returned_token` is the `oauth_token` Twitter echoes on a browser
/// callback; when present it must match the pending request token.
/// `email` overrides the email remembered at start.
pub async fn complete_oauth1(
    provider: &dyn TwitterProvider,
    store: &dyn CredentialStore,
    config: &OAuth1Config,
    pending: Option<PendingAuth>,
    verifier: Option<&str>,
    email: Option<&str>,
    returned_token: Option<&str>,
) -> Result<Credential, AppError> {
    let verifier = non_empty(verifier)
        .ok_or_else(|| AppError::InvalidPayload("PIN is required".to_string()))?;

    let (request_token, request_token_secret, pending_email) = match pending {
        Some(PendingAuth::OAuth1 {
            request_token,
            request_token_secret,
            pending_email,
        }) => (request_token, request_token_secret, pending_email),
        _ => return Err(AppError::SessionExpired),
    };

    if let Some(returned) = returned_token {
        if !constant_time_eq(returned, &request_token) {
            log::warn!("[TWITTER] OAuth 1.0a callback token does not match the pending request token");
            return Err(AppError::CsrfMismatch);
        }
    }

    let owner_email = non_empty(email)
        .map(str::to_string)
        .or(pending_email)
        .ok_or_else(|| AppError::InvalidPayload("userEmail is required".to_string()))?;
    validate_email(&owner_email)?;

    let access = provider
        .exchange_verifier(
            config,
            &super::RequestToken {
                token: request_token,
                secret: request_token_secret,
            },
            verifier,
        )
        .await?;

    log::info!(
        "[TWITTER] OAuth 1.0a handshake completed for {} (@{}, user {})",
        owner_email,
        access.screen_name.as_deref().unwrap_or("unknown"),
        access.user_id.as_deref().unwrap_or("unknown")
    );

    let credential = Credential::oauth1(&owner_email, access.token, access.secret);
    store.save(&credential).await?;
    Ok(credential)
}

pub fn start_oauth2(config: &OAuth2Config, email: Option<&str>) -> Result<Started, AppError> {
    let email = non_empty(email)
        .ok_or_else(|| AppError::InvalidPayload("email is required".to_string()))?;
    validate_email(email)?;

    let code_verifier = oauth2::generate_code_verifier();
    let csrf_state = oauth2::generate_state();
    let challenge = oauth2::code_challenge(&code_verifier);

    Ok(Started {
        authorization_url: oauth2::authorize_url(config, &csrf_state, &challenge),
        pending: PendingAuth::OAuth2 {
            code_verifier,
            csrf_state,
            pending_email: email.to_string(),
        },
    })
}

pub async fn complete_oauth2(
    provider: &dyn TwitterProvider,
    store: &dyn CredentialStore,
    config: &OAuth2Config,
    pending: Option<PendingAuth>,
    callback: OAuth2Callback<'_>,
) -> Result<Credential, AppError> {
    let (code_verifier, csrf_state, pending_email) = match pending {
        Some(PendingAuth::OAuth2 {
            code_verifier,
            csrf_state,
            pending_email,
        }) => (code_verifier, csrf_state, pending_email),
        _ => return Err(AppError::SessionExpired),
    };

    let returned_state = callback.state.unwrap_or("");
    if !constant_time_eq(returned_state, &csrf_state) {
        log::warn!("[TWITTER] OAuth 2.0 state mismatch, aborting handshake");
        return Err(AppError::CsrfMismatch);
    }

    if let Some(error) = non_empty(callback.error) {
        return Err(AppError::Upstream(format!(
            "Twitter authorization failed: {} - {}",
            error,
            callback.error_description.unwrap_or("no description")
        )));
    }

    let code = non_empty(callback.code)
        .ok_or_else(|| AppError::InvalidPayload("code is required".to_string()))?;

    let tokens = provider.exchange_code(config, code, &code_verifier).await?;
    log::info!(
        "[TWITTER] OAuth 2.0 handshake completed for {} (scope: {})",
        pending_email,
        tokens.scope.as_deref().unwrap_or("-")
    );

    let credential = Credential::oauth2(
        &pending_email,
        tokens.access_token,
        tokens.refresh_token,
        tokens.expires_in,
    );
    store.save(&credential).await?;
    Ok(credential)
}
