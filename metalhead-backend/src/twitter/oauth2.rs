//! OAuth 2.0 authorization code flow with PKCE (S256)

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use sha2::{Digest, Sha256};

use crate::config::OAuth2Config;

pub const AUTHORIZE_URL: &str = "https://twitter.com/i/oauth2/authorize";
pub const TOKEN_URL: &str = "https://api.twitter.com/2/oauth2/token";

pub const SCOPES: &str = "tweet.read tweet.write users.read offline.access";

const VERIFIER_CHARSET: &[u8] =
    b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789-._~";
const VERIFIER_LEN: usize = 64;

/// Random code verifier from the RFC 7636 unreserved alphabet
pub fn generate_code_verifier() -> String {
    (0..VERIFIER_LEN)
        .map(|_| {
            let idx = rand::random::<usize>() % VERIFIER_CHARSET.len();
            VERIFIER_CHARSET[idx] as char
        })
        .collect()
}

/// `base64url(sha256(verifier))` without padding
pub fn code_challenge(verifier: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(verifier.as_bytes());
    URL_SAFE_NO_PAD.encode(hasher.finalize())
}

/// 32 random bytes, hex encoded
pub fn generate_state() -> String {
    hex::encode(rand::random::<[u8; 32]>())
}

pub fn authorize_url(config: &OAuth2Config, state: &str, challenge: &str) -> String {
    format!(
        "{}?response_type=code&client_id={}&redirect_uri={}&scope={}&state={}&code_challenge={}&code_challenge_method=S256",
        AUTHORIZE_URL,
        urlencoding::encode(&config.client_id),
        urlencoding::encode(&config.redirect_uri),
        urlencoding::encode(SCOPES),
        urlencoding::encode(state),
        urlencoding::encode(challenge),
    )
}
