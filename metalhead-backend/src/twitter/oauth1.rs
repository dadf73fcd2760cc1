//! OAuth 1.0a request signing (HMAC-SHA1)
//!
//! Signature base string per RFC 5849 section 3.4.1: the uppercase method,
//! the encoded base URL and the encoded, sorted parameter string, joined by
//! `&`. Encoding is RFC 3986 (only `A-Z a-z 0-9 - . _ ~` pass through).

use base64::{engine::general_purpose::STANDARD, Engine};
use chrono::Utc;
use hmac::{Hmac, Mac};
use sha1::Sha1;
use std::collections::HashMap;

use super::{AccessToken, RequestToken};
use crate::error::AppError;

type HmacSha1 = Hmac<Sha1>;

pub const REQUEST_TOKEN_URL: &str = "https://api.twitter.com/oauth/request_token";
pub const ACCESS_TOKEN_URL: &str = "https://api.twitter.com/oauth/access_token";
pub const AUTHORIZE_URL: &str = "https://api.twitter.com/oauth/authorize";

pub fn percent_encode(value: &str) -> String {
    urlencoding::encode(value).into_owned()
}

/// Everything needed to sign one request
pub struct SigningRequest<'a> {
    pub method: &'a str,
    pub url: &'a str,
    pub consumer_key: &'a str,
    pub consumer_secret: &'a str,
    /// `(token, token_secret)` once a token has been issued
    pub token: Option<(&'a str, &'a str)>,
    /// Extra `oauth_*` protocol parameters, e.g. `oauth_callback`, `oauth_verifier`
    pub oauth_extra: &'a [(&'a str, &'a str)],
    /// Query/form parameters that are part of the signature but not the header
    pub request_params: &'a [(&'a str, &'a str)],
}

/// Build the `Authorization` header with a fresh nonce and timestamp
pub fn authorization_header(req: &SigningRequest) -> String {
    let nonce = uuid::Uuid::new_v4().simple().to_string();
    authorization_header_with(req, &nonce, Utc::now().timestamp())
}

pub fn authorization_header_with(req: &SigningRequest, nonce: &str, timestamp: i64) -> String {
    let mut oauth_params = protocol_params(req, nonce, timestamp);

    let mut all_params = oauth_params.clone();
    all_params.extend(
        req.request_params
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string())),
    );

    let base = signature_base_string(req.method, req.url, &all_params);
    let signature = sign(&base, req.consumer_secret, req.token.map(|(_, secret)| secret));
    oauth_params.push(("oauth_signature".to_string(), signature));
    oauth_params.sort();

    let fields: Vec<String> = oauth_params
        .iter()
        .map(|(k, v)| format!("{}=\"{}\"", percent_encode(k), percent_encode(v)))
        .collect();

    format!("OAuth {}", fields.join(", "))
}

fn protocol_params(req: &SigningRequest, nonce: &str, timestamp: i64) -> Vec<(String, String)> {
    let mut params = vec![
        ("oauth_consumer_key".to_string(), req.consumer_key.to_string()),
        ("oauth_nonce".to_string(), nonce.to_string()),
        ("oauth_signature_method".to_string(), "HMAC-SHA1".to_string()),
        ("oauth_timestamp".to_string(), timestamp.to_string()),
        ("oauth_version".to_string(), "1.0".to_string()),
    ];
    if let Some((token, _)) = req.token {
        params.push(("oauth_token".to_string(), token.to_string()));
    }
    params.extend(
        req.oauth_extra
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string())),
    );
    params
}

pub fn signature_base_string(method: &str, url: &str, params: &[(String, String)]) -> String {
    let mut encoded: Vec<(String, String)> = params
        .iter()
        .map(|(k, v)| (percent_encode(k), percent_encode(v)))
        .collect();
    encoded.sort();

    let param_string = encoded
        .iter()
        .map(|(k, v)| format!("{}={}", k, v))
        .collect::<Vec<_>>()
        .join("&");

    format!(
        "{}&{}&{}",
        method.to_uppercase(),
        percent_encode(url),
        percent_encode(&param_string)
    )
}

/// HMAC-SHA1 of `base` keyed with `consumer_secret&token_secret`, base64
pub fn sign(base: &str, consumer_secret: &str, token_secret: Option<&str>) -> String {
    let key = format!(
        "{}&{}",
        percent_encode(consumer_secret),
        percent_encode(token_secret.unwrap_or(""))
    );
    let mut mac = HmacSha1::new_from_slice(key.as_bytes()).expect("HMAC can take key of any size");
    mac.update(base.as_bytes());
    STANDARD.encode(mac.finalize().into_bytes())
}

/// URL the user visits to approve the request token
pub fn authorize_url(request_token: &str) -> String {
    format!("{}?oauth_token={}", AUTHORIZE_URL, percent_encode(request_token))
}

fn parse_form(body: &str) -> HashMap<String, String> {
    url::form_urlencoded::parse(body.trim().as_bytes())
        .into_owned()
        .collect()
}

/// Parse the `request_token` response body
pub fn parse_request_token(body: &str) -> Result<RequestToken, AppError> {
    let mut fields = parse_form(body);

    if fields.get("oauth_callback_confirmed").map(String::as_str) == Some("false") {
        return Err(AppError::Upstream(
            "Twitter did not confirm the callback URL".to_string(),
        ));
    }

    match (
        fields.remove("oauth_token").filter(|t| !t.is_empty()),
        fields.remove("oauth_token_secret").filter(|s| !s.is_empty()),
    ) {
        (Some(token), Some(secret)) => Ok(RequestToken { token, secret }),
        _ => Err(AppError::Upstream(
            "Failed to get request token from Twitter".to_string(),
        )),
    }
}

/// Parse the `access_token` response body
pub fn parse_access_token(body: &str) -> Result<AccessToken, AppError> {
    let mut fields = parse_form(body);

    match (
        fields.remove("oauth_token").filter(|t| !t.is_empty()),
        fields.remove("oauth_token_secret").filter(|s| !s.is_empty()),
    ) {
        (Some(token), Some(secret)) => Ok(AccessToken {
            token,
            secret,
            user_id: fields.remove("user_id"),
            screen_name: fields.remove("screen_name"),
        }),
        _ => Err(AppError::Upstream(
            "Failed to exchange PIN for access token".to_string(),
        )),
    }
}
