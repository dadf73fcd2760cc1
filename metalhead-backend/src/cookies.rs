//! Signed, versioned, expiring cookie payloads
//!
//! Cookie value format: `base64url(json envelope) "." base64url(hmac_sha256)`.
//! The envelope carries a schema version and an absolute expiry; both are
//! checked on every read after the MAC.

use actix_web::cookie::{time::Duration as CookieDuration, Cookie, SameSite};
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use chrono::Utc;
use hmac::{Hmac, Mac};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use sha2::Sha256;
use subtle::ConstantTimeEq;

use crate::error::AppError;

type HmacSha256 = Hmac<Sha256>;

/// Holds the in-flight handshake (`PendingAuth`)
pub const OAUTH_COOKIE: &str = "twitter_oauth";
/// Holds `SessionClaims` after a completed handshake
pub const SESSION_COOKIE: &str = "metalhead_session";

pub const OAUTH_COOKIE_TTL_SECS: i64 = 10 * 60;
pub const SESSION_COOKIE_TTL_SECS: i64 = 7 * 24 * 60 * 60;

const ENVELOPE_VERSION: u8 = 1;

#[derive(Serialize, Deserialize)]
struct Envelope<T> {
    v: u8,
    exp: i64,
    data: T,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpenError {
    Malformed,
    BadSignature,
    UnsupportedVersion,
    Expired,
}

#[derive(Clone)]
pub struct CookieSigner {
    key: Vec<u8>,
    secure: bool,
}

impl CookieSigner {
    pub fn new(secret: &str, secure: bool) -> Self {
        Self {
            key: secret.as_bytes().to_vec(),
            secure,
        }
    }

    fn mac(&self) -> HmacSha256 {
        // HMAC accepts keys of any length
        HmacSha256::new_from_slice(&self.key).expect("HMAC can take key of any size")
    }

    /// Serialize and sign `data`, valid for `ttl_secs` from now
    pub fn seal<T: Serialize>(&self, data: &T, ttl_secs: i64) -> Result<String, AppError> {
        let envelope = Envelope {
            v: ENVELOPE_VERSION,
            exp: Utc::now().timestamp() + ttl_secs,
            data,
        };
        let json = serde_json::to_vec(&envelope)
            .map_err(|e| AppError::Storage(format!("Failed to encode cookie: {}", e)))?;
        let payload = URL_SAFE_NO_PAD.encode(json);

        let mut mac = self.mac();
        mac.update(payload.as_bytes());
        let signature = URL_SAFE_NO_PAD.encode(mac.finalize().into_bytes());

        Ok(format!("{}.{}", payload, signature))
    }

    /// Verify and decode a value produced by `seal`
    pub fn open<T: DeserializeOwned>(&self, value: &str) -> Result<T, OpenError> {
        let (payload, signature) = value.split_once('.').ok_or(OpenError::Malformed)?;
        let signature = URL_SAFE_NO_PAD
            .decode(signature)
            .map_err(|_| OpenError::Malformed)?;

        let mut mac = self.mac();
        mac.update(payload.as_bytes());
        mac.verify_slice(&signature)
            .map_err(|_| OpenError::BadSignature)?;

        let json = URL_SAFE_NO_PAD
            .decode(payload)
            .map_err(|_| OpenError::Malformed)?;
        let envelope: Envelope<serde_json::Value> =
            serde_json::from_slice(&json).map_err(|_| OpenError::Malformed)?;

        if envelope.v != ENVELOPE_VERSION {
            return Err(OpenError::UnsupportedVersion);
        }
        if envelope.exp <= Utc::now().timestamp() {
            return Err(OpenError::Expired);
        }

        serde_json::from_value(envelope.data).map_err(|_| OpenError::Malformed)
    }

    /// Build an `HttpOnly`, `SameSite=Lax` cookie carrying a sealed payload
    pub fn cookie<T: Serialize>(
        &self,
        name: &'static str,
        data: &T,
        ttl_secs: i64,
    ) -> Result<Cookie<'static>, AppError> {
        let value = self.seal(data, ttl_secs)?;
        Ok(Cookie::build(name, value)
            .path("/")
            .http_only(true)
            .secure(self.secure)
            .same_site(SameSite::Lax)
            .max_age(CookieDuration::seconds(ttl_secs))
            .finish())
    }

    /// A cookie that tells the browser to drop `name`
    pub fn removal(&self, name: &'static str) -> Cookie<'static> {
        let mut cookie = Cookie::build(name, "")
            .path("/")
            .http_only(true)
            .secure(self.secure)
            .same_site(SameSite::Lax)
            .finish();
        cookie.make_removal();
        cookie
    }
}

/// Equality that does not short-circuit on the first differing byte
pub fn constant_time_eq(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.as_bytes().ct_eq(b.as_bytes()).into()
}
