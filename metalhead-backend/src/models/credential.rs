use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CredentialFlow {
    OAuth1,
    OAuth2,
}

/// Twitter access credential issued to one user
///
/// OAuth 1.0a credentials carry `access_token_secret`; OAuth 2.0 credentials
/// carry `refresh_token` and `expires_in`. Re-authenticating replaces the
/// stored credential wholesale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Credential {
    pub owner_email: String,
    pub flow: CredentialFlow,
    pub access_token: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access_token_secret: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    pub issued_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_in: Option<i64>,
}

impl Credential {
    pub fn oauth1(owner_email: &str, access_token: String, access_token_secret: String) -> Self {
        Self {
            owner_email: owner_email.to_string(),
            flow: CredentialFlow::OAuth1,
            access_token,
            access_token_secret: Some(access_token_secret),
            refresh_token: None,
            issued_at: Utc::now(),
            expires_in: None,
        }
    }

    pub fn oauth2(
        owner_email: &str,
        access_token: String,
        refresh_token: Option<String>,
        expires_in: Option<i64>,
    ) -> Self {
        Self {
            owner_email: owner_email.to_string(),
            flow: CredentialFlow::OAuth2,
            access_token,
            access_token_secret: None,
            refresh_token,
            issued_at: Utc::now(),
            expires_in,
        }
    }

    /// Whether an OAuth 2.0 access token has passed its lifetime
    pub fn is_expired(&self) -> bool {
        match self.expires_in {
            Some(secs) => self.issued_at.timestamp() + secs <= Utc::now().timestamp(),
            None => false,
        }
    }
}
