use serde::{Deserialize, Serialize};

/// Handshake state carried between the two legs of an OAuth flow
///
/// Lives only inside the signed `twitter_oauth` cookie and is discarded once
/// the handshake completes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "flow", rename_all = "lowercase")]
pub enum PendingAuth {
    #[serde(rename_all = "camelCase")]
    OAuth1 {
        request_token: String,
        request_token_secret: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        pending_email: Option<String>,
    },
    #[serde(rename_all = "camelCase")]
    OAuth2 {
        code_verifier: String,
        csrf_state: String,
        pending_email: String,
    },
}

/// Identity established by a completed handshake
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionClaims {
    pub email: String,
    pub access_token: String,
}
