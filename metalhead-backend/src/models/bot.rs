use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A registered bot, bound to one account credential and one server domain
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BotRecord {
    pub id: i64,
    pub email: String,
    pub access_token: String,
    pub server_domain: String,
    pub bot_name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Body of `POST /api/create-bot`
///
/// Every field is optional at the serde level so that a missing field is
/// reported as an invalid payload rather than a JSON extractor error.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateBotRequest {
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub access_token: Option<String>,
    #[serde(default)]
    pub server_domain: Option<String>,
    #[serde(default)]
    pub bot_name: Option<String>,
}

/// Validated insert payload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewBot {
    pub email: String,
    pub access_token: String,
    pub server_domain: String,
    pub bot_name: String,
}
