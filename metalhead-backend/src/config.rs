use std::env;

use strum::{Display, EnumString};

use crate::error::{AppError, ConfigError};

/// Minimum length of the cookie signing secret
pub const MIN_COOKIE_SECRET_LEN: usize = 32;

/// Where issued Twitter credentials are persisted
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumString, Display)]
#[strum(serialize_all = "lowercase")]
pub enum CredentialBackend {
    /// One JSON object per user under a bucket directory
    Object,
    /// `twitter_credentials` table in the main database
    Sqlite,
}

/// OAuth 1.0a consumer credentials
#[derive(Clone)]
pub struct OAuth1Config {
    pub consumer_key: String,
    pub consumer_secret: String,
    pub callback_url: String,
}

/// OAuth 2.0 client registration
#[derive(Clone)]
pub struct OAuth2Config {
    pub client_id: String,
    /// Present for confidential clients; public clients send `client_id` instead
    pub client_secret: Option<String>,
    pub redirect_uri: String,
}

#[derive(Clone)]
pub struct Config {
    pub cookie_secret: String,
    pub port: u16,
    pub database_url: String,
    pub app_origin: String,
    pub post_auth_path: String,
    pub production: bool,
    pub oauth1: Option<OAuth1Config>,
    pub oauth2: Option<OAuth2Config>,
    pub credential_backend: CredentialBackend,
    pub credential_bucket_dir: String,
    /// Required prefix for a bot's server domain; `None` accepts any domain
    pub server_domain_prefix: Option<String>,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build the config from an arbitrary key lookup. Blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let cookie_secret =
            get("SECRET_COOKIE_PASSWORD").ok_or(ConfigError::Missing("SECRET_COOKIE_PASSWORD"))?;
        if cookie_secret.len() < MIN_COOKIE_SECRET_LEN {
            return Err(ConfigError::Invalid {
                key: "SECRET_COOKIE_PASSWORD",
                reason: format!("must be at least {} bytes", MIN_COOKIE_SECRET_LEN),
            });
        }

        let port = match get("PORT") {
            Some(p) => p.parse().map_err(|_| ConfigError::Invalid {
                key: "PORT",
                reason: format!("'{}' is not a valid port", p),
            })?,
            None => 8080,
        };

        let oauth1 = match (
            get("TWITTER_CONSUMER_KEY"),
            get("TWITTER_CONSUMER_SECRET"),
            get("TWITTER_CALLBACK_URL"),
        ) {
            (Some(consumer_key), Some(consumer_secret), Some(callback_url)) => Some(OAuth1Config {
                consumer_key,
                consumer_secret,
                callback_url,
            }),
            (None, None, None) => None,
            _ => {
                return Err(ConfigError::Incomplete(
                    "TWITTER_CONSUMER_KEY, TWITTER_CONSUMER_SECRET and TWITTER_CALLBACK_URL",
                ));
            }
        };

        let oauth2 = match (get("TWITTER_CLIENT_ID"), get("TWITTER_REDIRECT_URI")) {
            (Some(client_id), Some(redirect_uri)) => Some(OAuth2Config {
                client_id,
                client_secret: get("TWITTER_CLIENT_SECRET"),
                redirect_uri,
            }),
            (None, None) if get("TWITTER_CLIENT_SECRET").is_none() => None,
            _ => {
                return Err(ConfigError::Incomplete(
                    "TWITTER_CLIENT_ID and TWITTER_REDIRECT_URI",
                ));
            }
        };

        let credential_backend = match get("CREDENTIAL_BACKEND") {
            Some(b) => b
                .to_lowercase()
                .parse()
                .map_err(|_| ConfigError::Invalid {
                    key: "CREDENTIAL_BACKEND",
                    reason: format!("unknown backend '{}', expected 'object' or 'sqlite'", b),
                })?,
            None => CredentialBackend::Object,
        };

        // An explicitly empty prefix disables the check, so look at the raw value here
        let server_domain_prefix = match lookup("SERVER_DOMAIN_PREFIX") {
            Some(raw) if raw.trim().is_empty() => None,
            Some(raw) => Some(raw.trim().to_string()),
            None => Some("https://zealy.io/cw/".to_string()),
        };

        Ok(Self {
            cookie_secret,
            port,
            database_url: get("DATABASE_URL").unwrap_or_else(|| "./.db/metalhead.db".to_string()),
            app_origin: get("APP_ORIGIN")
                .unwrap_or_else(|| "http://localhost:3000".to_string())
                .trim_end_matches('/')
                .to_string(),
            post_auth_path: get("POST_AUTH_PATH").unwrap_or_else(|| "/create-bot".to_string()),
            production: get("APP_ENV")
                .map(|v| v.eq_ignore_ascii_case("production"))
                .unwrap_or(false),
            oauth1,
            oauth2,
            credential_backend,
            credential_bucket_dir: get("CREDENTIAL_BUCKET_DIR")
                .unwrap_or_else(|| "./.data/zealore".to_string()),
            server_domain_prefix,
        })
    }

    /// Where the browser lands after a completed handshake
    pub fn post_auth_redirect(&self) -> String {
        if self.post_auth_path.starts_with('/') {
            format!("{}{}", self.app_origin, self.post_auth_path)
        } else {
            format!("{}/{}", self.app_origin, self.post_auth_path)
        }
    }

    pub fn oauth1(&self) -> Result<&OAuth1Config, AppError> {
        self.oauth1.as_ref().ok_or_else(|| {
            AppError::Configuration("Twitter OAuth 1.0a keys are not configured".to_string())
        })
    }

    pub fn oauth2(&self) -> Result<&OAuth2Config, AppError> {
        self.oauth2.as_ref().ok_or_else(|| {
            AppError::Configuration("Twitter OAuth 2.0 client is not configured".to_string())
        })
    }
}
