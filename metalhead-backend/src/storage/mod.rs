//! Credential persistence backends
//!
//! - `object`: one JSON object per user at `<bucket>/<email>/twitter/tokens.json`
//! - `sqlite`: `twitter_credentials` table in the main database
//!
//! Both overwrite on re-authentication.

mod object;
mod sqlite;

use async_trait::async_trait;
use std::sync::Arc;

use crate::config::{Config, CredentialBackend};
use crate::db::Database;
use crate::error::AppError;
use crate::models::Credential;

pub use object::ObjectCredentialStore;
pub use sqlite::SqliteCredentialStore;

#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Persist `credential`, replacing any previous one for the same email
    async fn save(&self, credential: &Credential) -> Result<(), AppError>;

    async fn load(&self, owner_email: &str) -> Result<Option<Credential>, AppError>;

    /// Backend name for logs and health output
    fn backend(&self) -> CredentialBackend;
}

/// Build the configured backend once at startup
pub fn create_credential_store(config: &Config, db: Arc<Database>) -> Arc<dyn CredentialStore> {
    match config.credential_backend {
        CredentialBackend::Object => {
            Arc::new(ObjectCredentialStore::new(&config.credential_bucket_dir))
        }
        CredentialBackend::Sqlite => Arc::new(SqliteCredentialStore::new(db)),
    }
}

/// Object key for a user's token file
pub fn credential_key(owner_email: &str) -> String {
    format!("{}/twitter/tokens.json", owner_email)
}

/// Validate an email used as a storage key or record owner
pub fn validate_email(email: &str) -> Result<(), AppError> {
    let email = email.trim();
    if email.is_empty() {
        return Err(AppError::InvalidPayload("email is required".to_string()));
    }

    let well_formed = match email.split_once('@') {
        Some((local, domain)) => !local.is_empty() && !domain.is_empty() && !domain.contains('@'),
        None => false,
    };
    if !well_formed
        || email.contains('/')
        || email.contains('\\')
        || email.contains("..")
        || email.starts_with('.')
        || email.chars().any(|c| c.is_control() || c.is_whitespace())
    {
        return Err(AppError::InvalidPayload(format!("'{}' is not a valid email", email)));
    }

    Ok(())
}
