use async_trait::async_trait;
use std::sync::Arc;

use super::{validate_email, CredentialStore};
use crate::config::CredentialBackend;
use crate::db::Database;
use crate::error::AppError;
use crate::models::Credential;

pub struct SqliteCredentialStore {
    db: Arc<Database>,
}

impl SqliteCredentialStore {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl CredentialStore for SqliteCredentialStore {
    async fn save(&self, credential: &Credential) -> Result<(), AppError> {
        validate_email(&credential.owner_email)?;
        self.db.upsert_credential(credential)?;
        log::info!(
            "[CREDENTIALS] Stored {:?} credential for {}",
            credential.flow,
            credential.owner_email
        );
        Ok(())
    }

    async fn load(&self, owner_email: &str) -> Result<Option<Credential>, AppError> {
        validate_email(owner_email)?;
        Ok(self.db.get_credential(owner_email)?)
    }

    fn backend(&self) -> CredentialBackend {
        CredentialBackend::Sqlite
    }
}
