//! Bucket-style credential store on the local filesystem

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;

use super::{credential_key, validate_email, CredentialStore};
use crate::config::CredentialBackend;
use crate::error::AppError;
use crate::models::Credential;

pub struct ObjectCredentialStore {
    root: PathBuf,
}

impl ObjectCredentialStore {
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    pub fn object_path(&self, owner_email: &str) -> PathBuf {
        self.root.join(credential_key(owner_email))
    }
}

/// Create `path` readable by the owner only, then write `body` to it
async fn write_private(path: &Path, body: &[u8]) -> std::io::Result<()> {
    let mut options = tokio::fs::OpenOptions::new();
    options.write(true).create_new(true);
    #[cfg(unix)]
    options.mode(0o600);

    let mut file = options.open(path).await?;
    file.write_all(body).await?;
    file.sync_all().await
}

#[async_trait]
impl CredentialStore for ObjectCredentialStore {
    async fn save(&self, credential: &Credential) -> Result<(), AppError> {
        validate_email(&credential.owner_email)?;

        let path = self.object_path(&credential.owner_email);
        let body = serde_json::to_vec_pretty(credential)
            .map_err(|e| AppError::Storage(format!("Failed to encode credential: {}", e)))?;

        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| AppError::Storage(format!("Failed to create bucket path: {}", e)))?;
        }

        // Write beside the target then rename so readers never see a partial object
        let tmp = path.with_extension(format!("json.{}.tmp", uuid::Uuid::new_v4().simple()));
        if let Err(e) = write_private(&tmp, &body).await {
            let _ = tokio::fs::remove_file(&tmp).await;
            return Err(AppError::Storage(format!("Failed to write credential: {}", e)));
        }

        if let Err(e) = tokio::fs::rename(&tmp, &path).await {
            let _ = tokio::fs::remove_file(&tmp).await;
            return Err(AppError::Storage(format!("Failed to store credential: {}", e)));
        }

        log::info!(
            "[CREDENTIALS] Stored {:?} credential for {}",
            credential.flow,
            credential.owner_email
        );
        Ok(())
    }

    async fn load(&self, owner_email: &str) -> Result<Option<Credential>, AppError> {
        validate_email(owner_email)?;

        let bytes = match tokio::fs::read(self.object_path(owner_email)).await {
            Ok(b) => b,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(AppError::Storage(format!("Failed to read credential: {}", e))),
        };

        serde_json::from_slice(&bytes)
            .map(Some)
            .map_err(|e| AppError::Storage(format!("Corrupt credential object: {}", e)))
    }

    fn backend(&self) -> CredentialBackend {
        CredentialBackend::Object
    }
}
