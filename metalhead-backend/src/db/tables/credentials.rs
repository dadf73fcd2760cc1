//! Twitter credential database operations

use chrono::Utc;
use rusqlite::{Result as SqliteResult, Row};

use crate::models::{Credential, CredentialFlow};
use super::super::sqlite::parse_timestamp;
use super::super::Database;

impl Database {
    /// Insert or replace the credential for `credential.owner_email`
    pub fn upsert_credential(&self, credential: &Credential) -> SqliteResult<()> {
        let conn = self.conn.lock().unwrap();
        let now = Utc::now().to_rfc3339();
        let flow = match credential.flow {
            CredentialFlow::OAuth1 => "oauth1",
            CredentialFlow::OAuth2 => "oauth2",
        };

        conn.execute(
            "INSERT INTO twitter_credentials
                (owner_email, flow, access_token, access_token_secret, refresh_token, issued_at, expires_in, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
             ON CONFLICT(owner_email) DO UPDATE SET
                flow = excluded.flow,
                access_token = excluded.access_token,
                access_token_secret = excluded.access_token_secret,
                refresh_token = excluded.refresh_token,
                issued_at = excluded.issued_at,
                expires_in = excluded.expires_in,
                updated_at = excluded.updated_at",
            rusqlite::params![
                &credential.owner_email,
                flow,
                &credential.access_token,
                &credential.access_token_secret,
                &credential.refresh_token,
                credential.issued_at.to_rfc3339(),
                credential.expires_in,
                &now
            ],
        )?;

        Ok(())
    }

    /// Get the stored credential for an email
    pub fn get_credential(&self, owner_email: &str) -> SqliteResult<Option<Credential>> {
        let conn = self.conn.lock().unwrap();

        let mut stmt = conn.prepare(
            "SELECT owner_email, flow, access_token, access_token_secret, refresh_token, issued_at, expires_in
             FROM twitter_credentials WHERE owner_email = ?1",
        )?;
        let mut rows = stmt.query_map([owner_email], |row| Self::row_to_credential(row))?;

        rows.next().transpose()
    }

    fn row_to_credential(row: &Row) -> SqliteResult<Credential> {
        let flow_str: String = row.get(1)?;
        let issued_at_str: String = row.get(5)?;

        let flow = match flow_str.as_str() {
            "oauth1" => CredentialFlow::OAuth1,
            _ => CredentialFlow::OAuth2,
        };

        Ok(Credential {
            owner_email: row.get(0)?,
            flow,
            access_token: row.get(2)?,
            access_token_secret: row.get(3)?,
            refresh_token: row.get(4)?,
            issued_at: parse_timestamp(5, &issued_at_str)?,
            expires_in: row.get(6)?,
        })
    }
}
