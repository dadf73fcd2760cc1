//! Bot record database operations

use chrono::Utc;
use rusqlite::{Result as SqliteResult, Row};

use crate::models::{BotRecord, NewBot};
use super::super::sqlite::parse_timestamp;
use super::super::Database;

const BOT_COLUMNS: &str =
    "id, email, access_token, server_domain, bot_name, created_at, updated_at";

impl Database {
    /// Insert a bot. A duplicate (email, access_token, server_domain) fails
    /// with a constraint violation; see `is_unique_violation`.
    pub fn insert_bot(&self, bot: &NewBot) -> SqliteResult<BotRecord> {
        let conn = self.conn.lock().unwrap();
        let now = Utc::now();
        let now_str = now.to_rfc3339();

        conn.execute(
            "INSERT INTO bots (email, access_token, server_domain, bot_name, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?5)",
            rusqlite::params![
                &bot.email,
                &bot.access_token,
                &bot.server_domain,
                &bot.bot_name,
                &now_str
            ],
        )?;

        let id = conn.last_insert_rowid();

        Ok(BotRecord {
            id,
            email: bot.email.clone(),
            access_token: bot.access_token.clone(),
            server_domain: bot.server_domain.clone(),
            bot_name: bot.bot_name.clone(),
            created_at: now,
            updated_at: now,
        })
    }

    /// Get a bot by id
    pub fn get_bot(&self, id: i64) -> SqliteResult<Option<BotRecord>> {
        let conn = self.conn.lock().unwrap();

        let mut stmt = conn.prepare(&format!("SELECT {} FROM bots WHERE id = ?1", BOT_COLUMNS))?;
        let mut rows = stmt.query_map([id], |row| Self::row_to_bot(row))?;

        rows.next().transpose()
    }

    /// List bots registered by an email, oldest first
    pub fn list_bots_for_email(&self, email: &str) -> SqliteResult<Vec<BotRecord>> {
        let conn = self.conn.lock().unwrap();

        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM bots WHERE email = ?1 ORDER BY id",
            BOT_COLUMNS
        ))?;

        let bots = stmt
            .query_map([email], |row| Self::row_to_bot(row))?
            .collect::<SqliteResult<Vec<_>>>()?;

        Ok(bots)
    }

    pub fn count_bots(&self) -> SqliteResult<i64> {
        let conn = self.conn.lock().unwrap();
        conn.query_row("SELECT COUNT(*) FROM bots", [], |row| row.get(0))
    }

    fn row_to_bot(row: &Row) -> SqliteResult<BotRecord> {
        let created_at_str: String = row.get(5)?;
        let updated_at_str: String = row.get(6)?;

        Ok(BotRecord {
            id: row.get(0)?,
            email: row.get(1)?,
            access_token: row.get(2)?,
            server_domain: row.get(3)?,
            bot_name: row.get(4)?,
            created_at: parse_timestamp(5, &created_at_str)?,
            updated_at: parse_timestamp(6, &updated_at_str)?,
        })
    }
}
