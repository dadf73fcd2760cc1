//! SQLite database - schema definitions and connection management
//!
//! This file contains:
//! - Database struct definition
//! - Connection management (new, init)
//! - Schema creation
//!
//! All table operations are in the tables/ subdirectory.

use chrono::{DateTime, Utc};
use rusqlite::types::Type;
use rusqlite::{Connection, ErrorCode, Result as SqliteResult};
use std::path::Path;
use std::sync::Mutex;

/// Main database wrapper, one connection serialized behind a Mutex
pub struct Database {
    pub(crate) conn: Mutex<Connection>,
}

impl Database {
    /// Create a new database connection and initialize schema
    pub fn new(database_url: &str) -> SqliteResult<Self> {
        // Create parent directory if it doesn't exist
        if let Some(parent) = Path::new(database_url).parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).ok();
            }
        }

        let conn = Connection::open(database_url)?;
        let db = Self {
            conn: Mutex::new(conn),
        };
        db.init()?;
        Ok(db)
    }

    /// Initialize all database tables
    fn init(&self) -> SqliteResult<()> {
        let conn = self.conn.lock().unwrap();

        // Registered bots. The UNIQUE constraint is the duplicate check;
        // inserts never query first.
        conn.execute(
            "CREATE TABLE IF NOT EXISTS bots (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                email TEXT NOT NULL,
                access_token TEXT NOT NULL,
                server_domain TEXT NOT NULL,
                bot_name TEXT NOT NULL,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL,
                UNIQUE(email, access_token, server_domain)
            )",
            [],
        )?;

        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_bots_email ON bots(email)",
            [],
        )?;

        // Twitter credentials, one row per user (sqlite credential backend)
        conn.execute(
            "CREATE TABLE IF NOT EXISTS twitter_credentials (
                owner_email TEXT PRIMARY KEY,
                flow TEXT NOT NULL,
                access_token TEXT NOT NULL,
                access_token_secret TEXT,
                refresh_token TEXT,
                issued_at TEXT NOT NULL,
                expires_in INTEGER,
                updated_at TEXT NOT NULL
            )",
            [],
        )?;

        Ok(())
    }
}

/// True when `err` is a UNIQUE / PRIMARY KEY constraint failure
pub fn is_unique_violation(err: &rusqlite::Error) -> bool {
    match err {
        rusqlite::Error::SqliteFailure(e, _) => {
            e.code == ErrorCode::ConstraintViolation
                && (e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
                    || e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_PRIMARYKEY)
        }
        _ => false,
    }
}

/// Parse an RFC 3339 column into UTC
pub(crate) fn parse_timestamp(idx: usize, value: &str) -> SqliteResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}
