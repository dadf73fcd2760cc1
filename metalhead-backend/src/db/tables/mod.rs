//! Database table modules - extends Database with domain-specific methods
//!
//! Each module adds `impl Database` blocks with methods for one table.

mod bots;        // bots
mod credentials; // twitter_credentials
