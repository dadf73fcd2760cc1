pub mod auth;
pub mod bots;
pub mod health;
pub mod twitter;
