//! Bot registration
//!
//! A bot is unique per (email, access token, server domain). Registration is
//! a single INSERT; the table's UNIQUE constraint decides duplicates, so two
//! concurrent registrations of the same key cannot both succeed.

use rand::Rng;

use crate::db::{is_unique_violation, Database};
use crate::error::AppError;
use crate::models::{BotRecord, CreateBotRequest, NewBot};
use crate::storage::validate_email;

const BOT_NAME_CHARSET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789";
pub const BOT_NAME_LEN: usize = 5;

/// Random 5-character alphanumeric bot name
pub fn generate_bot_name() -> String {
    let mut rng = rand::thread_rng();
    (0..BOT_NAME_LEN)
        .map(|_| BOT_NAME_CHARSET[rng.gen_range(0..BOT_NAME_CHARSET.len())] as char)
        .collect()
}

fn required(value: Option<String>, field: &str) -> Result<String, AppError> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .ok_or_else(|| AppError::InvalidPayload(format!("{} is required", field)))
}

/// Validate a create-bot payload without touching storage
pub fn validate_request(
    req: CreateBotRequest,
    server_domain_prefix: Option<&str>,
) -> Result<NewBot, AppError> {
    let bot = NewBot {
        email: required(req.email, "email")?,
        access_token: required(req.access_token, "accessToken")?,
        server_domain: required(req.server_domain, "serverDomain")?,
        bot_name: required(req.bot_name, "botName")?,
    };

    validate_email(&bot.email)?;

    if let Some(prefix) = server_domain_prefix {
        if !bot.server_domain.starts_with(prefix) || bot.server_domain.len() == prefix.len() {
            return Err(AppError::InvalidPayload(format!(
                "serverDomain must look like {}<community>",
                prefix
            )));
        }
    }

    Ok(bot)
}

pub fn register_bot(
    db: &Database,
    req: CreateBotRequest,
    server_domain_prefix: Option<&str>,
) -> Result<BotRecord, AppError> {
    let bot = validate_request(req, server_domain_prefix)?;

    match db.insert_bot(&bot) {
        Ok(record) => {
            log::info!(
                "[BOTS] Registered bot '{}' (#{}) for {} on {}",
                record.bot_name,
                record.id,
                record.email,
                record.server_domain
            );
            Ok(record)
        }
        Err(e) if is_unique_violation(&e) => {
            log::info!(
                "[BOTS] Duplicate registration for {} on {}",
                bot.email,
                bot.server_domain
            );
            Err(AppError::DuplicateBot)
        }
        Err(e) => {
            log::error!("[BOTS] Failed to insert bot: {}", e);
            Err(e.into())
        }
    }
}
