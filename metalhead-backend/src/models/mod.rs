//! Domain types shared by controllers, storage and the database layer

mod auth_state;
mod bot;
mod credential;

pub use auth_state::{PendingAuth, SessionClaims};
pub use bot::{BotRecord, CreateBotRequest, NewBot};
pub use credential::{Credential, CredentialFlow};
