use actix_web::http::StatusCode;
use actix_web::{web, HttpRequest, HttpResponse, ResponseError};
use serde::Serialize;

use crate::error::AppError;
use crate::middleware::session_auth::require_session;
use crate::models::{BotRecord, CreateBotRequest};
use crate::registration::{generate_bot_name, register_bot};
use crate::AppState;

#[derive(Serialize)]
pub struct CreateBotResponse {
    success: bool,
    message: String,
    bot: BotRecord,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BotNameResponse {
    bot_name: String,
}

#[derive(Serialize)]
pub struct BotListResponse {
    success: bool,
    bots: Vec<BotRecord>,
}

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("/api/create-bot").route(web::post().to(create_bot)));
    cfg.service(web::resource("/api/create-bot/name").route(web::get().to(suggest_name)));
    cfg.service(web::resource("/api/bots").route(web::get().to(list_bots)));
}

async fn create_bot(
    state: web::Data<AppState>,
    body: Option<web::Json<CreateBotRequest>>,
) -> HttpResponse {
    // A missing or unparseable body is just an empty payload
    let request = body.map(|b| b.into_inner()).unwrap_or_default();
    let prefix = state.config.server_domain_prefix.as_deref();

    match register_bot(&state.db, request, prefix) {
        Ok(bot) => HttpResponse::Ok().json(CreateBotResponse {
            success: true,
            message: "Bot created successfully".to_string(),
            bot,
        }),
        Err(e @ AppError::InvalidPayload(_)) => e.response_with_status(StatusCode::FORBIDDEN),
        Err(e) => e.error_response(),
    }
}

async fn suggest_name() -> HttpResponse {
    HttpResponse::Ok().json(BotNameResponse {
        bot_name: generate_bot_name(),
    })
}

/// Bots registered by the signed-in user
async fn list_bots(state: web::Data<AppState>, req: HttpRequest) -> HttpResponse {
    let claims = match require_session(&state.cookies, &req) {
        Ok(c) => c,
        Err(resp) => return resp,
    };

    match state.db.list_bots_for_email(&claims.email) {
        Ok(bots) => HttpResponse::Ok().json(BotListResponse {
            success: true,
            bots,
        }),
        Err(e) => {
            log::error!("[BOTS] Failed to list bots for {}: {}", claims.email, e);
            AppError::from(e).error_response()
        }
    }
}
