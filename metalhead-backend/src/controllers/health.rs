use actix_web::{web, HttpResponse, Responder};

use crate::AppState;

/// Version from Cargo.toml, available at compile time
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("/api/health").route(web::get().to(health_check)));
    cfg.service(web::resource("/api/version").route(web::get().to(get_version)));
}

async fn health_check(state: web::Data<AppState>) -> impl Responder {
    let database_ok = state.db.count_bots().is_ok();

    HttpResponse::Ok().json(serde_json::json!({
        "status": if database_ok { "ok" } else { "degraded" },
        "version": VERSION,
        "database": database_ok,
        "flows": {
            "oauth1": state.config.oauth1.is_some(),
            "oauth2": state.config.oauth2.is_some(),
        },
        "credentialBackend": state.credentials.backend().to_string(),
    }))
}

async fn get_version() -> impl Responder {
    HttpResponse::Ok().json(serde_json::json!({
        "version": VERSION
    }))
}
