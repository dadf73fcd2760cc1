use actix_web::{web, HttpRequest, HttpResponse, Responder};
use serde::Serialize;

use crate::cookies::SESSION_COOKIE;
use crate::middleware::session_auth::extract_session;
use crate::models::CredentialFlow;
use crate::AppState;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionResponse {
    authenticated: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    access_token: Option<String>,
    /// Flow of the stored credential, if one was found
    #[serde(skip_serializing_if = "Option::is_none")]
    flow: Option<CredentialFlow>,
    #[serde(skip_serializing_if = "Option::is_none")]
    token_expired: Option<bool>,
}

#[derive(Serialize)]
pub struct LogoutResponse {
    success: bool,
}

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/auth")
            .route("/session", web::get().to(session))
            .route("/logout", web::post().to(logout)),
    );
}

/// Who the browser is signed in as, from the session cookie
async fn session(state: web::Data<AppState>, req: HttpRequest) -> impl Responder {
    let Some(claims) = extract_session(&state.cookies, &req) else {
        return HttpResponse::Ok().json(SessionResponse {
            authenticated: false,
            email: None,
            access_token: None,
            flow: None,
            token_expired: None,
        });
    };

    // A storage failure only hides the credential details
    let stored = match state.credentials.load(&claims.email).await {
        Ok(stored) => stored,
        Err(e) => {
            log::warn!("[AUTH] Failed to load credential for {}: {}", claims.email, e);
            None
        }
    };

    HttpResponse::Ok().json(SessionResponse {
        authenticated: true,
        email: Some(claims.email),
        access_token: Some(claims.access_token),
        flow: stored.as_ref().map(|c| c.flow),
        token_expired: stored.as_ref().map(|c| c.is_expired()),
    })
}

async fn logout(state: web::Data<AppState>) -> impl Responder {
    HttpResponse::Ok()
        .cookie(state.cookies.removal(SESSION_COOKIE))
        .json(LogoutResponse { success: true })
}
