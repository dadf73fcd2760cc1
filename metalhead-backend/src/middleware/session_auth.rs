// Session cookie helpers for routes that act on behalf of an authenticated user.
// A completed OAuth handshake leaves a signed `metalhead_session` cookie; these
// helpers read it back and turn a missing or invalid cookie into a 401.

use actix_web::{HttpRequest, HttpResponse};

use crate::cookies::{CookieSigner, SESSION_COOKIE};
use crate::models::SessionClaims;

pub fn extract_session(signer: &CookieSigner, req: &HttpRequest) -> Option<SessionClaims> {
    let cookie = req.cookie(SESSION_COOKIE)?;
    match signer.open::<SessionClaims>(cookie.value()) {
        Ok(claims) => Some(claims),
        Err(e) => {
            log::debug!("Ignoring invalid session cookie: {:?}", e);
            None
        }
    }
}

pub fn require_session(signer: &CookieSigner, req: &HttpRequest) -> Result<SessionClaims, HttpResponse> {
    extract_session(signer, req).ok_or_else(|| {
        HttpResponse::Unauthorized().json(serde_json::json!({
            "success": false,
            "error": "Not authenticated with Twitter"
        }))
    })
}
