use actix_web::http::header;
use actix_web::{web, HttpRequest, HttpResponse, ResponseError};
use serde::{Deserialize, Serialize};

use crate::cookies::{OAUTH_COOKIE, OAUTH_COOKIE_TTL_SECS, SESSION_COOKIE, SESSION_COOKIE_TTL_SECS};
use crate::error::AppError;
use crate::models::{Credential, PendingAuth, SessionClaims};
use crate::twitter::handshake::{self, OAuth2Callback};
use crate::AppState;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StartOAuth1Request {
    #[serde(default)]
    user_email: Option<String>,
}

#[derive(Serialize)]
pub struct AuthorizationUrlResponse {
    url: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExchangePinRequest {
    #[serde(default)]
    pin: Option<String>,
    #[serde(default)]
    user_email: Option<String>,
}

#[derive(Serialize)]
pub struct ExchangePinResponse {
    success: bool,
    message: String,
    email: String,
}

#[derive(Debug, Deserialize)]
pub struct OAuth1CallbackQuery {
    oauth_token: Option<String>,
    oauth_verifier: Option<String>,
    denied: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StartOAuth2Request {
    #[serde(default, alias = "userEmail")]
    email: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct OAuth2CallbackQuery {
    code: Option<String>,
    state: Option<String>,
    error: Option<String>,
    error_description: Option<String>,
}

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/twitter")
            .route("/authenticate", web::get().to(start_oauth1_query))
            .route("/authenticate", web::post().to(start_oauth1_body))
            .route("/access_token", web::post().to(exchange_pin))
            .route("/callback", web::get().to(oauth1_callback))
            .route("/oauth2/authorize", web::post().to(start_oauth2))
            .route("/oauth2/callback", web::get().to(oauth2_callback)),
    );
}

/// Read the in-flight handshake from the signed cookie
fn pending_auth(state: &AppState, req: &HttpRequest) -> Option<PendingAuth> {
    let cookie = req.cookie(OAUTH_COOKIE)?;
    match state.cookies.open::<PendingAuth>(cookie.value()) {
        Ok(pending) => Some(pending),
        Err(e) => {
            log::warn!("[TWITTER] Rejected OAuth state cookie: {:?}", e);
            None
        }
    }
}

/// Error response for a completion attempt. Anything but bad caller input
/// ends the handshake, so the pending cookie is dropped with it.
fn completion_failure(state: &AppState, err: AppError) -> HttpResponse {
    let mut resp = err.error_response();
    if !matches!(err, AppError::InvalidPayload(_)) {
        if let Err(e) = resp.add_cookie(&state.cookies.removal(OAUTH_COOKIE)) {
            log::error!("[TWITTER] Failed to clear OAuth cookie: {}", e);
        }
    }
    resp
}

fn session_cookie(
    state: &AppState,
    credential: &Credential,
) -> Result<actix_web::cookie::Cookie<'static>, AppError> {
    state.cookies.cookie(
        SESSION_COOKIE,
        &SessionClaims {
            email: credential.owner_email.clone(),
            access_token: credential.access_token.clone(),
        },
        SESSION_COOKIE_TTL_SECS,
    )
}

/// Completed handshake: session cookie set, pending cookie dropped, browser sent to the app
fn redirect_to_app(state: &AppState, credential: &Credential) -> Result<HttpResponse, AppError> {
    Ok(HttpResponse::Found()
        .insert_header((header::LOCATION, state.config.post_auth_redirect()))
        .cookie(session_cookie(state, credential)?)
        .cookie(state.cookies.removal(OAUTH_COOKIE))
        .finish())
}

async fn start_oauth1(state: &AppState, email: Option<String>) -> Result<HttpResponse, AppError> {
    let config = state.config.oauth1()?;
    let started = handshake::start_oauth1(state.twitter.as_ref(), config, email.as_deref()).await?;
    let cookie = state
        .cookies
        .cookie(OAUTH_COOKIE, &started.pending, OAUTH_COOKIE_TTL_SECS)?;

    Ok(HttpResponse::Ok()
        .cookie(cookie)
        .json(AuthorizationUrlResponse {
            url: started.authorization_url,
        }))
}

async fn start_oauth1_query(
    state: web::Data<AppState>,
    query: web::Query<StartOAuth1Request>,
) -> Result<HttpResponse, AppError> {
    start_oauth1(&state, query.into_inner().user_email).await
}

async fn start_oauth1_body(
    state: web::Data<AppState>,
    body: Option<web::Json<StartOAuth1Request>>,
) -> Result<HttpResponse, AppError> {
    let email = body.and_then(|b| b.into_inner().user_email);
    start_oauth1(&state, email).await
}

/// PIN-based (out-of-band) completion of the OAuth 1.0a flow
async fn exchange_pin(
    state: web::Data<AppState>,
    req: HttpRequest,
    body: Option<web::Json<ExchangePinRequest>>,
) -> HttpResponse {
    // An unreadable body is treated as empty and fails validation below
    let body = body.map(|b| b.into_inner()).unwrap_or_default();

    let config = match state.config.oauth1() {
        Ok(c) => c,
        Err(e) => return e.error_response(),
    };

    let result = handshake::complete_oauth1(
        state.twitter.as_ref(),
        state.credentials.as_ref(),
        config,
        pending_auth(&state, &req),
        body.pin.as_deref(),
        body.user_email.as_deref(),
        None,
    )
    .await;

    let credential = match result {
        Ok(c) => c,
        Err(e) => return completion_failure(&state, e),
    };

    match session_cookie(&state, &credential) {
        Ok(cookie) => HttpResponse::Ok()
            .cookie(cookie)
            .cookie(state.cookies.removal(OAUTH_COOKIE))
            .json(ExchangePinResponse {
                success: true,
                message: "Tokens successfully stored".to_string(),
                email: credential.owner_email,
            }),
        Err(e) => e.error_response(),
    }
}

/// Browser redirect from Twitter carrying `oauth_token` and `oauth_verifier`
async fn oauth1_callback(
    state: web::Data<AppState>,
    req: HttpRequest,
    query: web::Query<OAuth1CallbackQuery>,
) -> HttpResponse {
    let config = match state.config.oauth1() {
        Ok(c) => c,
        Err(e) => return e.error_response(),
    };

    if query.denied.is_some() {
        return completion_failure(
            &state,
            AppError::Upstream("Twitter authorization was denied".to_string()),
        );
    }

    let result = handshake::complete_oauth1(
        state.twitter.as_ref(),
        state.credentials.as_ref(),
        config,
        pending_auth(&state, &req),
        query.oauth_verifier.as_deref(),
        None,
        Some(query.oauth_token.as_deref().unwrap_or("")),
    )
    .await;

    match result.and_then(|credential| redirect_to_app(&state, &credential)) {
        Ok(resp) => resp,
        Err(e) => completion_failure(&state, e),
    }
}

async fn start_oauth2(
    state: web::Data<AppState>,
    body: Option<web::Either<web::Json<StartOAuth2Request>, web::Form<StartOAuth2Request>>>,
) -> Result<HttpResponse, AppError> {
    let config = state.config.oauth2()?;
    let email = match body {
        Some(web::Either::Left(json)) => json.into_inner().email,
        Some(web::Either::Right(form)) => form.into_inner().email,
        None => None,
    };

    let started = handshake::start_oauth2(config, email.as_deref())?;
    let cookie = state
        .cookies
        .cookie(OAUTH_COOKIE, &started.pending, OAUTH_COOKIE_TTL_SECS)?;

    log::info!("[TWITTER] Redirecting to Twitter for OAuth 2.0 authorization");
    Ok(HttpResponse::Found()
        .insert_header((header::LOCATION, started.authorization_url))
        .cookie(cookie)
        .finish())
}

async fn oauth2_callback(
    state: web::Data<AppState>,
    req: HttpRequest,
    query: web::Query<OAuth2CallbackQuery>,
) -> HttpResponse {
    let config = match state.config.oauth2() {
        Ok(c) => c,
        Err(e) => return e.error_response(),
    };

    let result = handshake::complete_oauth2(
        state.twitter.as_ref(),
        state.credentials.as_ref(),
        config,
        pending_auth(&state, &req),
        OAuth2Callback {
            code: query.code.as_deref(),
            state: query.state.as_deref(),
            error: query.error.as_deref(),
            error_description: query.error_description.as_deref(),
        },
    )
    .await;

    match result.and_then(|credential| redirect_to_app(&state, &credential)) {
        Ok(resp) => resp,
        Err(e) => completion_failure(&state, e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{test_config, test_state, StubProvider};
    use actix_web::cookie::Cookie;
    use actix_web::dev::ServiceResponse;
    use actix_web::http::StatusCode;
    use actix_web::{test, App};
    use std::collections::HashMap;
    use std::sync::Arc;

    fn response_cookie(resp: &ServiceResponse, name: &str) -> Option<Cookie<'static>> {
        resp.response()
            .cookies()
            .find(|c| c.name() == name)
            .map(|c| c.into_owned())
    }

    fn query_of(url: &str) -> HashMap<String, String> {
        url::Url::parse(url).unwrap().query_pairs().into_owned().collect()
    }

    #[actix_web::test]
    async fn test_oauth1_start_cookie_matches_url() {
        let dir = tempfile::tempdir().unwrap();
        let state = test_state(test_config(dir.path()), Arc::new(StubProvider::default()));
        let app =
            test::init_service(App::new().app_data(state.clone()).configure(super::config)).await;

        let req = test::TestRequest::get()
            .uri("/api/twitter/authenticate?userEmail=u%40x.com")
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);

        let cookie = response_cookie(&resp, OAUTH_COOKIE).unwrap();
        assert_eq!(cookie.http_only(), Some(true));
        let pending: PendingAuth = state.cookies.open(cookie.value()).unwrap();

        let body: serde_json::Value = test::read_body_json(resp).await;
        let url_token = query_of(body["url"].as_str().unwrap())["oauth_token"].clone();
        match pending {
            PendingAuth::OAuth1 { request_token, pending_email, .. } => {
                assert_eq!(url_token, request_token);
                assert_eq!(pending_email.as_deref(), Some("u@x.com"));
            }
            other => panic!("unexpected pending state {:?}", other),
        }
    }

    #[actix_web::test]
    async fn test_oauth1_start_without_config() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = test_config(dir.path());
        config.oauth1 = None;
        let provider = Arc::new(StubProvider::default());
        let state = test_state(config, provider.clone());
        let app = test::init_service(App::new().app_data(state).configure(super::config)).await;

        let req = test::TestRequest::post().uri("/api/twitter/authenticate").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body: serde_json::Value = test::read_body_json(resp).await;
        assert_eq!(body["code"], "configuration_error");
        assert_eq!(provider.request_token_calls(), 0);
    }

    #[actix_web::test]
    async fn test_oauth1_start_upstream_failure() {
        let dir = tempfile::tempdir().unwrap();
        let state = test_state(test_config(dir.path()), Arc::new(StubProvider::failing()));
        let app = test::init_service(App::new().app_data(state).configure(super::config)).await;

        let req = test::TestRequest::get().uri("/api/twitter/authenticate").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(response_cookie(&resp, OAUTH_COOKIE).is_none());
    }

    #[actix_web::test]
    async fn test_oauth1_pin_exchange() {
        let dir = tempfile::tempdir().unwrap();
        let provider = Arc::new(StubProvider::default());
        let state = test_state(test_config(dir.path()), provider.clone());
        let app =
            test::init_service(App::new().app_data(state.clone()).configure(super::config)).await;

        let req = test::TestRequest::post()
            .uri("/api/twitter/authenticate")
            .set_json(serde_json::json!({ "userEmail": "u@x.com" }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        let oauth_cookie = response_cookie(&resp, OAUTH_COOKIE).unwrap();

        let req = test::TestRequest::post()
            .uri("/api/twitter/access_token")
            .cookie(oauth_cookie)
            .set_json(serde_json::json!({ "pin": "9876543", "userEmail": "u@x.com" }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);

        let session = response_cookie(&resp, SESSION_COOKIE).unwrap();
        let claims: SessionClaims = state.cookies.open(session.value()).unwrap();
        assert_eq!(claims.email, "u@x.com");
        assert_eq!(claims.access_token, "ACCESS-9876543");
        assert_eq!(response_cookie(&resp, OAUTH_COOKIE).unwrap().value(), "");

        let stored = state.credentials.load("u@x.com").await.unwrap().unwrap();
        assert_eq!(stored.access_token_secret.as_deref(), Some("SECRET-9876543"));
        assert_eq!(provider.exchange_verifier_calls(), 1);
    }

    #[actix_web::test]
    async fn test_oauth1_pin_exchange_without_cookie() {
        let dir = tempfile::tempdir().unwrap();
        let provider = Arc::new(StubProvider::default());
        let state = test_state(test_config(dir.path()), provider.clone());
        let app = test::init_service(App::new().app_data(state).configure(super::config)).await;

        let req = test::TestRequest::post()
            .uri("/api/twitter/access_token")
            .set_json(serde_json::json!({ "pin": "9876543", "userEmail": "u@x.com" }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body: serde_json::Value = test::read_body_json(resp).await;
        assert_eq!(body["code"], "session_expired");
        assert_eq!(provider.exchange_verifier_calls(), 0);
    }

    #[actix_web::test]
    async fn test_oauth1_pin_exchange_with_forged_cookie() {
        let dir = tempfile::tempdir().unwrap();
        let state = test_state(test_config(dir.path()), Arc::new(StubProvider::default()));
        let app = test::init_service(App::new().app_data(state).configure(super::config)).await;

        let forged = serde_json::json!({
            "flow": "oauth1",
            "requestToken": "t",
            "requestTokenSecret": "s"
        });
        let req = test::TestRequest::post()
            .uri("/api/twitter/access_token")
            .cookie(Cookie::new(OAUTH_COOKIE, forged.to_string()))
            .set_json(serde_json::json!({ "pin": "1", "userEmail": "u@x.com" }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body: serde_json::Value = test::read_body_json(resp).await;
        assert_eq!(body["code"], "session_expired");
    }

    #[actix_web::test]
    async fn test_oauth1_browser_callback() {
        let dir = tempfile::tempdir().unwrap();
        let state = test_state(test_config(dir.path()), Arc::new(StubProvider::default()));
        let app =
            test::init_service(App::new().app_data(state.clone()).configure(super::config)).await;

        let req = test::TestRequest::get()
            .uri("/api/twitter/authenticate?userEmail=u%40x.com")
            .to_request();
        let resp = test::call_service(&app, req).await;
        let oauth_cookie = response_cookie(&resp, OAUTH_COOKIE).unwrap();
        let body: serde_json::Value = test::read_body_json(resp).await;
        let token = query_of(body["url"].as_str().unwrap())["oauth_token"].clone();

        // Wrong token is refused
        let req = test::TestRequest::get()
            .uri("/api/twitter/callback?oauth_token=other&oauth_verifier=v")
            .cookie(oauth_cookie.clone())
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let req = test::TestRequest::get()
            .uri(&format!("/api/twitter/callback?oauth_token={}&oauth_verifier=v", token))
            .cookie(oauth_cookie)
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::FOUND);
        assert_eq!(
            resp.headers().get(header::LOCATION).unwrap(),
            "http://localhost:3000/create-bot"
        );
        assert!(state.credentials.load("u@x.com").await.unwrap().is_some());
    }

    #[actix_web::test]
    async fn test_oauth2_full_handshake() {
        let dir = tempfile::tempdir().unwrap();
        let provider = Arc::new(StubProvider::default());
        let state = test_state(test_config(dir.path()), provider.clone());
        let app =
            test::init_service(App::new().app_data(state.clone()).configure(super::config)).await;

        let req = test::TestRequest::post()
            .uri("/api/twitter/oauth2/authorize")
            .set_json(serde_json::json!({ "email": "u@x.com" }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::FOUND);

        let location = resp
            .headers()
            .get(header::LOCATION)
            .unwrap()
            .to_str()
            .unwrap()
            .to_string();
        assert!(location.starts_with("https://twitter.com/i/oauth2/authorize?"));

        let oauth_cookie = response_cookie(&resp, OAUTH_COOKIE).unwrap();
        let csrf_state = match state.cookies.open::<PendingAuth>(oauth_cookie.value()).unwrap() {
            PendingAuth::OAuth2 { csrf_state, pending_email, .. } => {
                assert_eq!(pending_email, "u@x.com");
                csrf_state
            }
            other => panic!("unexpected pending state {:?}", other),
        };
        assert_eq!(query_of(&location)["state"], csrf_state);

        let req = test::TestRequest::get()
            .uri(&format!(
                "/api/twitter/oauth2/callback?code=fabricated&state={}",
                csrf_state
            ))
            .cookie(oauth_cookie)
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::FOUND);
        assert_eq!(
            resp.headers().get(header::LOCATION).unwrap(),
            "http://localhost:3000/create-bot"
        );

        let session = response_cookie(&resp, SESSION_COOKIE).unwrap();
        let claims: SessionClaims = state.cookies.open(session.value()).unwrap();
        assert_eq!(claims.email, "u@x.com");
        assert_eq!(claims.access_token, "AT");

        let object = dir.path().join("u@x.com/twitter/tokens.json");
        let json: serde_json::Value =
            serde_json::from_slice(&std::fs::read(object).unwrap()).unwrap();
        assert_eq!(json["accessToken"], "AT");
        assert_eq!(json["refreshToken"], "RT");
        assert_eq!(json["expiresIn"], 7200);
        assert_eq!(provider.exchange_code_calls(), 1);
    }

    #[actix_web::test]
    async fn test_oauth2_start_accepts_form() {
        let dir = tempfile::tempdir().unwrap();
        let state = test_state(test_config(dir.path()), Arc::new(StubProvider::default()));
        let app = test::init_service(App::new().app_data(state).configure(super::config)).await;

        let req = test::TestRequest::post()
            .uri("/api/twitter/oauth2/authorize")
            .set_form([("email", "u@x.com")])
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::FOUND);
        assert!(response_cookie(&resp, OAUTH_COOKIE).is_some());
    }

    #[actix_web::test]
    async fn test_oauth2_state_mismatch() {
        let dir = tempfile::tempdir().unwrap();
        let provider = Arc::new(StubProvider::default());
        let state = test_state(test_config(dir.path()), provider.clone());
        let app =
            test::init_service(App::new().app_data(state.clone()).configure(super::config)).await;

        let req = test::TestRequest::post()
            .uri("/api/twitter/oauth2/authorize")
            .set_json(serde_json::json!({ "email": "u@x.com" }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        let oauth_cookie = response_cookie(&resp, OAUTH_COOKIE).unwrap();

        let req = test::TestRequest::get()
            .uri("/api/twitter/oauth2/callback?code=fabricated&state=not-the-state")
            .cookie(oauth_cookie)
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        assert_eq!(response_cookie(&resp, OAUTH_COOKIE).unwrap().value(), "");

        let body: serde_json::Value = test::read_body_json(resp).await;
        assert_eq!(body["code"], "csrf_mismatch");
        assert_eq!(provider.exchange_code_calls(), 0);
        assert!(state.credentials.load("u@x.com").await.unwrap().is_none());
    }

    #[actix_web::test]
    async fn test_oauth2_callback_upstream_failure() {
        let dir = tempfile::tempdir().unwrap();
        let state = test_state(test_config(dir.path()), Arc::new(StubProvider::failing()));
        let app =
            test::init_service(App::new().app_data(state.clone()).configure(super::config)).await;

        let req = test::TestRequest::post()
            .uri("/api/twitter/oauth2/authorize")
            .set_json(serde_json::json!({ "email": "u@x.com" }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        let oauth_cookie = response_cookie(&resp, OAUTH_COOKIE).unwrap();
        let csrf_state = match state.cookies.open::<PendingAuth>(oauth_cookie.value()).unwrap() {
            PendingAuth::OAuth2 { csrf_state, .. } => csrf_state,
            other => panic!("unexpected pending state {:?}", other),
        };

        let req = test::TestRequest::get()
            .uri(&format!("/api/twitter/oauth2/callback?code=c&state={}", csrf_state))
            .cookie(oauth_cookie)
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body: serde_json::Value = test::read_body_json(resp).await;
        assert_eq!(body["code"], "upstream_error");
    }

    #[actix_web::test]
    async fn test_oauth1_pin_exchange_with_malformed_body() {
        let dir = tempfile::tempdir().unwrap();
        let provider = Arc::new(StubProvider::default());
        let state = test_state(test_config(dir.path()), provider.clone());
        let app =
            test::init_service(App::new().app_data(state.clone()).configure(super::config)).await;

        let req = test::TestRequest::post()
            .uri("/api/twitter/authenticate")
            .set_json(serde_json::json!({ "userEmail": "u@x.com" }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        let oauth_cookie = response_cookie(&resp, OAUTH_COOKIE).unwrap();

        let req = test::TestRequest::post()
            .uri("/api/twitter/access_token")
            .cookie(oauth_cookie)
            .insert_header((header::CONTENT_TYPE, "application/json"))
            .set_payload("{not json")
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        // Bad input keeps the handshake alive for a retry
        assert!(response_cookie(&resp, OAUTH_COOKIE).is_none());

        let body: serde_json::Value = test::read_body_json(resp).await;
        assert_eq!(body["success"], false);
        assert_eq!(body["code"], "invalid_payload");
        assert_eq!(provider.exchange_verifier_calls(), 0);
    }

    #[actix_web::test]
    async fn test_oauth2_start_with_empty_body() {
        let dir = tempfile::tempdir().unwrap();
        let state = test_state(test_config(dir.path()), Arc::new(StubProvider::default()));
        let app = test::init_service(App::new().app_data(state).configure(super::config)).await;

        let req = test::TestRequest::post().uri("/api/twitter/oauth2/authorize").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        assert!(response_cookie(&resp, OAUTH_COOKIE).is_none());

        let body: serde_json::Value = test::read_body_json(resp).await;
        assert_eq!(body["success"], false);
        assert_eq!(body["code"], "invalid_payload");
    }
}
