use actix_cors::Cors;
use actix_web::{http::header, middleware::Logger, web, App, HttpServer};
use dotenv::dotenv;
use std::sync::Arc;

mod config;
mod controllers;
mod cookies;
mod db;
mod error;
mod middleware;
mod models;
mod registration;
mod storage;
mod twitter;

#[cfg(test)]
mod test_support;

use config::Config;
use cookies::CookieSigner;
use db::Database;
use storage::CredentialStore;
use twitter::{TwitterClient, TwitterProvider};

pub struct AppState {
    pub db: Arc<Database>,
    pub config: Config,
    pub cookies: CookieSigner,
    pub twitter: Arc<dyn TwitterProvider>,
    pub credentials: Arc<dyn CredentialStore>,
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenv().ok();
    env_logger::init();

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            log::error!("Invalid configuration: {}", e);
            return Err(std::io::Error::new(std::io::ErrorKind::InvalidInput, e.to_string()));
        }
    };
    let port = config.port;

    log::info!("Initializing database at {}", config.database_url);
    let db = Database::new(&config.database_url).map_err(|e| {
        log::error!("Failed to initialize database: {}", e);
        std::io::Error::other(e.to_string())
    })?;
    let db = Arc::new(db);

    log::info!("Using '{}' credential backend", config.credential_backend);
    let credentials = storage::create_credential_store(&config, db.clone());

    // One HTTP client for every Twitter call
    let twitter: Arc<dyn TwitterProvider> = Arc::new(TwitterClient::new(reqwest::Client::new()));

    if config.oauth1.is_none() {
        log::warn!("Twitter OAuth 1.0a keys not set - PIN flow disabled");
    }
    if config.oauth2.is_none() {
        log::warn!("Twitter OAuth 2.0 client not set - PKCE flow disabled");
    }

    let cookies = CookieSigner::new(&config.cookie_secret, config.production);
    let state = web::Data::new(AppState {
        db,
        config: config.clone(),
        cookies,
        twitter,
        credentials,
    });

    log::info!("Starting Metalhead server on port {}", port);
    log::info!("Allowing browser requests from {}", config.app_origin);

    let app_origin = config.app_origin.clone();

    HttpServer::new(move || {
        // Credentialed requests need an explicit origin, not a wildcard
        let cors = Cors::default()
            .allowed_origin(&app_origin)
            .supports_credentials()
            .allow_any_method()
            .allowed_headers(vec![header::CONTENT_TYPE, header::ACCEPT, header::AUTHORIZATION])
            .max_age(3600);

        App::new()
            .app_data(state.clone())
            .wrap(Logger::default())
            .wrap(cors)
            .configure(controllers::health::config)
            .configure(controllers::auth::config)
            .configure(controllers::twitter::config)
            .configure(controllers::bots::config)
    })
    .bind(("0.0.0.0", port))?
    .run()
    .await
}
