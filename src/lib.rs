pub mod admin;
pub mod appresult;
pub mod auth;
pub mod companion;
pub mod config;
pub mod db;
pub mod extract;
pub mod logging;
pub mod matches;
pub mod messages;
pub mod profiles;
pub mod res;
pub mod rooms;

use axum::{extract::FromRef, Router};
use sqlx::SqlitePool;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

pub use appresult::{AppError, AppResult};

use auth::TokenKeys;
use companion::Companion;
use config::AppConfig;
use messages::MessageVault;
use rooms::Relay;

#[derive(Clone, FromRef)]
pub struct AppState {
    pub db_pool: SqlitePool,
    pub tokens: TokenKeys,
    pub relay: Relay,
    pub vault: MessageVault,
    pub companion: Companion,
}

impl AppState {
    pub fn new(db_pool: SqlitePool, config: &AppConfig) -> AppResult<Self> {
        Ok(AppState {
            db_pool,
            tokens: TokenKeys::new(&config.jwt_secret, config.token_ttl_days),
            relay: Relay::new(),
            vault: MessageVault::new(&config.message_key_secret),
            companion: Companion::new(config.companion_url.clone(), config.companion_timeout)?,
        })
    }
}

pub fn app(state: AppState) -> Router {
    let api = Router::new()
        .merge(auth::router())
        .merge(profiles::router())
        .merge(matches::router())
        .merge(messages::router())
        .merge(rooms::router())
        .merge(companion::router())
        .merge(admin::router());

    Router::new()
        .nest("/api", api)
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}
