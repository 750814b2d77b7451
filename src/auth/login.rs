use axum::{debug_handler, extract::State};
use serde::Deserialize;
use sqlx::SqlitePool;

use crate::{extract::Json, profiles::directory, AppError, AppResult, AppState};

use super::{password, register::AuthResponse, TokenKeys};

#[derive(Deserialize)]
pub(crate) struct LoginBody {
    email: String,
    password: String,
}

#[debug_handler(state = AppState)]
pub(crate) async fn login(
    State(db_pool): State<SqlitePool>,
    State(keys): State<TokenKeys>,
    Json(LoginBody { email, password }): Json<LoginBody>,
) -> AppResult<Json<AuthResponse>> {
    let invalid = || AppError::Unauthorized("Invalid email or password".to_owned());

    let Some((profile, password_hash)) = directory::find_credentials(&db_pool, &email.trim().to_lowercase()).await? else {
        return Err(invalid());
    };

    if !password::verify_blocking(password, password_hash).await? {
        tracing::info!(user_id = %profile.id, "rejected login");
        return Err(invalid());
    }

    tracing::info!(user_id = %profile.id, username = %profile.username, "welcome back");
    let token = keys.issue(profile.id, profile.role)?;
    Ok(Json(AuthResponse {
        id: profile.id,
        name: profile.name,
        email: profile.email,
        role: profile.role,
        token,
    }))
}
