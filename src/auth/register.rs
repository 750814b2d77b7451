use axum::{debug_handler, extract::State, http::StatusCode};
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::{
    extract::Json,
    profiles::{directory, NewProfile, Role},
    AppError, AppResult, AppState,
};

use super::{password, TokenKeys};

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct RegisterBody {
    name: Option<String>,
    username: Option<String>,
    age: Option<i64>,
    gender: Option<String>,
    email: Option<String>,
    password: Option<String>,
    #[serde(default)]
    interests: Vec<String>,
    #[serde(default)]
    looking_for: String,
    #[serde(default)]
    bio: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct AuthResponse {
    pub(crate) id: Uuid,
    pub(crate) name: String,
    pub(crate) email: String,
    pub(crate) role: Role,
    pub(crate) token: String,
}

fn required(value: Option<String>, label: &str) -> AppResult<String> {
    match value.map(|v| v.trim().to_owned()) {
        Some(v) if !v.is_empty() => Ok(v),
        _ => Err(AppError::validation(format!("{label} is required"))),
    }
}

#[debug_handler(state = AppState)]
pub(crate) async fn register(
    State(db_pool): State<SqlitePool>,
    State(keys): State<TokenKeys>,
    Json(body): Json<RegisterBody>,
) -> AppResult<(StatusCode, Json<AuthResponse>)> {
    let username = required(body.username, "Username")?;
    let name = required(body.name, "Name")?;
    let email = required(body.email, "Email")?.to_lowercase();
    let gender = required(body.gender, "Gender")?;
    let Some(password) = body.password.filter(|p| !p.is_empty()) else {
        return Err(AppError::validation("Password is required"));
    };
    let age = match body.age {
        Some(age) if age > 0 => age,
        Some(_) => return Err(AppError::validation("Age must be positive")),
        None => return Err(AppError::validation("Age is required")),
    };

    let password_hash = password::hash_blocking(password).await?;

    let profile = directory::create(&db_pool, NewProfile {
        name,
        username,
        email,
        password_hash,
        age,
        gender,
        interests: body.interests,
        looking_for: body.looking_for,
        bio: body.bio,
    })
    .await?;

    let token = keys.issue(profile.id, profile.role)?;
    Ok((
        StatusCode::CREATED,
        Json(AuthResponse {
            id: profile.id,
            name: profile.name,
            email: profile.email,
            role: profile.role,
            token,
        }),
    ))
}
