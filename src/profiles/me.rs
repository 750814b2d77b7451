use axum::{debug_handler, extract::State};
use sqlx::SqlitePool;

use crate::{auth::AuthUser, extract::Json, AppResult, AppState};

use super::{directory, Profile, ProfileUpdate};

#[debug_handler(state = AppState)]
pub(crate) async fn profile(
    State(db_pool): State<SqlitePool>,
    user: AuthUser,
) -> AppResult<Json<Profile>> {
    Ok(Json(directory::require(&db_pool, user.user_id).await?))
}

#[debug_handler(state = AppState)]
pub(crate) async fn update_profile(
    State(db_pool): State<SqlitePool>,
    user: AuthUser,
    Json(changes): Json<ProfileUpdate>,
) -> AppResult<Json<Profile>> {
    Ok(Json(directory::update(&db_pool, user.user_id, changes).await?))
}
