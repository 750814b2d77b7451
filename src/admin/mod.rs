pub mod feedback;

use axum::{
    debug_handler,
    extract::State,
    http::StatusCode,
    routing::get,
    Router,
};
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;

use crate::{
    auth::{AdminUser, AuthUser},
    extract::Json,
    profiles::{directory, Profile},
    rooms::Relay,
    AppResult, AppState,
};

use feedback::{Feedback, FeedbackEntry};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/admin/feedback", get(list_feedback).post(submit_feedback))
        .route("/admin/users", get(users))
        .route("/admin/stats", get(stats))
}

#[derive(Deserialize)]
pub(crate) struct FeedbackBody {
    #[serde(default)]
    message: String,
}

#[derive(Serialize)]
pub(crate) struct FeedbackCreated {
    message: &'static str,
    feedback: Feedback,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Stats {
    pub users: i64,
    pub online_connections: usize,
    pub online_users: usize,
}

#[debug_handler(state = AppState)]
pub(crate) async fn submit_feedback(
    State(db_pool): State<SqlitePool>,
    user: AuthUser,
    Json(body): Json<FeedbackBody>,
) -> AppResult<(StatusCode, Json<FeedbackCreated>)> {
    let feedback = feedback::submit(&db_pool, user.user_id, &body.message).await?;
    Ok((StatusCode::CREATED, Json(FeedbackCreated { message: "Feedback submitted", feedback })))
}

#[debug_handler(state = AppState)]
pub(crate) async fn list_feedback(
    State(db_pool): State<SqlitePool>,
    _admin: AdminUser,
) -> AppResult<Json<Vec<FeedbackEntry>>> {
    Ok(Json(feedback::list(&db_pool).await?))
}

#[debug_handler(state = AppState)]
pub(crate) async fn users(
    State(db_pool): State<SqlitePool>,
    _admin: AdminUser,
) -> AppResult<Json<Vec<Profile>>> {
    Ok(Json(directory::list(&db_pool).await?))
}

#[debug_handler(state = AppState)]
pub(crate) async fn stats(
    State(db_pool): State<SqlitePool>,
    State(relay): State<Relay>,
    _admin: AdminUser,
) -> AppResult<Json<Stats>> {
    Ok(Json(Stats {
        users: directory::count(&db_pool).await?,
        online_connections: relay.online_connections(),
        online_users: relay.online_users(),
    }))
}
