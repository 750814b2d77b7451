use axum::{debug_handler, extract::State, http::StatusCode};
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::{auth::AuthUser, extract::Json, AppResult, AppState};

use super::{
    ledger::{self, Decision, MatchRequest, RequestLists},
    recommend::{self, Candidate},
    registry::{self, MatchSummary},
};

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ProposeBody {
    receiver_id: Uuid,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct RespondBody {
    request_id: Uuid,
    status: Decision,
}

#[derive(Serialize)]
pub(crate) struct MessageBody {
    message: String,
}

#[derive(Serialize)]
pub(crate) struct MyMatches {
    matches: Vec<MatchSummary>,
}

#[debug_handler(state = AppState)]
pub(crate) async fn candidates(
    State(db_pool): State<SqlitePool>,
    user: AuthUser,
) -> AppResult<Json<Vec<Candidate>>> {
    Ok(Json(recommend::recommend(&db_pool, user.user_id).await?))
}

#[debug_handler(state = AppState)]
pub(crate) async fn my_matches(
    State(db_pool): State<SqlitePool>,
    user: AuthUser,
) -> AppResult<Json<MyMatches>> {
    let matches = registry::list_for(&db_pool, user.user_id).await?;
    Ok(Json(MyMatches { matches }))
}

#[debug_handler(state = AppState)]
pub(crate) async fn propose(
    State(db_pool): State<SqlitePool>,
    user: AuthUser,
    Json(ProposeBody { receiver_id }): Json<ProposeBody>,
) -> AppResult<(StatusCode, Json<MatchRequest>)> {
    let request = ledger::propose(&db_pool, user.user_id, receiver_id).await?;
    Ok((StatusCode::CREATED, Json(request)))
}

#[debug_handler(state = AppState)]
pub(crate) async fn respond(
    State(db_pool): State<SqlitePool>,
    user: AuthUser,
    Json(RespondBody { request_id, status }): Json<RespondBody>,
) -> AppResult<Json<MessageBody>> {
    let decided = ledger::respond(&db_pool, request_id, user.user_id, status).await?;
    let verb = match decided.request.status {
        ledger::RequestStatus::Accepted => "accepted",
        ledger::RequestStatus::Rejected => "rejected",
        ledger::RequestStatus::Pending => "pending",
    };
    Ok(Json(MessageBody { message: format!("Request {verb}") }))
}

#[debug_handler(state = AppState)]
pub(crate) async fn requests(
    State(db_pool): State<SqlitePool>,
    user: AuthUser,
) -> AppResult<Json<RequestLists>> {
    Ok(Json(ledger::lists_for(&db_pool, user.user_id).await?))
}
