pub mod store;
pub mod vault;

use axum::{
    debug_handler,
    extract::State,
    http::StatusCode,
    routing::get,
    Router,
};
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::{
    auth::AuthUser,
    extract::{Json, Path},
    matches::registry,
    AppError, AppResult, AppState,
};

pub use store::PrivateMessage;
pub use vault::{MessageVault, PairKey, VaultError};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/messages", axum::routing::post(send_message))
        .route("/messages/{partner_id}", get(history))
        .route("/matches/{partner_id}/key", get(pair_key))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct SendMessageBody {
    receiver_id: Uuid,
    encrypted_message: Option<String>,
    /// Plaintext fallback; sealed server-side and never stored.
    message: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct PairKeyBody {
    partner_id: Uuid,
    key: String,
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

#[debug_handler(state = AppState)]
pub(crate) async fn send_message(
    State(db_pool): State<SqlitePool>,
    State(vault): State<MessageVault>,
    user: AuthUser,
    Json(body): Json<SendMessageBody>,
) -> AppResult<(StatusCode, Json<PrivateMessage>)> {
    let encrypted_message = match (non_empty(body.encrypted_message), non_empty(body.message)) {
        (Some(encrypted), _) => encrypted,
        (None, Some(plaintext)) => vault.pair_key(user.user_id, body.receiver_id)?.seal(&plaintext)?,
        (None, None) => return Err(AppError::validation("Message is required")),
    };

    let message = store::save(&db_pool, user.user_id, body.receiver_id, encrypted_message).await?;
    Ok((StatusCode::CREATED, Json(message)))
}

#[debug_handler(state = AppState)]
pub(crate) async fn history(
    State(db_pool): State<SqlitePool>,
    user: AuthUser,
    Path(partner_id): Path<Uuid>,
) -> AppResult<Json<Vec<PrivateMessage>>> {
    Ok(Json(store::history(&db_pool, user.user_id, partner_id).await?))
}

#[debug_handler(state = AppState)]
pub(crate) async fn pair_key(
    State(db_pool): State<SqlitePool>,
    State(vault): State<MessageVault>,
    user: AuthUser,
    Path(partner_id): Path<Uuid>,
) -> AppResult<Json<PairKeyBody>> {
    registry::require_between(&db_pool, user.user_id, partner_id).await?;
    let key = vault.pair_key(user.user_id, partner_id)?;
    Ok(Json(PairKeyBody { partner_id, key: key.to_hex() }))
}
