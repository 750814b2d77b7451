mod bot;
pub mod history;
mod wellness;

use axum::{
    debug_handler,
    extract::State,
    routing::{get, post},
    Router,
};
use serde::Deserialize;
use sqlx::SqlitePool;

use crate::{auth::AuthUser, extract::Json, AppError, AppResult, AppState};

pub use bot::{song_for, Companion};
pub use history::BotExchange;
pub use wellness::{MusicData, WellnessReply};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/chatbot", post(chatbot))
        .route("/chatbot/history", get(chatbot_history))
        .route("/chat", post(wellness_chat))
}

#[derive(Deserialize)]
pub(crate) struct ChatbotBody {
    message: Option<String>,
}

#[debug_handler(state = AppState)]
pub(crate) async fn chatbot(
    State(db_pool): State<SqlitePool>,
    State(companion): State<Companion>,
    user: AuthUser,
    Json(body): Json<ChatbotBody>,
) -> AppResult<Json<BotExchange>> {
    let message = body.message
        .filter(|m| !m.trim().is_empty())
        .ok_or_else(|| AppError::validation("Message is required"))?;

    let reply = companion.reply(&message).await;
    Ok(Json(history::record(&db_pool, user.user_id, message, reply).await?))
}

#[debug_handler(state = AppState)]
pub(crate) async fn chatbot_history(
    State(db_pool): State<SqlitePool>,
    user: AuthUser,
) -> AppResult<Json<Vec<BotExchange>>> {
    Ok(Json(history::list(&db_pool, user.user_id).await?))
}

/// The posted conversation is not inspected.
pub(crate) async fn wellness_chat() -> Json<WellnessReply> {
    Json(wellness::respond())
}
