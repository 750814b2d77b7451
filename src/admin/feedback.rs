use serde::Serialize;
use sqlx::SqlitePool;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::{db, AppError, AppResult};

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Feedback {
    pub id: Uuid,
    pub user_id: Uuid,
    pub message: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

#[derive(Debug, Clone, Serialize)]
pub struct Author {
    pub name: String,
    pub email: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedbackEntry {
    #[serde(flatten)]
    pub feedback: Feedback,
    pub user: Author,
}

#[derive(sqlx::FromRow)]
struct FeedbackRow {
    id: String,
    user_id: String,
    message: String,
    created_at: OffsetDateTime,
    name: String,
    email: String,
}

pub async fn submit(db_pool: &SqlitePool, user_id: Uuid, message: &str) -> AppResult<Feedback> {
    let message = message.trim();
    if message.is_empty() {
        return Err(AppError::validation("Feedback message is required"));
    }

    let feedback = Feedback {
        id: Uuid::now_v7(),
        user_id,
        message: message.to_owned(),
        created_at: db::now(),
    };

    sqlx::query("INSERT INTO feedback (id,user_id,message,created_at) VALUES (?,?,?,?)")
        .bind(feedback.id.to_string())
        .bind(user_id.to_string())
        .bind(&feedback.message)
        .bind(feedback.created_at)
        .execute(db_pool)
        .await?;

    tracing::info!(feedback_id = %feedback.id, user_id = %user_id, "feedback received");
    Ok(feedback)
}

/// Newest first.
pub async fn list(db_pool: &SqlitePool) -> AppResult<Vec<FeedbackEntry>> {
    sqlx::query_as::<_, FeedbackRow>(
        "SELECT f.id, f.user_id, f.message, f.created_at, u.name, u.email \
         FROM feedback f JOIN users u ON u.id = f.user_id \
         ORDER BY f.created_at DESC, f.rowid DESC",
    )
        .fetch_all(db_pool)
        .await?
        .into_iter()
        .map(|row| {
            Ok(FeedbackEntry {
                feedback: Feedback {
                    id: db::parse_id(&row.id)?,
                    user_id: db::parse_id(&row.user_id)?,
                    message: row.message,
                    created_at: row.created_at,
                },
                user: Author { name: row.name, email: row.email },
            })
        })
        .collect()
}
