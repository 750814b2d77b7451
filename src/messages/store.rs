use serde::Serialize;
use sqlx::SqlitePool;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::{db, matches::registry, AppError, AppResult};

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PrivateMessage {
    pub id: Uuid,
    pub sender_id: Uuid,
    pub receiver_id: Uuid,
    pub encrypted_message: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

#[derive(sqlx::FromRow)]
struct MessageRow {
    id: String,
    sender_id: String,
    receiver_id: String,
    encrypted_message: String,
    created_at: OffsetDateTime,
}

impl TryFrom<MessageRow> for PrivateMessage {
    type Error = AppError;

    fn try_from(row: MessageRow) -> AppResult<Self> {
        Ok(PrivateMessage {
            id: db::parse_id(&row.id)?,
            sender_id: db::parse_id(&row.sender_id)?,
            receiver_id: db::parse_id(&row.receiver_id)?,
            encrypted_message: row.encrypted_message,
            created_at: row.created_at,
        })
    }
}

/// Persists one payload. Only matched users may write to each other.
pub async fn save(
    db_pool: &SqlitePool,
    sender: Uuid,
    receiver: Uuid,
    encrypted_message: String,
) -> AppResult<PrivateMessage> {
    let pairing = registry::require_between(db_pool, sender, receiver).await?;

    let message = PrivateMessage {
        id: Uuid::now_v7(),
        sender_id: sender,
        receiver_id: receiver,
        encrypted_message,
        created_at: db::now(),
    };

    sqlx::query("INSERT INTO messages (id,sender_id,receiver_id,pair_key,encrypted_message,created_at) VALUES (?,?,?,?,?,?)")
        .bind(message.id.to_string())
        .bind(sender.to_string())
        .bind(receiver.to_string())
        .bind(&pairing.pair_key)
        .bind(&message.encrypted_message)
        .bind(message.created_at)
        .execute(db_pool)
        .await?;

    tracing::debug!(message_id = %message.id, pair_key = %pairing.pair_key, "stored message");
    Ok(message)
}

/// Both directions of the conversation, oldest first.
pub async fn history(db_pool: &SqlitePool, user_id: Uuid, partner: Uuid) -> AppResult<Vec<PrivateMessage>> {
    let pairing = registry::require_between(db_pool, user_id, partner).await?;

    sqlx::query_as::<_, MessageRow>(
        "SELECT id,sender_id,receiver_id,encrypted_message,created_at FROM messages \
         WHERE pair_key=? ORDER BY created_at, rowid",
    )
        .bind(&pairing.pair_key)
        .fetch_all(db_pool)
        .await?
        .into_iter()
        .map(PrivateMessage::try_from)
        .collect()
}
