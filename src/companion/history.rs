use serde::Serialize;
use sqlx::SqlitePool;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::{db, AppError, AppResult};

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BotExchange {
    pub id: Uuid,
    pub user_id: Uuid,
    pub message: String,
    pub bot_reply: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

#[derive(sqlx::FromRow)]
struct ExchangeRow {
    id: String,
    user_id: String,
    message: String,
    bot_reply: String,
    created_at: OffsetDateTime,
}

impl TryFrom<ExchangeRow> for BotExchange {
    type Error = AppError;

    fn try_from(row: ExchangeRow) -> AppResult<Self> {
        Ok(BotExchange {
            id: db::parse_id(&row.id)?,
            user_id: db::parse_id(&row.user_id)?,
            message: row.message,
            bot_reply: row.bot_reply,
            created_at: row.created_at,
        })
    }
}

pub async fn record(db_pool: &SqlitePool, user_id: Uuid, message: String, bot_reply: String) -> AppResult<BotExchange> {
    let exchange = BotExchange {
        id: Uuid::now_v7(),
        user_id,
        message,
        bot_reply,
        created_at: db::now(),
    };

    sqlx::query("INSERT INTO bot_messages (id,user_id,message,bot_reply,created_at) VALUES (?,?,?,?,?)")
        .bind(exchange.id.to_string())
        .bind(user_id.to_string())
        .bind(&exchange.message)
        .bind(&exchange.bot_reply)
        .bind(exchange.created_at)
        .execute(db_pool)
        .await?;
    Ok(exchange)
}

pub async fn list(db_pool: &SqlitePool, user_id: Uuid) -> AppResult<Vec<BotExchange>> {
    sqlx::query_as::<_, ExchangeRow>(
        "SELECT id,user_id,message,bot_reply,created_at FROM bot_messages WHERE user_id=? ORDER BY created_at, rowid",
    )
        .bind(user_id.to_string())
        .fetch_all(db_pool)
        .await?
        .into_iter()
        .map(BotExchange::try_from)
        .collect()
}
