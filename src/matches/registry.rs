//! Confirmed pairings. One row per unordered pair, keyed by the sorted pair key.

use serde::Serialize;
use sqlx::{SqliteConnection, SqlitePool};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::{db, rooms::room_key, AppError, AppResult};

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Match {
    pub id: Uuid,
    pub user1: Uuid,
    pub user2: Uuid,
    pub pair_key: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchSummary {
    pub match_id: Uuid,
    pub partner_id: Uuid,
    pub name: String,
    pub username: String,
    pub profile_photo: String,
}

#[derive(sqlx::FromRow)]
struct MatchRow {
    id: String,
    user1: String,
    user2: String,
    pair_key: String,
    created_at: OffsetDateTime,
}

impl TryFrom<MatchRow> for Match {
    type Error = AppError;

    fn try_from(row: MatchRow) -> AppResult<Self> {
        Ok(Match {
            id: db::parse_id(&row.id)?,
            user1: db::parse_id(&row.user1)?,
            user2: db::parse_id(&row.user2)?,
            pair_key: row.pair_key,
            created_at: row.created_at,
        })
    }
}

pub fn pair_key(a: Uuid, b: Uuid) -> String {
    room_key(&a.to_string(), &b.to_string())
}

/// Records the pairing inside the caller's transaction. An existing match for
/// the same pair is returned as-is.
pub(crate) async fn insert(conn: &mut SqliteConnection, user1: Uuid, user2: Uuid) -> AppResult<Match> {
    let key = pair_key(user1, user2);

    let inserted = sqlx::query("INSERT INTO matches (id,user1,user2,pair_key,created_at) VALUES (?,?,?,?,?) ON CONFLICT(pair_key) DO NOTHING")
        .bind(Uuid::now_v7().to_string())
        .bind(user1.to_string())
        .bind(user2.to_string())
        .bind(&key)
        .bind(db::now())
        .execute(&mut *conn)
        .await?;

    if inserted.rows_affected() == 0 {
        tracing::warn!(pair_key = %key, "pair already matched, keeping existing match");
    }

    let row: MatchRow = sqlx::query_as("SELECT id,user1,user2,pair_key,created_at FROM matches WHERE pair_key=?")
        .bind(&key)
        .fetch_one(&mut *conn)
        .await?;
    row.try_into()
}

pub async fn find_between(db_pool: &SqlitePool, a: Uuid, b: Uuid) -> AppResult<Option<Match>> {
    sqlx::query_as::<_, MatchRow>("SELECT id,user1,user2,pair_key,created_at FROM matches WHERE pair_key=?")
        .bind(pair_key(a, b))
        .fetch_optional(db_pool)
        .await?
        .map(Match::try_from)
        .transpose()
}

pub async fn are_matched(db_pool: &SqlitePool, a: Uuid, b: Uuid) -> AppResult<bool> {
    Ok(find_between(db_pool, a, b).await?.is_some())
}

/// The match between the caller and `partner`, or NotFound.
pub async fn require_between(db_pool: &SqlitePool, user_id: Uuid, partner: Uuid) -> AppResult<Match> {
    find_between(db_pool, user_id, partner)
        .await?
        .ok_or_else(|| AppError::not_found("No match with this user"))
}

pub async fn partners(db_pool: &SqlitePool, user_id: Uuid) -> AppResult<Vec<Uuid>> {
    let id = user_id.to_string();
    sqlx::query_as::<_, (String,)>("SELECT CASE WHEN user1=? THEN user2 ELSE user1 END FROM matches WHERE user1=? OR user2=?")
        .bind(&id)
        .bind(&id)
        .bind(&id)
        .fetch_all(db_pool)
        .await?
        .iter()
        .map(|(partner,)| db::parse_id(partner))
        .collect()
}

pub async fn list_for(db_pool: &SqlitePool, user_id: Uuid) -> AppResult<Vec<MatchSummary>> {
    let id = user_id.to_string();
    let rows: Vec<(String, String, String, String, String)> = sqlx::query_as(
        "SELECT m.id,u.id,u.name,u.username,u.profile_photo FROM matches m \
         JOIN users u ON u.id = CASE WHEN m.user1=? THEN m.user2 ELSE m.user1 END \
         WHERE m.user1=? OR m.user2=? ORDER BY m.created_at, m.rowid",
    )
        .bind(&id)
        .bind(&id)
        .bind(&id)
        .fetch_all(db_pool)
        .await?;

    rows.into_iter()
        .map(|(match_id, partner_id, name, username, profile_photo)| {
            Ok(MatchSummary {
                match_id: db::parse_id(&match_id)?,
                partner_id: db::parse_id(&partner_id)?,
                name,
                username,
                profile_photo,
            })
        })
        .collect()
}
