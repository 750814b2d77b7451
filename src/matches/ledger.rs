//! Directional match proposals.
//!
//! A request is created `pending` by its sender and decided exactly once by its
//! receiver. The decision and the resulting match are written in one
//! transaction, with the status change guarded on `pending` so concurrent
//! responses cannot both win.

use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::{db, profiles::directory, AppError, AppResult};

use super::registry::{self, Match};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum RequestStatus {
    Pending,
    Accepted,
    Rejected,
}

/// What a receiver may answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Decision {
    Accepted,
    Rejected,
}

impl From<Decision> for RequestStatus {
    fn from(decision: Decision) -> Self {
        match decision {
            Decision::Accepted => RequestStatus::Accepted,
            Decision::Rejected => RequestStatus::Rejected,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchRequest {
    pub id: Uuid,
    pub sender_id: Uuid,
    pub receiver_id: Uuid,
    pub status: RequestStatus,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

/// The other party of a listed request.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Counterpart {
    pub id: Uuid,
    pub name: String,
    pub username: String,
    pub age: i64,
    pub profile_photo: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestEntry {
    #[serde(flatten)]
    pub request: MatchRequest,
    pub counterpart: Counterpart,
}

#[derive(Debug, Clone, Serialize)]
pub struct RequestLists {
    pub incoming: Vec<RequestEntry>,
    pub sent: Vec<RequestEntry>,
}

#[derive(Debug)]
pub struct Decided {
    pub request: MatchRequest,
    pub created_match: Option<Match>,
}

#[derive(sqlx::FromRow)]
struct RequestRow {
    id: String,
    sender_id: String,
    receiver_id: String,
    status: RequestStatus,
    created_at: OffsetDateTime,
}

#[derive(sqlx::FromRow)]
struct EntryRow {
    #[sqlx(flatten)]
    request: RequestRow,
    party_id: String,
    name: String,
    username: String,
    age: i64,
    profile_photo: String,
}

impl TryFrom<RequestRow> for MatchRequest {
    type Error = AppError;

    fn try_from(row: RequestRow) -> AppResult<Self> {
        Ok(MatchRequest {
            id: db::parse_id(&row.id)?,
            sender_id: db::parse_id(&row.sender_id)?,
            receiver_id: db::parse_id(&row.receiver_id)?,
            status: row.status,
            created_at: row.created_at,
        })
    }
}

impl TryFrom<EntryRow> for RequestEntry {
    type Error = AppError;

    fn try_from(row: EntryRow) -> AppResult<Self> {
        Ok(RequestEntry {
            request: row.request.try_into()?,
            counterpart: Counterpart {
                id: db::parse_id(&row.party_id)?,
                name: row.name,
                username: row.username,
                age: row.age,
                profile_photo: row.profile_photo,
            },
        })
    }
}

pub async fn propose(db_pool: &SqlitePool, proposer: Uuid, recipient: Uuid) -> AppResult<MatchRequest> {
    if proposer == recipient {
        return Err(AppError::validation("You cannot send a request to yourself"));
    }

    if !directory::exists(db_pool, recipient).await? {
        return Err(AppError::not_found("User not found"));
    }

    let existing = sqlx::query("SELECT 1 FROM match_requests WHERE (sender_id=? AND receiver_id=?) OR (sender_id=? AND receiver_id=?)")
        .bind(proposer.to_string())
        .bind(recipient.to_string())
        .bind(recipient.to_string())
        .bind(proposer.to_string())
        .fetch_optional(db_pool)
        .await?;
    if existing.is_some() {
        return Err(AppError::conflict("Request already sent"));
    }

    if registry::are_matched(db_pool, proposer, recipient).await? {
        return Err(AppError::conflict("Already matched"));
    }

    let request = MatchRequest {
        id: Uuid::now_v7(),
        sender_id: proposer,
        receiver_id: recipient,
        status: RequestStatus::Pending,
        created_at: db::now(),
    };

    let inserted = sqlx::query("INSERT INTO match_requests (id,sender_id,receiver_id,status,created_at) VALUES (?,?,?,?,?)")
        .bind(request.id.to_string())
        .bind(request.sender_id.to_string())
        .bind(request.receiver_id.to_string())
        .bind(request.status)
        .bind(request.created_at)
        .execute(db_pool)
        .await;

    match inserted {
        Ok(_) => {}
        Err(err) if db::is_unique_violation(&err) => return Err(AppError::conflict("Request already sent")),
        Err(err) => return Err(err.into()),
    }

    tracing::info!(request_id = %request.id, sender = %proposer, receiver = %recipient, "match request sent");
    Ok(request)
}

/// Decides a pending request addressed to `acting_user`. Unknown ids, other
/// users' requests and already-decided requests are all reported as NotFound.
pub async fn respond(
    db_pool: &SqlitePool,
    request_id: Uuid,
    acting_user: Uuid,
    decision: Decision,
) -> AppResult<Decided> {
    let mut tx = db_pool.begin().await?;

    let row: Option<RequestRow> = sqlx::query_as(
        "UPDATE match_requests SET status=? WHERE id=? AND receiver_id=? AND status='pending' \
         RETURNING id,sender_id,receiver_id,status,created_at",
    )
        .bind(RequestStatus::from(decision))
        .bind(request_id.to_string())
        .bind(acting_user.to_string())
        .fetch_optional(&mut *tx)
        .await?;

    let Some(row) = row else {
        return Err(AppError::not_found("Request not found or invalid"));
    };
    let request = MatchRequest::try_from(row)?;

    let created_match = match decision {
        Decision::Accepted => Some(registry::insert(&mut *tx, request.sender_id, request.receiver_id).await?),
        Decision::Rejected => None,
    };

    tx.commit().await?;

    tracing::info!(request_id = %request.id, status = ?request.status, matched = created_match.is_some(), "match request decided");
    Ok(Decided { request, created_match })
}

/// Users with a request to or from `user_id`, in any state.
pub async fn related_users(db_pool: &SqlitePool, user_id: Uuid) -> AppResult<Vec<Uuid>> {
    let id = user_id.to_string();
    sqlx::query_as::<_, (String,)>("SELECT CASE WHEN sender_id=? THEN receiver_id ELSE sender_id END FROM match_requests WHERE sender_id=? OR receiver_id=?")
        .bind(&id)
        .bind(&id)
        .bind(&id)
        .fetch_all(db_pool)
        .await?
        .iter()
        .map(|(other,)| db::parse_id(other))
        .collect()
}

/// Pending requests addressed to the user, and every request they sent.
pub async fn lists_for(db_pool: &SqlitePool, user_id: Uuid) -> AppResult<RequestLists> {
    let id = user_id.to_string();

    let incoming = sqlx::query_as::<_, EntryRow>(
        "SELECT r.id,r.sender_id,r.receiver_id,r.status,r.created_at,\
         u.id AS party_id,u.name,u.username,u.age,u.profile_photo \
         FROM match_requests r JOIN users u ON u.id = r.sender_id \
         WHERE r.receiver_id=? AND r.status='pending' ORDER BY r.created_at, r.rowid",
    )
        .bind(&id)
        .fetch_all(db_pool)
        .await?
        .into_iter()
        .map(RequestEntry::try_from)
        .collect::<AppResult<Vec<_>>>()?;

    let sent = sqlx::query_as::<_, EntryRow>(
        "SELECT r.id,r.sender_id,r.receiver_id,r.status,r.created_at,\
         u.id AS party_id,u.name,u.username,u.age,u.profile_photo \
         FROM match_requests r JOIN users u ON u.id = r.receiver_id \
         WHERE r.sender_id=? ORDER BY r.created_at, r.rowid",
    )
        .bind(&id)
        .fetch_all(db_pool)
        .await?
        .into_iter()
        .map(RequestEntry::try_from)
        .collect::<AppResult<Vec<_>>>()?;

    Ok(RequestLists { incoming, sent })
}
