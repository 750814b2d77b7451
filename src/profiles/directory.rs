//! The user directory: profile records keyed by id, unique on username and email.

use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::{db, AppError, AppResult};

pub const DEFAULT_PROFILE_PHOTO: &str = "default-profile.png";

macro_rules! profile_columns {
    () => {
        "id,name,username,email,age,gender,role,bio,interests,looking_for,profile_photo,created_at"
    };
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum Role {
    User,
    Admin,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    pub id: Uuid,
    pub name: String,
    pub username: String,
    pub email: String,
    pub age: i64,
    pub gender: String,
    pub role: Role,
    pub bio: String,
    pub interests: Vec<String>,
    pub looking_for: String,
    pub profile_photo: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

/// What other users get to see.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicProfile {
    pub id: Uuid,
    pub name: String,
    pub username: String,
    pub age: i64,
    pub gender: String,
    pub bio: String,
    pub interests: Vec<String>,
    pub looking_for: String,
    pub profile_photo: String,
}

impl From<Profile> for PublicProfile {
    fn from(profile: Profile) -> Self {
        Self {
            id: profile.id,
            name: profile.name,
            username: profile.username,
            age: profile.age,
            gender: profile.gender,
            bio: profile.bio,
            interests: profile.interests,
            looking_for: profile.looking_for,
            profile_photo: profile.profile_photo,
        }
    }
}

#[derive(Debug)]
pub struct NewProfile {
    pub name: String,
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub age: i64,
    pub gender: String,
    pub interests: Vec<String>,
    pub looking_for: String,
    pub bio: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileUpdate {
    pub name: Option<String>,
    pub age: Option<i64>,
    pub interests: Option<Vec<String>>,
    pub bio: Option<String>,
    pub looking_for: Option<String>,
}

#[derive(sqlx::FromRow)]
struct ProfileRow {
    id: String,
    name: String,
    username: String,
    email: String,
    age: i64,
    gender: String,
    role: Role,
    bio: String,
    interests: String,
    looking_for: String,
    profile_photo: String,
    created_at: OffsetDateTime,
}

#[derive(sqlx::FromRow)]
struct LoginRow {
    #[sqlx(flatten)]
    profile: ProfileRow,
    password_hash: String,
}

impl TryFrom<ProfileRow> for Profile {
    type Error = AppError;

    fn try_from(row: ProfileRow) -> AppResult<Self> {
        Ok(Profile {
            id: db::parse_id(&row.id)?,
            name: row.name,
            username: row.username,
            email: row.email,
            age: row.age,
            gender: row.gender,
            role: row.role,
            bio: row.bio,
            interests: serde_json::from_str(&row.interests)?,
            looking_for: row.looking_for,
            profile_photo: row.profile_photo,
            created_at: row.created_at,
        })
    }
}

/// Trims tags, drops blanks and repeats, keeps first-seen order.
pub fn normalize_interests(interests: Vec<String>) -> Vec<String> {
    let mut normalized: Vec<String> = Vec::with_capacity(interests.len());
    for tag in interests {
        let tag = tag.trim();
        if !tag.is_empty() && !normalized.iter().any(|seen| seen == tag) {
            normalized.push(tag.to_owned());
        }
    }
    normalized
}

pub async fn create(db_pool: &SqlitePool, new: NewProfile) -> AppResult<Profile> {
    let taken = sqlx::query("SELECT 1 FROM users WHERE email=? OR username=?")
        .bind(&new.email)
        .bind(&new.username)
        .fetch_optional(db_pool)
        .await?;
    if taken.is_some() {
        return Err(AppError::conflict("User with this email or username already exists"));
    }

    // first account administers the instance
    let role = if count(db_pool).await? == 0 { Role::Admin } else { Role::User };

    let profile = Profile {
        id: Uuid::now_v7(),
        name: new.name,
        username: new.username,
        email: new.email,
        age: new.age,
        gender: new.gender,
        role,
        bio: new.bio,
        interests: normalize_interests(new.interests),
        looking_for: new.looking_for.trim().to_owned(),
        profile_photo: DEFAULT_PROFILE_PHOTO.to_owned(),
        created_at: db::now(),
    };

    let inserted = sqlx::query(concat!(
        "INSERT INTO users (", profile_columns!(), ",password_hash) VALUES (?,?,?,?,?,?,?,?,?,?,?,?,?)"
    ))
        .bind(profile.id.to_string())
        .bind(&profile.name)
        .bind(&profile.username)
        .bind(&profile.email)
        .bind(profile.age)
        .bind(&profile.gender)
        .bind(profile.role)
        .bind(&profile.bio)
        .bind(serde_json::to_string(&profile.interests)?)
        .bind(&profile.looking_for)
        .bind(&profile.profile_photo)
        .bind(profile.created_at)
        .bind(&new.password_hash)
        .execute(db_pool)
        .await;

    match inserted {
        Ok(_) => {}
        Err(err) if db::is_unique_violation(&err) => {
            return Err(AppError::conflict("User with this email or username already exists"));
        }
        Err(err) => return Err(err.into()),
    }

    tracing::info!(user_id = %profile.id, username = %profile.username, role = ?profile.role, "registered user");
    Ok(profile)
}

pub async fn find(db_pool: &SqlitePool, id: Uuid) -> AppResult<Option<Profile>> {
    sqlx::query_as::<_, ProfileRow>(concat!("SELECT ", profile_columns!(), " FROM users WHERE id=?"))
        .bind(id.to_string())
        .fetch_optional(db_pool)
        .await?
        .map(Profile::try_from)
        .transpose()
}

pub async fn require(db_pool: &SqlitePool, id: Uuid) -> AppResult<Profile> {
    find(db_pool, id)
        .await?
        .ok_or_else(|| AppError::not_found("User not found"))
}

pub async fn exists(db_pool: &SqlitePool, id: Uuid) -> AppResult<bool> {
    Ok(sqlx::query("SELECT 1 FROM users WHERE id=?")
        .bind(id.to_string())
        .fetch_optional(db_pool)
        .await?
        .is_some())
}

/// Profile plus stored password hash, for login.
pub async fn find_credentials(db_pool: &SqlitePool, email: &str) -> AppResult<Option<(Profile, String)>> {
    let Some(LoginRow { profile, password_hash }) =
        sqlx::query_as::<_, LoginRow>(concat!("SELECT ", profile_columns!(), ",password_hash FROM users WHERE email=?"))
            .bind(email)
            .fetch_optional(db_pool)
            .await?
    else {
        return Ok(None);
    };

    Ok(Some((profile.try_into()?, password_hash)))
}

pub async fn update(db_pool: &SqlitePool, id: Uuid, changes: ProfileUpdate) -> AppResult<Profile> {
    let mut profile = require(db_pool, id).await?;

    if let Some(name) = changes.name.filter(|name| !name.trim().is_empty()) {
        profile.name = name;
    }
    if let Some(age) = changes.age {
        if age <= 0 {
            return Err(AppError::validation("Age must be positive"));
        }
        profile.age = age;
    }
    if let Some(interests) = changes.interests {
        profile.interests = normalize_interests(interests);
    }
    if let Some(bio) = changes.bio {
        profile.bio = bio;
    }
    if let Some(looking_for) = changes.looking_for {
        profile.looking_for = looking_for.trim().to_owned();
    }

    sqlx::query("UPDATE users SET name=?,age=?,interests=?,bio=?,looking_for=? WHERE id=?")
        .bind(&profile.name)
        .bind(profile.age)
        .bind(serde_json::to_string(&profile.interests)?)
        .bind(&profile.bio)
        .bind(&profile.looking_for)
        .bind(id.to_string())
        .execute(db_pool)
        .await?;

    tracing::debug!(user_id = %id, "updated profile");
    Ok(profile)
}

/// Every profile in registration order.
pub async fn list(db_pool: &SqlitePool) -> AppResult<Vec<Profile>> {
    sqlx::query_as::<_, ProfileRow>(concat!("SELECT ", profile_columns!(), " FROM users ORDER BY rowid"))
        .fetch_all(db_pool)
        .await?
        .into_iter()
        .map(Profile::try_from)
        .collect()
}

pub async fn count(db_pool: &SqlitePool) -> AppResult<i64> {
    let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM users")
        .fetch_one(db_pool)
        .await?;
    Ok(count)
}
