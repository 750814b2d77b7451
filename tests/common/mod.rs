#![allow(dead_code)]

use heartlink::{
    auth::TokenKeys,
    companion::Companion,
    db,
    messages::MessageVault,
    profiles::{directory, NewProfile, Profile},
    rooms::Relay,
    AppState,
};
use sqlx::SqlitePool;

pub async fn pool() -> SqlitePool {
    db::connect_in_memory().await.unwrap()
}

pub fn state(db_pool: SqlitePool) -> AppState {
    AppState {
        db_pool,
        tokens: TokenKeys::new("integration-jwt", 1),
        relay: Relay::new(),
        vault: MessageVault::new("integration-vault"),
        companion: Companion::offline(),
    }
}

pub async fn user(db_pool: &SqlitePool, name: &str, looking_for: &str, interests: &[&str]) -> Profile {
    let handle = name.to_lowercase();
    directory::create(db_pool, NewProfile {
        name: name.to_owned(),
        username: handle.clone(),
        email: format!("{handle}@example.com"),
        password_hash: "not-a-real-hash".to_owned(),
        age: 28,
        gender: "other".to_owned(),
        interests: interests.iter().map(|t| t.to_string()).collect(),
        looking_for: looking_for.to_owned(),
        bio: String::new(),
    })
    .await
    .unwrap()
}
