pub mod directory;
mod me;

use axum::{routing::get, Router};

use crate::AppState;

pub use directory::{NewProfile, Profile, ProfileUpdate, PublicProfile, Role};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/profile", get(me::profile).put(me::update_profile))
}
