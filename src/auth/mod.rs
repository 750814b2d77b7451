use axum::{routing::post, Router};

use crate::AppState;

mod login;
pub mod password;
mod register;
mod token;

pub use token::{AdminUser, AuthUser, Claims, TokenKeys};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/register", post(register::register))
        .route("/login", post(login::login))
}
