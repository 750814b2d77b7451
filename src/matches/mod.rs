mod handlers;
pub mod ledger;
pub mod recommend;
pub mod registry;
pub mod score;

use axum::{routing::{get, post}, Router};

use crate::AppState;

pub use ledger::{Decision, MatchRequest, RequestStatus};
pub use registry::Match;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/matches", get(handlers::candidates))
        .route("/matches/mine", get(handlers::my_matches))
        .route("/request", get(handlers::requests).post(handlers::propose))
        .route("/request/respond", post(handlers::respond))
}
