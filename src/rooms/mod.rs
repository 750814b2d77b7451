mod events;
mod relay;
mod ws;

use axum::{routing::get, Router};

use crate::AppState;

pub use events::{ChatMessage, ClientEvent, JoinRoom, ServerEvent, Typing};
pub use relay::{room_key, ConnectionId, Relay};
pub use ws::{dispatch, handle_frame};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/ws", get(ws::relay_ws))
}
