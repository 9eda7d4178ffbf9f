use crate::commands;
use crate::state::AppState;
use axum::{routing::post, Router};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/auth/login", post(commands::auth::login))
        .route("/auth/logout", post(commands::auth::logout))
}
