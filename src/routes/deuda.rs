use crate::commands;
use crate::state::AppState;
use axum::{routing::get, Router};

pub fn router() -> Router<AppState> {
    Router::new().route(
        "/deuda",
        get(commands::deuda::list_deudas).delete(commands::deuda::settle_deuda),
    )
}
