use crate::commands;
use crate::state::AppState;
use axum::{routing::get, Router};

pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/producto",
            get(commands::producto::list_productos)
                .post(commands::producto::create_producto)
                .put(commands::producto::update_producto)
                .delete(commands::producto::delete_producto),
        )
        .route("/producto/:id", get(commands::producto::get_producto))
}
