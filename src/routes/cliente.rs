use crate::commands;
use crate::state::AppState;
use axum::{
    routing::{get, put},
    Router,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/cliente",
            get(commands::cliente::list_clientes)
                .post(commands::cliente::create_cliente)
                .delete(commands::cliente::delete_cliente),
        )
        .route("/cliente/:id", put(commands::cliente::update_cliente))
}
