use crate::commands;
use crate::state::AppState;
use axum::{routing::get, Router};

pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/anuncio",
            get(commands::anuncio::list_anuncios)
                .post(commands::anuncio::create_anuncio)
                .put(commands::anuncio::update_anuncio),
        )
        .route(
            "/anuncio/disponible",
            get(commands::anuncio::list_anuncios_disponibles),
        )
}
