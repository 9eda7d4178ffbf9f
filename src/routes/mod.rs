use crate::state::AppState;
use axum::Router;

pub mod anuncio;
pub mod auth;
pub mod cliente;
pub mod deuda;
pub mod negocio;
pub mod perfil;
pub mod producto;
pub mod soporte;
pub mod venta;

pub fn create_router() -> Router<AppState> {
    Router::new()
        .merge(auth::router())
        .merge(venta::router())
        .merge(cliente::router())
        .merge(producto::router())
        .merge(deuda::router())
        .merge(anuncio::router())
        .merge(negocio::router())
        .merge(perfil::router())
        .merge(soporte::router())
}
