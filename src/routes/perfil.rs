use crate::commands;
use crate::state::AppState;
use axum::{
    routing::{get, put},
    Router,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/overview", get(commands::reporte::overview))
        .route(
            "/overview/accesos",
            get(commands::perfil::get_accesos_directos)
                .put(commands::perfil::update_accesos_directos),
        )
        .route("/perfil/usuario", get(commands::perfil::get_usuario))
        .route(
            "/perfil/seguridad",
            put(commands::perfil::update_credenciales),
        )
}
