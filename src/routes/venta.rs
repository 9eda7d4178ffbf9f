use crate::commands;
use crate::state::AppState;
use axum::{routing::get, Router};

pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/venta",
            get(commands::venta::list_ventas)
                .post(commands::venta::create_venta)
                .delete(commands::venta::delete_venta),
        )
        // Los agregados van antes que "/venta/:id"; axum prioriza las
        // rutas estáticas sobre las dinámicas.
        .route("/venta/net_revenue", get(commands::reporte::net_revenue))
        .route(
            "/venta/por_producto",
            get(commands::reporte::ventas_por_producto),
        )
        .route(
            "/venta/metodo_de_pago",
            get(commands::reporte::ventas_por_metodo_de_pago),
        )
        .route("/venta/ultimas", get(commands::reporte::ultimas_ventas))
        .route(
            "/venta/:id",
            get(commands::venta::get_venta).put(commands::venta::update_venta),
        )
}
