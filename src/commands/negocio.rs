use crate::error::{CreceError, CreceResult};
use crate::middleware::auth::TenantContext;
use crate::state::AppState;
use axum::{extract::State, Json};
use rust_decimal::Decimal;
use serde_json::{json, Value};

/// Porcentaje de IVA del negocio del usuario; lo consume el formulario de
/// ventas para calcular el total con impuesto.
pub async fn get_iva_percentage(
    State(state): State<AppState>,
    ctx: TenantContext,
) -> CreceResult<Json<Value>> {
    let iva: Option<Decimal> =
        sqlx::query_scalar("SELECT iva_percentage FROM negocios WHERE id = $1")
            .bind(ctx.negocio_id)
            .fetch_optional(&state.pool)
            .await?;

    let Some(iva_percentage) = iva else {
        return Err(CreceError::NotFound("Negocio no encontrado".to_string()));
    };

    Ok(Json(json!({ "iva_percentage": iva_percentage })))
}
