use crate::error::{CreceError, CreceResult};
use crate::middleware::auth::TenantContext;
use crate::state::AppState;
use axum::{
    extract::{Query, State},
    Json,
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use sqlx::FromRow;
use uuid::Uuid;

use super::venta::{month_range, IdQuery};

/// Deuda con el nombre del cliente y la fecha de la venta, tal como la
/// consume el listado del panel.
#[derive(Debug, Serialize, FromRow)]
pub struct DeudaConCliente {
    pub id: Uuid,
    pub cliente_id: Uuid,
    pub venta_id: Uuid,
    pub amount: Decimal,
    pub due_date: Option<DateTime<Utc>>,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub cliente_name: String,
    pub venta_date: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub struct DeudaListQuery {
    pub month: Option<u32>,
    pub year: Option<i32>,
}

pub async fn list_deudas(
    State(state): State<AppState>,
    ctx: TenantContext,
    Query(params): Query<DeudaListQuery>,
) -> CreceResult<Json<Vec<DeudaConCliente>>> {
    let base = "SELECT d.id, d.cliente_id, d.venta_id, d.amount, d.due_date, d.status, \
                d.created_at, d.updated_at, c.name AS cliente_name, v.created_at AS venta_date \
                FROM deudas d \
                JOIN ventas v ON v.id = d.venta_id \
                JOIN clientes c ON c.id = d.cliente_id \
                WHERE v.negocio_id = $1";

    let deudas = match month_range(params.year, params.month)? {
        Some((start, end)) => {
            let sql = format!(
                "{base} AND v.created_at >= $2 AND v.created_at < $3 ORDER BY v.created_at DESC"
            );
            sqlx::query_as::<_, DeudaConCliente>(&sql)
                .bind(ctx.negocio_id)
                .bind(start)
                .bind(end)
                .fetch_all(&state.pool)
                .await?
        }
        None => {
            let sql = format!("{base} ORDER BY v.created_at DESC");
            sqlx::query_as::<_, DeudaConCliente>(&sql)
                .bind(ctx.negocio_id)
                .fetch_all(&state.pool)
                .await?
        }
    };

    Ok(Json(deudas))
}

/// Saldar una deuda: deja la venta con saldo 0 y pago igual al total, y
/// borra la fila de deuda. Es el único camino que liquida una deuda sin
/// pasar por la edición de la venta.
pub async fn settle_deuda(
    State(state): State<AppState>,
    ctx: TenantContext,
    Query(params): Query<IdQuery>,
) -> CreceResult<Json<Value>> {
    let row: Option<(Uuid, Uuid, Decimal)> = sqlx::query_as(
        "SELECT d.venta_id, v.negocio_id, v.total \
         FROM deudas d JOIN ventas v ON v.id = d.venta_id \
         WHERE d.id = $1",
    )
    .bind(params.id)
    .fetch_optional(&state.pool)
    .await?;

    let Some((venta_id, negocio_id, total)) = row else {
        return Err(CreceError::NotFound("Deuda no encontrada".to_string()));
    };

    if negocio_id != ctx.negocio_id {
        return Err(CreceError::Forbidden(
            "La deuda no pertenece a tu negocio".to_string(),
        ));
    }

    let mut tx = state.pool.begin().await?;

    sqlx::query("UPDATE ventas SET balance_due = 0, payment = $1 WHERE id = $2")
        .bind(total)
        .bind(venta_id)
        .execute(&mut *tx)
        .await?;

    sqlx::query("DELETE FROM deudas WHERE id = $1")
        .bind(params.id)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;

    Ok(Json(json!({
        "message": "Deuda eliminada exitosamente y venta actualizada"
    })))
}
