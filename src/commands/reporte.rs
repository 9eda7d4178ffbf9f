use crate::error::CreceResult;
use crate::middleware::auth::TenantContext;
use crate::state::AppState;
use axum::{extract::State, Json};
use chrono::{DateTime, Datelike, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::FromRow;
use uuid::Uuid;

use super::anuncio::ESTADO_ACTIVO;

#[derive(Debug, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct OverviewTotals {
    pub total_amount: Decimal,
    pub total_balance_due: Decimal,
    pub quantity_of_sales: i64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OverviewResponse {
    pub user_name: String,
    #[serde(flatten)]
    pub totals: OverviewTotals,
}

/// Resumen del mes en curso: cobrado, saldo pendiente y cantidad de ventas.
pub async fn overview(
    State(state): State<AppState>,
    ctx: TenantContext,
) -> CreceResult<Json<OverviewResponse>> {
    let user_name: String = sqlx::query_scalar("SELECT name FROM usuarios WHERE id = $1")
        .bind(ctx.usuario_id)
        .fetch_one(&state.pool)
        .await?;

    let totals = sqlx::query_as::<_, OverviewTotals>(
        "SELECT COALESCE(SUM(payment), 0) AS total_amount, \
                COALESCE(SUM(balance_due), 0) AS total_balance_due, \
                COUNT(*) AS quantity_of_sales \
         FROM ventas \
         WHERE negocio_id = $1 \
           AND created_at >= date_trunc('month', now()) \
           AND created_at < date_trunc('month', now()) + interval '1 month'",
    )
    .bind(ctx.negocio_id)
    .fetch_one(&state.pool)
    .await?;

    Ok(Json(OverviewResponse { user_name, totals }))
}

#[derive(Debug, Serialize)]
pub struct NetRevenueResponse {
    pub total_sales: Decimal,
    pub total_debt: Decimal,
    pub actual_amount: Decimal,
}

/// Ingreso real del mes: lo cobrado menos las deudas activas del período.
pub async fn net_revenue(
    State(state): State<AppState>,
    ctx: TenantContext,
) -> CreceResult<Json<NetRevenueResponse>> {
    let total_sales: Decimal = sqlx::query_scalar(
        "SELECT COALESCE(SUM(payment), 0) FROM ventas \
         WHERE negocio_id = $1 \
           AND created_at >= date_trunc('month', now()) \
           AND created_at < date_trunc('month', now()) + interval '1 month'",
    )
    .bind(ctx.negocio_id)
    .fetch_one(&state.pool)
    .await?;

    let total_debt: Decimal = sqlx::query_scalar(
        "SELECT COALESCE(SUM(d.amount), 0) \
         FROM deudas d JOIN clientes c ON c.id = d.cliente_id \
         WHERE c.negocio_id = $1 AND d.status = $2 \
           AND d.updated_at >= date_trunc('month', now()) \
           AND d.updated_at < date_trunc('month', now()) + interval '1 month'",
    )
    .bind(ctx.negocio_id)
    .bind(ESTADO_ACTIVO)
    .fetch_one(&state.pool)
    .await?;

    Ok(Json(NetRevenueResponse {
        total_sales,
        total_debt,
        actual_amount: total_sales - total_debt,
    }))
}

#[derive(Debug, Serialize, FromRow)]
pub struct ProductoVendido {
    pub product_id: Uuid,
    pub product_name: String,
    pub total_sales: Decimal,
    pub total_quantity: i64,
}

pub async fn ventas_por_producto(
    State(state): State<AppState>,
    ctx: TenantContext,
) -> CreceResult<Json<Vec<ProductoVendido>>> {
    let productos = sqlx::query_as::<_, ProductoVendido>(
        "SELECT dv.producto_id AS product_id, p.name AS product_name, \
                COALESCE(SUM(dv.price), 0) AS total_sales, \
                COALESCE(SUM(dv.quantity), 0)::BIGINT AS total_quantity \
         FROM detalles_ventas dv \
         JOIN ventas v ON v.id = dv.venta_id \
         JOIN productos p ON p.id = dv.producto_id \
         WHERE v.negocio_id = $1 \
         GROUP BY dv.producto_id, p.name \
         ORDER BY total_sales DESC \
         LIMIT 10",
    )
    .bind(ctx.negocio_id)
    .fetch_all(&state.pool)
    .await?;

    Ok(Json(productos))
}

#[derive(Debug, Serialize, FromRow)]
pub struct VentasPorMetodo {
    pub payment_method: Option<String>,
    pub total_sales: Decimal,
}

pub async fn ventas_por_metodo_de_pago(
    State(state): State<AppState>,
    ctx: TenantContext,
) -> CreceResult<Json<Vec<VentasPorMetodo>>> {
    let metodos = sqlx::query_as::<_, VentasPorMetodo>(
        "SELECT payment_method, COALESCE(SUM(payment), 0) AS total_sales \
         FROM ventas WHERE negocio_id = $1 \
         GROUP BY payment_method",
    )
    .bind(ctx.negocio_id)
    .fetch_all(&state.pool)
    .await?;

    Ok(Json(metodos))
}

#[derive(Debug, Serialize, FromRow, Clone)]
pub struct VentasDelMes {
    pub month: String,
    pub total_sales: Decimal,
}

/// Completa los últimos tres meses calendario con 0 donde no hubo ventas,
/// para que el gráfico siempre reciba tres puntos.
pub fn fill_missing_months(now: DateTime<Utc>, rows: Vec<VentasDelMes>) -> Vec<VentasDelMes> {
    let mut months = Vec::with_capacity(3);
    let (mut year, mut month) = (now.year(), now.month());
    for _ in 0..3 {
        months.push(format!("{year:04}-{month:02}"));
        if month == 1 {
            year -= 1;
            month = 12;
        } else {
            month -= 1;
        }
    }
    months.reverse();

    months
        .into_iter()
        .map(|label| {
            rows.iter()
                .find(|row| row.month == label)
                .cloned()
                .unwrap_or(VentasDelMes {
                    month: label,
                    total_sales: Decimal::ZERO,
                })
        })
        .collect()
}

pub async fn ultimas_ventas(
    State(state): State<AppState>,
    ctx: TenantContext,
) -> CreceResult<Json<Vec<VentasDelMes>>> {
    let rows = sqlx::query_as::<_, VentasDelMes>(
        "SELECT to_char(date_trunc('month', created_at), 'YYYY-MM') AS month, \
                COALESCE(SUM(payment), 0) AS total_sales \
         FROM ventas \
         WHERE negocio_id = $1 \
           AND created_at >= date_trunc('month', now()) - interval '2 month' \
         GROUP BY 1 ORDER BY 1 ASC",
    )
    .bind(ctx.negocio_id)
    .fetch_all(&state.pool)
    .await?;

    Ok(Json(fill_missing_months(Utc::now(), rows)))
}
