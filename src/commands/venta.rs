use crate::db::{DetalleVenta, Venta};
use crate::error::{CreceError, CreceResult};
use crate::middleware::auth::TenantContext;
use crate::state::AppState;
use axum::{
    extract::{Path, Query, State},
    Json,
};
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use sqlx::{Postgres, Transaction};
use uuid::Uuid;
use validator::{Validate, ValidationError};

pub const STATUS_PAGADO: &str = "Pagado";
pub const STATUS_PAGADO_PARCIALMENTE: &str = "Pagado Parcialmente";
pub const DEUDA_ACTIVA: &str = "Activo";

fn decimal_error(code: &'static str, message: &'static str) -> ValidationError {
    let mut error = ValidationError::new(code);
    error.message = Some(message.into());
    error
}

fn positive_decimal(value: &Decimal) -> Result<(), ValidationError> {
    if *value > Decimal::ZERO {
        Ok(())
    } else {
        Err(decimal_error("positive", "Debe ser mayor a 0"))
    }
}

fn non_negative_decimal(value: &Decimal) -> Result<(), ValidationError> {
    if *value >= Decimal::ZERO {
        Ok(())
    } else {
        Err(decimal_error("non_negative", "Debe ser mayor o igual a 0"))
    }
}

fn percentage(value: &Decimal) -> Result<(), ValidationError> {
    if *value >= Decimal::ZERO && *value <= Decimal::from(100) {
        Ok(())
    } else {
        Err(decimal_error("percentage", "Debe estar entre 0 y 100"))
    }
}

#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct DetalleVentaInput {
    pub id: Option<Uuid>,
    #[serde(rename = "productoid")]
    pub producto_id: Uuid,
    #[serde(rename = "productname")]
    pub product_name: Option<String>,
    #[validate(range(min = 1, message = "La cantidad debe ser mayor a 0"))]
    pub quantity: i32,
    #[validate(custom(function = "positive_decimal"))]
    pub price: Decimal,
    #[validate(custom(function = "percentage"))]
    pub iva_percentage: Option<Decimal>,
    #[validate(custom(function = "percentage"))]
    pub discount: Option<Decimal>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateVentaRequest {
    #[validate(custom(function = "positive_decimal"))]
    pub total: Decimal,
    #[validate(custom(function = "non_negative_decimal"))]
    pub payment: Option<Decimal>,
    #[validate(length(max = 100, message = "Método de pago es muy largo"))]
    pub payment_method: Option<String>,
    #[serde(rename = "clienteid")]
    pub cliente_id: Option<Uuid>,
    #[serde(default)]
    pub is_on_credit: bool,
    #[validate(custom(function = "non_negative_decimal"))]
    pub deuda_amount: Option<Decimal>,
    pub due_date: Option<DateTime<Utc>>,
    #[validate(
        length(min = 1, message = "Debe incluir al menos un detalle de venta"),
        nested
    )]
    pub detalles_ventas: Vec<DetalleVentaInput>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateVentaRequest {
    #[validate(custom(function = "non_negative_decimal"))]
    pub payment: Option<Decimal>,
    #[validate(length(max = 100, message = "Método de pago es muy largo"))]
    pub payment_method: Option<String>,
    #[serde(rename = "clienteid")]
    pub cliente_id: Option<Uuid>,
    #[serde(default)]
    pub is_on_credit: bool,
    #[validate(custom(function = "non_negative_decimal"))]
    pub deuda_amount: Option<Decimal>,
    pub due_date: Option<DateTime<Utc>>,
    #[validate(custom(function = "positive_decimal"))]
    pub total: Decimal,
    #[validate(nested)]
    pub detalles_ventas: Option<Vec<DetalleVentaInput>>,
}

#[derive(Debug, Serialize)]
pub struct VentaConDetalles {
    #[serde(flatten)]
    pub venta: Venta,
    pub detalles_ventas: Vec<DetalleVenta>,
}

/// Saldo pendiente derivado del pago declarado: 0 para ventas de contado,
/// nunca negativo para ventas a crédito.
pub fn effective_debt(is_on_credit: bool, deuda_amount: Option<Decimal>) -> Decimal {
    if is_on_credit {
        deuda_amount.unwrap_or(Decimal::ZERO).max(Decimal::ZERO)
    } else {
        Decimal::ZERO
    }
}

pub fn venta_status(is_on_credit: bool) -> &'static str {
    if is_on_credit {
        STATUS_PAGADO_PARCIALMENTE
    } else {
        STATUS_PAGADO
    }
}

/// Rango [inicio, fin) para un filtro año/mes. `None` cuando no se filtra.
pub fn month_range(
    year: Option<i32>,
    month: Option<u32>,
) -> CreceResult<Option<(NaiveDate, NaiveDate)>> {
    let (Some(year), Some(month)) = (year, month) else {
        return Ok(None);
    };
    let start = NaiveDate::from_ymd_opt(year, month, 1)
        .ok_or_else(|| CreceError::validation("month", "Mes o año no válido"))?;
    let end = if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)
    }
    .ok_or_else(|| CreceError::validation("month", "Mes o año no válido"))?;
    Ok(Some((start, end)))
}

async fn fetch_detalles(pool: &sqlx::PgPool, venta_id: Uuid) -> CreceResult<Vec<DetalleVenta>> {
    Ok(sqlx::query_as::<_, DetalleVenta>(
        "SELECT * FROM detalles_ventas WHERE venta_id = $1 ORDER BY sale_date ASC",
    )
    .bind(venta_id)
    .fetch_all(pool)
    .await?)
}

/// Inserta un detalle tomando el nombre del producto como copia al momento
/// de la venta. El producto debe pertenecer al negocio del vendedor.
async fn insert_detalle(
    tx: &mut Transaction<'_, Postgres>,
    venta_id: Uuid,
    negocio_id: Uuid,
    detalle: &DetalleVentaInput,
) -> CreceResult<()> {
    let producto_name: Option<String> =
        sqlx::query_scalar("SELECT name FROM productos WHERE id = $1 AND negocio_id = $2")
            .bind(detalle.producto_id)
            .bind(negocio_id)
            .fetch_optional(&mut **tx)
            .await?;

    let Some(producto_name) = producto_name else {
        return Err(CreceError::NotFound("Producto no encontrado".to_string()));
    };

    let product_name = detalle
        .product_name
        .clone()
        .unwrap_or(producto_name);

    sqlx::query(
        "INSERT INTO detalles_ventas \
         (venta_id, producto_id, product_name, quantity, price, iva_percentage, discount) \
         VALUES ($1, $2, $3, $4, $5, $6, $7)",
    )
    .bind(venta_id)
    .bind(detalle.producto_id)
    .bind(product_name)
    .bind(detalle.quantity)
    .bind(detalle.price)
    .bind(detalle.iva_percentage.unwrap_or(Decimal::ZERO))
    .bind(detalle.discount.unwrap_or(Decimal::ZERO))
    .execute(&mut **tx)
    .await?;

    Ok(())
}

#[derive(Debug, Deserialize)]
pub struct VentaListQuery {
    pub year: Option<i32>,
    pub month: Option<u32>,
}

pub async fn list_ventas(
    State(state): State<AppState>,
    ctx: TenantContext,
    Query(params): Query<VentaListQuery>,
) -> CreceResult<Json<Vec<Venta>>> {
    let ventas = match month_range(params.year, params.month)? {
        Some((start, end)) => {
            sqlx::query_as::<_, Venta>(
                "SELECT * FROM ventas \
                 WHERE negocio_id = $1 AND created_at >= $2 AND created_at < $3 \
                 ORDER BY created_at DESC",
            )
            .bind(ctx.negocio_id)
            .bind(start)
            .bind(end)
            .fetch_all(&state.pool)
            .await?
        }
        None => {
            sqlx::query_as::<_, Venta>(
                "SELECT * FROM ventas WHERE negocio_id = $1 ORDER BY created_at DESC",
            )
            .bind(ctx.negocio_id)
            .fetch_all(&state.pool)
            .await?
        }
    };

    Ok(Json(ventas))
}

pub async fn get_venta(
    State(state): State<AppState>,
    ctx: TenantContext,
    Path(id): Path<Uuid>,
) -> CreceResult<Json<VentaConDetalles>> {
    let venta: Option<Venta> =
        sqlx::query_as("SELECT * FROM ventas WHERE id = $1 AND negocio_id = $2")
            .bind(id)
            .bind(ctx.negocio_id)
            .fetch_optional(&state.pool)
            .await?;

    let Some(venta) = venta else {
        return Err(CreceError::NotFound("Venta no encontrada".to_string()));
    };

    let detalles_ventas = fetch_detalles(&state.pool, venta.id).await?;
    Ok(Json(VentaConDetalles {
        venta,
        detalles_ventas,
    }))
}

/// Alta de venta con sus detalles y, para ventas a crédito con saldo, la
/// deuda asociada. Todo dentro de una sola transacción.
pub async fn create_venta(
    State(state): State<AppState>,
    ctx: TenantContext,
    Json(payload): Json<CreateVentaRequest>,
) -> CreceResult<Json<VentaConDetalles>> {
    payload.validate()?;

    let debt = effective_debt(payload.is_on_credit, payload.deuda_amount);
    if payload.is_on_credit && payload.cliente_id.is_none() {
        return Err(CreceError::validation(
            "clienteid",
            "Cliente ID es requerido para ventas a crédito",
        ));
    }

    let mut tx = state.pool.begin().await?;

    let venta: Venta = sqlx::query_as(
        "INSERT INTO ventas \
         (negocio_id, cliente_id, payment, total, balance_due, status, payment_method) \
         VALUES ($1, $2, $3, $4, $5, $6, $7) RETURNING *",
    )
    .bind(ctx.negocio_id)
    .bind(payload.cliente_id)
    .bind(payload.payment.unwrap_or(Decimal::ZERO))
    .bind(payload.total)
    .bind(debt)
    .bind(venta_status(payload.is_on_credit))
    .bind(&payload.payment_method)
    .fetch_one(&mut *tx)
    .await?;

    for detalle in &payload.detalles_ventas {
        insert_detalle(&mut tx, venta.id, ctx.negocio_id, detalle).await?;
    }

    if payload.is_on_credit && debt > Decimal::ZERO {
        sqlx::query(
            "INSERT INTO deudas (cliente_id, venta_id, amount, due_date, status) \
             VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(payload.cliente_id)
        .bind(venta.id)
        .bind(debt)
        .bind(payload.due_date)
        .bind(DEUDA_ACTIVA)
        .execute(&mut *tx)
        .await?;
    }

    tx.commit().await?;

    let detalles_ventas = fetch_detalles(&state.pool, venta.id).await?;
    Ok(Json(VentaConDetalles {
        venta,
        detalles_ventas,
    }))
}

/// Edición de venta: actualiza el encabezado, concilia detalles (con id se
/// actualizan en su lugar, sin id se agregan) y sincroniza la deuda del par
/// (cliente, venta). Una sola transacción.
pub async fn update_venta(
    State(state): State<AppState>,
    ctx: TenantContext,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateVentaRequest>,
) -> CreceResult<Json<VentaConDetalles>> {
    payload.validate()?;

    let Some(cliente_id) = payload.cliente_id else {
        return Err(CreceError::validation(
            "clienteid",
            "Cliente ID es requerido",
        ));
    };

    let debt = effective_debt(payload.is_on_credit, payload.deuda_amount);

    let mut tx = state.pool.begin().await?;

    let existing: Option<(Uuid,)> =
        sqlx::query_as("SELECT id FROM ventas WHERE id = $1 AND negocio_id = $2")
            .bind(id)
            .bind(ctx.negocio_id)
            .fetch_optional(&mut *tx)
            .await?;
    if existing.is_none() {
        return Err(CreceError::NotFound("Venta no encontrada".to_string()));
    }

    let venta: Venta = sqlx::query_as(
        "UPDATE ventas SET \
            payment = COALESCE($1, payment), \
            payment_method = COALESCE($2, payment_method), \
            cliente_id = $3, \
            total = $4, \
            balance_due = $5, \
            status = $6 \
         WHERE id = $7 RETURNING *",
    )
    .bind(payload.payment)
    .bind(&payload.payment_method)
    .bind(cliente_id)
    .bind(payload.total)
    .bind(debt)
    .bind(venta_status(payload.is_on_credit))
    .bind(id)
    .fetch_one(&mut *tx)
    .await?;

    if let Some(detalles) = &payload.detalles_ventas {
        for detalle in detalles {
            match detalle.id {
                Some(detalle_id) => {
                    let owned: Option<(Uuid,)> = sqlx::query_as(
                        "SELECT id FROM detalles_ventas WHERE id = $1 AND venta_id = $2",
                    )
                    .bind(detalle_id)
                    .bind(id)
                    .fetch_optional(&mut *tx)
                    .await?;

                    if owned.is_none() {
                        tracing::warn!(
                            "Detalle {} no pertenece a la venta {}, se omite",
                            detalle_id,
                            id
                        );
                        continue;
                    }

                    sqlx::query(
                        "UPDATE detalles_ventas SET \
                            producto_id = $1, quantity = $2, price = $3, \
                            iva_percentage = $4, discount = $5 \
                         WHERE id = $6",
                    )
                    .bind(detalle.producto_id)
                    .bind(detalle.quantity)
                    .bind(detalle.price)
                    .bind(detalle.iva_percentage.unwrap_or(Decimal::ZERO))
                    .bind(detalle.discount.unwrap_or(Decimal::ZERO))
                    .bind(detalle_id)
                    .execute(&mut *tx)
                    .await?;
                }
                None => insert_detalle(&mut tx, id, ctx.negocio_id, detalle).await?,
            }
        }
    }

    // Sincronización de la deuda: upsert sobre el par (cliente, venta) si
    // la venta queda a crédito con saldo, borrado en cualquier otro caso.
    if payload.is_on_credit && debt > Decimal::ZERO {
        sqlx::query(
            "INSERT INTO deudas (cliente_id, venta_id, amount, due_date, status) \
             VALUES ($1, $2, $3, $4, $5) \
             ON CONFLICT (cliente_id, venta_id) DO UPDATE SET \
                amount = EXCLUDED.amount, \
                due_date = EXCLUDED.due_date, \
                status = EXCLUDED.status, \
                updated_at = now()",
        )
        .bind(cliente_id)
        .bind(id)
        .bind(debt)
        .bind(payload.due_date)
        .bind(DEUDA_ACTIVA)
        .execute(&mut *tx)
        .await?;
    } else {
        sqlx::query("DELETE FROM deudas WHERE cliente_id = $1 AND venta_id = $2")
            .bind(cliente_id)
            .bind(id)
            .execute(&mut *tx)
            .await?;
    }

    tx.commit().await?;

    let detalles_ventas = fetch_detalles(&state.pool, venta.id).await?;
    Ok(Json(VentaConDetalles {
        venta,
        detalles_ventas,
    }))
}

#[derive(Debug, Deserialize)]
pub struct IdQuery {
    pub id: Uuid,
}

/// Baja de venta: borra detalles y deudas antes que la venta para
/// respetar las referencias, en una sola transacción.
pub async fn delete_venta(
    State(state): State<AppState>,
    ctx: TenantContext,
    Query(params): Query<IdQuery>,
) -> CreceResult<Json<Value>> {
    let mut tx = state.pool.begin().await?;

    let existing: Option<(Uuid,)> =
        sqlx::query_as("SELECT id FROM ventas WHERE id = $1 AND negocio_id = $2")
            .bind(params.id)
            .bind(ctx.negocio_id)
            .fetch_optional(&mut *tx)
            .await?;
    if existing.is_none() {
        return Err(CreceError::NotFound("Venta no encontrada".to_string()));
    }

    sqlx::query("DELETE FROM detalles_ventas WHERE venta_id = $1")
        .bind(params.id)
        .execute(&mut *tx)
        .await?;
    sqlx::query("DELETE FROM deudas WHERE venta_id = $1")
        .bind(params.id)
        .execute(&mut *tx)
        .await?;
    sqlx::query("DELETE FROM ventas WHERE id = $1")
        .bind(params.id)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;

    Ok(Json(json!({ "message": "Venta eliminada exitosamente" })))
}
