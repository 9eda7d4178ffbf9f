use crate::db::Producto;
use crate::error::{CreceError, CreceResult};
use crate::middleware::auth::TenantContext;
use crate::state::AppState;
use axum::{
    extract::{Path, Query, State},
    Json,
};
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;
use validator::{Validate, ValidationError};

use super::venta::IdQuery;

fn positive_price(value: &Decimal) -> Result<(), ValidationError> {
    if *value > Decimal::ZERO {
        Ok(())
    } else {
        let mut error = ValidationError::new("positive");
        error.message = Some("El precio debe ser mayor a 0".into());
        Err(error)
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct ProductoRequest {
    #[validate(length(min = 1, message = "Nombre es requerido"))]
    pub name: String,
    #[validate(length(min = 1, message = "Descripción es requerida"))]
    pub description: String,
    #[validate(length(
        min = 5,
        message = "El código de barras tiene que tener al menos 5 caracteres"
    ))]
    pub barcode: String,
    #[validate(custom(function = "positive_price"))]
    pub price: Decimal,
}

pub async fn list_productos(
    State(state): State<AppState>,
    ctx: TenantContext,
) -> CreceResult<Json<Vec<Producto>>> {
    let productos = sqlx::query_as::<_, Producto>(
        "SELECT * FROM productos WHERE negocio_id = $1 ORDER BY created_at DESC",
    )
    .bind(ctx.negocio_id)
    .fetch_all(&state.pool)
    .await?;

    Ok(Json(productos))
}

pub async fn get_producto(
    State(state): State<AppState>,
    ctx: TenantContext,
    Path(id): Path<Uuid>,
) -> CreceResult<Json<Producto>> {
    let producto: Option<Producto> =
        sqlx::query_as("SELECT * FROM productos WHERE id = $1 AND negocio_id = $2")
            .bind(id)
            .bind(ctx.negocio_id)
            .fetch_optional(&state.pool)
            .await?;

    producto
        .map(Json)
        .ok_or_else(|| CreceError::NotFound("Producto no encontrado".to_string()))
}

async fn barcode_in_use(
    pool: &sqlx::PgPool,
    barcode: &str,
    exclude: Option<Uuid>,
) -> CreceResult<bool> {
    let existing: Option<(Uuid,)> = match exclude {
        Some(id) => {
            sqlx::query_as("SELECT id FROM productos WHERE barcode = $1 AND id != $2")
                .bind(barcode)
                .bind(id)
                .fetch_optional(pool)
                .await?
        }
        None => {
            sqlx::query_as("SELECT id FROM productos WHERE barcode = $1")
                .bind(barcode)
                .fetch_optional(pool)
                .await?
        }
    };
    Ok(existing.is_some())
}

pub async fn create_producto(
    State(state): State<AppState>,
    ctx: TenantContext,
    Json(payload): Json<ProductoRequest>,
) -> CreceResult<Json<Producto>> {
    payload.validate()?;

    if barcode_in_use(&state.pool, &payload.barcode, None).await? {
        return Err(CreceError::Conflict(
            "El código de barras ya está en uso".to_string(),
        ));
    }

    let producto: Producto = sqlx::query_as(
        "INSERT INTO productos (negocio_id, name, description, barcode, price) \
         VALUES ($1, $2, $3, $4, $5) RETURNING *",
    )
    .bind(ctx.negocio_id)
    .bind(&payload.name)
    .bind(&payload.description)
    .bind(&payload.barcode)
    .bind(payload.price)
    .fetch_one(&state.pool)
    .await?;

    Ok(Json(producto))
}

pub async fn update_producto(
    State(state): State<AppState>,
    ctx: TenantContext,
    Query(params): Query<IdQuery>,
    Json(payload): Json<ProductoRequest>,
) -> CreceResult<Json<Producto>> {
    payload.validate()?;

    let existing: Option<Producto> = sqlx::query_as("SELECT * FROM productos WHERE id = $1")
        .bind(params.id)
        .fetch_optional(&state.pool)
        .await?;

    let Some(existing) = existing else {
        return Err(CreceError::NotFound(
            "Producto no encontrado o no autorizado para actualizar".to_string(),
        ));
    };
    if existing.negocio_id != ctx.negocio_id {
        return Err(CreceError::NotFound(
            "Producto no encontrado o no autorizado para actualizar".to_string(),
        ));
    }

    if existing.barcode != payload.barcode
        && barcode_in_use(&state.pool, &payload.barcode, Some(params.id)).await?
    {
        return Err(CreceError::Conflict(
            "El código de barras ya está en uso".to_string(),
        ));
    }

    let producto: Producto = sqlx::query_as(
        "UPDATE productos SET name = $1, description = $2, barcode = $3, price = $4 \
         WHERE id = $5 RETURNING *",
    )
    .bind(&payload.name)
    .bind(&payload.description)
    .bind(&payload.barcode)
    .bind(payload.price)
    .bind(params.id)
    .fetch_one(&state.pool)
    .await?;

    Ok(Json(producto))
}

pub async fn delete_producto(
    State(state): State<AppState>,
    ctx: TenantContext,
    Query(params): Query<IdQuery>,
) -> CreceResult<Json<Value>> {
    let existing: Option<(Uuid, Uuid)> =
        sqlx::query_as("SELECT id, negocio_id FROM productos WHERE id = $1")
            .bind(params.id)
            .fetch_optional(&state.pool)
            .await?;

    match existing {
        Some((_, negocio_id)) if negocio_id == ctx.negocio_id => {}
        _ => {
            return Err(CreceError::NotFound(
                "Producto no encontrado o no autorizado para eliminar".to_string(),
            ));
        }
    }

    sqlx::query("DELETE FROM productos WHERE id = $1")
        .bind(params.id)
        .execute(&state.pool)
        .await?;

    Ok(Json(json!({ "message": "Producto eliminado exitosamente" })))
}
