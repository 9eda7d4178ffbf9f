use crate::db::Cliente;
use crate::error::{CreceError, CreceResult};
use crate::middleware::auth::TenantContext;
use crate::state::AppState;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;
use validator::Validate;

use super::venta::IdQuery;

#[derive(Debug, Deserialize, Validate)]
pub struct ClienteRequest {
    #[validate(length(min = 1, message = "El nombre es obligatorio"))]
    pub name: String,
    #[validate(email(message = "Email no válido"))]
    pub email: String,
    pub phone: Option<String>,
    pub address: Option<String>,
}

pub async fn list_clientes(
    State(state): State<AppState>,
    ctx: TenantContext,
) -> CreceResult<Json<Vec<Cliente>>> {
    let clientes = sqlx::query_as::<_, Cliente>(
        "SELECT * FROM clientes WHERE negocio_id = $1 ORDER BY created_at DESC",
    )
    .bind(ctx.negocio_id)
    .fetch_all(&state.pool)
    .await?;

    Ok(Json(clientes))
}

pub async fn create_cliente(
    State(state): State<AppState>,
    ctx: TenantContext,
    Json(payload): Json<ClienteRequest>,
) -> CreceResult<(StatusCode, Json<Cliente>)> {
    payload.validate()?;

    let existing: Option<(Uuid,)> = sqlx::query_as("SELECT id FROM clientes WHERE email = $1")
        .bind(&payload.email)
        .fetch_optional(&state.pool)
        .await?;
    if existing.is_some() {
        return Err(CreceError::Conflict(
            "Cliente con este email ya existe".to_string(),
        ));
    }

    let cliente: Cliente = sqlx::query_as(
        "INSERT INTO clientes (negocio_id, name, email, phone, address) \
         VALUES ($1, $2, $3, $4, $5) RETURNING *",
    )
    .bind(ctx.negocio_id)
    .bind(&payload.name)
    .bind(&payload.email)
    .bind(&payload.phone)
    .bind(&payload.address)
    .fetch_one(&state.pool)
    .await?;

    Ok((StatusCode::CREATED, Json(cliente)))
}

pub async fn update_cliente(
    State(state): State<AppState>,
    ctx: TenantContext,
    Path(id): Path<Uuid>,
    Json(payload): Json<ClienteRequest>,
) -> CreceResult<Json<Cliente>> {
    payload.validate()?;

    let existing: Option<Cliente> = sqlx::query_as("SELECT * FROM clientes WHERE id = $1")
        .bind(id)
        .fetch_optional(&state.pool)
        .await?;

    let Some(existing) = existing else {
        return Err(CreceError::NotFound("Cliente no encontrado".to_string()));
    };
    if existing.negocio_id != ctx.negocio_id {
        return Err(CreceError::Forbidden(
            "Cliente no pertenece a tu negocio".to_string(),
        ));
    }

    if existing.email != payload.email {
        let email_taken: Option<(Uuid,)> =
            sqlx::query_as("SELECT id FROM clientes WHERE email = $1 AND id != $2")
                .bind(&payload.email)
                .bind(id)
                .fetch_optional(&state.pool)
                .await?;
        if email_taken.is_some() {
            return Err(CreceError::Conflict(
                "Cliente con este email ya existe".to_string(),
            ));
        }
    }

    let cliente: Cliente = sqlx::query_as(
        "UPDATE clientes SET name = $1, email = $2, phone = $3, address = $4, \
         updated_at = now() WHERE id = $5 RETURNING *",
    )
    .bind(&payload.name)
    .bind(&payload.email)
    .bind(&payload.phone)
    .bind(&payload.address)
    .bind(id)
    .fetch_one(&state.pool)
    .await?;

    Ok(Json(cliente))
}

pub async fn delete_cliente(
    State(state): State<AppState>,
    ctx: TenantContext,
    Query(params): Query<IdQuery>,
) -> CreceResult<Json<Value>> {
    let existing: Option<(Uuid, Uuid)> =
        sqlx::query_as("SELECT id, negocio_id FROM clientes WHERE id = $1")
            .bind(params.id)
            .fetch_optional(&state.pool)
            .await?;

    let Some((_, negocio_id)) = existing else {
        return Err(CreceError::NotFound("Cliente no encontrado".to_string()));
    };
    if negocio_id != ctx.negocio_id {
        return Err(CreceError::Forbidden(
            "Cliente no pertenece a tu negocio".to_string(),
        ));
    }

    sqlx::query("DELETE FROM clientes WHERE id = $1")
        .bind(params.id)
        .execute(&state.pool)
        .await?;

    Ok(Json(json!({ "message": "Cliente eliminado exitosamente" })))
}
