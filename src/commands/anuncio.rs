use crate::db::{Anuncio, DbPool};
use crate::error::{CreceError, CreceResult};
use crate::middleware::auth::{SessionUser, TenantContext};
use crate::state::AppState;
use axum::{
    extract::{Query, State},
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

use super::venta::IdQuery;

pub const ESTADO_ACTIVO: &str = "Activo";
pub const ESTADO_FINALIZADO: &str = "Finalizado";

/// Transición perezosa Activo → Finalizado: se corrige el estado vencido
/// en cada lectura de la colección, no hay temporizador de fondo.
async fn finalize_stale(pool: &DbPool) -> CreceResult<()> {
    sqlx::query(
        "UPDATE anuncios SET estado = $1 \
         WHERE estado = $2 AND finished_at IS NOT NULL AND finished_at <= now()",
    )
    .bind(ESTADO_FINALIZADO)
    .bind(ESTADO_ACTIVO)
    .execute(pool)
    .await?;
    Ok(())
}

#[derive(Debug, Serialize, FromRow)]
pub struct AnuncioConAutor {
    pub id: Uuid,
    pub usuario_id: Uuid,
    pub message: String,
    pub created_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    pub estado: String,
    pub author_name: String,
    pub author_lastname: String,
}

pub async fn list_anuncios(
    State(state): State<AppState>,
) -> CreceResult<Json<Vec<AnuncioConAutor>>> {
    finalize_stale(&state.pool).await?;

    let anuncios = sqlx::query_as::<_, AnuncioConAutor>(
        "SELECT a.id, a.usuario_id, a.message, a.created_at, a.finished_at, a.estado, \
         u.name AS author_name, u.lastname AS author_lastname \
         FROM anuncios a JOIN usuarios u ON u.id = a.usuario_id \
         ORDER BY a.created_at DESC",
    )
    .fetch_all(&state.pool)
    .await?;

    Ok(Json(anuncios))
}

pub async fn list_anuncios_disponibles(
    State(state): State<AppState>,
) -> CreceResult<Json<Vec<Anuncio>>> {
    finalize_stale(&state.pool).await?;

    let anuncios =
        sqlx::query_as::<_, Anuncio>("SELECT * FROM anuncios WHERE estado = $1 ORDER BY created_at DESC")
            .bind(ESTADO_ACTIVO)
            .fetch_all(&state.pool)
            .await?;

    Ok(Json(anuncios))
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateAnuncioRequest {
    #[validate(length(min = 1, message = "Mensaje es requerido"))]
    pub message: String,
    pub created_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,
}

pub async fn create_anuncio(
    State(state): State<AppState>,
    ctx: TenantContext,
    Json(payload): Json<CreateAnuncioRequest>,
) -> CreceResult<Json<Anuncio>> {
    payload.validate()?;

    let anuncio: Anuncio = sqlx::query_as(
        "INSERT INTO anuncios (usuario_id, message, created_at, finished_at, estado) \
         VALUES ($1, $2, COALESCE($3, now()), $4, $5) RETURNING *",
    )
    .bind(ctx.usuario_id)
    .bind(&payload.message)
    .bind(payload.created_at)
    .bind(payload.finished_at)
    .bind(ESTADO_ACTIVO)
    .fetch_one(&state.pool)
    .await?;

    Ok(Json(anuncio))
}

#[derive(Debug, Deserialize)]
pub struct UpdateAnuncioRequest {
    pub finished_at: Option<DateTime<Utc>>,
    pub estado: Option<String>,
}

/// Finalización explícita (o reactivación): fija finished_at y estado.
pub async fn update_anuncio(
    State(state): State<AppState>,
    _session: SessionUser,
    Query(params): Query<IdQuery>,
    Json(payload): Json<UpdateAnuncioRequest>,
) -> CreceResult<Json<Anuncio>> {
    let anuncio: Option<Anuncio> = sqlx::query_as(
        "UPDATE anuncios SET finished_at = $1, estado = $2 WHERE id = $3 RETURNING *",
    )
    .bind(payload.finished_at)
    .bind(payload.estado.unwrap_or_else(|| ESTADO_ACTIVO.to_string()))
    .bind(params.id)
    .fetch_optional(&state.pool)
    .await?;

    anuncio
        .map(Json)
        .ok_or_else(|| CreceError::NotFound("Anuncio no encontrado".to_string()))
}
