use crate::db::Usuario;
use crate::error::{CreceError, CreceResult};
use crate::middleware::auth::SessionUser;
use crate::state::AppState;
use axum::{extract::State, Json};
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;
use validator::Validate;

pub async fn get_usuario(
    State(state): State<AppState>,
    session: SessionUser,
) -> CreceResult<Json<Usuario>> {
    let usuario: Option<Usuario> = sqlx::query_as("SELECT * FROM usuarios WHERE id = $1")
        .bind(session.usuario_id)
        .fetch_optional(&state.pool)
        .await?;

    usuario
        .map(Json)
        .ok_or_else(|| CreceError::NotFound("Usuario no encontrado".to_string()))
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateCredencialesRequest {
    #[validate(email(message = "El email debe ser válido"))]
    pub new_email: Option<String>,
    #[validate(length(min = 8, message = "La contraseña debe tener al menos 8 caracteres"))]
    pub new_password: Option<String>,
    #[validate(length(
        min = 8,
        message = "La contraseña actual es necesaria para la confirmación"
    ))]
    pub old_password: Option<String>,
}

/// Cambio de credenciales: la contraseña vigente debe confirmarse y el
/// email nuevo no puede estar tomado por otro usuario.
pub async fn update_credenciales(
    State(state): State<AppState>,
    session: SessionUser,
    Json(payload): Json<UpdateCredencialesRequest>,
) -> CreceResult<Json<Value>> {
    payload.validate()?;

    let usuario: Option<Usuario> = sqlx::query_as("SELECT * FROM usuarios WHERE id = $1")
        .bind(session.usuario_id)
        .fetch_optional(&state.pool)
        .await?;

    let Some(usuario) = usuario else {
        return Err(CreceError::NotFound("Usuario no encontrado".to_string()));
    };

    if let Some(old_password) = &payload.old_password {
        if !bcrypt::verify(old_password, usuario.password.trim())? {
            return Err(CreceError::validation(
                "old_password",
                "La contraseña actual no es correcta",
            ));
        }
    }

    if let Some(new_email) = &payload.new_email {
        if new_email != &usuario.email {
            let taken: Option<(Uuid,)> =
                sqlx::query_as("SELECT id FROM usuarios WHERE email = $1 AND id != $2")
                    .bind(new_email)
                    .bind(usuario.id)
                    .fetch_optional(&state.pool)
                    .await?;
            if taken.is_some() {
                return Err(CreceError::Conflict("El email ya está en uso".to_string()));
            }

            sqlx::query("UPDATE usuarios SET email = $1 WHERE id = $2")
                .bind(new_email)
                .bind(usuario.id)
                .execute(&state.pool)
                .await?;
        }
    }

    if let Some(new_password) = &payload.new_password {
        let hashed = bcrypt::hash(new_password, bcrypt::DEFAULT_COST)?;
        sqlx::query("UPDATE usuarios SET password = $1 WHERE id = $2")
            .bind(hashed)
            .bind(usuario.id)
            .execute(&state.pool)
            .await?;
    }

    Ok(Json(json!({ "message": "Credenciales actualizadas con éxito" })))
}

pub async fn get_accesos_directos(
    State(state): State<AppState>,
    session: SessionUser,
) -> CreceResult<Json<Option<String>>> {
    let accesos: Option<Option<String>> =
        sqlx::query_scalar("SELECT accesos_directos FROM usuarios WHERE id = $1")
            .bind(session.usuario_id)
            .fetch_optional(&state.pool)
            .await?;

    let Some(accesos) = accesos else {
        return Err(CreceError::NotFound("Usuario no encontrado".to_string()));
    };

    Ok(Json(accesos))
}

#[derive(Debug, Deserialize)]
pub struct UpdateAccesosRequest {
    pub accesos_directos: String,
}

pub async fn update_accesos_directos(
    State(state): State<AppState>,
    session: SessionUser,
    Json(payload): Json<UpdateAccesosRequest>,
) -> CreceResult<Json<Value>> {
    sqlx::query("UPDATE usuarios SET accesos_directos = $1 WHERE id = $2")
        .bind(&payload.accesos_directos)
        .bind(session.usuario_id)
        .execute(&state.pool)
        .await?;

    Ok(Json(json!({
        "message": "Accesos directos actualizados exitosamente",
        "accesos_directos": payload.accesos_directos,
    })))
}
