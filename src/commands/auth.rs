use crate::db::{DbPool, Usuario};
use crate::error::{CreceError, CreceResult};
use crate::middleware::auth::{expired_session_cookie, issue_session_token, session_cookie};
use crate::state::AppState;
use axum::{
    extract::{ConnectInfo, State},
    http::{header, HeaderMap},
    response::IntoResponse,
    Json,
};
use chrono::{Duration, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::net::SocketAddr;
use validator::Validate;

/// Intentos fallidos tolerados dentro de la ventana antes de bloquear.
pub const MAX_ATTEMPTS: i64 = 15;
/// Ventana móvil del bloqueo, en minutos.
pub const LOCK_WINDOW_MINUTES: i64 = 1;

#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(email(message = "Email no válido"))]
    pub email: String,
    #[validate(length(min = 6, message = "La contraseña debe tener al menos 6 caracteres"))]
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub id: uuid::Uuid,
    pub name: String,
    pub lastname: String,
    pub email: String,
}

pub fn is_locked(failed_attempts: i64) -> bool {
    failed_attempts >= MAX_ATTEMPTS
}

/// IP del cliente: x-forwarded-for (primera entrada), x-real-ip,
/// cf-connecting-ip, y como último recurso la dirección del socket.
pub fn client_ip(headers: &HeaderMap, remote: SocketAddr) -> String {
    if let Some(forwarded) = headers.get("x-forwarded-for").and_then(|v| v.to_str().ok()) {
        if let Some(first) = forwarded.split(',').next() {
            let first = first.trim();
            if !first.is_empty() {
                return first.to_string();
            }
        }
    }
    if let Some(real_ip) = headers.get("x-real-ip").and_then(|v| v.to_str().ok()) {
        if !real_ip.is_empty() {
            return real_ip.to_string();
        }
    }
    if let Some(cf_ip) = headers.get("cf-connecting-ip").and_then(|v| v.to_str().ok()) {
        if !cf_ip.is_empty() {
            return cf_ip.to_string();
        }
    }
    remote.ip().to_string()
}

async fn record_failed_attempt(
    pool: &DbPool,
    usuario_id: uuid::Uuid,
    ip_address: &str,
    reason: &str,
) -> CreceResult<()> {
    sqlx::query(
        "INSERT INTO login_attempts (usuario_id, success, ip_address, reason) \
         VALUES ($1, FALSE, $2, $3)",
    )
    .bind(usuario_id)
    .bind(ip_address)
    .bind(reason)
    .execute(pool)
    .await?;
    Ok(())
}

/// Intercambio de credenciales. Los éxitos no se registran en la
/// auditoría; solo los fallos.
pub async fn login(
    State(state): State<AppState>,
    ConnectInfo(remote): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    Json(payload): Json<LoginRequest>,
) -> CreceResult<impl IntoResponse> {
    payload.validate()?;

    let usuario: Option<Usuario> = sqlx::query_as("SELECT * FROM usuarios WHERE email = $1")
        .bind(&payload.email)
        .fetch_optional(&state.pool)
        .await?;

    let Some(usuario) = usuario else {
        return Err(CreceError::Unauthorized(
            "No se encontró un usuario".to_string(),
        ));
    };

    let window_start = Utc::now() - Duration::minutes(LOCK_WINDOW_MINUTES);
    let failed_attempts: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM login_attempts \
         WHERE usuario_id = $1 AND success = FALSE AND attempted_at >= $2",
    )
    .bind(usuario.id)
    .bind(window_start)
    .fetch_one(&state.pool)
    .await?;

    if is_locked(failed_attempts) {
        // Corto circuito previo a la comparación de credenciales: este
        // rechazo no genera una fila nueva de auditoría.
        crate::commands::soporte::send_block_warning(&usuario.email).await;
        return Err(CreceError::Locked(LOCK_WINDOW_MINUTES));
    }

    let valid = bcrypt::verify(&payload.password, usuario.password.trim())?;
    if !valid {
        record_failed_attempt(
            &state.pool,
            usuario.id,
            &client_ip(&headers, remote),
            "Contraseña incorrecta",
        )
        .await?;
        return Err(CreceError::Unauthorized("Contraseña inválida".to_string()));
    }

    let token = issue_session_token(usuario.id, &usuario.email)?;

    Ok((
        [(header::SET_COOKIE, session_cookie(&token))],
        Json(LoginResponse {
            id: usuario.id,
            name: usuario.name,
            lastname: usuario.lastname,
            email: usuario.email,
        }),
    ))
}

pub async fn logout() -> impl IntoResponse {
    (
        [(header::SET_COOKIE, expired_session_cookie())],
        Json(json!({ "message": "Sesión cerrada" })),
    )
}
