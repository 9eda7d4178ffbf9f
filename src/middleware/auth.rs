use crate::error::CreceError;
use crate::state::AppState;
use axum::{
    extract::{FromRequestParts, Request, State},
    http::{header, request::Parts, HeaderMap, Method},
    middleware::Next,
    response::Response,
};
use chrono::Utc;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub const SESSION_COOKIE: &str = "crece_session";

const SESSION_DAYS: i64 = 30;

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    pub sub: String,
    pub email: String,
    pub exp: usize,
}

/// Identidad de la sesión, disponible en toda ruta protegida.
#[derive(Debug, Clone)]
pub struct SessionUser {
    pub usuario_id: Uuid,
    pub email: String,
}

/// Contexto de tenant resuelto por el middleware: el usuario autenticado y
/// su negocio. Solo se inyecta cuando el usuario tiene negocio asignado.
#[derive(Debug, Clone)]
pub struct TenantContext {
    pub usuario_id: Uuid,
    pub negocio_id: Uuid,
}

#[axum::async_trait]
impl<S> FromRequestParts<S> for SessionUser
where
    S: Send + Sync,
{
    type Rejection = CreceError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<SessionUser>()
            .cloned()
            .ok_or_else(|| CreceError::Unauthorized("No autorizado".to_string()))
    }
}

#[axum::async_trait]
impl<S> FromRequestParts<S> for TenantContext
where
    S: Send + Sync,
{
    type Rejection = CreceError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<TenantContext>()
            .cloned()
            .ok_or_else(|| {
                CreceError::NotFound("Este usuario no tiene un negocio designado".to_string())
            })
    }
}

pub fn get_jwt_secret() -> Vec<u8> {
    std::env::var("JWT_SECRET")
        .unwrap_or_else(|_| {
            tracing::warn!("JWT_SECRET not set, using insecure default!");
            "insecure-development-secret-key-replace-me-immediately".to_string()
        })
        .into_bytes()
}

pub fn issue_session_token(usuario_id: Uuid, email: &str) -> Result<String, CreceError> {
    let exp = (Utc::now() + chrono::Duration::days(SESSION_DAYS)).timestamp() as usize;
    let claims = Claims {
        sub: usuario_id.to_string(),
        email: email.to_string(),
        exp,
    };
    Ok(encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(&get_jwt_secret()),
    )?)
}

pub fn session_cookie(token: &str) -> String {
    format!("{SESSION_COOKIE}={token}; Path=/; HttpOnly; SameSite=Lax")
}

pub fn expired_session_cookie() -> String {
    format!("{SESSION_COOKIE}=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0")
}

fn token_from_headers(headers: &HeaderMap) -> Option<String> {
    if let Some(cookies) = headers.get(header::COOKIE).and_then(|v| v.to_str().ok()) {
        let prefix = format!("{SESSION_COOKIE}=");
        if let Some(token) = cookies
            .split(';')
            .map(str::trim)
            .find_map(|c| c.strip_prefix(prefix.as_str()))
        {
            return Some(token.to_string());
        }
    }

    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(|t| t.to_string())
}

fn is_public(method: &Method, path: &str) -> bool {
    if path == "/" || path == "/auth/login" {
        return true;
    }
    *method == Method::GET && (path == "/anuncio" || path == "/anuncio/disponible")
}

/// Valida el token de sesión, carga el usuario y deja `SessionUser` (y
/// `TenantContext` cuando hay negocio asignado) en las extensiones. Las
/// rutas públicas pasan directo.
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, CreceError> {
    let method = request.method().clone();
    let path = request.uri().path().to_string();

    if is_public(&method, &path) {
        return Ok(next.run(request).await);
    }

    let token = token_from_headers(request.headers())
        .ok_or_else(|| CreceError::Unauthorized("No autorizado".to_string()))?;

    let token_data = decode::<Claims>(
        &token,
        &DecodingKey::from_secret(&get_jwt_secret()),
        &Validation::default(),
    )
    .map_err(|_| CreceError::Unauthorized("No autorizado".to_string()))?;

    let usuario_id = Uuid::parse_str(&token_data.claims.sub)
        .map_err(|_| CreceError::Unauthorized("No autorizado".to_string()))?;

    let row: Option<(String, Option<Uuid>)> =
        sqlx::query_as("SELECT email, negocio_id FROM usuarios WHERE id = $1")
            .bind(usuario_id)
            .fetch_optional(&state.pool)
            .await?;

    let Some((email, negocio_id)) = row else {
        return Err(CreceError::Unauthorized("No autorizado".to_string()));
    };

    request.extensions_mut().insert(SessionUser { usuario_id, email });
    if let Some(negocio_id) = negocio_id {
        request.extensions_mut().insert(TenantContext {
            usuario_id,
            negocio_id,
        });
    }

    Ok(next.run(request).await)
}
