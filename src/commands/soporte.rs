use crate::error::CreceResult;
use crate::middleware::auth::TenantContext;
use crate::state::AppState;
use axum::{extract::State, Json};
use serde::Deserialize;
use serde_json::{json, Value};
use validator::Validate;

use super::auth::MAX_ATTEMPTS;

fn relay_url() -> Option<String> {
    std::env::var("SUPPORT_RELAY_URL")
        .ok()
        .filter(|url| !url.is_empty())
}

async fn relay_message(subject: &str, text: &str) -> Result<(), String> {
    let Some(url) = relay_url() else {
        tracing::warn!("SUPPORT_RELAY_URL not set, skipping outbound message: {subject}");
        return Ok(());
    };

    let client = reqwest::Client::new();
    let response = client
        .post(&url)
        .json(&json!({ "subject": subject, "text": text }))
        .send()
        .await
        .map_err(|e| format!("Network error: {e}"))?;

    if !response.status().is_success() {
        return Err(format!("Relay returned {}", response.status()));
    }
    Ok(())
}

/// Aviso de bloqueo de cuenta. Se dispara fuera de banda durante el
/// ingreso; cualquier fallo se registra y se descarta para no filtrar el
/// estado del bloqueo al cliente.
pub async fn send_block_warning(email: &str) {
    let subject = format!("Bloqueo en Crece de email: {email}");
    let text = format!(
        "Esta cuenta ha sido bloqueada por {MAX_ATTEMPTS} intentos fallidos de ingreso.\n\nEmail: {email}"
    );
    if let Err(e) = relay_message(&subject, &text).await {
        tracing::error!("No se pudo enviar el aviso de bloqueo: {e}");
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct ContactRequest {
    #[validate(length(min = 1, max = 100, message = "Nombre es requerido"))]
    pub name: String,
    #[validate(length(min = 1, max = 100, message = "Apellido es requerido"))]
    pub lastname: String,
    #[validate(email(message = "Correo electrónico no válido"))]
    pub email: String,
    #[validate(length(min = 10, message = "El número de telefono tiene que ser de al menos 10 digitos"))]
    pub phone_number: String,
    #[validate(length(min = 1, max = 255, message = "Asunto es requerido"))]
    pub subject: String,
    #[validate(length(min = 1, max = 2000, message = "Mensaje es requerido"))]
    pub message: String,
}

pub async fn contact(
    State(state): State<AppState>,
    ctx: TenantContext,
    Json(payload): Json<ContactRequest>,
) -> CreceResult<Json<Value>> {
    payload.validate()?;

    let sender_name: String = sqlx::query_scalar("SELECT name FROM usuarios WHERE id = $1")
        .bind(ctx.usuario_id)
        .fetch_one(&state.pool)
        .await?;

    let text = format!(
        "Name: {} {}\nEmail: {}\nPhone Number: {}\nSubject: {}\nMessage: {}\nUsuario: {}",
        payload.name,
        payload.lastname,
        payload.email,
        payload.phone_number,
        payload.subject,
        payload.message,
        sender_name,
    );

    relay_message(&payload.subject, &text)
        .await
        .map_err(crate::error::CreceError::Internal)?;

    Ok(Json(json!({ "message": "Mensaje enviado exitosamente" })))
}
