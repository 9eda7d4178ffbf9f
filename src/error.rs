use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::json;
use thiserror::Error;

/// Error de validación a nivel de campo, con la misma forma
/// `{path, message}` que consume el panel.
#[derive(Debug, Clone, Serialize)]
pub struct FieldError {
    pub path: String,
    pub message: String,
}

#[derive(Error, Debug)]
pub enum CreceError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("Bcrypt error: {0}")]
    Bcrypt(#[from] bcrypt::BcryptError),

    #[error("Token error: {0}")]
    Jwt(#[from] jsonwebtoken::errors::Error),

    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    #[error("Error de validación")]
    Validation(Vec<FieldError>),

    /// Cuenta bloqueada por intentos fallidos; lleva los minutos de espera.
    #[error("Cuenta temporalmente bloqueada")]
    Locked(i64),

    #[error("Internal error: {0}")]
    Internal(String),
}

pub type CreceResult<T> = Result<T, CreceError>;

impl CreceError {
    pub fn validation(path: &str, message: &str) -> Self {
        CreceError::Validation(vec![FieldError {
            path: path.to_string(),
            message: message.to_string(),
        }])
    }
}

impl From<validator::ValidationErrors> for CreceError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let mut fields = Vec::new();
        collect_field_errors("", &errors, &mut fields);
        CreceError::Validation(fields)
    }
}

fn collect_field_errors(
    prefix: &str,
    errors: &validator::ValidationErrors,
    out: &mut Vec<FieldError>,
) {
    use validator::ValidationErrorsKind;

    for (field, kind) in errors.errors() {
        let path = if prefix.is_empty() {
            field.to_string()
        } else {
            format!("{prefix}.{field}")
        };
        match kind {
            ValidationErrorsKind::Field(field_errors) => {
                for error in field_errors {
                    let message = error
                        .message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| error.code.to_string());
                    out.push(FieldError {
                        path: path.clone(),
                        message,
                    });
                }
            }
            ValidationErrorsKind::Struct(nested) => {
                collect_field_errors(&path, nested, out);
            }
            ValidationErrorsKind::List(items) => {
                for (index, nested) in items {
                    collect_field_errors(&format!("{path}[{index}]"), nested, out);
                }
            }
        }
    }
}

impl IntoResponse for CreceError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            CreceError::Database(ref e) => {
                tracing::error!("Database error: {:?}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    json!({ "message": "Error interno del servidor" }),
                )
            }
            CreceError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, json!({ "message": msg })),
            CreceError::Forbidden(msg) => (StatusCode::FORBIDDEN, json!({ "message": msg })),
            CreceError::NotFound(msg) => (StatusCode::NOT_FOUND, json!({ "message": msg })),
            CreceError::Conflict(msg) => (StatusCode::CONFLICT, json!({ "message": msg })),
            CreceError::Validation(errors) => (
                StatusCode::BAD_REQUEST,
                json!({ "message": "Error de validación", "errors": errors }),
            ),
            CreceError::Locked(minutes) => (
                StatusCode::TOO_MANY_REQUESTS,
                json!({
                    "message": format!(
                        "Su cuenta esta temporalmente bloqueada. Por favor intente de nuevo en {} minutos.",
                        minutes
                    )
                }),
            ),
            CreceError::Internal(ref msg) => {
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    json!({ "message": "Error interno del servidor" }),
                )
            }
            other => {
                tracing::error!("Unhandled error: {:?}", other);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    json!({ "message": "Error interno del servidor" }),
                )
            }
        };

        (status, Json(body)).into_response()
    }
}
