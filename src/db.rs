#![allow(dead_code)]
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::postgres::{PgConnectOptions, PgPoolOptions, PgSslMode};
use sqlx::{FromRow, Pool, Postgres};
use std::str::FromStr;
use uuid::Uuid;

use crate::error::{CreceError, CreceResult};

pub type DbPool = Pool<Postgres>;

pub async fn init_pool_with_options(opts: PgConnectOptions) -> CreceResult<DbPool> {
    // connect_lazy_with returns the pool immediately without validating
    // the connection; the first query does.
    Ok(PgPoolOptions::new()
        .max_connections(20)
        .acquire_timeout(std::time::Duration::from_secs(30))
        .idle_timeout(std::time::Duration::from_secs(120))
        .connect_lazy_with(opts))
}

pub async fn init_pool(database_url: &str) -> CreceResult<DbPool> {
    let opts = PgConnectOptions::from_str(database_url)
        .map_err(|e| CreceError::Internal(format!("Invalid DB URL: {}", e)))?
        .ssl_mode(PgSslMode::Prefer);

    init_pool_with_options(opts).await
}

pub async fn init_database(pool: &DbPool) -> CreceResult<()> {
    sqlx::migrate!("./migrations").run(pool).await?;
    tracing::info!("Database ready");
    Ok(())
}

/// Negocio: el tenant. Todo dato operativo cuelga de uno.
#[derive(Debug, Serialize, Deserialize, FromRow)]
pub struct Negocio {
    pub id: Uuid,
    pub name: String,
    pub location: Option<String>,
    pub iva_percentage: Decimal,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize, FromRow)]
pub struct Usuario {
    pub id: Uuid,
    pub name: String,
    pub lastname: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password: String,
    pub negocio_id: Option<Uuid>,
    pub profile_image: Option<String>,
    pub default_picture: Option<String>,
    pub accesos_directos: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Auditoría de intentos de ingreso. Solo se insertan filas; el estado de
/// bloqueo se recalcula sobre la ventana móvil, nunca se persiste.
#[derive(Debug, Serialize, Deserialize, FromRow)]
pub struct LoginAttempt {
    pub id: Uuid,
    pub usuario_id: Uuid,
    pub success: bool,
    pub attempted_at: DateTime<Utc>,
    pub ip_address: Option<String>,
    pub reason: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, FromRow)]
pub struct Cliente {
    pub id: Uuid,
    pub negocio_id: Uuid,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize, FromRow)]
pub struct Producto {
    pub id: Uuid,
    pub negocio_id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub barcode: String,
    pub price: Decimal,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize, FromRow)]
pub struct Venta {
    pub id: Uuid,
    pub negocio_id: Uuid,
    pub cliente_id: Option<Uuid>,
    pub payment: Decimal,
    pub total: Decimal,
    pub balance_due: Decimal,
    pub status: String,
    pub payment_method: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize, FromRow)]
pub struct DetalleVenta {
    pub id: Uuid,
    pub venta_id: Uuid,
    pub producto_id: Uuid,
    pub product_name: String,
    pub quantity: i32,
    pub price: Decimal,
    pub iva_percentage: Decimal,
    pub discount: Decimal,
    pub sale_date: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize, FromRow)]
pub struct Deuda {
    pub id: Uuid,
    pub cliente_id: Uuid,
    pub venta_id: Uuid,
    pub amount: Decimal,
    pub due_date: Option<DateTime<Utc>>,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize, FromRow)]
pub struct Anuncio {
    pub id: Uuid,
    pub usuario_id: Uuid,
    pub message: String,
    pub created_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    pub estado: String,
}
