#[cfg(test)]
mod tests {
    use crate::commands::venta::{
        CreateVentaRequest, DetalleVentaInput, IdQuery, UpdateVentaRequest,
        STATUS_PAGADO, STATUS_PAGADO_PARCIALMENTE,
    };
    use crate::db::{self, DbPool};
    use crate::middleware::auth::TenantContext;
    use crate::state::AppState;
    use axum::extract::{ConnectInfo, Path, Query, State};
    use axum::http::HeaderMap;
    use axum::Json;
    use rust_decimal::Decimal;
    use std::net::SocketAddr;
    use uuid::Uuid;

    async fn setup_test_state() -> AppState {
        dotenvy::dotenv().ok();
        let database_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");
        let pool = db::init_pool(&database_url)
            .await
            .expect("Failed to create pool");
        db::init_database(&pool).await.expect("Failed to migrate");
        AppState { pool }
    }

    async fn seed_negocio(pool: &DbPool) -> Uuid {
        sqlx::query_scalar(
            "INSERT INTO negocios (name, location, iva_percentage) \
             VALUES ('Negocio de prueba', 'Quito', 12.0) RETURNING id",
        )
        .fetch_one(pool)
        .await
        .unwrap()
    }

    async fn seed_usuario(pool: &DbPool, negocio_id: Uuid, password: &str) -> (Uuid, String) {
        let email = format!("test+{}@crece.test", Uuid::new_v4());
        let hash = bcrypt::hash(password, bcrypt::DEFAULT_COST).unwrap();
        let id = sqlx::query_scalar(
            "INSERT INTO usuarios (name, lastname, email, password, negocio_id) \
             VALUES ('Ana', 'Prueba', $1, $2, $3) RETURNING id",
        )
        .bind(&email)
        .bind(hash)
        .bind(negocio_id)
        .fetch_one(pool)
        .await
        .unwrap();
        (id, email)
    }

    async fn seed_cliente(pool: &DbPool, negocio_id: Uuid) -> Uuid {
        let email = format!("cliente+{}@crece.test", Uuid::new_v4());
        sqlx::query_scalar(
            "INSERT INTO clientes (negocio_id, name, email) \
             VALUES ($1, 'Ana', $2) RETURNING id",
        )
        .bind(negocio_id)
        .bind(email)
        .fetch_one(pool)
        .await
        .unwrap()
    }

    async fn seed_producto(pool: &DbPool, negocio_id: Uuid) -> Uuid {
        let barcode = format!("BC-{}", Uuid::new_v4());
        sqlx::query_scalar(
            "INSERT INTO productos (negocio_id, name, description, barcode, price) \
             VALUES ($1, 'Widget', 'Widget de prueba', $2, 10.00) RETURNING id",
        )
        .bind(negocio_id)
        .bind(barcode)
        .fetch_one(pool)
        .await
        .unwrap()
    }

    async fn teardown_negocio(pool: &DbPool, negocio_id: Uuid) {
        let _ = sqlx::query(
            "DELETE FROM detalles_ventas WHERE venta_id IN \
             (SELECT id FROM ventas WHERE negocio_id = $1)",
        )
        .bind(negocio_id)
        .execute(pool)
        .await;
        let _ = sqlx::query(
            "DELETE FROM deudas WHERE venta_id IN \
             (SELECT id FROM ventas WHERE negocio_id = $1)",
        )
        .bind(negocio_id)
        .execute(pool)
        .await;
        let _ = sqlx::query("DELETE FROM ventas WHERE negocio_id = $1")
            .bind(negocio_id)
            .execute(pool)
            .await;
        let _ = sqlx::query(
            "DELETE FROM anuncios WHERE usuario_id IN \
             (SELECT id FROM usuarios WHERE negocio_id = $1)",
        )
        .bind(negocio_id)
        .execute(pool)
        .await;
        let _ = sqlx::query(
            "DELETE FROM login_attempts WHERE usuario_id IN \
             (SELECT id FROM usuarios WHERE negocio_id = $1)",
        )
        .bind(negocio_id)
        .execute(pool)
        .await;
        let _ = sqlx::query("DELETE FROM productos WHERE negocio_id = $1")
            .bind(negocio_id)
            .execute(pool)
            .await;
        let _ = sqlx::query("DELETE FROM clientes WHERE negocio_id = $1")
            .bind(negocio_id)
            .execute(pool)
            .await;
        let _ = sqlx::query("DELETE FROM usuarios WHERE negocio_id = $1")
            .bind(negocio_id)
            .execute(pool)
            .await;
        let _ = sqlx::query("DELETE FROM negocios WHERE id = $1")
            .bind(negocio_id)
            .execute(pool)
            .await;
    }

    fn detalle(producto_id: Uuid) -> DetalleVentaInput {
        DetalleVentaInput {
            id: None,
            producto_id,
            product_name: None,
            quantity: 2,
            price: Decimal::new(1000, 2),
            iva_percentage: Some(Decimal::from(10)),
            discount: Some(Decimal::ZERO),
        }
    }

    /// Venta a crédito: queda con saldo, estado parcial y una deuda
    /// activa; al saldarla la venta se completa y la deuda desaparece.
    #[tokio::test]
    async fn test_credit_sale_and_settlement_flow() {
        let state = setup_test_state().await;
        let negocio_id = seed_negocio(&state.pool).await;
        let (usuario_id, _) = seed_usuario(&state.pool, negocio_id, "secreta123").await;
        let cliente_id = seed_cliente(&state.pool, negocio_id).await;
        let producto_id = seed_producto(&state.pool, negocio_id).await;
        let ctx = TenantContext {
            usuario_id,
            negocio_id,
        };

        let payload = CreateVentaRequest {
            total: Decimal::new(2200, 2),
            payment: Some(Decimal::new(500, 2)),
            payment_method: Some("Efectivo".to_string()),
            cliente_id: Some(cliente_id),
            is_on_credit: true,
            deuda_amount: Some(Decimal::new(1700, 2)),
            due_date: None,
            detalles_ventas: vec![detalle(producto_id)],
        };

        let Json(created) = crate::commands::venta::create_venta(
            State(state.clone()),
            ctx.clone(),
            Json(payload),
        )
        .await
        .expect("create_venta failed");

        assert_eq!(created.venta.balance_due, Decimal::new(1700, 2));
        assert_eq!(created.venta.status, STATUS_PAGADO_PARCIALMENTE);
        assert_eq!(created.detalles_ventas.len(), 1);
        assert_eq!(created.detalles_ventas[0].product_name, "Widget");

        let (deuda_id, amount, deuda_status): (Uuid, Decimal, String) = sqlx::query_as(
            "SELECT id, amount, status FROM deudas WHERE cliente_id = $1 AND venta_id = $2",
        )
        .bind(cliente_id)
        .bind(created.venta.id)
        .fetch_one(&state.pool)
        .await
        .expect("deuda not created");
        assert_eq!(amount, Decimal::new(1700, 2));
        assert_eq!(deuda_status, "Activo");

        // Saldar la deuda por el endpoint dedicado
        crate::commands::deuda::settle_deuda(
            State(state.clone()),
            ctx.clone(),
            Query(IdQuery { id: deuda_id }),
        )
        .await
        .expect("settle_deuda failed");

        let (payment, balance_due): (Decimal, Decimal) =
            sqlx::query_as("SELECT payment, balance_due FROM ventas WHERE id = $1")
                .bind(created.venta.id)
                .fetch_one(&state.pool)
                .await
                .unwrap();
        assert_eq!(balance_due, Decimal::ZERO);
        assert_eq!(payment, Decimal::new(2200, 2));

        let remaining: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM deudas WHERE id = $1")
            .bind(deuda_id)
            .fetch_one(&state.pool)
            .await
            .unwrap();
        assert_eq!(remaining, 0);

        teardown_negocio(&state.pool, negocio_id).await;
    }

    /// Venta de contado: estado "Pagado" y saldo 0, sin fila de deuda.
    #[tokio::test]
    async fn test_cash_sale_has_no_debt() {
        let state = setup_test_state().await;
        let negocio_id = seed_negocio(&state.pool).await;
        let (usuario_id, _) = seed_usuario(&state.pool, negocio_id, "secreta123").await;
        let producto_id = seed_producto(&state.pool, negocio_id).await;
        let ctx = TenantContext {
            usuario_id,
            negocio_id,
        };

        let payload = CreateVentaRequest {
            total: Decimal::new(2200, 2),
            payment: Some(Decimal::new(2200, 2)),
            payment_method: Some("Tarjeta de Crédito".to_string()),
            cliente_id: None,
            is_on_credit: false,
            deuda_amount: Some(Decimal::new(9900, 2)),
            due_date: None,
            detalles_ventas: vec![detalle(producto_id)],
        };

        let Json(created) = crate::commands::venta::create_venta(
            State(state.clone()),
            ctx,
            Json(payload),
        )
        .await
        .expect("create_venta failed");

        assert_eq!(created.venta.status, STATUS_PAGADO);
        assert_eq!(created.venta.balance_due, Decimal::ZERO);

        let deudas: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM deudas WHERE venta_id = $1")
            .bind(created.venta.id)
            .fetch_one(&state.pool)
            .await
            .unwrap();
        assert_eq!(deudas, 0);

        teardown_negocio(&state.pool, negocio_id).await;
    }

    /// Dos ediciones idénticas dejan exactamente una deuda con el monto
    /// declarado; pasar la venta a contado la elimina y deja saldo 0.
    #[tokio::test]
    async fn test_debt_sync_idempotent_and_removal() {
        let state = setup_test_state().await;
        let negocio_id = seed_negocio(&state.pool).await;
        let (usuario_id, _) = seed_usuario(&state.pool, negocio_id, "secreta123").await;
        let cliente_id = seed_cliente(&state.pool, negocio_id).await;
        let producto_id = seed_producto(&state.pool, negocio_id).await;
        let ctx = TenantContext {
            usuario_id,
            negocio_id,
        };

        let Json(created) = crate::commands::venta::create_venta(
            State(state.clone()),
            ctx.clone(),
            Json(CreateVentaRequest {
                total: Decimal::new(5000, 2),
                payment: Some(Decimal::new(1000, 2)),
                payment_method: Some("Efectivo".to_string()),
                cliente_id: Some(cliente_id),
                is_on_credit: true,
                deuda_amount: Some(Decimal::new(4000, 2)),
                due_date: None,
                detalles_ventas: vec![detalle(producto_id)],
            }),
        )
        .await
        .unwrap();
        let venta_id = created.venta.id;

        let update_payload = || UpdateVentaRequest {
            payment: Some(Decimal::new(2000, 2)),
            payment_method: Some("Efectivo".to_string()),
            cliente_id: Some(cliente_id),
            is_on_credit: true,
            deuda_amount: Some(Decimal::new(3000, 2)),
            due_date: None,
            total: Decimal::new(5000, 2),
            detalles_ventas: None,
        };

        for _ in 0..2 {
            crate::commands::venta::update_venta(
                State(state.clone()),
                ctx.clone(),
                Path(venta_id),
                Json(update_payload()),
            )
            .await
            .expect("update_venta failed");
        }

        let deudas: Vec<(Decimal,)> =
            sqlx::query_as("SELECT amount FROM deudas WHERE cliente_id = $1 AND venta_id = $2")
                .bind(cliente_id)
                .bind(venta_id)
                .fetch_all(&state.pool)
                .await
                .unwrap();
        assert_eq!(deudas.len(), 1, "repeated upserts must not duplicate");
        assert_eq!(deudas[0].0, Decimal::new(3000, 2));

        // Pasar a contado borra la deuda y deja el saldo en 0
        let Json(updated) = crate::commands::venta::update_venta(
            State(state.clone()),
            ctx.clone(),
            Path(venta_id),
            Json(UpdateVentaRequest {
                payment: Some(Decimal::new(5000, 2)),
                payment_method: Some("Efectivo".to_string()),
                cliente_id: Some(cliente_id),
                is_on_credit: false,
                deuda_amount: None,
                due_date: None,
                total: Decimal::new(5000, 2),
                detalles_ventas: None,
            }),
        )
        .await
        .unwrap();

        assert_eq!(updated.venta.balance_due, Decimal::ZERO);
        assert_eq!(updated.venta.status, STATUS_PAGADO);

        let remaining: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM deudas WHERE venta_id = $1")
                .bind(venta_id)
                .fetch_one(&state.pool)
                .await
                .unwrap();
        assert_eq!(remaining, 0);

        teardown_negocio(&state.pool, negocio_id).await;
    }

    /// Borrar una venta arrastra detalles y deudas.
    #[tokio::test]
    async fn test_delete_venta_cascades() {
        let state = setup_test_state().await;
        let negocio_id = seed_negocio(&state.pool).await;
        let (usuario_id, _) = seed_usuario(&state.pool, negocio_id, "secreta123").await;
        let cliente_id = seed_cliente(&state.pool, negocio_id).await;
        let producto_id = seed_producto(&state.pool, negocio_id).await;
        let ctx = TenantContext {
            usuario_id,
            negocio_id,
        };

        let Json(created) = crate::commands::venta::create_venta(
            State(state.clone()),
            ctx.clone(),
            Json(CreateVentaRequest {
                total: Decimal::new(2200, 2),
                payment: Some(Decimal::new(500, 2)),
                payment_method: Some("Efectivo".to_string()),
                cliente_id: Some(cliente_id),
                is_on_credit: true,
                deuda_amount: Some(Decimal::new(1700, 2)),
                due_date: None,
                detalles_ventas: vec![detalle(producto_id)],
            }),
        )
        .await
        .unwrap();
        let venta_id = created.venta.id;
        let detalle_id = created.detalles_ventas[0].id;

        crate::commands::venta::delete_venta(
            State(state.clone()),
            ctx,
            Query(IdQuery { id: venta_id }),
        )
        .await
        .expect("delete_venta failed");

        let venta_left: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM ventas WHERE id = $1")
            .bind(venta_id)
            .fetch_one(&state.pool)
            .await
            .unwrap();
        let detalle_left: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM detalles_ventas WHERE id = $1")
                .bind(detalle_id)
                .fetch_one(&state.pool)
                .await
                .unwrap();
        let deuda_left: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM deudas WHERE venta_id = $1")
            .bind(venta_id)
            .fetch_one(&state.pool)
            .await
            .unwrap();
        assert_eq!(venta_left, 0);
        assert_eq!(detalle_left, 0);
        assert_eq!(deuda_left, 0);

        teardown_negocio(&state.pool, negocio_id).await;
    }

    /// Un anuncio activo con vencimiento pasado se finaliza (y persiste)
    /// en la siguiente lectura de la colección.
    #[tokio::test]
    async fn test_anuncio_lazy_transition() {
        let state = setup_test_state().await;
        let negocio_id = seed_negocio(&state.pool).await;
        let (usuario_id, _) = seed_usuario(&state.pool, negocio_id, "secreta123").await;

        let anuncio_id: Uuid = sqlx::query_scalar(
            "INSERT INTO anuncios (usuario_id, message, finished_at, estado) \
             VALUES ($1, 'Cierre temprano', now() - interval '1 hour', 'Activo') RETURNING id",
        )
        .bind(usuario_id)
        .fetch_one(&state.pool)
        .await
        .unwrap();

        let Json(anuncios) =
            crate::commands::anuncio::list_anuncios(State(state.clone()))
                .await
                .expect("list_anuncios failed");

        let listed = anuncios
            .iter()
            .find(|a| a.id == anuncio_id)
            .expect("anuncio missing from list");
        assert_eq!(listed.estado, "Finalizado");

        let persisted: String =
            sqlx::query_scalar("SELECT estado FROM anuncios WHERE id = $1")
                .bind(anuncio_id)
                .fetch_one(&state.pool)
                .await
                .unwrap();
        assert_eq!(persisted, "Finalizado");

        teardown_negocio(&state.pool, negocio_id).await;
    }

    /// Tras 15 fallos en la ventana, el intento 16 se rechaza aunque la
    /// contraseña sea correcta; pasada la ventana vuelve a entrar.
    #[tokio::test]
    async fn test_login_lockout_window() {
        let state = setup_test_state().await;
        let negocio_id = seed_negocio(&state.pool).await;
        let (usuario_id, email) = seed_usuario(&state.pool, negocio_id, "secreta123").await;
        let remote: SocketAddr = "127.0.0.1:0".parse().unwrap();

        for _ in 0..15 {
            sqlx::query(
                "INSERT INTO login_attempts (usuario_id, success, ip_address, reason) \
                 VALUES ($1, FALSE, '127.0.0.1', 'Contraseña incorrecta')",
            )
            .bind(usuario_id)
            .execute(&state.pool)
            .await
            .unwrap();
        }

        let result = crate::commands::auth::login(
            State(state.clone()),
            ConnectInfo(remote),
            HeaderMap::new(),
            Json(crate::commands::auth::LoginRequest {
                email: email.clone(),
                password: "secreta123".to_string(),
            }),
        )
        .await;
        assert!(
            matches!(result, Err(crate::error::CreceError::Locked(_))),
            "16th attempt with correct credentials must be locked out"
        );

        // El bloqueo no registra una fila nueva
        let attempts: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM login_attempts WHERE usuario_id = $1")
                .bind(usuario_id)
                .fetch_one(&state.pool)
                .await
                .unwrap();
        assert_eq!(attempts, 15);

        // Simular el paso de la ventana
        sqlx::query(
            "UPDATE login_attempts SET attempted_at = now() - interval '2 minutes' \
             WHERE usuario_id = $1",
        )
        .bind(usuario_id)
        .execute(&state.pool)
        .await
        .unwrap();

        let result = crate::commands::auth::login(
            State(state.clone()),
            ConnectInfo(remote),
            HeaderMap::new(),
            Json(crate::commands::auth::LoginRequest {
                email,
                password: "secreta123".to_string(),
            }),
        )
        .await;
        assert!(result.is_ok(), "login must succeed after the window elapses");

        teardown_negocio(&state.pool, negocio_id).await;
    }

    /// Las contraseñas incorrectas sí quedan auditadas; los éxitos no.
    #[tokio::test]
    async fn test_failed_attempts_are_logged() {
        let state = setup_test_state().await;
        let negocio_id = seed_negocio(&state.pool).await;
        let (usuario_id, email) = seed_usuario(&state.pool, negocio_id, "secreta123").await;
        let remote: SocketAddr = "127.0.0.1:0".parse().unwrap();

        let result = crate::commands::auth::login(
            State(state.clone()),
            ConnectInfo(remote),
            HeaderMap::new(),
            Json(crate::commands::auth::LoginRequest {
                email: email.clone(),
                password: "equivocada1".to_string(),
            }),
        )
        .await;
        assert!(matches!(
            result,
            Err(crate::error::CreceError::Unauthorized(_))
        ));

        let (failures, successes): (i64, i64) = sqlx::query_as(
            "SELECT COUNT(*) FILTER (WHERE success = FALSE), \
                    COUNT(*) FILTER (WHERE success = TRUE) \
             FROM login_attempts WHERE usuario_id = $1",
        )
        .bind(usuario_id)
        .fetch_one(&state.pool)
        .await
        .unwrap();
        assert_eq!(failures, 1);
        assert_eq!(successes, 0);

        let result = crate::commands::auth::login(
            State(state.clone()),
            ConnectInfo(remote),
            HeaderMap::new(),
            Json(crate::commands::auth::LoginRequest {
                email,
                password: "secreta123".to_string(),
            }),
        )
        .await;
        assert!(result.is_ok());

        let total: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM login_attempts WHERE usuario_id = $1")
                .bind(usuario_id)
                .fetch_one(&state.pool)
                .await
                .unwrap();
        assert_eq!(total, 1, "successful logins are not recorded");

        teardown_negocio(&state.pool, negocio_id).await;
    }
}
