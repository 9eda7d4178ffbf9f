#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;

    /// El saldo pendiente nunca puede quedar negativo y las ventas de
    /// contado siempre quedan en 0.
    #[test]
    fn test_effective_debt_clamping() {
        use crate::commands::venta::effective_debt;

        // Venta a crédito con saldo declarado
        assert_eq!(
            effective_debt(true, Some(Decimal::new(1700, 2))),
            Decimal::new(1700, 2)
        );

        // Saldo negativo declarado se recorta a 0
        assert_eq!(effective_debt(true, Some(Decimal::new(-500, 2))), Decimal::ZERO);

        // Sin monto declarado, el crédito arranca en 0
        assert_eq!(effective_debt(true, None), Decimal::ZERO);

        // De contado el saldo es 0 aunque se declare deuda
        assert_eq!(effective_debt(false, Some(Decimal::new(9900, 2))), Decimal::ZERO);
        assert_eq!(effective_debt(false, None), Decimal::ZERO);
    }

    #[test]
    fn test_venta_status_derivation() {
        use crate::commands::venta::{venta_status, STATUS_PAGADO, STATUS_PAGADO_PARCIALMENTE};

        assert_eq!(venta_status(false), STATUS_PAGADO);
        assert_eq!(venta_status(true), STATUS_PAGADO_PARCIALMENTE);
    }

    /// El intento 16 dentro de la ventana queda bloqueado; el 15 todavía
    /// se evalúa contra la contraseña.
    #[test]
    fn test_lockout_threshold() {
        use crate::commands::auth::{is_locked, MAX_ATTEMPTS};

        assert!(!is_locked(0));
        assert!(!is_locked(MAX_ATTEMPTS - 1));
        assert!(is_locked(MAX_ATTEMPTS));
        assert!(is_locked(MAX_ATTEMPTS + 3));
    }

    #[test]
    fn test_client_ip_header_precedence() {
        use crate::commands::auth::client_ip;
        use axum::http::{HeaderMap, HeaderValue};
        use std::net::SocketAddr;

        let remote: SocketAddr = "10.0.0.9:4431".parse().unwrap();

        // x-forwarded-for gana y se toma la primera entrada
        let mut headers = HeaderMap::new();
        headers.insert(
            "x-forwarded-for",
            HeaderValue::from_static("203.0.113.7, 198.51.100.1"),
        );
        headers.insert("x-real-ip", HeaderValue::from_static("198.51.100.2"));
        assert_eq!(client_ip(&headers, remote), "203.0.113.7");

        // Sin forwarded-for, sigue x-real-ip
        let mut headers = HeaderMap::new();
        headers.insert("x-real-ip", HeaderValue::from_static("198.51.100.2"));
        headers.insert("cf-connecting-ip", HeaderValue::from_static("198.51.100.3"));
        assert_eq!(client_ip(&headers, remote), "198.51.100.2");

        // Después cf-connecting-ip
        let mut headers = HeaderMap::new();
        headers.insert("cf-connecting-ip", HeaderValue::from_static("198.51.100.3"));
        assert_eq!(client_ip(&headers, remote), "198.51.100.3");

        // Último recurso: la dirección del socket
        assert_eq!(client_ip(&HeaderMap::new(), remote), "10.0.0.9");
    }

    #[test]
    fn test_month_range() {
        use crate::commands::venta::month_range;
        use chrono::NaiveDate;

        assert_eq!(month_range(None, None).unwrap(), None);
        assert_eq!(month_range(Some(2024), None).unwrap(), None);

        let (start, end) = month_range(Some(2024), Some(7)).unwrap().unwrap();
        assert_eq!(start, NaiveDate::from_ymd_opt(2024, 7, 1).unwrap());
        assert_eq!(end, NaiveDate::from_ymd_opt(2024, 8, 1).unwrap());

        // Diciembre cruza de año
        let (start, end) = month_range(Some(2024), Some(12)).unwrap().unwrap();
        assert_eq!(start, NaiveDate::from_ymd_opt(2024, 12, 1).unwrap());
        assert_eq!(end, NaiveDate::from_ymd_opt(2025, 1, 1).unwrap());

        assert!(month_range(Some(2024), Some(13)).is_err());
    }

    #[test]
    fn test_fill_missing_months() {
        use crate::commands::reporte::{fill_missing_months, VentasDelMes};
        use chrono::{TimeZone, Utc};

        let now = Utc.with_ymd_and_hms(2024, 3, 15, 12, 0, 0).unwrap();
        let rows = vec![VentasDelMes {
            month: "2024-02".to_string(),
            total_sales: Decimal::new(50000, 2),
        }];

        let filled = fill_missing_months(now, rows);
        assert_eq!(filled.len(), 3);
        assert_eq!(filled[0].month, "2024-01");
        assert_eq!(filled[0].total_sales, Decimal::ZERO);
        assert_eq!(filled[1].month, "2024-02");
        assert_eq!(filled[1].total_sales, Decimal::new(50000, 2));
        assert_eq!(filled[2].month, "2024-03");
        assert_eq!(filled[2].total_sales, Decimal::ZERO);

        // El cruce de año arma diciembre y noviembre del año anterior
        let now = Utc.with_ymd_and_hms(2025, 1, 2, 0, 0, 0).unwrap();
        let filled = fill_missing_months(now, vec![]);
        assert_eq!(filled[0].month, "2024-11");
        assert_eq!(filled[1].month, "2024-12");
        assert_eq!(filled[2].month, "2025-01");
    }

    #[test]
    fn test_create_venta_validation() {
        use crate::commands::venta::CreateVentaRequest;
        use validator::Validate;

        // Sin detalles: rechazada
        let payload: CreateVentaRequest = serde_json::from_value(serde_json::json!({
            "total": 100.0,
            "detalles_ventas": []
        }))
        .unwrap();
        assert!(payload.validate().is_err());

        // Cantidad 0: rechazada
        let payload: CreateVentaRequest = serde_json::from_value(serde_json::json!({
            "total": 100.0,
            "detalles_ventas": [{
                "productoid": "c56a4180-65aa-42ec-a945-5fd21dec0538",
                "quantity": 0,
                "price": 10.0
            }]
        }))
        .unwrap();
        assert!(payload.validate().is_err());

        // Descuento fuera de rango: rechazado
        let payload: CreateVentaRequest = serde_json::from_value(serde_json::json!({
            "total": 100.0,
            "detalles_ventas": [{
                "productoid": "c56a4180-65aa-42ec-a945-5fd21dec0538",
                "quantity": 1,
                "price": 10.0,
                "discount": 150.0
            }]
        }))
        .unwrap();
        assert!(payload.validate().is_err());

        // Carga mínima válida
        let payload: CreateVentaRequest = serde_json::from_value(serde_json::json!({
            "total": 100.0,
            "detalles_ventas": [{
                "productoid": "c56a4180-65aa-42ec-a945-5fd21dec0538",
                "quantity": 2,
                "price": 10.0,
                "iva_percentage": 10.0,
                "discount": 0.0
            }]
        }))
        .unwrap();
        assert!(payload.validate().is_ok());
    }

    #[test]
    fn test_login_request_validation() {
        use crate::commands::auth::LoginRequest;
        use validator::Validate;

        let bad_email = LoginRequest {
            email: "no-es-un-email".to_string(),
            password: "secreta123".to_string(),
        };
        assert!(bad_email.validate().is_err());

        let short_password = LoginRequest {
            email: "ana@x.com".to_string(),
            password: "corta".to_string(),
        };
        assert!(short_password.validate().is_err());

        let ok = LoginRequest {
            email: "ana@x.com".to_string(),
            password: "secreta123".to_string(),
        };
        assert!(ok.validate().is_ok());
    }
}
