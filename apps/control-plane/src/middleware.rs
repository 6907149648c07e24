// [apps/control-plane/src/middleware.rs]
/*!
 * =================================================================
 * APARATO: IDENTITY RESOLUTION GUARD (V4.1)
 * CLASIFICACIÓN: API ADAPTER LAYER (ESTRATO L3-APP)
 * RESPONSABILIDAD: RESOLUCIÓN DEL OPERADOR ANTES DEL DESPACHO
 *
 * VISION HIPER-HOLÍSTICA 2026:
 * 1. UPSTREAM TRUST SEAM: El flujo OTP/sesión vive fuera del plano;
 *    la pasarela de autenticación reenvía el correo verificado en
 *    la cabecera 'x-vigil-operator'.
 * 2. FIRST-LOGIN MINT: Un correo desconocido acuña su operador en
 *    el primer ingreso y sella 'last_login' en los siguientes.
 * 3. HARD GATE: Sin identidad resuelta no hay despacho; la petición
 *    muere aquí con un sobre de fallo uniforme.
 * =================================================================
 */

use crate::state::AppState;
use axum::extract::{Request, State};
use axum::http::StatusCode;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use tracing::warn;
use vigil_infra_db::repositories::UserRepository;

/// Cabecera inyectada por la pasarela de autenticación externa.
pub const OPERATOR_IDENTITY_HEADER: &str = "x-vigil-operator";

pub async fn identity_guard(
    State(application_state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    // 1. EXTRACCIÓN DE LA IDENTIDAD VERIFICADA
    let operator_email = match request
        .headers()
        .get(OPERATOR_IDENTITY_HEADER)
        .and_then(|raw_header| raw_header.to_str().ok())
        .filter(|email| !email.is_empty())
    {
        Some(email) => email.to_string(),
        None => {
            return (
                StatusCode::UNAUTHORIZED,
                Json(json!({"success": false, "message": "Authentication required"})),
            )
                .into_response();
        }
    };

    // 2. RESOLUCIÓN (O ACUÑACIÓN) DEL OPERADOR
    let user_repository = UserRepository::new(application_state.database_client.clone());

    let operator = match user_repository.resolve_or_create_by_email(&operator_email).await {
        Ok(operator) => operator,
        Err(resolution_fault) => {
            warn!("⚠️ [IDENTITY_GUARD]: Operator resolution failed: {}", resolution_fault);
            return (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({"success": false, "message": "Identity resolution unavailable"})),
            )
                .into_response();
        }
    };

    if !operator.is_active {
        return (
            StatusCode::FORBIDDEN,
            Json(json!({"success": false, "message": "Operator account is deactivated"})),
        )
            .into_response();
    }

    // 3. INYECCIÓN EN EL CONTEXTO DE LA PETICIÓN
    request.extensions_mut().insert(operator);
    next.run(request).await
}
