// [apps/control-plane/src/handlers/tools.rs]
/*!
 * =================================================================
 * APARATO: TOOL DISPATCH HANDLER (V4.1)
 * CLASIFICACIÓN: API ADAPTER LAYER (ESTRATO L3-APP)
 * RESPONSABILIDAD: PUENTE HTTP -> MATRIZ DE DESPACHO DE LA FACHADA
 * =================================================================
 */

use crate::facade::dispatch_tool_operation;
use crate::state::AppState;
use axum::extract::{Path, State};
use axum::{Extension, Json};
use serde_json::{json, Value};
use vigil_domain_models::User;

/**
 * `POST /api/v1/tools/:operation`
 *
 * El cuerpo JSON (opcional) viaja como parámetros de la operación;
 * el operador llega resuelto por el guardián de identidad.
 */
pub async fn handle_tool_dispatch(
    State(application_state): State<AppState>,
    Path(operation_name): Path<String>,
    Extension(operator): Extension<User>,
    request_body: Option<Json<Value>>,
) -> Json<Value> {
    let parameters = request_body.map(|Json(body)| body).unwrap_or_else(|| json!({}));

    let verdict =
        dispatch_tool_operation(&application_state, &operator, &operation_name, &parameters).await;

    Json(verdict)
}
