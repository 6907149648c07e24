// [apps/control-plane/src/facade/mod.rs]
/*!
 * =================================================================
 * APARATO: TOOL FACADE DISPATCH MATRIX (V4.2)
 * CLASIFICACIÓN: API ADAPTER LAYER (ESTRATO L3-APP)
 * RESPONSABILIDAD: DESPACHO FINO DE OPERACIONES DEL AGENTE
 *
 * VISION HIPER-HOLÍSTICA 2026:
 * 1. ENVELOPE DISCIPLINE: Toda respuesta es un objeto con `success`
 *    booleano y, en fallo, un `message` corto. Jamás trazas de pila.
 * 2. OWNERSHIP MERGE: Entidad ausente y entidad ajena colapsan en
 *    el mismo veredicto "not found or access denied".
 * 3. TOTAL CATCH: Ningún error interno escapa del despacho; todo
 *    colapsa en un sobre de fallo.
 * =================================================================
 */

pub mod alerts;
pub mod monitors;
pub mod preferences;

use crate::state::AppState;
use serde_json::{json, Value};
use tracing::{error, instrument};
use vigil_domain_models::User;

/// Sobre de éxito: `{success: true}` fusionado con los campos de dominio.
pub(crate) fn success_envelope(mut domain_fields: Value) -> Value {
    if let Some(object) = domain_fields.as_object_mut() {
        object.insert("success".to_string(), Value::Bool(true));
    }
    domain_fields
}

/// Sobre de fallo con mensaje corto.
pub(crate) fn failure_envelope(message: impl Into<String>) -> Value {
    json!({"success": false, "message": message.into()})
}

/// Veredicto fusionado de ausencia/propiedad para una entidad nominal.
pub(crate) fn denied_envelope(entity_label: &str) -> Value {
    failure_envelope(format!("{} not found or access denied", entity_label))
}

/**
 * Matriz de despacho: nombre de operación -> aparato ejecutor.
 *
 * # Logic:
 * El operador llega ya resuelto por el middleware de identidad.
 * Cada aparato captura sus propios errores; esta matriz solo conoce
 * el catálogo de operaciones.
 */
#[instrument(skip(application_state, operator, parameters), fields(operator_id = %operator.id))]
pub async fn dispatch_tool_operation(
    application_state: &AppState,
    operator: &User,
    operation_name: &str,
    parameters: &Value,
) -> Value {
    let verdict = match operation_name {
        // --- CICLO DE VIDA DE MONITORES ---
        "create_monitor" => monitors::create_monitor(application_state, operator, parameters).await,
        "list_monitors" => monitors::list_monitors(application_state, operator).await,
        "get_monitor_status" => {
            monitors::get_monitor_status(application_state, operator, parameters).await
        }
        "delete_monitor" => monitors::delete_monitor(application_state, operator, parameters).await,
        "get_deployment_status" => {
            monitors::get_deployment_status(application_state, operator, parameters).await
        }

        // --- REGLAS Y ALERTAS ---
        "create_alert_rule" => {
            alerts::create_alert_rule(application_state, operator, parameters).await
        }
        "update_alert_rule" => {
            alerts::update_alert_rule(application_state, operator, parameters).await
        }
        "delete_alert_rule" => {
            alerts::delete_alert_rule(application_state, operator, parameters).await
        }
        "list_alert_rules" => {
            alerts::list_alert_rules(application_state, operator, parameters).await
        }
        "list_alerts" => alerts::list_alerts(application_state, operator, parameters).await,
        "acknowledge_alert" => {
            alerts::acknowledge_alert(application_state, operator, parameters).await
        }

        // --- PREFERENCIAS DE NOTIFICACIÓN ---
        "get_notification_preferences" => {
            preferences::get_notification_preferences(application_state, operator).await
        }
        "update_notification_preferences" => {
            preferences::update_notification_preferences(application_state, operator, parameters)
                .await
        }

        unknown_operation => Ok(failure_envelope(format!(
            "Unknown operation: {}",
            unknown_operation
        ))),
    };

    match verdict {
        Ok(response_envelope) => response_envelope,
        Err(internal_fault) => {
            error!(
                "❌ [TOOL_FACADE]: Operation {} collapsed: {}",
                operation_name, internal_fault
            );
            failure_envelope(format!("Failed to execute {}: {}", operation_name, internal_fault))
        }
    }
}

// --- UTILIDADES DE EXTRACCIÓN DE PARÁMETROS ---

pub(crate) fn required_string_parameter<'a>(
    parameters: &'a Value,
    key: &str,
) -> Result<&'a str, Value> {
    parameters
        .get(key)
        .and_then(Value::as_str)
        .filter(|value| !value.is_empty())
        .ok_or_else(|| failure_envelope(format!("Missing required parameter: {}", key)))
}

pub(crate) fn optional_string_parameter<'a>(parameters: &'a Value, key: &str) -> Option<&'a str> {
    parameters.get(key).and_then(Value::as_str)
}
