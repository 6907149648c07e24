// [apps/control-plane/src/facade/preferences.rs]
/*!
 * =================================================================
 * APARATO: NOTIFICATION PREFERENCES FACADE (V1.0)
 * CLASIFICACIÓN: API ADAPTER LAYER (ESTRATO L3-APP)
 * RESPONSABILIDAD: LECTURA Y SELLADO DE PREFERENCIAS POR OPERADOR
 *
 * VISION HIPER-HOLÍSTICA 2026:
 * 1. EFFECTIVE VIEW: La lectura devuelve la fila persistida o, en su
 *    ausencia, los valores por defecto del proceso; el operador ve
 *    exactamente lo que el despachador Herald aplicará.
 * 2. PARTIAL PATCH: El sellado muta solo los campos enviados; un
 *    null explícito limpia el webhook y lo devuelve al default de
 *    proceso.
 * =================================================================
 */

use super::{failure_envelope, success_envelope};
use crate::state::AppState;
use serde_json::{json, Value};
use tracing::info;
use vigil_domain_models::{ChannelPreferences, User};
use vigil_infra_db::repositories::PreferenceRepository;

fn render_preferences(preferences: &ChannelPreferences) -> Value {
    json!({
        "email_enabled": preferences.email_enabled,
        "chat_block_webhook_url": preferences.chat_block_webhook_url,
        "chat_embed_webhook_url": preferences.chat_embed_webhook_url,
        "chat_card_webhook_url": preferences.chat_card_webhook_url,
    })
}

/// Parchea un campo de webhook: string sella, null limpia, ausencia
/// preserva.
fn patch_webhook_field(
    current_value: &mut Option<String>,
    parameters: &Value,
    field_key: &str,
) -> Result<(), Value> {
    match parameters.get(field_key) {
        None => Ok(()),
        Some(Value::Null) => {
            *current_value = None;
            Ok(())
        }
        Some(Value::String(webhook_url)) if !webhook_url.is_empty() => {
            *current_value = Some(webhook_url.clone());
            Ok(())
        }
        Some(_) => Err(failure_envelope(format!(
            "Parameter '{}' must be a non-empty string or null",
            field_key
        ))),
    }
}

/// `get_notification_preferences`: vista efectiva del operador.
pub async fn get_notification_preferences(
    application_state: &AppState,
    operator: &User,
) -> anyhow::Result<Value> {
    let preference_repository =
        PreferenceRepository::new(application_state.database_client.clone());

    let effective_preferences = preference_repository
        .fetch_for_user(&operator.id)
        .await?
        .unwrap_or_else(|| ChannelPreferences::defaults_for(&operator.id));

    Ok(success_envelope(json!({
        "preferences": render_preferences(&effective_preferences)
    })))
}

/**
 * `update_notification_preferences`: parcheo selectivo y sellado de
 * la fila persistida que el despachador Herald consulta en cada
 * fan-out.
 */
pub async fn update_notification_preferences(
    application_state: &AppState,
    operator: &User,
    parameters: &Value,
) -> anyhow::Result<Value> {
    let preference_repository =
        PreferenceRepository::new(application_state.database_client.clone());

    // 1. BASE DEL PARCHE: fila existente o defaults del proceso
    let mut preferences = preference_repository
        .fetch_for_user(&operator.id)
        .await?
        .unwrap_or_else(|| ChannelPreferences::defaults_for(&operator.id));

    // 2. PARCHEO SELECTIVO DE CAMPOS ENVIADOS
    if let Some(raw_email_flag) = parameters.get("email_enabled") {
        let Some(email_flag) = raw_email_flag.as_bool() else {
            return Ok(failure_envelope("Parameter 'email_enabled' must be a boolean"));
        };
        preferences.email_enabled = email_flag;
    }

    for (field_key, field_slot) in [
        ("chat_block_webhook_url", &mut preferences.chat_block_webhook_url),
        ("chat_embed_webhook_url", &mut preferences.chat_embed_webhook_url),
        ("chat_card_webhook_url", &mut preferences.chat_card_webhook_url),
    ] {
        if let Err(validation_envelope) = patch_webhook_field(field_slot, parameters, field_key) {
            return Ok(validation_envelope);
        }
    }

    // 3. SELLADO DE LA FILA (alta o reemplazo)
    preference_repository.upsert(&preferences).await?;

    info!("🔧 [TOOL_FACADE]: Notification preferences sealed for operator {}.", operator.id);

    Ok(success_envelope(json!({
        "preferences": render_preferences(&preferences)
    })))
}
