// [apps/control-plane/src/handlers/health.rs]
/*!
 * =================================================================
 * APARATO: HEALTH PROBE HANDLERS (V4.1)
 * CLASIFICACIÓN: API ADAPTER LAYER (ESTRATO L3-APP)
 * RESPONSABILIDAD: SONDAS DE ORQUESTACIÓN DEL PLANO DE CONTROL
 *
 * VISION HIPER-HOLÍSTICA 2026:
 * 1. /health: Vida del proceso (siempre 200 mientras respire).
 * 2. /ready: 200 solo si el Ledger y el almacén de enfriamiento
 *    responden sondas triviales; 503 en caso contrario.
 * 3. /status: Booleanos de configuración sin material sensible.
 * =================================================================
 */

use crate::state::AppState;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use chrono::Utc;
use serde_json::json;
use tracing::error;

const SERVICE_NOMINAL_IDENTIFIER: &str = "vigil-control-plane";

/// Sonda de vida: el proceso está arriba.
pub async fn handle_health(State(application_state): State<AppState>) -> impl IntoResponse {
    let uptime_seconds = (Utc::now() - application_state.process_ignition_time).num_seconds();

    Json(json!({
        "status": "healthy",
        "service": SERVICE_NOMINAL_IDENTIFIER,
        "timestamp": Utc::now().to_rfc3339(),
        "uptime_seconds": uptime_seconds,
    }))
}

/// Sonda de disponibilidad: dependencias críticas con sonda trivial.
pub async fn handle_ready(State(application_state): State<AppState>) -> impl IntoResponse {
    let ledger_ready = match application_state.database_client.probe().await {
        Ok(()) => true,
        Err(probe_fault) => {
            error!("⚠️ [READINESS]: Ledger probe failed: {}", probe_fault);
            false
        }
    };

    let cooldown_ready = match application_state.cooldown_store.probe().await {
        Ok(()) => true,
        Err(probe_fault) => {
            error!("⚠️ [READINESS]: Cooldown probe failed: {}", probe_fault);
            false
        }
    };

    let all_ready = ledger_ready && cooldown_ready;
    let status_code = if all_ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (
        status_code,
        Json(json!({
            "status": if all_ready { "ready" } else { "not_ready" },
            "service": SERVICE_NOMINAL_IDENTIFIER,
            "checks": {
                "database": if ledger_ready { "ready" } else { "not_ready" },
                "cooldown": if cooldown_ready { "ready" } else { "not_ready" },
            },
            "timestamp": Utc::now().to_rfc3339(),
        })),
    )
}

/// Estado extendido: configuración no sensible en booleanos.
pub async fn handle_status(State(application_state): State<AppState>) -> impl IntoResponse {
    let runtime_config = &application_state.runtime_config;
    let uptime_seconds = (Utc::now() - application_state.process_ignition_time).num_seconds();

    Json(json!({
        "service": SERVICE_NOMINAL_IDENTIFIER,
        "version": env!("CARGO_PKG_VERSION"),
        "start_time": application_state.process_ignition_time.to_rfc3339(),
        "uptime_seconds": uptime_seconds,
        "config": {
            "evaluation_interval": runtime_config.alert_evaluation_interval.as_secs(),
            "reconcile_interval": runtime_config.workload_reconcile_interval.as_secs(),
            "database_configured": !runtime_config.database_url.is_empty(),
            "cooldown_configured": runtime_config.redis_url.is_some(),
            "sample_store_configured": runtime_config.influx_url.is_some(),
            "cluster_configured": runtime_config.cluster_api_url.is_some(),
            "mail_configured": runtime_config.mail_api_key.is_some(),
            "chat_block_configured": runtime_config.chat_block_webhook_url.is_some(),
            "chat_embed_configured": runtime_config.chat_embed_webhook_url.is_some(),
            "chat_card_configured": runtime_config.chat_card_webhook_url.is_some(),
        }
    }))
}
