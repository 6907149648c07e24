// [apps/control-plane/src/facade/monitors.rs]
/*!
 * =================================================================
 * APARATO: MONITOR LIFECYCLE FACADE (V4.3 - ROW FIRST)
 * CLASIFICACIÓN: API ADAPTER LAYER (ESTRATO L3-APP)
 * RESPONSABILIDAD: OPERACIONES DE MONITOR EXPUESTAS AL AGENTE
 *
 * VISION HIPER-HOLÍSTICA 2026:
 * 1. ROW-FIRST / WORKLOAD-SECOND: La fila relacional nace antes que
 *    la carga; el fallo de apply marca 'error' y NO borra la fila
 *    (reintentar el create converge).
 * 2. VAULT DISCIPLINE: Los secretos del agente se sellan en la
 *    bóveda antes de tocar el cluster; el material en claro viaja
 *    una única vez hacia el objeto de secretos.
 * 3. CASCADE TEARDOWN: El delete desmonta la carga y arrastra
 *    reglas, alertas y secretos en una transacción.
 * =================================================================
 */

use super::{
    denied_envelope, failure_envelope, optional_string_parameter, required_string_parameter,
    success_envelope,
};
use crate::state::AppState;
use chrono::Utc;
use serde_json::{json, Value};
use std::collections::BTreeMap;
use tracing::{info, warn};
use vigil_domain_models::{
    generate_entity_identifier, Monitor, MonitorStatus, User, MONITOR_PREFIX,
};
use vigil_infra_cluster::WorkloadPhase;
use vigil_infra_db::repositories::{AlertRepository, MonitorRepository, SecretRepository};

/**
 * `create_monitor`: sella secretos, registra la fila y aplica la
 * carga. Responde con el monitor y el recibo de despliegue.
 */
pub async fn create_monitor(
    application_state: &AppState,
    operator: &User,
    parameters: &Value,
) -> anyhow::Result<Value> {
    let monitor_name = match required_string_parameter(parameters, "name") {
        Ok(value) => value,
        Err(envelope) => return Ok(envelope),
    };
    let monitor_type = match required_string_parameter(parameters, "monitor_type") {
        Ok(value) => value,
        Err(envelope) => return Ok(envelope),
    };

    let monitor_config = parameters.get("config").cloned().unwrap_or_else(|| json!({}));
    if !monitor_config.is_object() {
        return Ok(failure_envelope("Parameter 'config' must be a JSON object"));
    }

    // 1. SELLADO DE SECRETOS EN LA BÓVEDA (texto plano -> sobre)
    let mut plaintext_secrets: BTreeMap<String, String> = BTreeMap::new();
    if let Some(raw_secrets) = parameters.get("secrets") {
        let Some(secrets_object) = raw_secrets.as_object() else {
            return Ok(failure_envelope("Parameter 'secrets' must be a JSON object"));
        };
        for (logical_name, raw_value) in secrets_object {
            let Some(plaintext_value) = raw_value.as_str() else {
                return Ok(failure_envelope(format!(
                    "Secret '{}' must be a string value",
                    logical_name
                )));
            };
            plaintext_secrets.insert(logical_name.clone(), plaintext_value.to_string());
        }
    }

    let secret_repository = SecretRepository::new(application_state.database_client.clone());
    let mut secret_refs: BTreeMap<String, String> = BTreeMap::new();

    for (logical_name, plaintext_value) in &plaintext_secrets {
        let sealed_envelope = application_state
            .secret_vault
            .encrypt(plaintext_value)
            .map_err(|vault_fault| anyhow::anyhow!("VAULT_SEAL_FAULT: {}", vault_fault))?;

        let record = secret_repository
            .seal_secret(
                &operator.id,
                &format!("{}_{}", monitor_name, logical_name),
                &sealed_envelope,
            )
            .await?;

        secret_refs.insert(logical_name.clone(), record.id);
    }

    // 2. FILA RELACIONAL PRIMERO
    let now = Utc::now();
    let mut monitor = Monitor {
        id: generate_entity_identifier(MONITOR_PREFIX),
        user_id: operator.id.clone(),
        name: monitor_name.to_string(),
        description: optional_string_parameter(parameters, "description").map(str::to_string),
        monitor_type: monitor_type.to_string(),
        config: monitor_config,
        secret_refs,
        status: MonitorStatus::Starting,
        workload_id: None,
        created_at: now,
        updated_at: now,
        last_sample_at: None,
    };

    let monitor_repository = MonitorRepository::new(application_state.database_client.clone());
    monitor_repository.register_monitor(&monitor).await?;

    // 3. CARGA FÍSICA DESPUÉS; el fallo degrada a 'error' sin borrar
    let deployment_receipt = match application_state
        .workload_manager
        .apply(&monitor, &plaintext_secrets)
        .await
    {
        Ok(receipt) => {
            monitor_repository
                .update_deployment_state(
                    &monitor.id,
                    MonitorStatus::Deploying,
                    Some(&receipt.workload_id),
                )
                .await?;
            monitor.status = MonitorStatus::Deploying;
            monitor.workload_id = Some(receipt.workload_id.clone());

            json!({"workload_id": receipt.workload_id, "status": receipt.apply_status})
        }
        Err(apply_fault) => {
            warn!("⚠️ [TOOL_FACADE]: Workload apply for {} failed: {}", monitor.id, apply_fault);
            monitor_repository
                .update_deployment_state(&monitor.id, MonitorStatus::Error, None)
                .await?;
            monitor.status = MonitorStatus::Error;

            json!({"workload_id": null, "status": "failed"})
        }
    };

    info!("🛰️ [TOOL_FACADE]: Monitor {} created for operator {}.", monitor.id, operator.id);

    Ok(success_envelope(json!({
        "monitor": {
            "id": monitor.id,
            "name": monitor.name,
            "type": monitor.monitor_type,
            "status": monitor.status.as_str(),
            "created_at": monitor.created_at.to_rfc3339(),
            "deployment": deployment_receipt,
        }
    })))
}

/// `list_monitors`: inventario del operador, más reciente primero.
pub async fn list_monitors(
    application_state: &AppState,
    operator: &User,
) -> anyhow::Result<Value> {
    let monitor_repository = MonitorRepository::new(application_state.database_client.clone());
    let monitors = monitor_repository.list_for_user(&operator.id).await?;

    let monitor_list: Vec<Value> = monitors
        .iter()
        .map(|monitor| {
            json!({
                "id": monitor.id,
                "name": monitor.name,
                "type": monitor.monitor_type,
                "status": monitor.status.as_str(),
                "created_at": monitor.created_at.to_rfc3339(),
                "last_check": monitor.last_sample_at.map(|moment| moment.to_rfc3339()),
            })
        })
        .collect();

    Ok(success_envelope(json!({"monitors": monitor_list})))
}

/// `get_monitor_status`: detalle + alertas recientes (≤ 10).
pub async fn get_monitor_status(
    application_state: &AppState,
    operator: &User,
    parameters: &Value,
) -> anyhow::Result<Value> {
    let monitor_id = match required_string_parameter(parameters, "monitor_id") {
        Ok(value) => value,
        Err(envelope) => return Ok(envelope),
    };

    let monitor_repository = MonitorRepository::new(application_state.database_client.clone());
    let Some(monitor) = monitor_repository.fetch_owned(monitor_id, &operator.id).await? else {
        return Ok(denied_envelope("Monitor"));
    };

    let alert_repository = AlertRepository::new(application_state.database_client.clone());
    let recent_alerts = alert_repository
        .list_recent(&operator.id, Some(monitor_id), 10)
        .await?;

    let alert_list: Vec<Value> = recent_alerts
        .iter()
        .map(|alert| {
            json!({
                "id": alert.id,
                "title": alert.title,
                "severity": alert.severity.as_str(),
                "status": alert.status.as_str(),
                "created_at": alert.created_at.to_rfc3339(),
            })
        })
        .collect();

    Ok(success_envelope(json!({
        "monitor": {
            "id": monitor.id,
            "name": monitor.name,
            "type": monitor.monitor_type,
            "status": monitor.status.as_str(),
            "config": monitor.config,
            "created_at": monitor.created_at.to_rfc3339(),
            "last_check": monitor.last_sample_at.map(|moment| moment.to_rfc3339()),
            "recent_alerts": alert_list,
        }
    })))
}

/**
 * `delete_monitor`: desmonta la carga (mejor esfuerzo) y ejecuta la
 * cascada relacional.
 */
pub async fn delete_monitor(
    application_state: &AppState,
    operator: &User,
    parameters: &Value,
) -> anyhow::Result<Value> {
    let monitor_id = match required_string_parameter(parameters, "monitor_id") {
        Ok(value) => value,
        Err(envelope) => return Ok(envelope),
    };

    let monitor_repository = MonitorRepository::new(application_state.database_client.clone());
    let Some(monitor) = monitor_repository.fetch_owned(monitor_id, &operator.id).await? else {
        return Ok(denied_envelope("Monitor"));
    };

    // El desmonte físico no bloquea la limpieza lógica
    if let Some(workload_id) = monitor.workload_id.as_deref() {
        if let Err(teardown_fault) = application_state.workload_manager.stop(workload_id).await {
            warn!(
                "⚠️ [TOOL_FACADE]: Workload {} teardown incomplete: {}",
                workload_id, teardown_fault
            );
        }
    }

    monitor_repository.delete_cascade(monitor_id, &operator.id).await?;

    Ok(success_envelope(json!({
        "message": format!("Monitor '{}' deleted successfully", monitor.name)
    })))
}

/// `get_deployment_status`: lectura directa del estado físico.
pub async fn get_deployment_status(
    application_state: &AppState,
    operator: &User,
    parameters: &Value,
) -> anyhow::Result<Value> {
    let monitor_id = match required_string_parameter(parameters, "monitor_id") {
        Ok(value) => value,
        Err(envelope) => return Ok(envelope),
    };

    let monitor_repository = MonitorRepository::new(application_state.database_client.clone());
    let Some(monitor) = monitor_repository.fetch_owned(monitor_id, &operator.id).await? else {
        return Ok(denied_envelope("Monitor"));
    };

    let Some(workload_id) = monitor.workload_id.as_deref() else {
        return Ok(success_envelope(json!({
            "deployment_status": {
                "status": "not_deployed",
                "message": "Monitor has not been deployed yet",
            }
        })));
    };

    let report = application_state.workload_manager.status(workload_id).await;

    let conditions: Vec<Value> = report
        .conditions
        .iter()
        .map(|condition| {
            json!({
                "type": condition.condition_type,
                "status": condition.status,
                "reason": condition.reason,
            })
        })
        .collect();

    let status_is_error = report.status == WorkloadPhase::Error;
    let mut deployment_status = json!({
        "status": report.status.as_str(),
        "ready_replicas": report.ready_replicas,
        "total_replicas": report.total_replicas,
        "conditions": conditions,
    });
    if status_is_error {
        deployment_status["message"] = json!("Cluster status read failed");
    }

    Ok(success_envelope(json!({
        "monitor": {"id": monitor.id, "name": monitor.name, "workload_id": workload_id},
        "deployment_status": deployment_status,
    })))
}
