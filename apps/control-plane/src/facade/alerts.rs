// [apps/control-plane/src/facade/alerts.rs]
/*!
 * =================================================================
 * APARATO: ALERTING FACADE (V4.3 - VALIDATION GATE)
 * CLASIFICACIÓN: API ADAPTER LAYER (ESTRATO L3-APP)
 * RESPONSABILIDAD: OPERACIONES DE REGLAS Y ALERTAS DEL AGENTE
 *
 * VISION HIPER-HOLÍSTICA 2026:
 * 1. GATE BEFORE LEDGER: Condición, severidad y enfriamiento se
 *    certifican ANTES de tocar el Ledger; el motor de evaluación
 *    jamás conoce reglas defectuosas.
 * 2. OWNERSHIP MERGE: Reglas y alertas ajenas son indistinguibles
 *    de las inexistentes.
 * =================================================================
 */

use super::{
    denied_envelope, failure_envelope, optional_string_parameter, required_string_parameter,
    success_envelope,
};
use crate::state::AppState;
use chrono::Utc;
use serde_json::{json, Value};
use tracing::info;
use vigil_domain_models::{
    generate_entity_identifier, AlertRule, AlertSeverity, User, RULE_PREFIX,
};
use vigil_domain_rules::AlertCondition;
use vigil_infra_db::repositories::{AlertRepository, AlertRuleRepository, MonitorRepository};

/// Severidad por defecto cuando el agente no la especifica.
const DEFAULT_SEVERITY_LABEL: &str = "medium";
/// Enfriamiento por defecto en minutos.
const DEFAULT_COOLDOWN_MINUTES: u32 = 5;
/// Tope del listado de alertas cuando el agente no acota.
const DEFAULT_ALERT_LIST_LIMIT: i64 = 20;

fn severity_catalogue_message() -> String {
    "Severity must be one of: low, medium, high, critical".to_string()
}

/// `create_alert_rule`: certifica y registra un predicado nuevo.
pub async fn create_alert_rule(
    application_state: &AppState,
    operator: &User,
    parameters: &Value,
) -> anyhow::Result<Value> {
    let monitor_id = match required_string_parameter(parameters, "monitor_id") {
        Ok(value) => value,
        Err(envelope) => return Ok(envelope),
    };
    let rule_title = match required_string_parameter(parameters, "title") {
        Ok(value) => value,
        Err(envelope) => return Ok(envelope),
    };

    // 1. PUERTA DE PROPIEDAD DEL MONITOR
    let monitor_repository = MonitorRepository::new(application_state.database_client.clone());
    if monitor_repository.fetch_owned(monitor_id, &operator.id).await?.is_none() {
        return Ok(denied_envelope("Monitor"));
    }

    // 2. CERTIFICACIÓN DE LA CONDICIÓN
    let Some(raw_condition) = parameters.get("condition") else {
        return Ok(failure_envelope("Missing required parameter: condition"));
    };
    if let Err(validation_fault) = AlertCondition::validate(raw_condition) {
        return Ok(failure_envelope(format!("Invalid condition: {}", validation_fault)));
    }

    // 3. SEVERIDAD Y ENFRIAMIENTO
    let severity_label =
        optional_string_parameter(parameters, "severity").unwrap_or(DEFAULT_SEVERITY_LABEL);
    let Some(severity) = AlertSeverity::parse(severity_label) else {
        return Ok(failure_envelope(severity_catalogue_message()));
    };

    let cooldown_minutes = match parameters.get("cooldown_minutes") {
        None => DEFAULT_COOLDOWN_MINUTES,
        Some(raw_cooldown) => match raw_cooldown.as_i64() {
            Some(minutes) if minutes >= 0 => minutes as u32,
            _ => {
                return Ok(failure_envelope(
                    "cooldown_minutes must be a non-negative integer",
                ))
            }
        },
    };

    let rule = AlertRule {
        id: generate_entity_identifier(RULE_PREFIX),
        monitor_id: monitor_id.to_string(),
        user_id: operator.id.clone(),
        title: rule_title.to_string(),
        condition: raw_condition.clone(),
        severity,
        cooldown_minutes,
        is_active: true,
        created_at: Utc::now(),
    };

    let rule_repository = AlertRuleRepository::new(application_state.database_client.clone());
    rule_repository.register_rule(&rule).await?;

    info!("📐 [TOOL_FACADE]: Rule {} registered on monitor {}.", rule.id, monitor_id);

    Ok(success_envelope(json!({"alert_rule": render_rule(&rule)})))
}

/// `update_alert_rule`: parcheo selectivo con la misma puerta de validación.
pub async fn update_alert_rule(
    application_state: &AppState,
    operator: &User,
    parameters: &Value,
) -> anyhow::Result<Value> {
    let rule_id = match required_string_parameter(parameters, "rule_id") {
        Ok(value) => value,
        Err(envelope) => return Ok(envelope),
    };

    let rule_repository = AlertRuleRepository::new(application_state.database_client.clone());
    let Some(mut rule) = rule_repository.fetch_owned(rule_id, &operator.id).await? else {
        return Ok(denied_envelope("Alert rule"));
    };

    if let Some(new_title) = optional_string_parameter(parameters, "title") {
        rule.title = new_title.to_string();
    }

    if let Some(raw_condition) = parameters.get("condition") {
        if let Err(validation_fault) = AlertCondition::validate(raw_condition) {
            return Ok(failure_envelope(format!("Invalid condition: {}", validation_fault)));
        }
        rule.condition = raw_condition.clone();
    }

    if let Some(severity_label) = optional_string_parameter(parameters, "severity") {
        let Some(severity) = AlertSeverity::parse(severity_label) else {
            return Ok(failure_envelope(severity_catalogue_message()));
        };
        rule.severity = severity;
    }

    if let Some(raw_cooldown) = parameters.get("cooldown_minutes") {
        match raw_cooldown.as_i64() {
            Some(minutes) if minutes >= 0 => rule.cooldown_minutes = minutes as u32,
            _ => {
                return Ok(failure_envelope(
                    "cooldown_minutes must be a non-negative integer",
                ))
            }
        }
    }

    if let Some(active_flag) = parameters.get("is_active").and_then(Value::as_bool) {
        rule.is_active = active_flag;
    }

    rule_repository.update_rule(&rule).await?;

    Ok(success_envelope(json!({"alert_rule": render_rule(&rule)})))
}

/// `delete_alert_rule`: borrado bajo puerta de propiedad.
pub async fn delete_alert_rule(
    application_state: &AppState,
    operator: &User,
    parameters: &Value,
) -> anyhow::Result<Value> {
    let rule_id = match required_string_parameter(parameters, "rule_id") {
        Ok(value) => value,
        Err(envelope) => return Ok(envelope),
    };

    let rule_repository = AlertRuleRepository::new(application_state.database_client.clone());

    match rule_repository.delete_owned(rule_id, &operator.id).await {
        Ok(()) => Ok(success_envelope(json!({
            "message": format!("Alert rule {} deleted", rule_id)
        }))),
        Err(vigil_infra_db::DbError::EntityNotFound) => Ok(denied_envelope("Alert rule")),
        Err(other_fault) => Err(other_fault.into()),
    }
}

/// `list_alert_rules`: catálogo del operador, filtrable por monitor.
pub async fn list_alert_rules(
    application_state: &AppState,
    operator: &User,
    parameters: &Value,
) -> anyhow::Result<Value> {
    let monitor_filter = optional_string_parameter(parameters, "monitor_id");

    if let Some(monitor_id) = monitor_filter {
        let monitor_repository = MonitorRepository::new(application_state.database_client.clone());
        if monitor_repository.fetch_owned(monitor_id, &operator.id).await?.is_none() {
            return Ok(denied_envelope("Monitor"));
        }
    }

    let rule_repository = AlertRuleRepository::new(application_state.database_client.clone());
    let rules = rule_repository.list_for_owner(&operator.id, monitor_filter).await?;

    let rule_list: Vec<Value> = rules.iter().map(render_rule).collect();
    Ok(success_envelope(json!({"alert_rules": rule_list})))
}

/// `list_alerts`: rastro reciente, más nuevo primero.
pub async fn list_alerts(
    application_state: &AppState,
    operator: &User,
    parameters: &Value,
) -> anyhow::Result<Value> {
    let monitor_filter = optional_string_parameter(parameters, "monitor_id");

    if let Some(monitor_id) = monitor_filter {
        let monitor_repository = MonitorRepository::new(application_state.database_client.clone());
        if monitor_repository.fetch_owned(monitor_id, &operator.id).await?.is_none() {
            return Ok(denied_envelope("Monitor"));
        }
    }

    let list_limit = parameters
        .get("limit")
        .and_then(Value::as_i64)
        .filter(|limit| *limit > 0)
        .unwrap_or(DEFAULT_ALERT_LIST_LIMIT);

    let alert_repository = AlertRepository::new(application_state.database_client.clone());
    let alerts = alert_repository
        .list_recent(&operator.id, monitor_filter, list_limit)
        .await?;

    let alert_list: Vec<Value> = alerts
        .iter()
        .map(|alert| {
            json!({
                "id": alert.id,
                "title": alert.title,
                "monitor_id": alert.monitor_id,
                "rule_id": alert.rule_id,
                "severity": alert.severity.as_str(),
                "status": alert.status.as_str(),
                "delivered_channels": alert.delivered_channels,
                "created_at": alert.created_at.to_rfc3339(),
                "delivered_at": alert.delivered_at.map(|moment| moment.to_rfc3339()),
                "acknowledged_at": alert.acknowledged_at.map(|moment| moment.to_rfc3339()),
            })
        })
        .collect();

    Ok(success_envelope(json!({"alerts": alert_list})))
}

/// `acknowledge_alert`: el operador sella la atención de la señal.
pub async fn acknowledge_alert(
    application_state: &AppState,
    operator: &User,
    parameters: &Value,
) -> anyhow::Result<Value> {
    let alert_id = match required_string_parameter(parameters, "alert_id") {
        Ok(value) => value,
        Err(envelope) => return Ok(envelope),
    };

    let alert_repository = AlertRepository::new(application_state.database_client.clone());

    match alert_repository.acknowledge_owned(alert_id, &operator.id).await {
        Ok(alert) => Ok(success_envelope(json!({
            "message": format!("Alert {} acknowledged", alert.id),
            "alert": {
                "id": alert.id,
                "status": alert.status.as_str(),
                "acknowledged_at": alert.acknowledged_at.map(|moment| moment.to_rfc3339()),
            }
        }))),
        Err(vigil_infra_db::DbError::EntityNotFound) => Ok(denied_envelope("Alert")),
        Err(other_fault) => Err(other_fault.into()),
    }
}

fn render_rule(rule: &AlertRule) -> Value {
    json!({
        "id": rule.id,
        "title": rule.title,
        "monitor_id": rule.monitor_id,
        "condition": rule.condition,
        "severity": rule.severity.as_str(),
        "cooldown_minutes": rule.cooldown_minutes,
        "is_active": rule.is_active,
        "created_at": rule.created_at.to_rfc3339(),
    })
}
