// [libs/domain/models/src/alert.rs]
/*!
 * =================================================================
 * APARATO: ALERTING DOMAIN CONTRACTS (V2.2)
 * CLASIFICACIÓN: DOMAIN MODELS (ESTRATO L2)
 * RESPONSABILIDAD: REGLAS DECLARATIVAS Y RASTRO DURABLE DE DISPAROS
 *
 * # Mathematical Proof (Alert Immutability):
 * El Alert captura severidad, título y condición en el instante del
 * disparo. Mutaciones posteriores quedan restringidas a los campos
 * de entrega y reconocimiento, garantizando que el rastro forense
 * del incidente sea reproducible.
 * =================================================================
 */

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use typeshare::typeshare;

/// Clasificación semántica de la urgencia de la señal.
#[typeshare]
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum AlertSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl AlertSeverity {
    pub fn as_str(&self) -> &'static str {
        match self {
            AlertSeverity::Low => "low",
            AlertSeverity::Medium => "medium",
            AlertSeverity::High => "high",
            AlertSeverity::Critical => "critical",
        }
    }

    pub fn parse(raw_label: &str) -> Option<Self> {
        match raw_label {
            "low" => Some(AlertSeverity::Low),
            "medium" => Some(AlertSeverity::Medium),
            "high" => Some(AlertSeverity::High),
            "critical" => Some(AlertSeverity::Critical),
            _ => None,
        }
    }
}

/// Estado del ciclo de entrega de una alerta.
#[typeshare]
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum AlertStatus {
    /// Fila persistida; el despacho multicanal aún no concluye.
    Pending,
    /// Al menos un canal confirmó recepción 2xx.
    Delivered,
    /// Ningún canal confirmó recepción.
    Failed,
    /// El operador marcó la señal como atendida.
    Acknowledged,
}

impl AlertStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AlertStatus::Pending => "pending",
            AlertStatus::Delivered => "delivered",
            AlertStatus::Failed => "failed",
            AlertStatus::Acknowledged => "acknowledged",
        }
    }

    pub fn parse(raw_label: &str) -> Option<Self> {
        match raw_label {
            "pending" => Some(AlertStatus::Pending),
            "delivered" => Some(AlertStatus::Delivered),
            "failed" => Some(AlertStatus::Failed),
            "acknowledged" => Some(AlertStatus::Acknowledged),
            _ => None,
        }
    }
}

/// Predicado declarativo sobre las muestras recientes de un monitor.
#[typeshare]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlertRule {
    /// Identificador opaco con prefijo `rule_`.
    pub id: String,
    pub monitor_id: String,
    /// Debe coincidir con el propietario del monitor referenciado.
    pub user_id: String,
    pub title: String,
    /// Condición validada en el borde de la API; el evaluador jamás
    /// recibe condiciones de tipo desconocido.
    pub condition: serde_json::Value,
    pub severity: AlertSeverity,
    /// Minutos de supresión tras un disparo. Cero desactiva la supresión.
    pub cooldown_minutes: u32,
    pub is_active: bool,
    #[typeshare(serialized_as = "String")]
    pub created_at: DateTime<Utc>,
}

/// Registro durable de un disparo de regla en un punto del tiempo.
#[typeshare]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Alert {
    /// Identificador opaco con prefijo `alert_`.
    pub id: String,
    pub rule_id: String,
    pub monitor_id: String,
    pub user_id: String,
    /// Copiada de la regla en el instante del disparo.
    pub severity: AlertSeverity,
    /// Copiado de la regla en el instante del disparo.
    pub title: String,
    /// Snapshot `{condition, trigger_data}` con las muestras detonantes.
    pub data: serde_json::Value,
    pub status: AlertStatus,
    /// Canales cuyo POST retornó 2xx; contabilidad exacta de entrega.
    pub delivered_channels: Vec<String>,
    #[typeshare(serialized_as = "String")]
    pub delivered_at: Option<DateTime<Utc>>,
    #[typeshare(serialized_as = "String")]
    pub acknowledged_at: Option<DateTime<Utc>>,
    #[typeshare(serialized_as = "String")]
    pub created_at: DateTime<Utc>,
}
