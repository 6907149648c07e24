// [libs/domain/models/src/monitor.rs]
/*!
 * =================================================================
 * APARATO: MONITOR LIFECYCLE CONTRACTS (V2.0 - STATE MACHINE)
 * CLASIFICACIÓN: DOMAIN MODELS (ESTRATO L2)
 * RESPONSABILIDAD: DECLARACIÓN DE CARGAS DE RECOLECCIÓN Y SU CICLO
 *
 * VISION HIPER-HOLÍSTICA:
 * El monitor es la declaración del operador; la carga de trabajo en
 * el cluster es su sombra física. La máquina de estados gobierna la
 * reconciliación entre ambos mundos:
 *
 *   starting ──apply-ok──▶ deploying ──ready──▶ running
 *       │                      │
 *       └──apply-fail──────────┴──────────▶ error
 *   running ──workload-missing──▶ error     (reconciler)
 *   error   ──reapply-ok──▶ deploying       (reconciler)
 * =================================================================
 */

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use typeshare::typeshare;

/// Estado operacional del monitor dentro del Ledger relacional.
#[typeshare]
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum MonitorStatus {
    /// Fila creada; la carga aún no ha sido aplicada al cluster.
    Starting,
    /// Carga aplicada; réplicas aún no reportan disponibilidad.
    Deploying,
    /// Réplicas deseadas listas y emitiendo muestras.
    Running,
    /// Fallo de aplicación o carga desaparecida; recuperable.
    Error,
}

impl MonitorStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            MonitorStatus::Starting => "starting",
            MonitorStatus::Deploying => "deploying",
            MonitorStatus::Running => "running",
            MonitorStatus::Error => "error",
        }
    }

    pub fn parse(raw_label: &str) -> Option<Self> {
        match raw_label {
            "starting" => Some(MonitorStatus::Starting),
            "deploying" => Some(MonitorStatus::Deploying),
            "running" => Some(MonitorStatus::Running),
            "error" => Some(MonitorStatus::Error),
            _ => None,
        }
    }

    /**
     * Certifica si la transición solicitada respeta la máquina de
     * estados del ciclo de vida.
     */
    pub fn permits_transition_to(&self, next_status: MonitorStatus) -> bool {
        matches!(
            (self, next_status),
            (MonitorStatus::Starting, MonitorStatus::Deploying)
                | (MonitorStatus::Starting, MonitorStatus::Error)
                | (MonitorStatus::Deploying, MonitorStatus::Running)
                | (MonitorStatus::Deploying, MonitorStatus::Error)
                | (MonitorStatus::Running, MonitorStatus::Error)
                | (MonitorStatus::Error, MonitorStatus::Deploying)
        )
    }

    /// Estados en los que existe (o debería existir) carga en el cluster.
    pub fn expects_workload_presence(&self) -> bool {
        matches!(
            self,
            MonitorStatus::Deploying | MonitorStatus::Running | MonitorStatus::Error
        )
    }
}

/// Declaración soberana de una carga de recolección de datos.
#[typeshare]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Monitor {
    /// Identificador opaco con prefijo `mon_`.
    pub id: String,
    /// Operador propietario. Toda referencia cruzada se valida contra él.
    pub user_id: String,
    pub name: String,
    pub description: Option<String>,
    /// Llave de plantilla que selecciona la imagen del agente recolector.
    pub monitor_type: String,
    /// Configuración libre del agente (JSON arbitrario).
    pub config: serde_json::Value,
    /// Mapa de nombre lógico (ej. `api_key`) -> identificador `sec_…`.
    /// Invariante: cada secreto referenciado pertenece al mismo operador.
    pub secret_refs: BTreeMap<String, String>,
    pub status: MonitorStatus,
    /// Manejador opaco de la carga en el cluster. Vacío hasta el primer
    /// apply; presente exactamente en {deploying, running, error}.
    pub workload_id: Option<String>,
    #[typeshare(serialized_as = "String")]
    pub created_at: DateTime<Utc>,
    #[typeshare(serialized_as = "String")]
    pub updated_at: DateTime<Utc>,
    #[typeshare(serialized_as = "String")]
    pub last_sample_at: Option<DateTime<Utc>>,
}

impl Monitor {
    /// Invariante estructural: `workload_id` presente exactamente en los
    /// estados que esperan carga física.
    pub fn workload_presence_is_consistent(&self) -> bool {
        let has_workload = self
            .workload_id
            .as_deref()
            .map(|handle| !handle.is_empty())
            .unwrap_or(false);

        has_workload == self.status.expects_workload_presence()
    }
}
