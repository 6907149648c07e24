// [libs/infra/cluster/src/manager.rs]
/*!
 * =================================================================
 * APARATO: WORKLOAD LIFECYCLE MANAGER (V4.2 - RECONCILER READY)
 * CLASIFICACIÓN: INFRASTRUCTURE LAYER (ESTRATO L3)
 * RESPONSABILIDAD: APPLY / STOP / STATUS DE CARGAS DE MONITOR
 *
 * VISION HIPER-HOLÍSTICA 2026:
 * 1. SECRET-FIRST APPLY: El objeto de secretos se nivela ANTES que
 *    la carga; el agente jamás arranca sin su material.
 * 2. IDEMPOTENT CONVERGENCE: Aplicar el mismo monitor dos veces
 *    produce la misma carga (mismo nombre, mismo spec).
 * 3. STATUS TRUTH: `running` exige ready == deseadas > 0; cualquier
 *    fallo de lectura degrada a `error` sin propagar pánico.
 * =================================================================
 */

use crate::backend::{ClusterBackend, WorkloadCondition};
use crate::errors::ClusterError;
use crate::spec::WorkloadSpec;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{error, info, instrument, warn};
use vigil_domain_models::Monitor;

/// Nombre determinista de la carga de un monitor.
pub fn workload_name(monitor_id: &str) -> String {
    format!("monitor-{}", monitor_id)
}

/// Nombre determinista del objeto de secretos de un monitor.
pub fn secret_bundle_name(monitor_id: &str) -> String {
    format!("monitor-{}-secrets", monitor_id)
}

/// Resultado de una operación de apply.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApplyReceipt {
    pub workload_id: String,
    pub apply_status: String,
}

/// Fase observada de una carga en el cluster.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum WorkloadPhase {
    Running,
    Starting,
    NotFound,
    Error,
}

impl WorkloadPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            WorkloadPhase::Running => "running",
            WorkloadPhase::Starting => "starting",
            WorkloadPhase::NotFound => "not_found",
            WorkloadPhase::Error => "error",
        }
    }
}

/// Informe de estado devuelto por la operación `status`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkloadStatusReport {
    pub status: WorkloadPhase,
    pub ready_replicas: u32,
    pub total_replicas: u32,
    pub conditions: Vec<WorkloadCondition>,
}

pub struct WorkloadManager {
    cluster_backend: Arc<dyn ClusterBackend>,
    sample_store_endpoint: String,
}

impl WorkloadManager {
    pub fn new(cluster_backend: Arc<dyn ClusterBackend>, sample_store_endpoint: String) -> Self {
        Self {
            cluster_backend,
            sample_store_endpoint,
        }
    }

    /**
     * Aplica (crea o nivela) la sombra física de un monitor.
     *
     * # Logic:
     * 1. Upsert del objeto de secretos `monitor-<id>-secrets` con el
     *    material en claro recibido (nunca persistido en el Ledger).
     * 2. Upsert de la carga con la especificación determinista.
     *
     * # Idempotence:
     * La secuencia completa puede repetirse sin efectos dobles: el
     * backend converge al mismo objeto y la revisión no avanza si la
     * especificación es byte-igual.
     */
    #[instrument(skip(self, monitor, plaintext_secrets))]
    pub async fn apply(
        &self,
        monitor: &Monitor,
        plaintext_secrets: &BTreeMap<String, String>,
    ) -> Result<ApplyReceipt, ClusterError> {
        let workload_identifier = workload_name(&monitor.id);

        // 1. NIVELACIÓN DEL MATERIAL SENSIBLE
        if !plaintext_secrets.is_empty() {
            self.cluster_backend
                .upsert_secret_bundle(&secret_bundle_name(&monitor.id), plaintext_secrets)
                .await?;
        }

        // 2. NIVELACIÓN DE LA CARGA DECLARATIVA
        let workload_spec = WorkloadSpec::for_monitor(monitor, &self.sample_store_endpoint)?;
        self.cluster_backend.upsert_workload(&workload_spec).await?;

        info!("🛰️ [WORKLOAD_MANAGER]: Monitor {} applied as {}.", monitor.id, workload_identifier);

        Ok(ApplyReceipt {
            workload_id: workload_identifier,
            apply_status: "applied".to_string(),
        })
    }

    /**
     * Desmonta la carga y, en mejor esfuerzo, su objeto de secretos.
     */
    #[instrument(skip(self))]
    pub async fn stop(&self, workload_id: &str) -> Result<(), ClusterError> {
        self.cluster_backend.delete_workload(workload_id).await?;

        // Mejor esfuerzo: el 404 ya es tolerado por el backend y
        // cualquier otro fallo no debe impedir el desmonte lógico.
        let bundle_name = format!("{}-secrets", workload_id);
        if let Err(teardown_fault) = self.cluster_backend.delete_secret_bundle(&bundle_name).await {
            warn!(
                "⚠️ [WORKLOAD_MANAGER]: Secret bundle {} teardown incomplete: {}",
                bundle_name, teardown_fault
            );
        }

        info!("🛑 [WORKLOAD_MANAGER]: Workload {} dismantled.", workload_id);
        Ok(())
    }

    /**
     * Observa la fase de una carga. `running` exige que las réplicas
     * listas igualen a las deseadas y sean > 0.
     */
    #[instrument(skip(self))]
    pub async fn status(&self, workload_id: &str) -> WorkloadStatusReport {
        match self.cluster_backend.read_workload(workload_id).await {
            Ok(Some(observation)) => {
                let phase = if observation.ready_replicas == observation.total_replicas
                    && observation.total_replicas > 0
                {
                    WorkloadPhase::Running
                } else {
                    WorkloadPhase::Starting
                };

                WorkloadStatusReport {
                    status: phase,
                    ready_replicas: observation.ready_replicas,
                    total_replicas: observation.total_replicas,
                    conditions: observation.conditions,
                }
            }
            Ok(None) => WorkloadStatusReport {
                status: WorkloadPhase::NotFound,
                ready_replicas: 0,
                total_replicas: 0,
                conditions: Vec::new(),
            },
            Err(read_fault) => {
                error!("❌ [WORKLOAD_MANAGER]: Status read collapsed: {}", read_fault);
                WorkloadStatusReport {
                    status: WorkloadPhase::Error,
                    ready_replicas: 0,
                    total_replicas: 0,
                    conditions: Vec::new(),
                }
            }
        }
    }
}
