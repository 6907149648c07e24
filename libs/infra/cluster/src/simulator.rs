// [libs/infra/cluster/src/simulator.rs]
/*!
 * =================================================================
 * APARATO: SIMULATED CLUSTER BACKEND (V2.2)
 * CLASIFICACIÓN: INFRASTRUCTURE ADAPTER (ESTRATO L3)
 * RESPONSABILIDAD: CLUSTER EN MEMORIA PARA SIMULACIÓN Y PRUEBAS
 *
 * # Mathematical Proof (Revision Stability):
 * La revisión de una carga solo avanza cuando la especificación
 * serializada difiere byte a byte de la existente. Un apply
 * idéntico repetido N veces deja la revisión invariante, lo que
 * certifica la idempotencia del gestor sin apiserver real.
 * =================================================================
 */

use crate::backend::{ClusterBackend, WorkloadCondition, WorkloadObservation};
use crate::errors::ClusterError;
use crate::spec::WorkloadSpec;
use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap};
use tokio::sync::Mutex;
use tracing::info;

struct SimulatedWorkloadEntry {
    serialized_spec: String,
    revision: u64,
}

#[derive(Default)]
pub struct SimulatedCluster {
    workloads: Mutex<HashMap<String, SimulatedWorkloadEntry>>,
    secret_bundles: Mutex<HashMap<String, BTreeMap<String, String>>>,
}

impl SimulatedCluster {
    pub fn new() -> Self {
        Self::default()
    }

    /// Revisión actual de una carga (instrumentación de pruebas).
    pub async fn revision_of(&self, workload_name: &str) -> Option<u64> {
        self.workloads
            .lock()
            .await
            .get(workload_name)
            .map(|entry| entry.revision)
    }

    pub async fn workload_count(&self) -> usize {
        self.workloads.lock().await.len()
    }

    pub async fn secret_bundle_entries(
        &self,
        bundle_name: &str,
    ) -> Option<BTreeMap<String, String>> {
        self.secret_bundles.lock().await.get(bundle_name).cloned()
    }
}

#[async_trait]
impl ClusterBackend for SimulatedCluster {
    async fn upsert_secret_bundle(
        &self,
        bundle_name: &str,
        entries: &BTreeMap<String, String>,
    ) -> Result<(), ClusterError> {
        self.secret_bundles
            .lock()
            .await
            .insert(bundle_name.to_string(), entries.clone());
        Ok(())
    }

    async fn upsert_workload(&self, workload_spec: &WorkloadSpec) -> Result<(), ClusterError> {
        let serialized_spec = serde_json::to_string(workload_spec)
            .map_err(|fault| ClusterError::SerializationFault(fault.to_string()))?;

        let mut workloads = self.workloads.lock().await;

        match workloads.get_mut(&workload_spec.metadata.name) {
            Some(existing_entry) if existing_entry.serialized_spec == serialized_spec => {
                // Especificación byte-igual: la revisión no avanza
            }
            Some(existing_entry) => {
                existing_entry.serialized_spec = serialized_spec;
                existing_entry.revision += 1;
            }
            None => {
                info!("🧪 [SIM_CLUSTER]: Workload {} materialized.", workload_spec.metadata.name);
                workloads.insert(
                    workload_spec.metadata.name.clone(),
                    SimulatedWorkloadEntry {
                        serialized_spec,
                        revision: 1,
                    },
                );
            }
        }

        Ok(())
    }

    async fn delete_workload(&self, workload_name: &str) -> Result<(), ClusterError> {
        self.workloads.lock().await.remove(workload_name);
        Ok(())
    }

    async fn delete_secret_bundle(&self, bundle_name: &str) -> Result<(), ClusterError> {
        self.secret_bundles.lock().await.remove(bundle_name);
        Ok(())
    }

    async fn read_workload(
        &self,
        workload_name: &str,
    ) -> Result<Option<WorkloadObservation>, ClusterError> {
        let workloads = self.workloads.lock().await;

        Ok(workloads.get(workload_name).map(|_| WorkloadObservation {
            // El cluster simulado converge instantáneamente
            ready_replicas: 1,
            total_replicas: 1,
            conditions: vec![WorkloadCondition {
                condition_type: "Available".to_string(),
                status: "True".to_string(),
                reason: Some("SimulatedConvergence".to_string()),
            }],
        }))
    }
}
