// [libs/infra/cluster/src/backend.rs]
/*!
 * =================================================================
 * APARATO: CLUSTER BACKEND UPLINK (V4.1 - REST UPSERT)
 * CLASIFICACIÓN: INFRASTRUCTURE ADAPTER (ESTRATO L3)
 * RESPONSABILIDAD: DIÁLOGO CRUD CONTRA EL APISERVER DEL CLUSTER
 *
 * VISION HIPER-HOLÍSTICA 2026:
 * 1. UPSERT DISCIPLINE: GET-luego-PATCH con degradación a POST ante
 *    404; la misma secuencia aplicada dos veces converge al mismo
 *    objeto (idempotencia del apply).
 * 2. TOLERANT TEARDOWN: Los 404 de borrado se interpretan como
 *    convergencia, no como fallo.
 * 3. POLYMORPHIC SEAM: El trait permite sustituir el apiserver por
 *    el cluster simulado sin tocar al gestor.
 * =================================================================
 */

use crate::errors::ClusterError;
use crate::spec::WorkloadSpec;
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;
use tracing::{debug, info, instrument, warn};

/// Observación puntual del estado físico de una carga.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkloadObservation {
    pub ready_replicas: u32,
    pub total_replicas: u32,
    pub conditions: Vec<WorkloadCondition>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkloadCondition {
    pub condition_type: String,
    pub status: String,
    pub reason: Option<String>,
}

/**
 * Contrato mínimo que el gestor de cargas exige al cluster.
 */
#[async_trait]
pub trait ClusterBackend: Send + Sync {
    async fn upsert_secret_bundle(
        &self,
        bundle_name: &str,
        entries: &BTreeMap<String, String>,
    ) -> Result<(), ClusterError>;

    async fn upsert_workload(&self, workload_spec: &WorkloadSpec) -> Result<(), ClusterError>;

    /// Borrado convergente: un 404 cuenta como éxito.
    async fn delete_workload(&self, workload_name: &str) -> Result<(), ClusterError>;

    /// Borrado de mejor esfuerzo del objeto de secretos (404 ignorado).
    async fn delete_secret_bundle(&self, bundle_name: &str) -> Result<(), ClusterError>;

    /// `None` cuando la carga no existe en el cluster.
    async fn read_workload(
        &self,
        workload_name: &str,
    ) -> Result<Option<WorkloadObservation>, ClusterError>;
}

// =================================================================
// IMPLEMENTACIÓN REST CONTRA EL APISERVER
// =================================================================

pub struct KubernetesRestBackend {
    network_uplink_client: Client,
    apiserver_base_endpoint: String,
    access_token: String,
    namespace: String,
}

impl KubernetesRestBackend {
    pub fn new(base_url: String, access_token: String, namespace: String) -> Self {
        Self {
            network_uplink_client: Client::builder()
                .timeout(Duration::from_secs(30))
                .tcp_keepalive(Some(Duration::from_secs(60)))
                .user_agent("Vigil-Cluster-Uplink/V4.1")
                .build()
                .expect("FATAL: Cluster uplink client initialization failed."),
            apiserver_base_endpoint: base_url.trim_end_matches('/').to_string(),
            access_token,
            namespace,
        }
    }

    fn deployments_collection_url(&self) -> String {
        format!(
            "{}/apis/apps/v1/namespaces/{}/deployments",
            self.apiserver_base_endpoint, self.namespace
        )
    }

    fn secrets_collection_url(&self) -> String {
        format!(
            "{}/api/v1/namespaces/{}/secrets",
            self.apiserver_base_endpoint, self.namespace
        )
    }

    /// Secuencia GET -> PATCH(merge) | POST que materializa el upsert.
    async fn upsert_resource(
        &self,
        collection_url: &str,
        resource_name: &str,
        body: &serde_json::Value,
    ) -> Result<(), ClusterError> {
        let resource_url = format!("{}/{}", collection_url, resource_name);

        let probe_response = self
            .network_uplink_client
            .get(&resource_url)
            .bearer_auth(&self.access_token)
            .send()
            .await
            .map_err(|fault| ClusterError::Transport(fault.to_string()))?;

        let mutation_response = if probe_response.status() == StatusCode::NOT_FOUND {
            debug!("🛰️ [CLUSTER]: Resource {} absent. Creating.", resource_name);
            self.network_uplink_client
                .post(collection_url)
                .bearer_auth(&self.access_token)
                .json(body)
                .send()
                .await
        } else {
            debug!("🛰️ [CLUSTER]: Resource {} present. Patching.", resource_name);
            self.network_uplink_client
                .patch(&resource_url)
                .bearer_auth(&self.access_token)
                .header("Content-Type", "application/merge-patch+json")
                .json(body)
                .send()
                .await
        }
        .map_err(|fault| ClusterError::Transport(fault.to_string()))?;

        let status = mutation_response.status();

        // 409 en creación concurrente: otro apply convergió primero
        if status.is_success() || status == StatusCode::CONFLICT {
            Ok(())
        } else {
            let detail = mutation_response.text().await.unwrap_or_default();
            Err(ClusterError::ApiRejection {
                status: status.as_u16(),
                detail,
            })
        }
    }

    async fn delete_resource(
        &self,
        collection_url: &str,
        resource_name: &str,
    ) -> Result<(), ClusterError> {
        let resource_url = format!("{}/{}", collection_url, resource_name);

        let response = self
            .network_uplink_client
            .delete(&resource_url)
            .bearer_auth(&self.access_token)
            .send()
            .await
            .map_err(|fault| ClusterError::Transport(fault.to_string()))?;

        let status = response.status();

        if status.is_success() || status == StatusCode::NOT_FOUND {
            Ok(())
        } else {
            let detail = response.text().await.unwrap_or_default();
            Err(ClusterError::ApiRejection {
                status: status.as_u16(),
                detail,
            })
        }
    }
}

#[async_trait]
impl ClusterBackend for KubernetesRestBackend {
    #[instrument(skip(self, entries))]
    async fn upsert_secret_bundle(
        &self,
        bundle_name: &str,
        entries: &BTreeMap<String, String>,
    ) -> Result<(), ClusterError> {
        let secret_body = serde_json::json!({
            "apiVersion": "v1",
            "kind": "Secret",
            "metadata": {"name": bundle_name},
            "stringData": entries,
        });

        self.upsert_resource(&self.secrets_collection_url(), bundle_name, &secret_body)
            .await?;

        info!("🔐 [CLUSTER]: Secret bundle {} leveled.", bundle_name);
        Ok(())
    }

    #[instrument(skip(self, workload_spec))]
    async fn upsert_workload(&self, workload_spec: &WorkloadSpec) -> Result<(), ClusterError> {
        let body = serde_json::to_value(workload_spec)
            .map_err(|fault| ClusterError::SerializationFault(fault.to_string()))?;

        self.upsert_resource(
            &self.deployments_collection_url(),
            &workload_spec.metadata.name,
            &body,
        )
        .await?;

        info!("🚀 [CLUSTER]: Workload {} leveled.", workload_spec.metadata.name);
        Ok(())
    }

    #[instrument(skip(self))]
    async fn delete_workload(&self, workload_name: &str) -> Result<(), ClusterError> {
        self.delete_resource(&self.deployments_collection_url(), workload_name)
            .await
    }

    #[instrument(skip(self))]
    async fn delete_secret_bundle(&self, bundle_name: &str) -> Result<(), ClusterError> {
        self.delete_resource(&self.secrets_collection_url(), bundle_name)
            .await
    }

    #[instrument(skip(self))]
    async fn read_workload(
        &self,
        workload_name: &str,
    ) -> Result<Option<WorkloadObservation>, ClusterError> {
        let resource_url = format!("{}/{}", self.deployments_collection_url(), workload_name);

        let response = self
            .network_uplink_client
            .get(&resource_url)
            .bearer_auth(&self.access_token)
            .send()
            .await
            .map_err(|fault| ClusterError::Transport(fault.to_string()))?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let detail = response.text().await.unwrap_or_default();
            warn!("⚠️ [CLUSTER]: Status read rejected ({}).", status);
            return Err(ClusterError::ApiRejection { status, detail });
        }

        let raw_object: serde_json::Value = response
            .json()
            .await
            .map_err(|fault| ClusterError::Transport(fault.to_string()))?;

        let status_block = &raw_object["status"];

        let conditions = status_block["conditions"]
            .as_array()
            .map(|raw_conditions| {
                raw_conditions
                    .iter()
                    .map(|condition| WorkloadCondition {
                        condition_type: condition["type"].as_str().unwrap_or_default().to_string(),
                        status: condition["status"].as_str().unwrap_or_default().to_string(),
                        reason: condition["reason"].as_str().map(str::to_string),
                    })
                    .collect()
            })
            .unwrap_or_default();

        Ok(Some(WorkloadObservation {
            ready_replicas: status_block["readyReplicas"].as_u64().unwrap_or(0) as u32,
            total_replicas: status_block["replicas"].as_u64().unwrap_or(0) as u32,
            conditions,
        }))
    }
}
