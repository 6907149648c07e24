// [libs/infra/cluster/src/spec.rs]
/*!
 * =================================================================
 * APARATO: WORKLOAD SPEC FORGE (V4.1 - DECLARATIVE SHADOW)
 * CLASIFICACIÓN: INFRASTRUCTURE LAYER (ESTRATO L3)
 * RESPONSABILIDAD: TRADUCCIÓN MONITOR -> ESPECIFICACIÓN DE CLUSTER
 *
 * VISION HIPER-HOLÍSTICA 2026:
 * 1. DETERMINISTIC FORGE: El mismo monitor produce la misma
 *    especificación byte a byte; la idempotencia del apply descansa
 *    sobre esta propiedad.
 * 2. SECRET INDIRECTION: El material sensible viaja por el objeto
 *    de secretos `monitor-<id>-secrets`; la especificación solo
 *    porta referencias.
 * 3. FIXED FOOTPRINT: Recursos pequeños e inmutables por agente
 *    (50m/100m CPU, 64Mi/128Mi memoria).
 * =================================================================
 */

use crate::errors::ClusterError;
use crate::manager::{secret_bundle_name, workload_name};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use vigil_domain_models::Monitor;

/// Puerto fijo donde los agentes exponen sus sondas HTTP.
const AGENT_PROBE_PORT: u16 = 8080;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct WorkloadSpec {
    pub api_version: String,
    pub kind: String,
    pub metadata: WorkloadMetadata,
    pub spec: WorkloadSpecInner,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct WorkloadMetadata {
    pub name: String,
    pub labels: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct WorkloadSpecInner {
    pub replicas: u32,
    pub selector: LabelSelector,
    pub template: PodTemplate,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct LabelSelector {
    pub match_labels: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PodTemplate {
    pub metadata: PodTemplateMetadata,
    pub spec: PodSpec,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PodTemplateMetadata {
    pub labels: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PodSpec {
    pub containers: Vec<ContainerSpec>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ContainerSpec {
    pub name: String,
    pub image: String,
    pub env: Vec<EnvVarSpec>,
    pub resources: ResourceRequirements,
    pub liveness_probe: ProbeSpec,
    pub readiness_probe: ProbeSpec,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct EnvVarSpec {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value_from: Option<EnvVarSource>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct EnvVarSource {
    pub secret_key_ref: SecretKeySelector,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SecretKeySelector {
    pub name: String,
    pub key: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ResourceRequirements {
    pub limits: BTreeMap<String, String>,
    pub requests: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ProbeSpec {
    pub http_get: HttpProbeTarget,
    pub initial_delay_seconds: u32,
    pub period_seconds: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct HttpProbeTarget {
    pub path: String,
    pub port: u16,
}

impl WorkloadSpec {
    /**
     * Forja la especificación declarativa de un monitor.
     *
     * # Logic:
     * - Nombre `monitor-<id>`, réplica única, etiquetas de rastreo.
     * - Imagen seleccionada por `monitor_type`.
     * - Entorno: MONITOR_ID, CONFIG serializado, endpoint del almacén
     *   de muestras y una referencia por cada secreto lógico hacia el
     *   objeto `monitor-<id>-secrets`.
     * - Sondas de vida y disponibilidad en /health y /ready.
     */
    pub fn for_monitor(
        monitor: &Monitor,
        sample_store_endpoint: &str,
    ) -> Result<Self, ClusterError> {
        let workload_identifier = workload_name(&monitor.id);

        let labels = BTreeMap::from([
            ("app".to_string(), "monitor".to_string()),
            ("monitor_id".to_string(), monitor.id.clone()),
            ("user_id".to_string(), monitor.user_id.clone()),
            ("monitor_type".to_string(), monitor.monitor_type.clone()),
        ]);

        let selector_labels =
            BTreeMap::from([("monitor_id".to_string(), monitor.id.clone())]);

        let template_labels = BTreeMap::from([
            ("app".to_string(), "monitor".to_string()),
            ("monitor_id".to_string(), monitor.id.clone()),
        ]);

        let serialized_config = serde_json::to_string(&monitor.config)
            .map_err(|fault| ClusterError::SerializationFault(fault.to_string()))?;

        // 1. ENTORNO BASE DEL AGENTE
        let mut environment = vec![
            EnvVarSpec {
                name: "MONITOR_ID".to_string(),
                value: Some(monitor.id.clone()),
                value_from: None,
            },
            EnvVarSpec {
                name: "CONFIG".to_string(),
                value: Some(serialized_config),
                value_from: None,
            },
            EnvVarSpec {
                name: "SAMPLE_STORE_URL".to_string(),
                value: Some(sample_store_endpoint.to_string()),
                value_from: None,
            },
        ];

        // 2. REFERENCIAS DE SECRETOS (una por nombre lógico, material
        //    entregado por el objeto de secretos en el apply)
        let bundle_name = secret_bundle_name(&monitor.id);
        for logical_name in monitor.secret_refs.keys() {
            environment.push(EnvVarSpec {
                name: logical_name.to_uppercase(),
                value: None,
                value_from: Some(EnvVarSource {
                    secret_key_ref: SecretKeySelector {
                        name: bundle_name.clone(),
                        key: logical_name.clone(),
                    },
                }),
            });
        }

        Ok(WorkloadSpec {
            api_version: "apps/v1".to_string(),
            kind: "Deployment".to_string(),
            metadata: WorkloadMetadata {
                name: workload_identifier,
                labels,
            },
            spec: WorkloadSpecInner {
                replicas: 1,
                selector: LabelSelector {
                    match_labels: selector_labels,
                },
                template: PodTemplate {
                    metadata: PodTemplateMetadata {
                        labels: template_labels,
                    },
                    spec: PodSpec {
                        containers: vec![ContainerSpec {
                            name: "monitor".to_string(),
                            image: format!("monitors/{}:latest", monitor.monitor_type),
                            env: environment,
                            resources: ResourceRequirements {
                                limits: BTreeMap::from([
                                    ("memory".to_string(), "128Mi".to_string()),
                                    ("cpu".to_string(), "100m".to_string()),
                                ]),
                                requests: BTreeMap::from([
                                    ("memory".to_string(), "64Mi".to_string()),
                                    ("cpu".to_string(), "50m".to_string()),
                                ]),
                            },
                            liveness_probe: ProbeSpec {
                                http_get: HttpProbeTarget {
                                    path: "/health".to_string(),
                                    port: AGENT_PROBE_PORT,
                                },
                                initial_delay_seconds: 10,
                                period_seconds: 30,
                            },
                            readiness_probe: ProbeSpec {
                                http_get: HttpProbeTarget {
                                    path: "/ready".to_string(),
                                    port: AGENT_PROBE_PORT,
                                },
                                initial_delay_seconds: 5,
                                period_seconds: 10,
                            },
                        }],
                    },
                },
            },
        })
    }
}
