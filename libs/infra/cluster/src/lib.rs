// [libs/infra/cluster/src/lib.rs]
/*!
 * =================================================================
 * APARATO: CLUSTER WORKLOAD GATEWAY (V4.0)
 * CLASIFICACIÓN: INFRASTRUCTURE LAYER (ESTRATO L3)
 * RESPONSABILIDAD: SOMBRA FÍSICA DE LOS MONITORES EN EL CLUSTER
 * =================================================================
 */

pub mod backend;
pub mod errors;
pub mod manager;
pub mod simulator;
pub mod spec;

pub use backend::{
    ClusterBackend, KubernetesRestBackend, WorkloadCondition, WorkloadObservation,
};
pub use errors::ClusterError;
pub use manager::{
    secret_bundle_name, workload_name, ApplyReceipt, WorkloadManager, WorkloadPhase,
    WorkloadStatusReport,
};
pub use simulator::SimulatedCluster;
pub use spec::WorkloadSpec;
