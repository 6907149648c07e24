// [libs/infra/cluster/src/errors.rs]

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ClusterError {
    /// Fallo físico de red contra el apiserver del cluster.
    #[error("[L3_CLUSTER_FAULT]: UPLINK_SEVERED -> {0}")]
    Transport(String),

    /// El apiserver rechazó la operación con un estado no recuperable.
    #[error("[L3_CLUSTER_FAULT]: API_REJECTION_{status} -> {detail}")]
    ApiRejection { status: u16, detail: String },

    /// La especificación de carga no pudo serializarse.
    #[error("[L3_CLUSTER_FAULT]: SPEC_SERIALIZATION -> {0}")]
    SerializationFault(String),
}
