// [apps/control-plane/src/state/mod.rs]
/*!
 * =================================================================
 * APARATO: SHARED APPLICATION STATE (V4.1 - NEURAL NEXUS)
 * CLASIFICACIÓN: APPLICATION SHELL (ESTRATO L3-APP)
 * RESPONSABILIDAD: SINAPSIS COMPARTIDA ENTRE HANDLERS Y DAEMONS
 *
 * VISION HIPER-HOLÍSTICA 2026:
 * 1. BACKEND POLYMORPHISM: Los almacenes de muestras, enfriamiento
 *    y cluster viajan como objetos de trait, por lo que el modo
 *    simulación y las pruebas inyectan gemelos sin tocar el núcleo.
 * 2. PROCESS-WIDE SINGLETONS: Bóveda, despachador y cliente del
 *    Ledger se construyen una única vez en la ignición y se liberan
 *    solo en el apagado ordenado.
 * =================================================================
 */

use crate::config::RuntimeConfig;
use crate::services::dispatcher::NotificationDispatcher;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use vigil_core_vault::SecretVault;
use vigil_infra_cluster::WorkloadManager;
use vigil_infra_cooldown::CooldownStore;
use vigil_infra_db::TursoClient;
use vigil_infra_samples::SampleStore;

#[derive(Clone)]
pub struct AppState {
    pub database_client: TursoClient,
    pub secret_vault: Arc<SecretVault>,
    pub sample_store: Arc<dyn SampleStore>,
    pub cooldown_store: Arc<dyn CooldownStore>,
    pub workload_manager: Arc<WorkloadManager>,
    pub dispatcher: Arc<NotificationDispatcher>,
    pub runtime_config: Arc<RuntimeConfig>,
    pub process_ignition_time: DateTime<Utc>,
}

impl AppState {
    #[allow(clippy::too_many_arguments)]
    pub fn assemble(
        database_client: TursoClient,
        secret_vault: Arc<SecretVault>,
        sample_store: Arc<dyn SampleStore>,
        cooldown_store: Arc<dyn CooldownStore>,
        workload_manager: Arc<WorkloadManager>,
        dispatcher: Arc<NotificationDispatcher>,
        runtime_config: Arc<RuntimeConfig>,
    ) -> Self {
        Self {
            database_client,
            secret_vault,
            sample_store,
            cooldown_store,
            workload_manager,
            dispatcher,
            runtime_config,
            process_ignition_time: Utc::now(),
        }
    }
}
