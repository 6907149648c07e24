// INICIO DEL ARCHIVO [apps/control-plane/src/kernel.rs]
/**
 * =================================================================
 * APARATO: CONTROL PLANE SOVEREIGN KERNEL (V4.3 - GRACEFUL)
 * CLASIFICACIÓN: COMPOSITION ROOT (ESTRATO L1-APP)
 * RESPONSABILIDAD: BOOTSTRAP DE INFRAESTRUCTURA E IGNICIÓN SEGURA
 *
 * VISION HIPER-HOLÍSTICA:
 * Actúa como la placa base donde se conectan todos los servicios:
 * Ledger, bóveda, almacenes polimórficos, daemons (motor de alertas
 * y reconciliador) y el transporte HTTP. El apagado es cooperativo:
 * el tick en vuelo concluye y el drenaje completo queda acotado a
 * 30 segundos.
 * =================================================================
 */

use crate::config::RuntimeConfig;
use crate::routes::create_control_plane_router;
use crate::services::{
    AlertEvaluationEngine, DispatcherSettings, NotificationDispatcher, WorkloadReconciler,
};
use crate::state::AppState;
use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{error, info, instrument, warn};
use vigil_core_vault::SecretVault;
use vigil_infra_cluster::{KubernetesRestBackend, SimulatedCluster, WorkloadManager};
use vigil_infra_cooldown::{CooldownStore, InMemoryCooldownStore, RedisCooldownStore};
use vigil_infra_db::TursoClient;
use vigil_infra_samples::{DeterministicSampleSimulator, InfluxSampleGateway, SampleStore};

/// Tope duro del drenaje ordenado de daemons.
const GRACEFUL_SHUTDOWN_CAP_SECONDS: u64 = 30;

pub struct ControlPlaneKernel {
    pub application_state: AppState,
}

impl ControlPlaneKernel {
    /**
     * Realiza la ignición de la infraestructura y el estado neural.
     * Establece la conexión al Ledger antes de levantar servicios.
     */
    #[instrument(skip(runtime_config))]
    pub async fn ignite(runtime_config: RuntimeConfig) -> Self {
        // 1. LEDGER RELACIONAL (fatal si no enlaza)
        let database_client = TursoClient::connect(
            &runtime_config.database_url,
            runtime_config.database_auth_token.clone(),
        )
        .await
        .expect("FATAL: Ledger link collapse. Ignition aborted.");

        // 2. BÓVEDA DE PROCESO (llave derivada una única vez)
        let secret_vault = Arc::new(SecretVault::from_master_key(&runtime_config.master_key));

        // 3. ALMACÉN DE MUESTRAS (real o simulación determinista)
        let sample_store: Arc<dyn SampleStore> = match runtime_config.influx_url.clone() {
            Some(influx_url) => Arc::new(InfluxSampleGateway::new(
                influx_url,
                runtime_config.influx_token.clone(),
                runtime_config.influx_database.clone(),
            )),
            None => {
                warn!("🧪 [KERNEL]: INFLUXDB_URL absent. Sample store in SIMULATION mode.");
                Arc::new(DeterministicSampleSimulator::new())
            }
        };

        // 4. ALMACÉN DE ENFRIAMIENTO (distribuido o en memoria)
        let cooldown_store: Arc<dyn CooldownStore> = match runtime_config.redis_url.clone() {
            Some(redis_url) => match RedisCooldownStore::connect(&redis_url) {
                Ok(store) => Arc::new(store),
                Err(connect_fault) => {
                    warn!(
                        "🧪 [KERNEL]: Redis link rejected ({}). Cooldown in MEMORY mode.",
                        connect_fault
                    );
                    Arc::new(InMemoryCooldownStore::new())
                }
            },
            None => {
                warn!("🧪 [KERNEL]: REDIS_URL absent. Cooldown in MEMORY mode.");
                Arc::new(InMemoryCooldownStore::new())
            }
        };

        // 5. GESTOR DE CARGAS (apiserver real o cluster simulado)
        let workload_manager = match runtime_config.cluster_api_url.clone() {
            Some(cluster_url) => Arc::new(WorkloadManager::new(
                Arc::new(KubernetesRestBackend::new(
                    cluster_url,
                    runtime_config.cluster_api_token.clone(),
                    runtime_config.cluster_namespace.clone(),
                )),
                runtime_config.sample_store_agent_endpoint(),
            )),
            None => {
                warn!("🧪 [KERNEL]: CLUSTER_API_URL absent. Workloads in SIMULATION mode.");
                Arc::new(WorkloadManager::new(
                    Arc::new(SimulatedCluster::new()),
                    runtime_config.sample_store_agent_endpoint(),
                ))
            }
        };

        // 6. DESPACHADOR HERALD (cliente HTTP de proceso, único)
        let dispatcher = Arc::new(NotificationDispatcher::new(
            database_client.clone(),
            DispatcherSettings {
                mail_api_key: runtime_config.mail_api_key.clone(),
                mail_endpoint: DispatcherSettings::mail_provider_default_endpoint(),
                mail_sender: runtime_config.mail_sender.clone(),
                default_block_webhook_url: runtime_config.chat_block_webhook_url.clone(),
                default_embed_webhook_url: runtime_config.chat_embed_webhook_url.clone(),
                default_card_webhook_url: runtime_config.chat_card_webhook_url.clone(),
            },
        ));

        Self {
            application_state: AppState::assemble(
                database_client,
                secret_vault,
                sample_store,
                cooldown_store,
                workload_manager,
                dispatcher,
                Arc::new(runtime_config),
            ),
        }
    }

    /**
     * Lanza daemons y transporte HTTP; retorna tras el drenaje
     * ordenado (tope de 30 s) cuando llega la señal de apagado.
     */
    pub async fn launch_operations(self) {
        let shared_application_state = self.application_state.clone();
        let listen_port = shared_application_state.runtime_config.listen_port;

        // --- 1. SEÑAL COOPERATIVA DE APAGADO ---
        let (shutdown_transmitter, shutdown_receiver) = watch::channel(false);
        let shutdown_transmitter = Arc::new(shutdown_transmitter);

        // --- 2. DESPLIEGUE DE DAEMONS ---

        // A. Motor de Evaluación de Alertas
        let engine = AlertEvaluationEngine::new(shared_application_state.clone());
        let engine_handle = tokio::spawn(engine.run(shutdown_receiver.clone()));

        // B. Reconciliador de Cargas
        let reconciler = WorkloadReconciler::new(shared_application_state.clone());
        let reconciler_handle = tokio::spawn(reconciler.run(shutdown_receiver));

        // --- 3. IGNICIÓN DEL TRANSPORTE HTTP (AXUM) ---
        let control_plane_router = create_control_plane_router(shared_application_state);

        let bind_address = SocketAddr::new("0.0.0.0".parse::<IpAddr>().unwrap(), listen_port);

        info!("🚀 [KERNEL_ONLINE]: Control plane listening at {}", bind_address);

        let tcp_listener = tokio::net::TcpListener::bind(bind_address)
            .await
            .expect("CRITICAL_FAULT: Failed to bind network port.");

        let graceful_transmitter = shutdown_transmitter.clone();
        let server_verdict = axum::serve(tcp_listener, control_plane_router)
            .with_graceful_shutdown(async move {
                if tokio::signal::ctrl_c().await.is_err() {
                    error!("💀 [KERNEL]: Shutdown signal listener collapsed.");
                }
                info!("🛑 [KERNEL]: Shutdown signal received. Draining strata...");
                let _ = graceful_transmitter.send(true);
            })
            .await;

        if let Err(server_error) = server_verdict {
            error!("💀 [KERNEL_COLLAPSE]: Runtime failure: {}", server_error);
            let _ = shutdown_transmitter.send(true);
        }

        // --- 4. DRENAJE ORDENADO CON TOPE DURO ---
        let drain_verdict = tokio::time::timeout(
            Duration::from_secs(GRACEFUL_SHUTDOWN_CAP_SECONDS),
            async {
                let _ = engine_handle.await;
                let _ = reconciler_handle.await;
            },
        )
        .await;

        match drain_verdict {
            Ok(()) => info!("🏁 [KERNEL]: All daemons retired. Shutdown complete."),
            Err(_) => warn!(
                "⏱️ [KERNEL]: Drain cap of {}s exceeded. Forcing exit.",
                GRACEFUL_SHUTDOWN_CAP_SECONDS
            ),
        }
    }
}
// FIN DEL ARCHIVO [apps/control-plane/src/kernel.rs]
