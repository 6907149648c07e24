// [apps/control-plane/src/services/reconciler.rs]
/*!
 * =================================================================
 * APARATO: WORKLOAD RECONCILER SWEEP (V4.1)
 * CLASIFICACIÓN: BACKGROUND INFRASTRUCTURE SERVICE (ESTRATO L4)
 * RESPONSABILIDAD: NIVELACIÓN PERIÓDICA MONITOR <-> CARGA FÍSICA
 *
 * VISION HIPER-HOLÍSTICA 2026:
 * 1. STATUS TRUTH: El estado relacional se nivela desde la lectura
 *    del cluster; la fila nunca es autoritativa por sí sola.
 * 2. LAZARUS PATH: Los monitores en 'error' se re-aplican abriendo
 *    los sobres de la bóveda; el éxito los devuelve a 'deploying'.
 * 3. NO RETRY STORM: Sin reintentos más allá del propio barrido.
 * =================================================================
 */

use crate::state::AppState;
use std::collections::BTreeMap;
use tokio::sync::watch;
use tracing::{debug, error, info, instrument, warn};
use vigil_domain_models::{Monitor, MonitorStatus};
use vigil_infra_cluster::WorkloadPhase;
use vigil_infra_db::repositories::{MonitorRepository, SecretRepository};

pub struct WorkloadReconciler {
    application_state: AppState,
}

impl WorkloadReconciler {
    pub fn new(application_state: AppState) -> Self {
        Self { application_state }
    }

    /// Bucle perpetuo de barridos; retorna al observar el apagado.
    pub async fn run(self, mut shutdown_signal: watch::Receiver<bool>) {
        let sweep_interval = self.application_state.runtime_config.workload_reconcile_interval;

        info!(
            "🧭 [RECONCILER]: Sweep daemon online. Cadence: {}s.",
            sweep_interval.as_secs()
        );

        loop {
            if let Err(sweep_fault) = self.execute_reconcile_sweep().await {
                error!("❌ [RECONCILER]: Sweep collapsed: {}", sweep_fault);
            }

            tokio::select! {
                _ = shutdown_signal.changed() => {
                    if *shutdown_signal.borrow() {
                        break;
                    }
                }
                _ = tokio::time::sleep(sweep_interval) => {}
            }
        }

        info!("🛑 [RECONCILER]: Sweep daemon retired gracefully.");
    }

    #[instrument(skip(self))]
    async fn execute_reconcile_sweep(&self) -> anyhow::Result<()> {
        let monitor_repository =
            MonitorRepository::new(self.application_state.database_client.clone());
        let reconcilable_monitors = monitor_repository.list_reconcilable().await?;

        debug!("🧭 [RECONCILER]: {} monitors under reconciliation.", reconcilable_monitors.len());

        for monitor in &reconcilable_monitors {
            if let Err(monitor_fault) = self.reconcile_single_monitor(monitor).await {
                error!("❌ [RECONCILER]: Monitor {} reconciliation failed: {}", monitor.id, monitor_fault);
            }
        }

        Ok(())
    }

    async fn reconcile_single_monitor(&self, monitor: &Monitor) -> anyhow::Result<()> {
        let monitor_repository =
            MonitorRepository::new(self.application_state.database_client.clone());

        match monitor.status {
            // Carga aplicada: ¿ya reporta disponibilidad total?
            MonitorStatus::Deploying => {
                let Some(workload_id) = monitor.workload_id.as_deref() else {
                    return Ok(());
                };

                let report = self.application_state.workload_manager.status(workload_id).await;

                match report.status {
                    WorkloadPhase::Running => {
                        info!("🟢 [RECONCILER]: Monitor {} is now running.", monitor.id);
                        monitor_repository
                            .update_deployment_state(&monitor.id, MonitorStatus::Running, Some(workload_id))
                            .await?;
                    }
                    WorkloadPhase::NotFound => {
                        warn!("🔴 [RECONCILER]: Workload of monitor {} vanished mid-deploy.", monitor.id);
                        monitor_repository
                            .update_deployment_state(&monitor.id, MonitorStatus::Error, Some(workload_id))
                            .await?;
                    }
                    // Starting se re-observa en el próximo barrido; los
                    // errores de lectura no mutan el estado.
                    WorkloadPhase::Starting | WorkloadPhase::Error => {}
                }
            }

            // Carga en producción: detección de desaparición
            MonitorStatus::Running => {
                let Some(workload_id) = monitor.workload_id.as_deref() else {
                    return Ok(());
                };

                let report = self.application_state.workload_manager.status(workload_id).await;

                if report.status == WorkloadPhase::NotFound {
                    warn!("🔴 [RECONCILER]: Workload of monitor {} is missing.", monitor.id);
                    monitor_repository
                        .update_deployment_state(&monitor.id, MonitorStatus::Error, Some(workload_id))
                        .await?;
                }
            }

            // Sendero Lázaro: re-aplicación con material de la bóveda
            MonitorStatus::Error => {
                let plaintext_secrets = self.unseal_monitor_secrets(monitor).await?;

                match self
                    .application_state
                    .workload_manager
                    .apply(monitor, &plaintext_secrets)
                    .await
                {
                    Ok(receipt) => {
                        info!("🌅 [RECONCILER]: Monitor {} re-applied as {}.", monitor.id, receipt.workload_id);
                        monitor_repository
                            .update_deployment_state(
                                &monitor.id,
                                MonitorStatus::Deploying,
                                Some(&receipt.workload_id),
                            )
                            .await?;
                    }
                    Err(apply_fault) => {
                        warn!("⚠️ [RECONCILER]: Re-apply of monitor {} deferred: {}", monitor.id, apply_fault);
                    }
                }
            }

            MonitorStatus::Starting => {}
        }

        Ok(())
    }

    /**
     * Abre los sobres referenciados por el monitor para reconstruir
     * el material en claro del objeto de secretos. El plano jamás lo
     * persiste fuera del cluster.
     */
    async fn unseal_monitor_secrets(
        &self,
        monitor: &Monitor,
    ) -> anyhow::Result<BTreeMap<String, String>> {
        let secret_repository =
            SecretRepository::new(self.application_state.database_client.clone());
        let mut plaintext_secrets = BTreeMap::new();

        for (logical_name, secret_identifier) in &monitor.secret_refs {
            let Some(record) = secret_repository
                .fetch_owned(secret_identifier, &monitor.user_id)
                .await?
            else {
                warn!(
                    "⚠️ [RECONCILER]: Secret {} of monitor {} is gone; reference skipped.",
                    secret_identifier, monitor.id
                );
                continue;
            };

            let plaintext_value = self
                .application_state
                .secret_vault
                .decrypt(&record.encrypted_value)
                .map_err(|vault_fault| anyhow::anyhow!("VAULT_INTEGRITY_FAULT: {}", vault_fault))?;

            plaintext_secrets.insert(logical_name.clone(), plaintext_value);
        }

        Ok(plaintext_secrets)
    }
}
