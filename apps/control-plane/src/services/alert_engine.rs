// [apps/control-plane/src/services/alert_engine.rs]
/*!
 * =================================================================
 * APARATO: ALERT EVALUATION ENGINE (V4.3 - PERPETUAL LOOP)
 * CLASIFICACIÓN: BACKGROUND INFRASTRUCTURE SERVICE (ESTRATO L4)
 * RESPONSABILIDAD: CICLO PERPETUO DE EVALUACIÓN DE REGLAS ACTIVAS
 *
 * VISION HIPER-HOLÍSTICA 2026:
 * 1. TICK DISCIPLINE: Una consulta de reglas por ciclo; reglas en
 *    secuencia; la pausa descuenta el trabajo ya consumido y jamás
 *    duerme una duración negativa.
 * 2. FAULT BULKHEADS: El fallo de una regla no aborta el ciclo; el
 *    fallo de un ciclo no mata el bucle.
 * 3. FAIL-OPEN SUPPRESSION: Si el almacén de enfriamiento no
 *    responde, toda regla se considera fuera de enfriamiento. Se
 *    favorece la entrega (con posibles duplicados) sobre el
 *    silencio.
 * 4. COOPERATIVE SHUTDOWN: El tick en vuelo concluye; el bucle
 *    retorna al observar la señal de apagado.
 * =================================================================
 */

use crate::state::AppState;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::Instant;
use tracing::{debug, error, info, instrument, warn};
use vigil_domain_models::AlertRule;
use vigil_domain_rules::{evaluate, AlertCondition};
use vigil_infra_cooldown::cooldown_key;
use vigil_infra_db::repositories::{AlertRepository, AlertRuleRepository, MonitorRepository};
use vigil_infra_samples::{ALERT_WINDOW_DURATION, ALERT_WINDOW_LIMIT};

/// Cardinal de muestras detonantes preservadas en el snapshot.
const TRIGGER_SNAPSHOT_DEPTH: usize = 3;

pub struct AlertEvaluationEngine {
    application_state: AppState,
}

impl AlertEvaluationEngine {
    pub fn new(application_state: AppState) -> Self {
        Self { application_state }
    }

    /**
     * Bucle perpetuo de evaluación. Retorna cuando la señal de
     * apagado se activa, tras concluir el tick en vuelo.
     */
    pub async fn run(self, mut shutdown_signal: watch::Receiver<bool>) {
        let evaluation_interval = self.application_state.runtime_config.alert_evaluation_interval;

        info!(
            "🚨 [ALERT_ENGINE]: Evaluation daemon online. Cadence: {}s.",
            evaluation_interval.as_secs()
        );

        loop {
            let tick_ignition = Instant::now();

            // El fallo de un ciclo completo se registra y el bucle persiste
            if let Err(cycle_fault) = self.execute_evaluation_cycle().await {
                error!("❌ [ALERT_ENGINE]: Evaluation cycle collapsed: {}", cycle_fault);
            }

            // Pausa con descuento del trabajo consumido (jamás negativa)
            let consumed = tick_ignition.elapsed();
            let pause = evaluation_interval.saturating_sub(consumed);

            tokio::select! {
                _ = shutdown_signal.changed() => {
                    if *shutdown_signal.borrow() {
                        break;
                    }
                }
                _ = tokio::time::sleep(pause) => {}
            }
        }

        info!("🛑 [ALERT_ENGINE]: Evaluation daemon retired gracefully.");
    }

    /**
     * Un ciclo completo: carga de reglas activas y evaluación en
     * secuencia con mamparos de fallo por regla.
     */
    #[instrument(skip(self))]
    pub async fn execute_evaluation_cycle(&self) -> anyhow::Result<()> {
        let rule_repository = AlertRuleRepository::new(self.application_state.database_client.clone());
        let active_rules = rule_repository.list_active().await?;

        debug!("🔍 [ALERT_ENGINE]: {} active rules under evaluation.", active_rules.len());

        for rule in &active_rules {
            if let Err(rule_fault) = self.evaluate_single_rule(rule).await {
                error!("❌ [ALERT_ENGINE]: Rule {} evaluation failed: {}", rule.id, rule_fault);
            }
        }

        Ok(())
    }

    /**
     * Evaluación de una regla: enfriamiento, ventana, predicado,
     * cristalización y despacho.
     */
    async fn evaluate_single_rule(&self, rule: &AlertRule) -> anyhow::Result<()> {
        // 1. PUERTA DE ENFRIAMIENTO (fail-open ante indisponibilidad)
        let suppression_key = cooldown_key(&rule.id);

        match self.application_state.cooldown_store.exists(&suppression_key).await {
            Ok(true) => {
                debug!("🧊 [ALERT_ENGINE]: Rule {} in cooldown. Skipping.", rule.id);
                return Ok(());
            }
            Ok(false) => {}
            Err(store_fault) => {
                warn!(
                    "⚠️ [ALERT_ENGINE]: Cooldown store unavailable ({}). Failing OPEN for rule {}.",
                    store_fault, rule.id
                );
            }
        }

        // 2. VENTANA RECIENTE DEL MONITOR
        let sample_window = self
            .application_state
            .sample_store
            .window(&rule.monitor_id, ALERT_WINDOW_DURATION, ALERT_WINDOW_LIMIT)
            .await?;

        if sample_window.is_empty() {
            debug!("📭 [ALERT_ENGINE]: No recent samples for monitor {}.", rule.monitor_id);
            return Ok(());
        }

        // 3. PREDICADO PURO (las condiciones llegan certificadas del borde)
        let condition = AlertCondition::validate(&rule.condition)
            .map_err(|drift| anyhow::anyhow!("STORED_CONDITION_DRIFT: {}", drift))?;

        if !evaluate(&condition, &sample_window) {
            return Ok(());
        }

        info!("🔥 [ALERT_ENGINE]: Rule {} triggered: {}", rule.id, rule.title);

        // 4. CRISTALIZACIÓN TRANSACCIONAL DEL RASTRO
        let monitor_repository =
            MonitorRepository::new(self.application_state.database_client.clone());
        let monitor = match monitor_repository.fetch_by_id(&rule.monitor_id).await? {
            Some(monitor) => monitor,
            None => {
                warn!("⚠️ [ALERT_ENGINE]: Rule {} is orphaned (monitor {} gone).", rule.id, rule.monitor_id);
                return Ok(());
            }
        };

        let trigger_snapshot = serde_json::json!({
            "condition": rule.condition,
            "trigger_data": sample_window
                .iter()
                .take(TRIGGER_SNAPSHOT_DEPTH)
                .collect::<Vec<_>>(),
        });

        let alert_repository = AlertRepository::new(self.application_state.database_client.clone());
        let alert = alert_repository.insert_for_rule(rule, trigger_snapshot).await?;

        // 5. MARCADOR DE ENFRIAMIENTO (cero minutos desactiva la supresión)
        let suppression_ttl = Duration::from_secs(u64::from(rule.cooldown_minutes) * 60);
        if !suppression_ttl.is_zero() {
            if let Err(store_fault) = self
                .application_state
                .cooldown_store
                .set(&suppression_key, suppression_ttl)
                .await
            {
                warn!(
                    "⚠️ [ALERT_ENGINE]: Cooldown marker for rule {} not persisted: {}",
                    rule.id, store_fault
                );
            }
        }

        // 6. DESPACHO (el fallo de entrega jamás revierte la fila)
        if let Err(dispatch_fault) = self
            .application_state
            .dispatcher
            .dispatch_alert(&alert, &monitor, rule)
            .await
        {
            error!("❌ [ALERT_ENGINE]: Dispatch for alert {} failed: {}", alert.id, dispatch_fault);
        }

        Ok(())
    }
}
