// [apps/control-plane/src/config.rs]
/*!
 * =================================================================
 * APARATO: RUNTIME CONFIGURATION HARVESTER (V4.1)
 * CLASIFICACIÓN: APPLICATION SHELL (ESTRATO L3-APP)
 * RESPONSABILIDAD: COSECHA Y VALIDACIÓN DEL ENTORNO DE PROCESO
 *
 * VISION HIPER-HOLÍSTICA 2026:
 * 1. FATAL GATE: La ausencia de MASTER_KEY o DATABASE_URL es
 *    irrecuperable; el proceso debe abortar con código distinto de
 *    cero antes de abrir el socket.
 * 2. SIMULATION FALLBACK: Los backends opcionales (Influx, Redis,
 *    cluster) ausentes seleccionan sus gemelos de simulación.
 * =================================================================
 */

use anyhow::{bail, Result};
use std::env;
use std::time::Duration;

/// Cadencia por defecto del motor de evaluación (segundos).
const DEFAULT_EVALUATION_INTERVAL_SECONDS: u64 = 30;
/// Cadencia por defecto del barrido de reconciliación (segundos).
const DEFAULT_RECONCILE_INTERVAL_SECONDS: u64 = 60;
/// Puerto HTTP por defecto del plano de control.
const DEFAULT_LISTEN_PORT: u16 = 8080;

#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    // --- RED ---
    pub listen_port: u16,

    // --- CADENCIAS ---
    pub alert_evaluation_interval: Duration,
    pub workload_reconcile_interval: Duration,

    // --- LEDGER RELACIONAL ---
    pub database_url: String,
    pub database_auth_token: Option<String>,

    // --- ALMACÉN DE ENFRIAMIENTO ---
    pub redis_url: Option<String>,

    // --- ALMACÉN DE MUESTRAS ---
    pub influx_url: Option<String>,
    pub influx_token: String,
    pub influx_database: String,

    // --- BÓVEDA ---
    pub master_key: String,

    // --- DESPACHO DE SEÑALES ---
    pub mail_api_key: Option<String>,
    pub mail_sender: String,
    pub chat_block_webhook_url: Option<String>,
    pub chat_embed_webhook_url: Option<String>,
    pub chat_card_webhook_url: Option<String>,

    // --- CLUSTER ---
    pub cluster_api_url: Option<String>,
    pub cluster_api_token: String,
    pub cluster_namespace: String,
}

impl RuntimeConfig {
    /**
     * Cosecha la configuración del entorno del proceso.
     *
     * # Errors:
     * Configuración fatal ausente (llave maestra, URL del Ledger):
     * el llamador debe terminar el proceso con código distinto de
     * cero.
     */
    pub fn from_environment() -> Result<Self> {
        let master_key = match env::var("MASTER_KEY") {
            Ok(value) if !value.is_empty() => value,
            _ => bail!("CRITICAL_FAULT: MASTER_KEY not defined in runtime environment."),
        };

        let database_url = match env::var("DATABASE_URL") {
            Ok(value) if !value.is_empty() => value,
            _ => bail!("CRITICAL_FAULT: DATABASE_URL not defined in runtime environment."),
        };

        let alert_evaluation_interval = Duration::from_secs(
            env::var("ALERT_EVALUATION_INTERVAL")
                .ok()
                .and_then(|raw| raw.parse::<u64>().ok())
                .unwrap_or(DEFAULT_EVALUATION_INTERVAL_SECONDS)
                .max(1),
        );

        let workload_reconcile_interval = Duration::from_secs(
            env::var("WORKLOAD_RECONCILE_INTERVAL")
                .ok()
                .and_then(|raw| raw.parse::<u64>().ok())
                .unwrap_or(DEFAULT_RECONCILE_INTERVAL_SECONDS)
                .max(1),
        );

        let listen_port = env::var("PORT")
            .ok()
            .and_then(|raw| raw.parse::<u16>().ok())
            .unwrap_or(DEFAULT_LISTEN_PORT);

        Ok(Self {
            listen_port,
            alert_evaluation_interval,
            workload_reconcile_interval,
            database_url,
            database_auth_token: non_empty_var("TURSO_AUTH_TOKEN"),
            redis_url: non_empty_var("REDIS_URL"),
            influx_url: non_empty_var("INFLUXDB_URL"),
            influx_token: env::var("INFLUXDB_TOKEN").unwrap_or_default(),
            influx_database: env::var("INFLUXDB_DATABASE")
                .unwrap_or_else(|_| "monitors".to_string()),
            master_key,
            mail_api_key: non_empty_var("MAIL_API_KEY"),
            mail_sender: env::var("MAIL_SENDER")
                .unwrap_or_else(|_| "alerts@vigil.dev".to_string()),
            chat_block_webhook_url: non_empty_var("CHAT_BLOCK_WEBHOOK_URL"),
            chat_embed_webhook_url: non_empty_var("CHAT_EMBED_WEBHOOK_URL"),
            chat_card_webhook_url: non_empty_var("CHAT_CARD_WEBHOOK_URL"),
            cluster_api_url: non_empty_var("CLUSTER_API_URL"),
            cluster_api_token: env::var("CLUSTER_API_TOKEN").unwrap_or_default(),
            cluster_namespace: env::var("CLUSTER_NAMESPACE")
                .unwrap_or_else(|_| "monitors".to_string()),
        })
    }

    /// Endpoint del almacén de muestras inyectado a los agentes.
    pub fn sample_store_agent_endpoint(&self) -> String {
        self.influx_url
            .clone()
            .unwrap_or_else(|| "http://influxdb:8086".to_string())
    }
}

fn non_empty_var(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.is_empty())
}
