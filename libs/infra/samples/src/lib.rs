// [libs/infra/samples/src/lib.rs]
/*!
 * =================================================================
 * APARATO: SAMPLE STORE GATEWAY (V3.0 - POLYMORPHIC)
 * CLASIFICACIÓN: INFRASTRUCTURE LAYER (ESTRATO L3)
 * RESPONSABILIDAD: VENTANAS RECIENTES DE MUESTRAS POR MONITOR
 *
 * VISION HIPER-HOLÍSTICA 2026:
 * 1. SINGLE CONTRACT: `window(monitor, duración, límite)` devuelve
 *    una secuencia descendente por tiempo, jamás parcial.
 * 2. BACKEND POLYMORPHISM: InfluxDB real o simulador determinista,
 *    inyectados por configuración para fijar comportamiento en
 *    pruebas.
 * =================================================================
 */

pub mod influx;
pub mod simulator;

use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;
use vigil_domain_models::Sample;

/// Ventana consultada por el motor de alertas: últimos 5 minutos.
pub const ALERT_WINDOW_DURATION: Duration = Duration::from_secs(300);
/// Tope de muestras por ventana de evaluación.
pub const ALERT_WINDOW_LIMIT: usize = 100;

#[derive(Error, Debug)]
pub enum SampleStoreError {
    /// Fallo transitorio del backend de series temporales.
    #[error("[L3_SAMPLES_FAULT]: BACKEND_UNAVAILABLE -> {0}")]
    BackendUnavailable(String),
    /// El backend respondió con una estructura irreconocible.
    #[error("[L3_SAMPLES_FAULT]: MALFORMED_RESPONSE -> {0}")]
    MalformedResponse(String),
}

/**
 * Contrato único del que depende la ruta de alertamiento.
 *
 * # Guarantees:
 * - A lo sumo `limit` muestras con timestamps en [now − duration, now].
 * - Orden estricto por tiempo descendente (índice 0 = más reciente).
 * - La secuencia vacía es un resultado válido, no un error.
 */
#[async_trait]
pub trait SampleStore: Send + Sync {
    async fn window(
        &self,
        monitor_id: &str,
        duration: Duration,
        limit: usize,
    ) -> Result<Vec<Sample>, SampleStoreError>;
}

pub use influx::InfluxSampleGateway;
pub use simulator::DeterministicSampleSimulator;
