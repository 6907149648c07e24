// [libs/infra/samples/src/simulator.rs]
/*!
 * =================================================================
 * APARATO: DETERMINISTIC SAMPLE SIMULATOR (V2.0)
 * CLASIFICACIÓN: INFRASTRUCTURE ADAPTER (ESTRATO L3)
 * RESPONSABILIDAD: MUESTRAS SINTÉTICAS REPRODUCIBLES SIN BACKEND
 *
 * # Mathematical Proof (Determinism):
 * Los valores derivan de un hash FNV-1a sobre (monitor_id, índice);
 * el mismo monitor produce siempre la misma serie de valores, lo
 * que permite fijar comportamiento en pruebas y demos sin motor de
 * series desplegado. Solo las marcas de tiempo siguen al reloj.
 * =================================================================
 */

use crate::{SampleStore, SampleStoreError};
use async_trait::async_trait;
use chrono::{Duration as ChronoDuration, Utc};
use std::collections::BTreeMap;
use std::time::Duration;
use vigil_domain_models::Sample;

/// Cardinal de muestras sintéticas por ventana.
const SYNTHETIC_WINDOW_DEPTH: usize = 5;
/// Separación temporal entre muestras sintéticas.
const SYNTHETIC_SPACING_SECONDS: i64 = 60;

#[derive(Default)]
pub struct DeterministicSampleSimulator;

impl DeterministicSampleSimulator {
    pub fn new() -> Self {
        Self
    }

    /// Hash FNV-1a de 64 bits: barato, estable y sin dependencias.
    fn fold_seed(monitor_id: &str, sample_index: usize) -> u64 {
        let mut accumulator: u64 = 0xcbf2_9ce4_8422_2325;
        for byte in monitor_id.bytes().chain([sample_index as u8]) {
            accumulator ^= byte as u64;
            accumulator = accumulator.wrapping_mul(0x0000_0100_0000_01b3);
        }
        accumulator
    }

    /// Proyecta el hash al intervalo [floor, ceiling).
    fn bounded_value(seed: u64, floor: f64, ceiling: f64) -> f64 {
        let normalized = (seed % 10_000) as f64 / 10_000.0;
        floor + normalized * (ceiling - floor)
    }
}

#[async_trait]
impl SampleStore for DeterministicSampleSimulator {
    async fn window(
        &self,
        monitor_id: &str,
        duration: Duration,
        limit: usize,
    ) -> Result<Vec<Sample>, SampleStoreError> {
        let newest_timestamp = Utc::now();
        let window_floor = newest_timestamp
            - ChronoDuration::seconds(duration.as_secs().min(i64::MAX as u64) as i64);

        let mut samples = Vec::new();

        for sample_index in 0..SYNTHETIC_WINDOW_DEPTH.min(limit) {
            let recorded_at = newest_timestamp
                - ChronoDuration::seconds(SYNTHETIC_SPACING_SECONDS * sample_index as i64);

            if recorded_at < window_floor {
                break;
            }

            let seed = Self::fold_seed(monitor_id, sample_index);

            // Catálogo completo de campos conocidos por los agentes:
            // cada condición encuentra su campo sea cual sea el tipo.
            let fields = BTreeMap::from([
                ("value".to_string(), Self::bounded_value(seed, 0.0, 100.0)),
                ("price".to_string(), Self::bounded_value(seed.rotate_left(8), 40_000.0, 70_000.0)),
                (
                    "response_time".to_string(),
                    Self::bounded_value(seed.rotate_left(16), 100.0, 2_000.0),
                ),
                (
                    "status_code".to_string(),
                    if seed.rotate_left(24) % 4 == 0 { 503.0 } else { 200.0 },
                ),
                (
                    "is_up".to_string(),
                    if seed.rotate_left(24) % 4 == 0 { 0.0 } else { 1.0 },
                ),
            ]);

            samples.push(Sample {
                monitor_id: monitor_id.to_string(),
                recorded_at,
                tags: BTreeMap::from([("provider".to_string(), "simulation".to_string())]),
                fields,
            });
        }

        Ok(samples)
    }
}
