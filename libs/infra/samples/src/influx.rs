// [libs/infra/samples/src/influx.rs]
/*!
 * =================================================================
 * APARATO: INFLUX TIMESERIES UPLINK (V3.1 - SQL OVER HTTP)
 * CLASIFICACIÓN: INFRASTRUCTURE ADAPTER (ESTRATO L3)
 * RESPONSABILIDAD: CONSULTA DE VENTANAS SOBRE EL MOTOR INFLUX
 *
 * # Mathematical Proof (Window Integrity):
 * La consulta acota por `time >= now() - INTERVAL` y ordena en el
 * motor; la pasarela re-certifica orden y tope localmente, por lo
 * que el contrato descendente se cumple incluso ante un backend
 * permisivo.
 * =================================================================
 */

use crate::{SampleStore, SampleStoreError};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde_json::Value;
use std::collections::BTreeMap;
use std::time::Duration;
use tracing::{error, instrument};
use vigil_domain_models::Sample;

/// Medida única donde los agentes recolectores escriben sus muestras.
const MONITOR_MEASUREMENT: &str = "monitor_data";

pub struct InfluxSampleGateway {
    network_uplink_client: Client,
    influx_base_endpoint: String,
    influx_access_token: String,
    influx_logical_database: String,
}

impl InfluxSampleGateway {
    /**
     * Inicializa el enlace endurecido hacia el motor de series.
     */
    pub fn new(base_url: String, access_token: String, logical_database: String) -> Self {
        Self {
            network_uplink_client: Client::builder()
                .timeout(Duration::from_secs(15))
                .user_agent("Vigil-Sample-Gateway/V3.1")
                .build()
                .expect("FATAL: Sample uplink client initialization failed."),
            influx_base_endpoint: base_url.trim_end_matches('/').to_string(),
            influx_access_token: access_token,
            influx_logical_database: logical_database,
        }
    }
}

#[async_trait]
impl SampleStore for InfluxSampleGateway {
    #[instrument(skip(self))]
    async fn window(
        &self,
        monitor_id: &str,
        duration: Duration,
        limit: usize,
    ) -> Result<Vec<Sample>, SampleStoreError> {
        // 1. BLINDAJE DEL IDENTIFICADOR (los ids son internos, pero el
        //    empalme en SQL exige disciplina de charset)
        if !monitor_id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
        {
            return Err(SampleStoreError::MalformedResponse(format!(
                "MONITOR_ID_CHARSET_VIOLATION: {}",
                monitor_id
            )));
        }

        let sql_query = format!(
            "SELECT * FROM \"{}\" \
             WHERE \"monitor_id\" = '{}' \
             AND time >= now() - INTERVAL '{} seconds' \
             ORDER BY time DESC \
             LIMIT {}",
            MONITOR_MEASUREMENT,
            monitor_id,
            duration.as_secs(),
            limit
        );

        let query_endpoint = format!("{}/api/v3/query_sql", self.influx_base_endpoint);

        // 2. EJECUCIÓN DE LA CONSULTA SQL-OVER-HTTP
        let network_response = self
            .network_uplink_client
            .post(&query_endpoint)
            .bearer_auth(&self.influx_access_token)
            .json(&serde_json::json!({
                "db": self.influx_logical_database,
                "q": sql_query,
                "format": "json"
            }))
            .send()
            .await
            .map_err(|fault| {
                error!("❌ [SAMPLES_UPLINK]: Physical link failure: {}", fault);
                SampleStoreError::BackendUnavailable(fault.to_string())
            })?;

        if !network_response.status().is_success() {
            return Err(SampleStoreError::BackendUnavailable(format!(
                "HTTP_{}",
                network_response.status()
            )));
        }

        let raw_rows: Vec<Value> = network_response
            .json()
            .await
            .map_err(|fault| SampleStoreError::MalformedResponse(fault.to_string()))?;

        // 3. PROYECCIÓN A MUESTRAS DEL DOMINIO
        let mut samples = map_influx_rows(monitor_id, raw_rows)?;

        // Re-certificación local del contrato descendente y el tope
        samples.sort_by(|a, b| b.recorded_at.cmp(&a.recorded_at));
        samples.truncate(limit);

        Ok(samples)
    }
}

/**
 * Proyecta filas crudas del motor a `Sample`: columnas de texto como
 * tags, numéricas como campos flotantes y booleanas como 1.0/0.0.
 * Las filas sin marca de tiempo interpretable se descartan.
 */
pub(crate) fn map_influx_rows(
    monitor_id: &str,
    raw_rows: Vec<Value>,
) -> Result<Vec<Sample>, SampleStoreError> {
    let mut samples = Vec::with_capacity(raw_rows.len());

    for raw_row in raw_rows {
        let row_object = match raw_row.as_object() {
            Some(object) => object,
            None => {
                return Err(SampleStoreError::MalformedResponse(
                    "ROW_NOT_OBJECT".to_string(),
                ))
            }
        };

        let recorded_at = match row_object.get("time").and_then(parse_influx_timestamp) {
            Some(moment) => moment,
            None => continue,
        };

        let mut tags = BTreeMap::new();
        let mut fields = BTreeMap::new();

        for (column_name, column_value) in row_object {
            if column_name == "time" || column_name == "monitor_id" {
                continue;
            }

            match column_value {
                Value::String(text) => {
                    tags.insert(column_name.clone(), text.clone());
                }
                Value::Number(number) => {
                    if let Some(numeric) = number.as_f64() {
                        fields.insert(column_name.clone(), numeric);
                    }
                }
                Value::Bool(flag) => {
                    fields.insert(column_name.clone(), if *flag { 1.0 } else { 0.0 });
                }
                // NULL y estructuras anidadas no portan medición
                _ => {}
            }
        }

        samples.push(Sample {
            monitor_id: monitor_id.to_string(),
            recorded_at,
            tags,
            fields,
        });
    }

    Ok(samples)
}

/// Acepta RFC 3339 o epoch en nanosegundos (dialectos del motor).
fn parse_influx_timestamp(raw_time: &Value) -> Option<DateTime<Utc>> {
    match raw_time {
        Value::String(text) => DateTime::parse_from_rfc3339(text)
            .ok()
            .map(|parsed| parsed.with_timezone(&Utc)),
        Value::Number(number) => number.as_i64().map(DateTime::from_timestamp_nanos),
        _ => None,
    }
}
