// [libs/infra/db/src/mapping.rs]
/*!
 * =================================================================
 * APARATO: ROW MAPPING UTILITIES (V1.2)
 * CLASIFICACIÓN: INFRASTRUCTURE LAYER (ESTRATO L3)
 * RESPONSABILIDAD: TRANSFORMACIÓN SQLITE <-> DOMINIO RUST
 * =================================================================
 */

use crate::errors::DbError;
use chrono::{DateTime, NaiveDateTime, Utc};

/**
 * Interpreta las marcas de tiempo del Ledger.
 *
 * # Logic:
 * Las escrituras del plano de control sellan RFC 3339; las filas
 * nacidas de `DEFAULT CURRENT_TIMESTAMP` portan el formato SQLite
 * `YYYY-MM-DD HH:MM:SS`. Ambos dialectos se aceptan.
 */
pub fn parse_timestamp(raw_timestamp: &str) -> Result<DateTime<Utc>, DbError> {
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw_timestamp) {
        return Ok(parsed.with_timezone(&Utc));
    }

    NaiveDateTime::parse_from_str(raw_timestamp, "%Y-%m-%d %H:%M:%S")
        .map(|naive| naive.and_utc())
        .map_err(|fault| {
            DbError::MappingError(format!("TIMESTAMP_DRIFT [{}]: {}", raw_timestamp, fault))
        })
}

/// Variante opcional: columna NULL -> None.
pub fn parse_optional_timestamp(
    raw_timestamp: Option<String>,
) -> Result<Option<DateTime<Utc>>, DbError> {
    raw_timestamp
        .as_deref()
        .map(parse_timestamp)
        .transpose()
}

/// Deserializa una columna JSON, degradando NULL al valor indicado.
pub fn parse_json_column<T: serde::de::DeserializeOwned>(
    raw_json: Option<String>,
    fallback: T,
) -> Result<T, DbError> {
    match raw_json {
        None => Ok(fallback),
        Some(raw) if raw.is_empty() => Ok(fallback),
        Some(raw) => serde_json::from_str(&raw)
            .map_err(|fault| DbError::MappingError(format!("JSON_COLUMN_DRIFT: {}", fault))),
    }
}

/// Sello temporal canónico para las escrituras del plano de control.
/// Precisión fija de microsegundos: el orden lexicográfico de la
/// columna coincide con el orden temporal.
pub fn format_timestamp(moment: DateTime<Utc>) -> String {
    moment.to_rfc3339_opts(chrono::SecondsFormat::Micros, true)
}
