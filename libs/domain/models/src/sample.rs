// [libs/domain/models/src/sample.rs]

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use typeshare::typeshare;

/// Átomo del almacén de series temporales: una medición de un monitor
/// en un instante. Los campos numéricos viajan como flotantes; los
/// booleanos del agente se proyectan a 1.0/0.0 en la pasarela.
#[typeshare]
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Sample {
    pub monitor_id: String,
    #[typeshare(serialized_as = "String")]
    pub recorded_at: DateTime<Utc>,
    /// Dimensiones textuales (ej. `symbol`, `url`, `provider`).
    pub tags: BTreeMap<String, String>,
    /// Mediciones numéricas (ej. `price`, `response_time`, `is_up`).
    pub fields: BTreeMap<String, f64>,
}

impl Sample {
    /// Extrae el valor numérico de un campo, si la muestra lo porta.
    pub fn numeric_field(&self, field_name: &str) -> Option<f64> {
        self.fields.get(field_name).copied()
    }
}
