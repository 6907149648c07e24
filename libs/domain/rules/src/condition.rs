// [libs/domain/rules/src/condition.rs]
/*!
 * =================================================================
 * APARATO: CONDITION CONTRACT & VALIDATION GATE (V3.1)
 * CLASIFICACIÓN: DOMAIN LOGIC (ESTRATO L2)
 * RESPONSABILIDAD: GRAMÁTICA DECLARATIVA DE PREDICADOS DE UMBRAL
 * =================================================================
 */

use serde::{Deserialize, Serialize};
use thiserror::Error;
use typeshare::typeshare;

/// Catálogo de fallos de validación devueltos por el borde de la API.
/// El evaluador jamás emite estos errores: toda condición que llega a
/// evaluación ya fue certificada.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum RuleValidationError {
    #[error("CONDITION_NOT_OBJECT: condition must be a JSON object")]
    NotAnObject,
    #[error("CONDITION_FIELD_VOID: missing required field '{0}'")]
    MissingField(&'static str),
    #[error("CONDITION_TYPE_UNKNOWN: unsupported condition type '{0}'")]
    UnknownConditionType(String),
    #[error("CONDITION_OPERATOR_UNKNOWN: unsupported operator '{0}'")]
    UnknownOperator(String),
    #[error("CONDITION_AGGREGATION_UNKNOWN: unsupported aggregation '{0}'")]
    UnknownAggregation(String),
    #[error("CONDITION_VALUE_NOT_NUMERIC: threshold value must be a number")]
    NonNumericValue,
}

/// Operador de comparación contra el umbral escalar.
#[typeshare]
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum ComparisonOperator {
    #[serde(rename = ">")]
    GreaterThan,
    #[serde(rename = "<")]
    LessThan,
    #[serde(rename = ">=")]
    GreaterOrEqual,
    #[serde(rename = "<=")]
    LessOrEqual,
    #[serde(rename = "==")]
    Equal,
    #[serde(rename = "!=")]
    NotEqual,
}

impl ComparisonOperator {
    pub fn as_str(&self) -> &'static str {
        match self {
            ComparisonOperator::GreaterThan => ">",
            ComparisonOperator::LessThan => "<",
            ComparisonOperator::GreaterOrEqual => ">=",
            ComparisonOperator::LessOrEqual => "<=",
            ComparisonOperator::Equal => "==",
            ComparisonOperator::NotEqual => "!=",
        }
    }

    pub fn parse(raw_symbol: &str) -> Option<Self> {
        match raw_symbol {
            ">" => Some(ComparisonOperator::GreaterThan),
            "<" => Some(ComparisonOperator::LessThan),
            ">=" => Some(ComparisonOperator::GreaterOrEqual),
            "<=" => Some(ComparisonOperator::LessOrEqual),
            "==" => Some(ComparisonOperator::Equal),
            "!=" => Some(ComparisonOperator::NotEqual),
            _ => None,
        }
    }
}

/// Reducción de la ventana de muestras a un escalar.
#[typeshare]
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Aggregation {
    /// Muestra más reciente de la ventana (índice 0, orden descendente).
    #[default]
    Latest,
    Avg,
    Max,
    Min,
}

impl Aggregation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Aggregation::Latest => "latest",
            Aggregation::Avg => "avg",
            Aggregation::Max => "max",
            Aggregation::Min => "min",
        }
    }

    pub fn parse(raw_label: &str) -> Option<Self> {
        match raw_label {
            "latest" => Some(Aggregation::Latest),
            "avg" => Some(Aggregation::Avg),
            "max" => Some(Aggregation::Max),
            "min" => Some(Aggregation::Min),
            _ => None,
        }
    }
}

/// Variante etiquetada del predicado. Hoy existe una única variante
/// certificada (`threshold`); cualquier otra etiqueta colapsa en la
/// puerta de validación, preservando compatibilidad hacia adelante.
#[typeshare]
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum AlertCondition {
    Threshold {
        field: String,
        operator: ComparisonOperator,
        value: f64,
        #[serde(default)]
        aggregation: Aggregation,
    },
}

impl AlertCondition {
    /**
     * Puerta de validación del borde de la API.
     *
     * # Logic:
     * Certifica presencia y forma de `type`, `field`, `operator` y
     * `value` antes de construir la variante tipada. La agregación es
     * opcional y degrada a `latest`.
     *
     * # Errors:
     * Catálogo completo de `RuleValidationError`; ninguna condición
     * defectuosa sobrevive hasta el bucle de evaluación.
     */
    pub fn validate(raw_condition: &serde_json::Value) -> Result<Self, RuleValidationError> {
        let condition_object = raw_condition
            .as_object()
            .ok_or(RuleValidationError::NotAnObject)?;

        // 1. CERTIFICACIÓN DE TIPO DE PREDICADO
        let condition_type = condition_object
            .get("type")
            .and_then(|v| v.as_str())
            .ok_or(RuleValidationError::MissingField("type"))?;

        if condition_type != "threshold" {
            return Err(RuleValidationError::UnknownConditionType(
                condition_type.to_string(),
            ));
        }

        // 2. CERTIFICACIÓN DE CAMPOS OBLIGATORIOS
        let field = condition_object
            .get("field")
            .and_then(|v| v.as_str())
            .ok_or(RuleValidationError::MissingField("field"))?;

        let operator_symbol = condition_object
            .get("operator")
            .and_then(|v| v.as_str())
            .ok_or(RuleValidationError::MissingField("operator"))?;

        let operator = ComparisonOperator::parse(operator_symbol)
            .ok_or_else(|| RuleValidationError::UnknownOperator(operator_symbol.to_string()))?;

        let threshold_value = condition_object
            .get("value")
            .ok_or(RuleValidationError::MissingField("value"))?
            .as_f64()
            .ok_or(RuleValidationError::NonNumericValue)?;

        // 3. AGREGACIÓN OPCIONAL (degrada a 'latest')
        let aggregation = match condition_object.get("aggregation") {
            None | Some(serde_json::Value::Null) => Aggregation::Latest,
            Some(raw_aggregation) => {
                let label = raw_aggregation.as_str().unwrap_or_default();
                Aggregation::parse(label)
                    .ok_or_else(|| RuleValidationError::UnknownAggregation(label.to_string()))?
            }
        };

        Ok(AlertCondition::Threshold {
            field: field.to_string(),
            operator,
            value: threshold_value,
            aggregation,
        })
    }

    /// Forma legible `<aggregation>(<field>) <op> <value>` compartida
    /// por los renderizadores de notificación.
    pub fn describe(&self) -> String {
        let AlertCondition::Threshold {
            field,
            operator,
            value,
            aggregation,
        } = self;

        format!(
            "{}({}) {} {}",
            aggregation.as_str(),
            field,
            operator.as_str(),
            format_threshold(*value)
        )
    }
}

/// Formatea el umbral sin cola decimal espuria (50000.0 -> "50000").
fn format_threshold(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1.0e15 {
        format!("{}", value as i64)
    } else {
        format!("{}", value)
    }
}
