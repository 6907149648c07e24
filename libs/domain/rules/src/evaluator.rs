// [libs/domain/rules/src/evaluator.rs]
/*!
 * =================================================================
 * APARATO: WINDOW PREDICATE EVALUATOR (V3.1 - PURE)
 * CLASIFICACIÓN: DOMAIN LOGIC (ESTRATO L2)
 * RESPONSABILIDAD: REDUCCIÓN Y COMPARACIÓN DE VENTANAS DE MUESTRAS
 *
 * # Mathematical Proof (Determinism):
 * La función depende exclusivamente de sus argumentos. La ventana
 * llega ordenada por tiempo descendente, por lo que `latest` es el
 * elemento en el índice cero; avg/max/min son pliegues asociativos
 * sobre los valores extraídos.
 * =================================================================
 */

use crate::condition::{Aggregation, AlertCondition, ComparisonOperator};
use vigil_domain_models::Sample;

/// Tolerancia absoluta para igualdad/desigualdad de flotantes.
const FLOAT_EQUALITY_TOLERANCE: f64 = 1.0e-3;

/**
 * Evalúa un predicado certificado contra una ventana de muestras
 * (más reciente primero).
 *
 * # Logic:
 * 1. Ventana vacía -> falso.
 * 2. Extracción de valores numéricos del campo (las muestras sin el
 *    campo se descartan); lista vacía -> falso.
 * 3. Reducción por agregación y comparación contra el umbral.
 */
pub fn evaluate(condition: &AlertCondition, sample_window: &[Sample]) -> bool {
    if sample_window.is_empty() {
        return false;
    }

    let AlertCondition::Threshold {
        field,
        operator,
        value: threshold_value,
        aggregation,
    } = condition;

    // 1. EXTRACCIÓN DE VALORES DEL CAMPO OBJETIVO
    let field_values: Vec<f64> = sample_window
        .iter()
        .filter_map(|sample| sample.numeric_field(field))
        .collect();

    if field_values.is_empty() {
        return false;
    }

    // 2. REDUCCIÓN A ESCALAR
    let aggregated_value = match aggregation {
        Aggregation::Latest => field_values[0],
        Aggregation::Avg => field_values.iter().sum::<f64>() / field_values.len() as f64,
        Aggregation::Max => field_values.iter().copied().fold(f64::MIN, f64::max),
        Aggregation::Min => field_values.iter().copied().fold(f64::MAX, f64::min),
    };

    // 3. VEREDICTO CONTRA EL UMBRAL
    match operator {
        ComparisonOperator::GreaterThan => aggregated_value > *threshold_value,
        ComparisonOperator::LessThan => aggregated_value < *threshold_value,
        ComparisonOperator::GreaterOrEqual => aggregated_value >= *threshold_value,
        ComparisonOperator::LessOrEqual => aggregated_value <= *threshold_value,
        ComparisonOperator::Equal => {
            (aggregated_value - threshold_value).abs() < FLOAT_EQUALITY_TOLERANCE
        }
        ComparisonOperator::NotEqual => {
            (aggregated_value - threshold_value).abs() >= FLOAT_EQUALITY_TOLERANCE
        }
    }
}
