// [libs/domain/rules/src/lib.rs]
/*!
 * =================================================================
 * APARATO: RULE PREDICATE ENGINE (V3.1 - PURE STRATA)
 * CLASIFICACIÓN: DOMAIN LOGIC (ESTRATO L2)
 * RESPONSABILIDAD: VALIDACIÓN Y EVALUACIÓN DE CONDICIONES DE ALERTA
 *
 * VISION HIPER-HOLÍSTICA 2026:
 * 1. BOUNDARY VALIDATION: Las condiciones de tipo desconocido se
 *    rechazan en el borde de la API; el evaluador solo recibe
 *    variantes certificadas.
 * 2. PURE ENGINE: `evaluate` es una función determinista sobre
 *    (condición, ventana); cero estado global, cero I/O.
 * 3. FLOAT DISCIPLINE: Igualdad y desigualdad con tolerancia
 *    absoluta ε = 10⁻³ para absorber ruido de agregación.
 * =================================================================
 */

pub mod condition;
pub mod evaluator;

pub use condition::{Aggregation, AlertCondition, ComparisonOperator, RuleValidationError};
pub use evaluator::evaluate;
