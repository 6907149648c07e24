// [apps/control-plane/src/services/mod.rs]
/*!
 * =================================================================
 * APARATO: BACKGROUND SERVICES BARREL (V4.0)
 * CLASIFICACIÓN: BACKGROUND INFRASTRUCTURE (ESTRATO L4)
 * RESPONSABILIDAD: TOPOLOGÍA DE DAEMONS DEL PLANO DE CONTROL
 * =================================================================
 */

/// Bucle perpetuo de evaluación de reglas activas.
pub mod alert_engine;
/// Despacho multicanal de alertas y contabilidad de entrega.
pub mod dispatcher;
/// Barrido de nivelación monitor <-> carga física.
pub mod reconciler;

pub use alert_engine::AlertEvaluationEngine;
pub use dispatcher::{DispatcherSettings, NotificationDispatcher};
pub use reconciler::WorkloadReconciler;
