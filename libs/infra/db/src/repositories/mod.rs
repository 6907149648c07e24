// [libs/infra/db/src/repositories/mod.rs]
/*!
 * =================================================================
 * APARATO: REPOSITORY ACCESS MATRIX (V4.0 - TOPOLOGY MASTER)
 * CLASIFICACIÓN: INFRASTRUCTURE LAYER (ESTRATO L3)
 * RESPONSABILIDAD: ORQUESTACIÓN DE SUBSISTEMAS DE PERSISTENCIA
 *
 * # Mathematical Proof (Modular Encapsulation):
 * El barrel actúa como interfaz galvánica: los sub-módulos quedan
 * aislados y solo las estructuras de autoridad (Repositories) se
 * exponen al exterior, reduciendo el acoplamiento sistémico.
 * =================================================================
 */

// --- ESTRATO 1: IDENTIDAD Y CREDENCIALES ---

/// Resolución y creación de operadores (ancla de multi-tenancy).
pub mod user;
/// Bóveda en reposo de credenciales cifradas.
pub mod secret;

// --- ESTRATO 2: DECLARACIÓN Y CICLO DE VIDA ---

/// Monitores: declaración, estado de despliegue y cascada de borrado.
pub mod monitor;

// --- ESTRATO 3: ALERTAMIENTO ---

/// Reglas declarativas y barrido de reglas activas.
pub mod alert_rule;
/// Rastro durable de disparos y contabilidad de entrega.
pub mod alert;
/// Preferencias de notificación por operador.
pub mod preferences;

// --- RE-EXPORTACIONES SOBERANAS (NOMINAL ACCESS API) ---

pub use alert::AlertRepository;
pub use alert_rule::AlertRuleRepository;
pub use monitor::MonitorRepository;
pub use preferences::PreferenceRepository;
pub use secret::SecretRepository;
pub use user::UserRepository;
