// [libs/infra/db/src/lib.rs]
/*!
 * =================================================================
 * APARATO: RELATIONAL LEDGER GATEWAY (V4.0)
 * CLASIFICACIÓN: INFRASTRUCTURE LAYER (ESTRATO L3)
 * RESPONSABILIDAD: PUERTA DE ENLACE ÚNICA HACIA EL LEDGER RELACIONAL
 * =================================================================
 */

pub mod client;
pub mod errors;
pub mod mapping;
pub mod repositories;
pub mod schema;

pub use client::TursoClient;
pub use errors::DbError;
