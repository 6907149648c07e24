// [libs/infra/db/src/errors.rs]
/*!
 * =================================================================
 * APARATO: LEDGER ERROR CATALOG (V4.0 - SOBERANO)
 * CLASIFICACIÓN: INFRASTRUCTURE CORE (ESTRATO L3)
 * RESPONSABILIDAD: CATALOGACIÓN SEMÁNTICA DE FALLOS DE PERSISTENCIA
 *
 * VISION HIPER-HOLÍSTICA 2026:
 * 1. CONFIGURATION AWARENESS: Distingue entre fallos de red y
 *    variables de entorno vacías o malformadas.
 * 2. MERGED VISIBILITY: 'EntityNotFound' cubre tanto la ausencia
 *    física como la falta de propiedad; el borde de la API no
 *    filtra cuál de las dos ocurrió.
 * 3. ZERO ABBREVIATIONS: Nomenclatura nominal absoluta.
 * =================================================================
 */

use thiserror::Error;

#[derive(Error, Debug)]
pub enum DbError {
    /// Error de enlace físico o de red con el cluster relacional.
    #[error("[L3_DB_NET_FAULT]: DATABASE_UPLINK_SEVERED -> {0}")]
    ConnectionError(String),

    /// Fallo en la configuración del entorno (variables vacías o malformadas).
    #[error("[L3_DB_CONFIG_FAULT]: ENVIRONMENT_VOID -> {0}")]
    ConfigurationError(String),

    /// Error de sintaxis o ejecución devuelto por el motor libSQL.
    #[error("[L3_DB_QUERY_FAULT]: SQL_QUERY_REJECTED -> {0}")]
    QueryError(#[from] libsql::Error),

    /// Fallo en la transformación de tipos entre SQLite y el Dominio Rust.
    #[error("[L3_DB_MAPPING_FAULT]: DATA_MAPPING_VIOLATION -> {0}")]
    MappingError(String),

    /// La entidad no existe o no pertenece al operador solicitante.
    /// Ambos casos colapsan en el mismo veredicto hacia el exterior.
    #[error("[L3_DB_FAULT]: ENTITY_NOT_FOUND_OR_FOREIGN")]
    EntityNotFound,

    /// Violación de unicidad (ej. correo de operador duplicado).
    #[error("[L3_DB_FAULT]: UNIQUENESS_VIOLATION -> {0}")]
    UniquenessViolation(String),

    /// Error al comprometer cambios en una secuencia multi-tabla.
    #[error("[L3_DB_FAULT]: TRANSACTION_COLLAPSE -> {0}")]
    TransactionError(String),
}
