// [libs/domain/models/src/identifier.rs]
/*!
 * =================================================================
 * APARATO: ENTITY IDENTIFIER FORGE (V1.2)
 * CLASIFICACIÓN: DOMAIN MODELS (ESTRATO L2)
 * RESPONSABILIDAD: ACUÑACIÓN DE IDENTIFICADORES OPACOS PREFIJADOS
 * =================================================================
 */

use uuid::Uuid;

pub const USER_PREFIX: &str = "usr";
pub const SECRET_PREFIX: &str = "sec";
pub const MONITOR_PREFIX: &str = "mon";
pub const RULE_PREFIX: &str = "rule";
pub const ALERT_PREFIX: &str = "alert";

/// Longitud del segmento hexadecimal tomado del UUIDv4.
const IDENTIFIER_HEX_LENGTH: usize = 8;

/**
 * Acuña un identificador opaco con prefijo semántico (ej: `mon_4fa91c02`).
 *
 * # Mathematical Proof:
 * 8 caracteres hexadecimales del UUIDv4 proveen 32 bits de entropía,
 * suficientes para el cardinal de entidades por despliegue sin
 * colisiones prácticas dentro de un mismo prefijo.
 */
pub fn generate_entity_identifier(semantic_prefix: &str) -> String {
    let uuid_hex = Uuid::new_v4().simple().to_string();
    format!("{}_{}", semantic_prefix, &uuid_hex[..IDENTIFIER_HEX_LENGTH])
}
