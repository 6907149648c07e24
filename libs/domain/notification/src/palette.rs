// [libs/domain/notification/src/palette.rs]
/*!
 * =================================================================
 * APARATO: SEVERITY CHROMATIC MAP (V1.0 - NORMATIVE)
 * CLASIFICACIÓN: DOMAIN LOGIC (ESTRATO L2)
 * RESPONSABILIDAD: FUENTE ÚNICA DE VERDAD CROMÁTICA POR SEVERIDAD
 * =================================================================
 */

use vigil_domain_models::AlertSeverity;

/// Color aplicado cuando la severidad no resuelve (rutas defensivas
/// de renderizado sobre datos históricos).
pub const DEFAULT_COLOR_HEX: &str = "#666666";

/// Mapa normativo severidad -> color hexadecimal con almohadilla.
pub fn severity_color_hex(severity: AlertSeverity) -> &'static str {
    match severity {
        AlertSeverity::Low => "#28a745",
        AlertSeverity::Medium => "#ffc107",
        AlertSeverity::High => "#fd7e14",
        AlertSeverity::Critical => "#dc3545",
    }
}

/// Proyección del mismo mapa como entero de 24 bits (estilo embed).
pub fn severity_color_decimal(severity: AlertSeverity) -> u32 {
    match severity {
        AlertSeverity::Low => 0x28a745,
        AlertSeverity::Medium => 0xffc107,
        AlertSeverity::High => 0xfd7e14,
        AlertSeverity::Critical => 0xdc3545,
    }
}

/// Proyección sin almohadilla (campo `themeColor` del estilo card).
pub fn severity_theme_color(severity: AlertSeverity) -> &'static str {
    match severity {
        AlertSeverity::Low => "28a745",
        AlertSeverity::Medium => "ffc107",
        AlertSeverity::High => "fd7e14",
        AlertSeverity::Critical => "dc3545",
    }
}
