// [libs/domain/notification/src/lib.rs]
/*!
 * =================================================================
 * APARATO: HERALD NOTIFICATION ENGINE (V4.0 - MULTI-CHANNEL)
 * CLASIFICACIÓN: DOMAIN LOGIC (ESTRATO L2)
 * RESPONSABILIDAD: GRAMÁTICA INMUTABLE DE SEÑALES POR CANAL
 *
 * VISION HIPER-HOLÍSTICA 2026:
 * 1. CONTRACT SOVEREIGNTY: Define las cargas bit-exactas que viajan
 *    hacia el proveedor de correo y los webhooks de chat.
 * 2. CHROMATIC SINGLE SOURCE: El mapa severidad -> color vive aquí y
 *    solo aquí; todos los canales lo derivan.
 * 3. PURE RENDERERS: Cero I/O. El despachador del plano de control
 *    aporta el transporte; este estrato aporta la forma.
 * =================================================================
 */

pub mod channel;
pub mod palette;
pub mod render;

pub use channel::NotificationChannel;
pub use palette::{
    severity_color_decimal, severity_color_hex, severity_theme_color, DEFAULT_COLOR_HEX,
};
pub use render::{
    render_chat_block, render_chat_card, render_chat_embed, render_email, AlertSignalContext,
    EmailArtifact,
};
