// [libs/domain/notification/src/channel.rs]

use serde::{Deserialize, Serialize};
use typeshare::typeshare;

/// Catálogo cerrado de canales de entrega. El nombre de cable es el
/// que se contabiliza en `delivered_channels`.
#[typeshare]
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "kebab-case")]
pub enum NotificationChannel {
    /// Proveedor externo de correo (API HTTP).
    Email,
    /// Webhook de chat estilo "block" (attachments con campos).
    ChatBlock,
    /// Webhook de chat estilo "embed" (color entero de 24 bits).
    ChatEmbed,
    /// Webhook de chat estilo "card" (tarjeta temática con facts).
    ChatCard,
}

impl NotificationChannel {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationChannel::Email => "email",
            NotificationChannel::ChatBlock => "chat-block",
            NotificationChannel::ChatEmbed => "chat-embed",
            NotificationChannel::ChatCard => "chat-card",
        }
    }
}
