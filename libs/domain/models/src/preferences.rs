// [libs/domain/models/src/preferences.rs]

use serde::{Deserialize, Serialize};
use typeshare::typeshare;

/// Preferencias de notificación persistidas por operador. Los campos
/// ausentes heredan los valores por defecto del proceso (correo
/// habilitado, webhooks globales de configuración).
#[typeshare]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChannelPreferences {
    pub user_id: String,
    /// Correo habilitado por defecto para todo operador.
    pub email_enabled: bool,
    pub chat_block_webhook_url: Option<String>,
    pub chat_embed_webhook_url: Option<String>,
    pub chat_card_webhook_url: Option<String>,
}

impl ChannelPreferences {
    /// Preferencias de un operador sin fila persistida.
    pub fn defaults_for(user_id: &str) -> Self {
        Self {
            user_id: user_id.to_string(),
            email_enabled: true,
            chat_block_webhook_url: None,
            chat_embed_webhook_url: None,
            chat_card_webhook_url: None,
        }
    }
}
