// [libs/infra/db/src/repositories/preferences.rs]
/*!
 * =================================================================
 * APARATO: NOTIFICATION PREFERENCES REPOSITORY (V1.0)
 * CLASIFICACIÓN: INFRASTRUCTURE ADAPTER (ESTRATO L3)
 * RESPONSABILIDAD: PREFERENCIAS DE CANAL POR OPERADOR
 *
 * La fila es opcional: un operador sin registro hereda los valores
 * por defecto del proceso en el despachador.
 * =================================================================
 */

use crate::errors::DbError;
use crate::mapping::format_timestamp;
use crate::TursoClient;
use chrono::Utc;
use libsql::params;
use tracing::instrument;
use vigil_domain_models::ChannelPreferences;

pub struct PreferenceRepository {
    database_client: TursoClient,
}

impl PreferenceRepository {
    pub fn new(client: TursoClient) -> Self {
        Self { database_client: client }
    }

    #[instrument(skip(self))]
    pub async fn fetch_for_user(
        &self,
        user_id: &str,
    ) -> Result<Option<ChannelPreferences>, DbError> {
        let connection = self.database_client.get_connection()?;

        let mut rows = connection
            .query(
                "SELECT user_id, email_enabled, chat_block_webhook_url,
                        chat_embed_webhook_url, chat_card_webhook_url
                 FROM notification_preferences WHERE user_id = ?1",
                params![user_id.to_string()],
            )
            .await?;

        match rows.next().await? {
            Some(row) => {
                let email_enabled_flag: i64 = row.get(1)?;
                Ok(Some(ChannelPreferences {
                    user_id: row.get(0)?,
                    email_enabled: email_enabled_flag != 0,
                    chat_block_webhook_url: row.get(2)?,
                    chat_embed_webhook_url: row.get(3)?,
                    chat_card_webhook_url: row.get(4)?,
                }))
            }
            None => Ok(None),
        }
    }

    /// Alta o reemplazo total de la fila de preferencias.
    #[instrument(skip(self, preferences))]
    pub async fn upsert(&self, preferences: &ChannelPreferences) -> Result<(), DbError> {
        let connection = self.database_client.get_connection()?;

        connection
            .execute(
                "INSERT INTO notification_preferences
                    (user_id, email_enabled, chat_block_webhook_url,
                     chat_embed_webhook_url, chat_card_webhook_url, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                 ON CONFLICT(user_id) DO UPDATE SET
                    email_enabled = excluded.email_enabled,
                    chat_block_webhook_url = excluded.chat_block_webhook_url,
                    chat_embed_webhook_url = excluded.chat_embed_webhook_url,
                    chat_card_webhook_url = excluded.chat_card_webhook_url,
                    updated_at = excluded.updated_at",
                params![
                    preferences.user_id.clone(),
                    preferences.email_enabled as i64,
                    preferences.chat_block_webhook_url.clone(),
                    preferences.chat_embed_webhook_url.clone(),
                    preferences.chat_card_webhook_url.clone(),
                    format_timestamp(Utc::now())
                ],
            )
            .await?;

        Ok(())
    }
}
