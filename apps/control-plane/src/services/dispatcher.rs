// [apps/control-plane/src/services/dispatcher.rs]
/*!
 * =================================================================
 * APARATO: HERALD MULTI-CHANNEL DISPATCHER (V4.2 - FAN-OUT)
 * CLASIFICACIÓN: BACKGROUND INFRASTRUCTURE SERVICE (ESTRATO L4)
 * RESPONSABILIDAD: ENTREGA CONCURRENTE Y CONTABILIDAD POR CANAL
 *
 * VISION HIPER-HOLÍSTICA 2026:
 * 1. LONG-LIVED UPLINK: Un único cliente HTTP de proceso, forjado en
 *    la ignición y liberado solo en el apagado; jamás se envuelve en
 *    bloques de adquisición por envío.
 * 2. CONCURRENT SETTLEMENT: Todos los canales habilitados disparan
 *    en paralelo y el despachador espera a que TODOS concluyan antes
 *    de sellar la contabilidad en el Ledger.
 * 3. EXACT ACCOUNTING: `delivered_channels` = canales con 2xx; el
 *    estado final es delivered si el conjunto no es vacío, failed en
 *    caso contrario. Sin reintentos en el núcleo.
 * =================================================================
 */

use chrono::Utc;
use futures::future::BoxFuture;
use futures::FutureExt;
use reqwest::Client;
use std::time::Duration;
use tracing::{error, info, instrument};
use vigil_domain_models::{Alert, AlertRule, ChannelPreferences, Monitor, User};
use vigil_domain_notification::{
    render_chat_block, render_chat_card, render_chat_embed, render_email, AlertSignalContext,
    NotificationChannel,
};
use vigil_domain_rules::AlertCondition;
use vigil_infra_db::repositories::{AlertRepository, PreferenceRepository, UserRepository};
use vigil_infra_db::TursoClient;

/// Presupuesto total por POST de canal.
const CHANNEL_POST_TIMEOUT_SECONDS: u64 = 30;

/// Valores de proceso que completan las preferencias por operador.
#[derive(Debug, Clone)]
pub struct DispatcherSettings {
    pub mail_api_key: Option<String>,
    pub mail_endpoint: String,
    pub mail_sender: String,
    pub default_block_webhook_url: Option<String>,
    pub default_embed_webhook_url: Option<String>,
    pub default_card_webhook_url: Option<String>,
}

impl DispatcherSettings {
    pub fn mail_provider_default_endpoint() -> String {
        "https://api.sendgrid.com/v3/mail/send".to_string()
    }
}

pub struct NotificationDispatcher {
    /// Recurso de proceso compartido; cerrado solo en el apagado.
    network_uplink_client: Client,
    database_client: TursoClient,
    settings: DispatcherSettings,
}

impl NotificationDispatcher {
    pub fn new(database_client: TursoClient, settings: DispatcherSettings) -> Self {
        Self {
            network_uplink_client: Client::builder()
                .timeout(Duration::from_secs(CHANNEL_POST_TIMEOUT_SECONDS))
                .tcp_keepalive(Some(Duration::from_secs(60)))
                .user_agent("Vigil-Herald-Dispatcher/V4.2")
                .build()
                .expect("FATAL: Herald uplink client initialization failed."),
            database_client,
            settings,
        }
    }

    /**
     * Despacha una alerta recién cristalizada a todos los canales
     * habilitados y sella la contabilidad de entrega.
     *
     * # Logic:
     * Los fallos por canal quedan aislados: un canal caído no afecta
     * a los demás ni revierte la fila de la alerta.
     */
    #[instrument(skip(self, alert, monitor, rule), fields(alert_id = %alert.id))]
    pub async fn dispatch_alert(
        &self,
        alert: &Alert,
        monitor: &Monitor,
        rule: &AlertRule,
    ) -> anyhow::Result<()> {
        info!("📢 [HERALD]: Fan-out initiated for alert {}.", alert.id);

        // 1. RESOLUCIÓN DEL OPERADOR DESTINATARIO
        let user_repository = UserRepository::new(self.database_client.clone());
        let operator = match user_repository.fetch_by_id(&alert.user_id).await? {
            Some(operator) => operator,
            None => {
                error!("❌ [HERALD]: Operator {} vanished; alert {} undeliverable.", alert.user_id, alert.id);
                return Ok(());
            }
        };

        // 2. PREFERENCIAS EFECTIVAS (fila del operador + defaults de proceso)
        let preference_repository = PreferenceRepository::new(self.database_client.clone());
        let stored_preferences = preference_repository
            .fetch_for_user(&alert.user_id)
            .await?
            .unwrap_or_else(|| ChannelPreferences::defaults_for(&alert.user_id));

        // 3. CONTEXTO DE RENDERIZADO
        let condition = match AlertCondition::validate(&rule.condition) {
            Ok(condition) => condition,
            Err(validation_drift) => {
                error!("❌ [HERALD]: Rule {} carries a corrupt condition: {}", rule.id, validation_drift);
                return Ok(());
            }
        };

        let signal_context = AlertSignalContext {
            alert_id: alert.id.clone(),
            rule_title: rule.title.clone(),
            monitor_name: monitor.name.clone(),
            severity: alert.severity,
            triggered_at: alert.created_at,
            latest_field_value: extract_latest_field_value(alert, &condition),
            condition,
        };

        // 4. FAN-OUT CONCURRENTE POR CANAL HABILITADO
        let mut channel_transmissions: Vec<
            BoxFuture<'_, (NotificationChannel, Result<(), String>)>,
        > = Vec::new();

        if stored_preferences.email_enabled && self.settings.mail_api_key.is_some() {
            let context = signal_context.clone();
            let recipient = operator.clone();
            channel_transmissions.push(
                async move {
                    (
                        NotificationChannel::Email,
                        self.transmit_email(&context, &recipient).await,
                    )
                }
                .boxed(),
            );
        }

        for (channel, webhook_url) in [
            (
                NotificationChannel::ChatBlock,
                stored_preferences
                    .chat_block_webhook_url
                    .clone()
                    .or_else(|| self.settings.default_block_webhook_url.clone()),
            ),
            (
                NotificationChannel::ChatEmbed,
                stored_preferences
                    .chat_embed_webhook_url
                    .clone()
                    .or_else(|| self.settings.default_embed_webhook_url.clone()),
            ),
            (
                NotificationChannel::ChatCard,
                stored_preferences
                    .chat_card_webhook_url
                    .clone()
                    .or_else(|| self.settings.default_card_webhook_url.clone()),
            ),
        ] {
            let Some(url) = webhook_url else { continue };
            let context = signal_context.clone();

            channel_transmissions.push(
                async move {
                    let payload = match channel {
                        NotificationChannel::ChatBlock => render_chat_block(&context),
                        NotificationChannel::ChatEmbed => render_chat_embed(&context),
                        NotificationChannel::ChatCard => render_chat_card(&context),
                        NotificationChannel::Email => unreachable!("email runs its own path"),
                    };
                    (channel, self.transmit_webhook(&url, &payload).await)
                }
                .boxed(),
            );
        }

        let settlement = futures::future::join_all(channel_transmissions).await;

        // 5. CONTABILIDAD EXACTA DE ENTREGA
        let mut confirmed_channels = Vec::new();
        for (channel, verdict) in settlement {
            match verdict {
                Ok(()) => {
                    info!("✅ [HERALD]: Channel {} confirmed for alert {}.", channel.as_str(), alert.id);
                    confirmed_channels.push(channel.as_str().to_string());
                }
                Err(channel_fault) => {
                    error!(
                        "❌ [HERALD]: Channel {} failed for alert {}: {}",
                        channel.as_str(),
                        alert.id,
                        channel_fault
                    );
                }
            }
        }

        let alert_repository = AlertRepository::new(self.database_client.clone());
        alert_repository
            .record_delivery_outcome(&alert.id, &confirmed_channels, Utc::now())
            .await?;

        info!(
            "📗 [HERALD]: Delivery sealed for alert {}. Confirmed: {:?}",
            alert.id, confirmed_channels
        );
        Ok(())
    }

    /// POST hacia la API del proveedor de correo (cuerpo HTML).
    async fn transmit_email(
        &self,
        signal_context: &AlertSignalContext,
        recipient: &User,
    ) -> Result<(), String> {
        let Some(api_key) = self.settings.mail_api_key.as_ref() else {
            return Err("MAIL_PROVIDER_UNCONFIGURED".to_string());
        };

        let artifact = render_email(signal_context);

        let provider_payload = serde_json::json!({
            "personalizations": [{"to": [{"email": recipient.email}]}],
            "from": {"email": self.settings.mail_sender},
            "subject": artifact.subject,
            "content": [{"type": "text/html", "value": artifact.html_body}],
        });

        let response = self
            .network_uplink_client
            .post(&self.settings.mail_endpoint)
            .bearer_auth(api_key)
            .json(&provider_payload)
            .send()
            .await
            .map_err(|fault| format!("TRANSPORT_FAULT: {}", fault))?;

        if response.status().is_success() {
            Ok(())
        } else {
            Err(format!("HTTP_{}", response.status()))
        }
    }

    /// POST único hacia un webhook de chat; 2xx cuenta como entrega.
    async fn transmit_webhook(
        &self,
        webhook_url: &str,
        payload: &serde_json::Value,
    ) -> Result<(), String> {
        let response = self
            .network_uplink_client
            .post(webhook_url)
            .json(payload)
            .send()
            .await
            .map_err(|fault| format!("TRANSPORT_FAULT: {}", fault))?;

        if response.status().is_success() {
            Ok(())
        } else {
            Err(format!("HTTP_{}", response.status()))
        }
    }
}

/**
 * Extrae el valor del campo vigilado desde la muestra más reciente
 * del snapshot detonante (`data.trigger_data[0]`).
 */
fn extract_latest_field_value(alert: &Alert, condition: &AlertCondition) -> Option<f64> {
    let AlertCondition::Threshold { field, .. } = condition;

    alert
        .data
        .get("trigger_data")
        .and_then(|trigger_data| trigger_data.get(0))
        .and_then(|latest_sample| latest_sample.get("fields"))
        .and_then(|fields| fields.get(field))
        .and_then(|value| value.as_f64())
}
