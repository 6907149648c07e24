// [libs/domain/notification/src/render.rs]
/*!
 * =================================================================
 * APARATO: CHANNEL PAYLOAD RENDERERS (V4.0 - BIT-EXACT)
 * CLASIFICACIÓN: DOMAIN LOGIC (ESTRATO L2)
 * RESPONSABILIDAD: PROYECCIÓN DE UNA ALERTA A CADA DIALECTO DE CANAL
 *
 * VISION HIPER-HOLÍSTICA 2026:
 * 1. BLOCK: Attachment cromático con campos y timestamp en segundos
 *    Unix.
 * 2. EMBED: Color entero de 24 bits, condición en bloque de código
 *    (no inline), timestamp ISO-8601.
 * 3. CARD: Tarjeta temática con summary, sección y facts nominales.
 * 4. EMAIL: Cuerpo HTML auto-contenido con severidad cromática y el
 *    último valor detonante.
 * =================================================================
 */

use crate::palette::{severity_color_decimal, severity_color_hex, severity_theme_color};
use chrono::{DateTime, Utc};
use serde_json::{json, Value};
use vigil_domain_models::AlertSeverity;
use vigil_domain_rules::AlertCondition;

/// Base pública del Dashboard para enlaces profundos de alerta.
const DASHBOARD_ALERT_BASE_URL: &str = "https://dashboard.vigil.dev/alerts";
/// Firma de pie de página común a los canales de chat.
const HERALD_FOOTER_SIGNATURE: &str = "Vigil Monitoring";
/// Remitente nominal de las señales de correo.
const EMAIL_SENDER_DISPLAY_NAME: &str = "Vigil Alerts";

/// Contexto inmutable de renderizado: todo lo que un canal necesita
/// para proyectar la señal, sin tocar I/O ni estado global.
#[derive(Debug, Clone)]
pub struct AlertSignalContext {
    pub alert_id: String,
    pub rule_title: String,
    pub monitor_name: String,
    pub severity: AlertSeverity,
    pub triggered_at: DateTime<Utc>,
    pub condition: AlertCondition,
    /// Valor del campo vigilado en la muestra más reciente del disparo.
    pub latest_field_value: Option<f64>,
}

/// Artefacto de correo listo para el proveedor HTTP.
#[derive(Debug, Clone, PartialEq)]
pub struct EmailArtifact {
    pub subject: String,
    pub html_body: String,
}

impl AlertSignalContext {
    fn triggered_human_utc(&self) -> String {
        self.triggered_at.format("%Y-%m-%d %H:%M:%S UTC").to_string()
    }

    fn severity_label_upper(&self) -> String {
        self.severity.as_str().to_uppercase()
    }

    fn latest_value_display(&self) -> String {
        match self.latest_field_value {
            Some(value) if value.fract() == 0.0 && value.abs() < 1.0e15 => {
                format!("{}", value as i64)
            }
            Some(value) => format!("{}", value),
            None => "N/A".to_string(),
        }
    }

    fn condition_code_span(&self) -> String {
        format!("`{}`", self.condition.describe())
    }
}

/**
 * Renderiza la carga estilo "block": attachment cromático con campos
 * {monitor, severity, condition, triggered} y timestamp Unix.
 */
pub fn render_chat_block(signal: &AlertSignalContext) -> Value {
    json!({
        "attachments": [
            {
                "color": severity_color_hex(signal.severity),
                "title": format!("🚨 {}", signal.rule_title),
                "title_link": format!("{}/{}", DASHBOARD_ALERT_BASE_URL, signal.alert_id),
                "fields": [
                    {"title": "Monitor", "value": signal.monitor_name, "short": true},
                    {"title": "Severity", "value": signal.severity_label_upper(), "short": true},
                    {"title": "Condition", "value": signal.condition_code_span(), "short": false},
                    {"title": "Triggered", "value": signal.triggered_human_utc(), "short": true},
                ],
                "footer": HERALD_FOOTER_SIGNATURE,
                "ts": signal.triggered_at.timestamp(),
            }
        ]
    })
}

/**
 * Renderiza la carga estilo "embed": color entero de 24 bits, campos
 * inline salvo la condición (bloque de código), timestamp ISO-8601.
 */
pub fn render_chat_embed(signal: &AlertSignalContext) -> Value {
    json!({
        "embeds": [
            {
                "title": format!("🚨 {}", signal.rule_title),
                "color": severity_color_decimal(signal.severity),
                "fields": [
                    {"name": "Monitor", "value": signal.monitor_name, "inline": true},
                    {"name": "Severity", "value": signal.severity_label_upper(), "inline": true},
                    {
                        "name": "Condition",
                        "value": format!("```{}```", signal.condition.describe()),
                        "inline": false
                    },
                ],
                "footer": {"text": HERALD_FOOTER_SIGNATURE},
                "timestamp": signal.triggered_at.to_rfc3339(),
            }
        ]
    })
}

/**
 * Renderiza la carga estilo "card": tarjeta temática con summary,
 * título/subtítulo de sección y facts nominales.
 */
pub fn render_chat_card(signal: &AlertSignalContext) -> Value {
    json!({
        "@type": "MessageCard",
        "@context": "http://schema.org/extensions",
        "themeColor": severity_theme_color(signal.severity),
        "summary": format!("Alert: {}", signal.rule_title),
        "sections": [
            {
                "activityTitle": format!("🚨 {}", signal.rule_title),
                "activitySubtitle": format!("Monitor: {}", signal.monitor_name),
                "facts": [
                    {"name": "Severity", "value": signal.severity_label_upper()},
                    {"name": "Condition", "value": signal.condition_code_span()},
                    {"name": "Triggered", "value": signal.triggered_human_utc()},
                ],
                "markdown": true,
            }
        ]
    })
}

/**
 * Renderiza el correo HTML auto-contenido.
 *
 * # Logic:
 * El cuerpo porta título de regla, monitor, severidad con su color
 * normativo, hora de disparo en UTC, último valor detonante y la
 * condición en tipografía monoespaciada. Sin recursos externos.
 */
pub fn render_email(signal: &AlertSignalContext) -> EmailArtifact {
    let severity_color = severity_color_hex(signal.severity);

    let html_body = format!(
        r#"<html>
<body style="font-family: Arial, sans-serif; max-width: 600px; margin: 0 auto;">
    <div style="background: linear-gradient(135deg, #667eea 0%, #764ba2 100%); color: white; padding: 20px; border-radius: 8px 8px 0 0;">
        <h1 style="margin: 0; font-size: 24px;">🚨 Monitor Alert</h1>
        <p style="margin: 5px 0 0 0; opacity: 0.9;">{rule_title}</p>
    </div>

    <div style="background: white; padding: 20px; border: 1px solid #e1e5e9; border-radius: 0 0 8px 8px;">
        <div style="background: #f8f9fa; padding: 15px; border-radius: 6px; margin-bottom: 20px;">
            <h3 style="margin: 0 0 10px 0; color: #333;">Alert Details</h3>
            <p><strong>Monitor:</strong> {monitor_name}</p>
            <p><strong>Severity:</strong> <span style="color: {severity_color}; font-weight: bold;">{severity_upper}</span></p>
            <p><strong>Triggered:</strong> {triggered_utc}</p>
            <p><strong>Current Value:</strong> {latest_value}</p>
        </div>

        <div style="margin-bottom: 20px;">
            <h4 style="color: #333; margin-bottom: 10px;">Condition</h4>
            <div style="background: #e9ecef; padding: 10px; border-radius: 4px; font-family: monospace; font-size: 14px;">
                {condition_description}
            </div>
        </div>

        <div style="border-top: 1px solid #e1e5e9; padding-top: 15px; font-size: 12px; color: #666;">
            <p>This alert was generated by {sender_name}.</p>
            <p>Alert ID: {alert_id}</p>
        </div>
    </div>
</body>
</html>"#,
        rule_title = signal.rule_title,
        monitor_name = signal.monitor_name,
        severity_color = severity_color,
        severity_upper = signal.severity_label_upper(),
        triggered_utc = signal.triggered_human_utc(),
        latest_value = signal.latest_value_display(),
        condition_description = signal.condition.describe(),
        sender_name = EMAIL_SENDER_DISPLAY_NAME,
        alert_id = signal.alert_id,
    );

    EmailArtifact {
        subject: format!("🚨 Alert: {}", signal.rule_title),
        html_body,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use vigil_domain_rules::{Aggregation, ComparisonOperator};

    fn forge_signal() -> AlertSignalContext {
        AlertSignalContext {
            alert_id: "alert_0badc0de".into(),
            rule_title: "BTC above ceiling".into(),
            monitor_name: "btc-ticker".into(),
            severity: AlertSeverity::High,
            triggered_at: Utc.with_ymd_and_hms(2026, 3, 1, 12, 30, 45).unwrap(),
            condition: AlertCondition::Threshold {
                field: "price".into(),
                operator: ComparisonOperator::GreaterThan,
                value: 50000.0,
                aggregation: Aggregation::Latest,
            },
            latest_field_value: Some(51000.0),
        }
    }

    #[test]
    fn certify_block_payload_shape() {
        let payload = render_chat_block(&forge_signal());
        let attachment = &payload["attachments"][0];

        assert_eq!(attachment["color"], "#fd7e14");
        assert_eq!(attachment["title"], "🚨 BTC above ceiling");
        assert_eq!(attachment["fields"][0]["value"], "btc-ticker");
        assert_eq!(attachment["fields"][1]["value"], "HIGH");
        assert_eq!(attachment["fields"][2]["value"], "`latest(price) > 50000`");
        assert_eq!(attachment["fields"][2]["short"], false);
        assert_eq!(attachment["fields"][3]["value"], "2026-03-01 12:30:45 UTC");
        // Timestamp como segundos Unix
        assert_eq!(attachment["ts"], 1772368245i64);
    }

    #[test]
    fn certify_embed_payload_shape() {
        let payload = render_chat_embed(&forge_signal());
        let embed = &payload["embeds"][0];

        // Color como entero de 24 bits
        assert_eq!(embed["color"], 0xfd7e14);
        assert_eq!(embed["fields"][0]["inline"], true);
        assert_eq!(embed["fields"][1]["inline"], true);
        assert_eq!(embed["fields"][2]["inline"], false);
        assert_eq!(embed["fields"][2]["value"], "```latest(price) > 50000```");
        // Timestamp ISO-8601
        assert_eq!(embed["timestamp"], "2026-03-01T12:30:45+00:00");
    }

    #[test]
    fn certify_card_payload_shape() {
        let payload = render_chat_card(&forge_signal());

        assert_eq!(payload["@type"], "MessageCard");
        assert_eq!(payload["themeColor"], "fd7e14");
        assert_eq!(payload["summary"], "Alert: BTC above ceiling");

        let section = &payload["sections"][0];
        assert_eq!(section["activitySubtitle"], "Monitor: btc-ticker");
        assert_eq!(section["facts"][0]["value"], "HIGH");
        assert_eq!(section["facts"][1]["value"], "`latest(price) > 50000`");
    }

    #[test]
    fn certify_email_artifact() {
        let artifact = render_email(&forge_signal());

        assert_eq!(artifact.subject, "🚨 Alert: BTC above ceiling");
        assert!(artifact.html_body.contains("btc-ticker"));
        assert!(artifact.html_body.contains("color: #fd7e14"));
        assert!(artifact.html_body.contains("latest(price) > 50000"));
        assert!(artifact.html_body.contains("<strong>Current Value:</strong> 51000"));
        assert!(artifact.html_body.contains("Alert ID: alert_0badc0de"));
    }

    #[test]
    fn certify_missing_latest_value_degrades_to_na() {
        let mut signal = forge_signal();
        signal.latest_field_value = None;

        let artifact = render_email(&signal);
        assert!(artifact.html_body.contains("<strong>Current Value:</strong> N/A"));
    }
}
