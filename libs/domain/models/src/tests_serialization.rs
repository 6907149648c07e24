// [libs/domain/models/src/tests_serialization.rs]
/*!
 * =================================================================
 * APARATO: CERTIFICADOR DE CONTRATOS DE DOMINIO (V1.1)
 * CLASIFICACIÓN: TRINITY EVIDENCE // ESTRATO L2-MIRROR
 * RESPONSABILIDAD: PARIDAD DE SERIALIZACIÓN CON EL DASHBOARD
 *
 * # Mathematical Proof (Wire Parity):
 * Los enums del dominio viajan en minúsculas hacia el Dashboard y el
 * Ledger. Cualquier deriva en el etiquetado rompería la contabilidad
 * de severidades y estados; este certificador la detecta en frío.
 * =================================================================
 */

use vigil_domain_models::{
    AlertSeverity, AlertStatus, ChannelPreferences, MonitorStatus, Sample, UserTier,
};

#[test]
fn certify_severity_wire_labels() {
    for (variant, label) in [
        (AlertSeverity::Low, "\"low\""),
        (AlertSeverity::Medium, "\"medium\""),
        (AlertSeverity::High, "\"high\""),
        (AlertSeverity::Critical, "\"critical\""),
    ] {
        assert_eq!(serde_json::to_string(&variant).unwrap(), label);
        assert_eq!(AlertSeverity::parse(variant.as_str()), Some(variant));
    }

    assert_eq!(AlertSeverity::parse("catastrophic"), None);
}

#[test]
fn certify_status_wire_labels() {
    for (variant, label) in [
        (AlertStatus::Pending, "pending"),
        (AlertStatus::Delivered, "delivered"),
        (AlertStatus::Failed, "failed"),
        (AlertStatus::Acknowledged, "acknowledged"),
    ] {
        assert_eq!(variant.as_str(), label);
        assert_eq!(AlertStatus::parse(label), Some(variant));
    }

    for (variant, label) in [
        (MonitorStatus::Starting, "starting"),
        (MonitorStatus::Deploying, "deploying"),
        (MonitorStatus::Running, "running"),
        (MonitorStatus::Error, "error"),
    ] {
        assert_eq!(variant.as_str(), label);
        assert_eq!(MonitorStatus::parse(label), Some(variant));
    }

    assert_eq!(UserTier::parse("pro"), Some(UserTier::Pro));
    assert_eq!(UserTier::parse("platinum"), None);
}

#[test]
fn certify_sample_round_trip() {
    let raw_frame = serde_json::json!({
        "monitor_id": "mon_cafe0001",
        "recorded_at": "2026-03-01T12:00:00Z",
        "tags": {"symbol": "BTC"},
        "fields": {"price": 51000.0, "is_up": 1.0}
    });

    let sample: Sample = serde_json::from_value(raw_frame).unwrap();
    assert_eq!(sample.numeric_field("price"), Some(51000.0));
    assert_eq!(sample.numeric_field("volume"), None);

    let round_trip: Sample =
        serde_json::from_str(&serde_json::to_string(&sample).unwrap()).unwrap();
    assert_eq!(round_trip, sample);
}

#[test]
fn certify_preference_defaults() {
    let preferences = ChannelPreferences::defaults_for("usr_feed0001");
    assert!(preferences.email_enabled);
    assert!(preferences.chat_block_webhook_url.is_none());
    assert!(preferences.chat_embed_webhook_url.is_none());
    assert!(preferences.chat_card_webhook_url.is_none());
}
