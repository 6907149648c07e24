// [tests/mirror/apps/control_plane/dispatcher_fanout.test.rs]
/*!
 * =================================================================
 * APARATO: CERTIFICADOR DE FAN-OUT MULTICANAL (V4.2)
 * CLASIFICACIÓN: TRINITY EVIDENCE // ESTRATO L4-MIRROR
 * RESPONSABILIDAD: CONTABILIDAD EXACTA DE ENTREGA POR CANAL
 *
 * # Mathematical Proof (Exact Accounting):
 * Sumideros HTTP locales responden 202/500/200 de forma
 * determinista; el conjunto `delivered_channels` debe igualar
 * EXACTAMENTE el subconjunto de canales con 2xx, y el veredicto
 * delivered/failed deriva solo de ese conjunto.
 * =================================================================
 */

use axum::http::StatusCode;
use axum::routing::post;
use axum::Router;
use chrono::Utc;
use std::collections::BTreeMap;
use std::net::SocketAddr;
use vigil_control_plane::services::{DispatcherSettings, NotificationDispatcher};
use vigil_domain_models::{
    generate_entity_identifier, AlertRule, AlertSeverity, AlertStatus, Monitor, MonitorStatus,
    RULE_PREFIX,
};
use vigil_infra_db::repositories::{
    AlertRepository, AlertRuleRepository, MonitorRepository, UserRepository,
};
use vigil_infra_db::TursoClient;

/// Levanta un nido de sumideros HTTP deterministas en un puerto
/// efímero: correo 202, block 500, embed 200.
async fn spawn_deterministic_sinks() -> SocketAddr {
    let sink_router = Router::new()
        .route("/mail", post(|| async { StatusCode::ACCEPTED }))
        .route("/hook-block", post(|| async { StatusCode::INTERNAL_SERVER_ERROR }))
        .route("/hook-embed", post(|| async { StatusCode::OK }))
        .route("/hook-card", post(|| async { StatusCode::NOT_FOUND }));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let sink_address = listener.local_addr().unwrap();

    tokio::spawn(async move {
        axum::serve(listener, sink_router).await.unwrap();
    });

    sink_address
}

/// Provisiona operador + monitor + regla + alerta pendiente.
async fn forge_pending_alert(
    database_client: &TursoClient,
) -> (Monitor, AlertRule, vigil_domain_models::Alert) {
    let owner = UserRepository::new(database_client.clone())
        .resolve_or_create_by_email("herald@vigil.dev")
        .await
        .unwrap();

    let now = Utc::now();
    let monitor = Monitor {
        id: generate_entity_identifier("mon"),
        user_id: owner.id.clone(),
        name: "btc-ticker".into(),
        description: None,
        monitor_type: "crypto_price".into(),
        config: serde_json::json!({"symbol": "BTC"}),
        secret_refs: BTreeMap::new(),
        status: MonitorStatus::Running,
        workload_id: Some("monitor-btc".into()),
        created_at: now,
        updated_at: now,
        last_sample_at: None,
    };
    MonitorRepository::new(database_client.clone())
        .register_monitor(&monitor)
        .await
        .unwrap();

    let rule = AlertRule {
        id: generate_entity_identifier(RULE_PREFIX),
        monitor_id: monitor.id.clone(),
        user_id: owner.id.clone(),
        title: "BTC above ceiling".into(),
        condition: serde_json::json!({
            "type": "threshold", "field": "price", "operator": ">",
            "value": 50000, "aggregation": "latest"
        }),
        severity: AlertSeverity::Critical,
        cooldown_minutes: 5,
        is_active: true,
        created_at: now,
    };
    AlertRuleRepository::new(database_client.clone())
        .register_rule(&rule)
        .await
        .unwrap();

    let alert = AlertRepository::new(database_client.clone())
        .insert_for_rule(
            &rule,
            serde_json::json!({
                "condition": rule.condition,
                "trigger_data": [{
                    "monitor_id": monitor.id,
                    "recorded_at": now.to_rfc3339(),
                    "tags": {},
                    "fields": {"price": 51000.0}
                }]
            }),
        )
        .await
        .unwrap();

    (monitor, rule, alert)
}

#[tokio::test]
async fn certify_partial_success_accounting() {
    let sink_address = spawn_deterministic_sinks().await;

    let database_client = TursoClient::connect("file:mem_herald_partial?mode=memory&cache=shared", None)
        .await
        .expect("CRITICAL_FAULT: memory ledger anchor failed.");

    let (monitor, rule, alert) = forge_pending_alert(&database_client).await;

    // Correo 202 (éxito), block 500 (fallo), embed 200 (éxito);
    // card sin webhook configurado: ni intento ni contabilidad.
    let dispatcher = NotificationDispatcher::new(
        database_client.clone(),
        DispatcherSettings {
            mail_api_key: Some("proving-grounds-key".into()),
            mail_endpoint: format!("http://{}/mail", sink_address),
            mail_sender: "alerts@vigil.dev".into(),
            default_block_webhook_url: Some(format!("http://{}/hook-block", sink_address)),
            default_embed_webhook_url: Some(format!("http://{}/hook-embed", sink_address)),
            default_card_webhook_url: None,
        },
    );

    dispatcher.dispatch_alert(&alert, &monitor, &rule).await.unwrap();

    let sealed = AlertRepository::new(database_client.clone())
        .fetch_owned(&alert.id, &alert.user_id)
        .await
        .unwrap()
        .unwrap();

    // Contabilidad exacta: solo los canales con 2xx
    assert_eq!(sealed.delivered_channels, vec!["email", "chat-embed"]);
    assert_eq!(sealed.status, AlertStatus::Delivered);
    assert!(sealed.delivered_at.is_some());
}

#[tokio::test]
async fn certify_stored_preferences_govern_fanout() {
    let sink_address = spawn_deterministic_sinks().await;

    let database_client = TursoClient::connect("file:mem_herald_prefs?mode=memory&cache=shared", None)
        .await
        .expect("CRITICAL_FAULT: memory ledger anchor failed.");

    let (monitor, rule, alert) = forge_pending_alert(&database_client).await;

    // Fila persistida del operador: correo apagado y webhook embed
    // propio; es la fila que el Herald debe honrar sobre los defaults.
    vigil_infra_db::repositories::PreferenceRepository::new(database_client.clone())
        .upsert(&vigil_domain_models::ChannelPreferences {
            user_id: alert.user_id.clone(),
            email_enabled: false,
            chat_block_webhook_url: None,
            chat_embed_webhook_url: Some(format!("http://{}/hook-embed", sink_address)),
            chat_card_webhook_url: None,
        })
        .await
        .unwrap();

    // Los defaults de proceso habilitarían correo y block; la fila
    // del operador debe prevalecer.
    let dispatcher = NotificationDispatcher::new(
        database_client.clone(),
        DispatcherSettings {
            mail_api_key: Some("proving-grounds-key".into()),
            mail_endpoint: format!("http://{}/mail", sink_address),
            mail_sender: "alerts@vigil.dev".into(),
            default_block_webhook_url: None,
            default_embed_webhook_url: None,
            default_card_webhook_url: None,
        },
    );

    dispatcher.dispatch_alert(&alert, &monitor, &rule).await.unwrap();

    let sealed = AlertRepository::new(database_client.clone())
        .fetch_owned(&alert.id, &alert.user_id)
        .await
        .unwrap()
        .unwrap();

    // Solo el canal de la fila persistida participó del fan-out
    assert_eq!(sealed.delivered_channels, vec!["chat-embed"]);
    assert_eq!(sealed.status, AlertStatus::Delivered);
}

#[tokio::test]
async fn certify_total_failure_verdict() {
    let sink_address = spawn_deterministic_sinks().await;

    let database_client = TursoClient::connect("file:mem_herald_failure?mode=memory&cache=shared", None)
        .await
        .expect("CRITICAL_FAULT: memory ledger anchor failed.");

    let (monitor, rule, alert) = forge_pending_alert(&database_client).await;

    // Todos los sumideros configurados responden fuera de 2xx
    let dispatcher = NotificationDispatcher::new(
        database_client.clone(),
        DispatcherSettings {
            mail_api_key: None,
            mail_endpoint: DispatcherSettings::mail_provider_default_endpoint(),
            mail_sender: "alerts@vigil.dev".into(),
            default_block_webhook_url: Some(format!("http://{}/hook-block", sink_address)),
            default_embed_webhook_url: None,
            default_card_webhook_url: Some(format!("http://{}/hook-card", sink_address)),
        },
    );

    dispatcher.dispatch_alert(&alert, &monitor, &rule).await.unwrap();

    let sealed = AlertRepository::new(database_client.clone())
        .fetch_owned(&alert.id, &alert.user_id)
        .await
        .unwrap()
        .unwrap();

    // Conjunto vacío => failed, con sello temporal de liquidación
    assert!(sealed.delivered_channels.is_empty());
    assert_eq!(sealed.status, AlertStatus::Failed);
    assert!(sealed.delivered_at.is_some());
}
