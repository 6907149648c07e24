// [tests/mirror/libs/infra/db/alert_persistence.test.rs]
/*!
 * =================================================================
 * APARATO: CERTIFICADOR DE PERSISTENCIA DE ALERTAS (V4.1)
 * CLASIFICACIÓN: TRINITY EVIDENCE // ESTRATO L3-MIRROR
 * RESPONSABILIDAD: INTEGRIDAD REFERENCIAL Y CONTABILIDAD DE ENTREGA
 *
 * # Mathematical Proof (Referential Birth):
 * El alta de una alerta y la verificación de su monitor ocurren en
 * la misma transacción; una regla huérfana no puede cristalizar
 * rastro.
 * =================================================================
 */

use chrono::Utc;
use std::collections::BTreeMap;
use std::time::Duration;
use vigil_domain_models::{
    generate_entity_identifier, AlertRule, AlertSeverity, AlertStatus, Monitor, MonitorStatus,
    RULE_PREFIX,
};
use vigil_infra_db::repositories::{
    AlertRepository, AlertRuleRepository, MonitorRepository, UserRepository,
};
use vigil_infra_db::TursoClient;

async fn forge_rule_with_monitor(
    database_client: &TursoClient,
    operator_email: &str,
) -> (String, AlertRule) {
    let user_repository = UserRepository::new(database_client.clone());
    let monitor_repository = MonitorRepository::new(database_client.clone());

    let owner = user_repository.resolve_or_create_by_email(operator_email).await.unwrap();

    let now = Utc::now();
    let monitor = Monitor {
        id: generate_entity_identifier("mon"),
        user_id: owner.id.clone(),
        name: "latency-watch".into(),
        description: None,
        monitor_type: "http_check".into(),
        config: serde_json::json!({"url": "https://example.com"}),
        secret_refs: BTreeMap::new(),
        status: MonitorStatus::Running,
        workload_id: Some("monitor-latency".into()),
        created_at: now,
        updated_at: now,
        last_sample_at: None,
    };
    monitor_repository.register_monitor(&monitor).await.unwrap();

    let rule = AlertRule {
        id: generate_entity_identifier(RULE_PREFIX),
        monitor_id: monitor.id.clone(),
        user_id: owner.id.clone(),
        title: "slow responses".into(),
        condition: serde_json::json!({
            "type": "threshold", "field": "response_time", "operator": ">", "value": 1500
        }),
        severity: AlertSeverity::Medium,
        cooldown_minutes: 5,
        is_active: true,
        created_at: now,
    };
    AlertRuleRepository::new(database_client.clone()).register_rule(&rule).await.unwrap();

    (owner.id, rule)
}

#[tokio::test]
async fn certify_transactional_birth_requires_monitor() {
    let database_client = TursoClient::connect("file:mem_alerts_birth?mode=memory&cache=shared", None)
        .await
        .expect("CRITICAL_FAULT: memory ledger anchor failed.");

    let (_, rule) = forge_rule_with_monitor(&database_client, "birth@vigil.dev").await;
    let alert_repository = AlertRepository::new(database_client.clone());

    // Nacimiento legítimo: severidad y título copiados de la regla
    let alert = alert_repository
        .insert_for_rule(&rule, serde_json::json!({"condition": rule.condition, "trigger_data": []}))
        .await
        .unwrap();

    assert_eq!(alert.severity, AlertSeverity::Medium);
    assert_eq!(alert.title, "slow responses");
    assert_eq!(alert.status, AlertStatus::Pending);
    assert!(alert.delivered_channels.is_empty());

    // Regla huérfana: el alta se aborta en la misma transacción
    let mut orphan_rule = rule.clone();
    orphan_rule.monitor_id = "mon_deadbeef".into();

    let orphan_verdict = alert_repository
        .insert_for_rule(&orphan_rule, serde_json::json!({}))
        .await;
    assert!(matches!(orphan_verdict, Err(vigil_infra_db::DbError::EntityNotFound)));
}

#[tokio::test]
async fn certify_newest_first_listing() {
    let database_client = TursoClient::connect("file:mem_alerts_order?mode=memory&cache=shared", None)
        .await
        .expect("CRITICAL_FAULT: memory ledger anchor failed.");

    let (owner_id, rule) = forge_rule_with_monitor(&database_client, "order@vigil.dev").await;
    let alert_repository = AlertRepository::new(database_client.clone());

    let mut minted_identifiers = Vec::new();
    for ordinal in 0..3 {
        let alert = alert_repository
            .insert_for_rule(&rule, serde_json::json!({"ordinal": ordinal}))
            .await
            .unwrap();
        minted_identifiers.push(alert.id);
        // Separación temporal mínima para un orden total estable
        tokio::time::sleep(Duration::from_millis(5)).await;
    }

    let listing = alert_repository.list_recent(&owner_id, None, 20).await.unwrap();
    assert_eq!(listing.len(), 3);

    // Más reciente primero
    assert_eq!(listing[0].id, minted_identifiers[2]);
    assert_eq!(listing[2].id, minted_identifiers[0]);

    // El tope acota el rastro
    let bounded = alert_repository.list_recent(&owner_id, None, 2).await.unwrap();
    assert_eq!(bounded.len(), 2);
    assert_eq!(bounded[0].id, minted_identifiers[2]);
}

#[tokio::test]
async fn certify_delivery_accounting_and_acknowledgement() {
    let database_client = TursoClient::connect("file:mem_alerts_delivery?mode=memory&cache=shared", None)
        .await
        .expect("CRITICAL_FAULT: memory ledger anchor failed.");

    let (owner_id, rule) = forge_rule_with_monitor(&database_client, "delivery@vigil.dev").await;
    let alert_repository = AlertRepository::new(database_client.clone());

    // 1. ENTREGA PARCIAL: el conjunto confirmado manda el veredicto
    let delivered_alert = alert_repository
        .insert_for_rule(&rule, serde_json::json!({}))
        .await
        .unwrap();

    alert_repository
        .record_delivery_outcome(
            &delivered_alert.id,
            &["email".to_string(), "chat-embed".to_string()],
            Utc::now(),
        )
        .await
        .unwrap();

    let sealed = alert_repository.fetch_owned(&delivered_alert.id, &owner_id).await.unwrap().unwrap();
    assert_eq!(sealed.status, AlertStatus::Delivered);
    assert_eq!(sealed.delivered_channels, vec!["email", "chat-embed"]);
    assert!(sealed.delivered_at.is_some());

    // 2. ENTREGA VACÍA: conjunto vacío => failed, con sello temporal
    let failed_alert = alert_repository
        .insert_for_rule(&rule, serde_json::json!({}))
        .await
        .unwrap();

    alert_repository
        .record_delivery_outcome(&failed_alert.id, &[], Utc::now())
        .await
        .unwrap();

    let sealed_failure = alert_repository.fetch_owned(&failed_alert.id, &owner_id).await.unwrap().unwrap();
    assert_eq!(sealed_failure.status, AlertStatus::Failed);
    assert!(sealed_failure.delivered_channels.is_empty());
    assert!(sealed_failure.delivered_at.is_some());

    // 3. RECONOCIMIENTO: solo el propietario sella la atención
    let foreign_verdict = alert_repository.acknowledge_owned(&delivered_alert.id, "usr_foreign1").await;
    assert!(matches!(foreign_verdict, Err(vigil_infra_db::DbError::EntityNotFound)));

    let acknowledged = alert_repository.acknowledge_owned(&delivered_alert.id, &owner_id).await.unwrap();
    assert_eq!(acknowledged.status, AlertStatus::Acknowledged);
    assert!(acknowledged.acknowledged_at.is_some());
}
