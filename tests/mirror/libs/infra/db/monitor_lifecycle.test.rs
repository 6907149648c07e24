// [tests/mirror/libs/infra/db/monitor_lifecycle.test.rs]
/*!
 * =================================================================
 * APARATO: CERTIFICADOR DE CICLO DE VIDA DE MONITORES (V4.1)
 * CLASIFICACIÓN: TRINITY EVIDENCE // ESTRATO L3-MIRROR
 * RESPONSABILIDAD: AUDITORÍA DE PROPIEDAD, ESTADO Y CASCADA
 *
 * # Mathematical Proof (Tenancy Isolation):
 * Toda lectura dirigida exige la dupla (id, user_id). El test
 * certifica que un operador ajeno observa exactamente lo mismo que
 * la ausencia de la entidad: nada.
 * =================================================================
 */

use chrono::Utc;
use std::collections::BTreeMap;
use vigil_domain_models::{
    generate_entity_identifier, AlertRule, AlertSeverity, Monitor, MonitorStatus, RULE_PREFIX,
};
use vigil_infra_db::repositories::{
    AlertRepository, AlertRuleRepository, MonitorRepository, SecretRepository, UserRepository,
};
use vigil_infra_db::TursoClient;

fn forge_monitor(user_id: &str, secret_refs: BTreeMap<String, String>) -> Monitor {
    let now = Utc::now();
    Monitor {
        id: generate_entity_identifier("mon"),
        user_id: user_id.to_string(),
        name: "btc-ticker".into(),
        description: Some("Precio spot BTC".into()),
        monitor_type: "crypto_price".into(),
        config: serde_json::json!({"symbol": "BTC"}),
        secret_refs,
        status: MonitorStatus::Starting,
        workload_id: None,
        created_at: now,
        updated_at: now,
        last_sample_at: None,
    }
}

#[tokio::test]
async fn certify_operator_minting_and_uniqueness() {
    let database_client = TursoClient::connect("file:mem_lifecycle_ident?mode=memory&cache=shared", None)
        .await
        .expect("CRITICAL_FAULT: memory ledger anchor failed.");

    let user_repository = UserRepository::new(database_client.clone());

    // Primer ingreso: acuñación
    let first_pass = user_repository
        .resolve_or_create_by_email("ana@vigil.dev")
        .await
        .unwrap();
    assert!(first_pass.id.starts_with("usr_"));
    assert!(first_pass.is_active);

    // Segundo ingreso: misma identidad, last_login sellado
    let second_pass = user_repository
        .resolve_or_create_by_email("ana@vigil.dev")
        .await
        .unwrap();
    assert_eq!(second_pass.id, first_pass.id);
    assert!(second_pass.last_login.is_some());
}

#[tokio::test]
async fn certify_ownership_gate_and_deployment_state() {
    let database_client = TursoClient::connect("file:mem_lifecycle_owner?mode=memory&cache=shared", None)
        .await
        .expect("CRITICAL_FAULT: memory ledger anchor failed.");

    let user_repository = UserRepository::new(database_client.clone());
    let monitor_repository = MonitorRepository::new(database_client.clone());

    let owner = user_repository.resolve_or_create_by_email("owner@vigil.dev").await.unwrap();
    let intruder = user_repository.resolve_or_create_by_email("intruder@vigil.dev").await.unwrap();

    let monitor = forge_monitor(&owner.id, BTreeMap::new());
    monitor_repository.register_monitor(&monitor).await.unwrap();

    // El propietario observa su monitor
    let owned_view = monitor_repository.fetch_owned(&monitor.id, &owner.id).await.unwrap();
    assert!(owned_view.is_some());

    // El intruso observa la nada (ausencia y ajenidad indistinguibles)
    let foreign_view = monitor_repository.fetch_owned(&monitor.id, &intruder.id).await.unwrap();
    assert!(foreign_view.is_none());

    // Transición de despliegue: fila primero, carga después
    monitor_repository
        .update_deployment_state(&monitor.id, MonitorStatus::Deploying, Some("monitor-x"))
        .await
        .unwrap();

    let leveled = monitor_repository.fetch_by_id(&monitor.id).await.unwrap().unwrap();
    assert_eq!(leveled.status, MonitorStatus::Deploying);
    assert_eq!(leveled.workload_id.as_deref(), Some("monitor-x"));
    assert!(leveled.workload_presence_is_consistent());

    // El barrido del reconciliador lo encuentra
    let reconcilable = monitor_repository.list_reconcilable().await.unwrap();
    assert!(reconcilable.iter().any(|entry| entry.id == monitor.id));
}

#[tokio::test]
async fn certify_cascade_teardown() {
    let database_client = TursoClient::connect("file:mem_lifecycle_cascade?mode=memory&cache=shared", None)
        .await
        .expect("CRITICAL_FAULT: memory ledger anchor failed.");

    let user_repository = UserRepository::new(database_client.clone());
    let secret_repository = SecretRepository::new(database_client.clone());
    let monitor_repository = MonitorRepository::new(database_client.clone());
    let rule_repository = AlertRuleRepository::new(database_client.clone());
    let alert_repository = AlertRepository::new(database_client.clone());

    let owner = user_repository.resolve_or_create_by_email("cascade@vigil.dev").await.unwrap();

    // 1. PROVISIÓN: secreto + monitor + regla + alerta
    let secret = secret_repository
        .seal_secret(&owner.id, "btc-ticker_api_key", "{\"algorithm\":\"AES-256-GCM\"}")
        .await
        .unwrap();

    let monitor = forge_monitor(
        &owner.id,
        BTreeMap::from([("api_key".to_string(), secret.id.clone())]),
    );
    monitor_repository.register_monitor(&monitor).await.unwrap();

    let rule = AlertRule {
        id: generate_entity_identifier(RULE_PREFIX),
        monitor_id: monitor.id.clone(),
        user_id: owner.id.clone(),
        title: "ceiling".into(),
        condition: serde_json::json!({
            "type": "threshold", "field": "price", "operator": ">", "value": 50000
        }),
        severity: AlertSeverity::High,
        cooldown_minutes: 5,
        is_active: true,
        created_at: Utc::now(),
    };
    rule_repository.register_rule(&rule).await.unwrap();

    let alert = alert_repository
        .insert_for_rule(&rule, serde_json::json!({"condition": rule.condition, "trigger_data": []}))
        .await
        .unwrap();

    // 2. CASCADA: un solo delete arrastra los cuatro estratos
    monitor_repository.delete_cascade(&monitor.id, &owner.id).await.unwrap();

    assert!(monitor_repository.fetch_by_id(&monitor.id).await.unwrap().is_none());
    assert!(rule_repository.fetch_owned(&rule.id, &owner.id).await.unwrap().is_none());
    assert!(alert_repository.fetch_owned(&alert.id, &owner.id).await.unwrap().is_none());
    assert!(secret_repository.fetch_owned(&secret.id, &owner.id).await.unwrap().is_none());

    // 3. REPETICIÓN: la cascada sobre lo inexistente es un veredicto limpio
    let repeat_verdict = monitor_repository.delete_cascade(&monitor.id, &owner.id).await;
    assert!(matches!(repeat_verdict, Err(vigil_infra_db::DbError::EntityNotFound)));
}
