// [tests/mirror/apps/control_plane/facade_contract.test.rs]
/*!
 * =================================================================
 * APARATO: CERTIFICADOR DEL CONTRATO DE FACHADA (V4.3)
 * CLASIFICACIÓN: TRINITY EVIDENCE // ESTRATO L3-MIRROR
 * RESPONSABILIDAD: SOBRES, VALIDACIÓN Y FUSIÓN DE PROPIEDAD
 *
 * # Mathematical Proof (Ownership Merge):
 * La fachada responde "not found or access denied" tanto para la
 * entidad ausente como para la ajena; ningún sobre permite a un
 * operador inferir la existencia de recursos de otro tenant.
 * =================================================================
 */

use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use vigil_control_plane::config::RuntimeConfig;
use vigil_control_plane::facade::dispatch_tool_operation;
use vigil_control_plane::services::{DispatcherSettings, NotificationDispatcher};
use vigil_control_plane::state::AppState;
use vigil_core_vault::SecretVault;
use vigil_domain_models::User;
use vigil_infra_cluster::{SimulatedCluster, WorkloadManager};
use vigil_infra_cooldown::InMemoryCooldownStore;
use vigil_infra_db::repositories::{SecretRepository, UserRepository};
use vigil_infra_db::TursoClient;
use vigil_infra_samples::DeterministicSampleSimulator;

fn forge_runtime_config() -> RuntimeConfig {
    RuntimeConfig {
        listen_port: 0,
        alert_evaluation_interval: Duration::from_secs(30),
        workload_reconcile_interval: Duration::from_secs(60),
        database_url: "file:unused".into(),
        database_auth_token: None,
        redis_url: None,
        influx_url: None,
        influx_token: String::new(),
        influx_database: "monitors".into(),
        master_key: "proving-grounds-master".into(),
        mail_api_key: None,
        mail_sender: "alerts@vigil.dev".into(),
        chat_block_webhook_url: None,
        chat_embed_webhook_url: None,
        chat_card_webhook_url: None,
        cluster_api_url: None,
        cluster_api_token: String::new(),
        cluster_namespace: "monitors".into(),
    }
}

/// Ensambla la cámara de fachada sobre cluster simulado y devuelve
/// el asidero del cluster para inspección física.
async fn forge_facade_chamber(
    database_anchor_url: &str,
) -> (AppState, Arc<SimulatedCluster>, User, User) {
    let database_client = TursoClient::connect(database_anchor_url, None)
        .await
        .expect("CRITICAL_FAULT: memory ledger anchor failed.");

    let simulated_cluster = Arc::new(SimulatedCluster::new());

    let dispatcher = Arc::new(NotificationDispatcher::new(
        database_client.clone(),
        DispatcherSettings {
            mail_api_key: None,
            mail_endpoint: DispatcherSettings::mail_provider_default_endpoint(),
            mail_sender: "alerts@vigil.dev".into(),
            default_block_webhook_url: None,
            default_embed_webhook_url: None,
            default_card_webhook_url: None,
        },
    ));

    let application_state = AppState::assemble(
        database_client.clone(),
        Arc::new(SecretVault::from_master_key("proving-grounds-master")),
        Arc::new(DeterministicSampleSimulator::new()),
        Arc::new(InMemoryCooldownStore::new()),
        Arc::new(WorkloadManager::new(
            simulated_cluster.clone(),
            "http://influxdb:8086".into(),
        )),
        dispatcher,
        Arc::new(forge_runtime_config()),
    );

    let user_repository = UserRepository::new(database_client);
    let owner = user_repository.resolve_or_create_by_email("owner@vigil.dev").await.unwrap();
    let intruder = user_repository.resolve_or_create_by_email("intruder@vigil.dev").await.unwrap();

    (application_state, simulated_cluster, owner, intruder)
}

#[tokio::test]
async fn certify_create_monitor_seals_secrets_and_deploys() {
    let (application_state, simulated_cluster, owner, _) =
        forge_facade_chamber("file:mem_facade_create?mode=memory&cache=shared").await;

    let verdict = dispatch_tool_operation(
        &application_state,
        &owner,
        "create_monitor",
        &json!({
            "name": "btc-ticker",
            "monitor_type": "crypto_price",
            "config": {"symbol": "BTC"},
            "secrets": {"api_key": "ultra-classified-material"}
        }),
    )
    .await;

    assert_eq!(verdict["success"], true);
    let monitor_view = &verdict["monitor"];
    assert_eq!(monitor_view["type"], "crypto_price");
    assert_eq!(monitor_view["status"], "deploying");

    let workload_id = monitor_view["deployment"]["workload_id"].as_str().unwrap();
    assert!(workload_id.starts_with("monitor-mon_"));

    // El cluster simulado porta exactamente una carga y su material
    assert_eq!(simulated_cluster.workload_count().await, 1);
    let bundle = simulated_cluster
        .secret_bundle_entries(&format!("{}-secrets", workload_id))
        .await
        .unwrap();
    assert_eq!(bundle.get("api_key").map(String::as_str), Some("ultra-classified-material"));

    // CONFIDENCIALIDAD: la columna del Ledger porta solo el sobre
    let monitor_id = monitor_view["id"].as_str().unwrap();
    let status_view = dispatch_tool_operation(
        &application_state,
        &owner,
        "get_monitor_status",
        &json!({"monitor_id": monitor_id}),
    )
    .await;
    assert_eq!(status_view["success"], true);

    let secret_id = {
        // El identificador del secreto viaja en secret_refs de la fila
        let monitor_repository = vigil_infra_db::repositories::MonitorRepository::new(
            application_state.database_client.clone(),
        );
        let stored = monitor_repository.fetch_owned(monitor_id, &owner.id).await.unwrap().unwrap();
        stored.secret_refs.get("api_key").cloned().unwrap()
    };

    let secret_repository = SecretRepository::new(application_state.database_client.clone());
    let sealed_record = secret_repository.fetch_owned(&secret_id, &owner.id).await.unwrap().unwrap();
    assert!(!sealed_record.encrypted_value.contains("ultra-classified-material"));
    assert!(sealed_record.encrypted_value.contains("AES-256-GCM"));

    // La bóveda recupera el material bit-perfecto
    let reopened = application_state.secret_vault.decrypt(&sealed_record.encrypted_value).unwrap();
    assert_eq!(reopened, "ultra-classified-material");
}

#[tokio::test]
async fn certify_ownership_merge_across_operations() {
    let (application_state, _, owner, intruder) =
        forge_facade_chamber("file:mem_facade_owner?mode=memory&cache=shared").await;

    let created = dispatch_tool_operation(
        &application_state,
        &owner,
        "create_monitor",
        &json!({"name": "ping", "monitor_type": "http_check", "config": {}}),
    )
    .await;
    let monitor_id = created["monitor"]["id"].as_str().unwrap().to_string();

    // Cada operación dirigida colapsa en el mismo veredicto opaco
    for (operation, parameters) in [
        ("get_monitor_status", json!({"monitor_id": monitor_id})),
        ("delete_monitor", json!({"monitor_id": monitor_id})),
        ("get_deployment_status", json!({"monitor_id": monitor_id})),
        ("list_alert_rules", json!({"monitor_id": monitor_id})),
        ("list_alerts", json!({"monitor_id": monitor_id})),
    ] {
        let verdict =
            dispatch_tool_operation(&application_state, &intruder, operation, &parameters).await;
        assert_eq!(verdict["success"], false, "operation {} leaked", operation);
        assert_eq!(verdict["message"], "Monitor not found or access denied");
    }

    // El inventario del intruso permanece vacío
    let foreign_inventory =
        dispatch_tool_operation(&application_state, &intruder, "list_monitors", &json!({})).await;
    assert_eq!(foreign_inventory["monitors"].as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn certify_rule_validation_taxonomy() {
    let (application_state, _, owner, _) =
        forge_facade_chamber("file:mem_facade_rules?mode=memory&cache=shared").await;

    let created = dispatch_tool_operation(
        &application_state,
        &owner,
        "create_monitor",
        &json!({"name": "btc", "monitor_type": "crypto_price", "config": {}}),
    )
    .await;
    let monitor_id = created["monitor"]["id"].as_str().unwrap().to_string();

    // 1. TIPO DESCONOCIDO: rechazado en el borde, jamás en evaluación
    let unknown_type = dispatch_tool_operation(
        &application_state,
        &owner,
        "create_alert_rule",
        &json!({
            "monitor_id": monitor_id, "title": "drift",
            "condition": {"type": "anomaly", "field": "price", "operator": ">", "value": 1}
        }),
    )
    .await;
    assert_eq!(unknown_type["success"], false);
    assert!(unknown_type["message"].as_str().unwrap().contains("Invalid condition"));

    // 2. CAMPO AUSENTE
    let missing_field = dispatch_tool_operation(
        &application_state,
        &owner,
        "create_alert_rule",
        &json!({
            "monitor_id": monitor_id, "title": "void",
            "condition": {"type": "threshold", "operator": ">", "value": 1}
        }),
    )
    .await;
    assert_eq!(missing_field["success"], false);
    assert!(missing_field["message"].as_str().unwrap().contains("field"));

    // 3. SEVERIDAD FUERA DEL CATÁLOGO
    let alien_severity = dispatch_tool_operation(
        &application_state,
        &owner,
        "create_alert_rule",
        &json!({
            "monitor_id": monitor_id, "title": "alien", "severity": "catastrophic",
            "condition": {"type": "threshold", "field": "price", "operator": ">", "value": 1}
        }),
    )
    .await;
    assert_eq!(alien_severity["success"], false);
    assert!(alien_severity["message"].as_str().unwrap().contains("Severity must be one of"));

    // 4. ENFRIAMIENTO NEGATIVO
    let negative_cooldown = dispatch_tool_operation(
        &application_state,
        &owner,
        "create_alert_rule",
        &json!({
            "monitor_id": monitor_id, "title": "negative", "cooldown_minutes": -3,
            "condition": {"type": "threshold", "field": "price", "operator": ">", "value": 1}
        }),
    )
    .await;
    assert_eq!(negative_cooldown["success"], false);
    assert!(negative_cooldown["message"].as_str().unwrap().contains("non-negative"));

    // 5. REGLA LEGÍTIMA + PARCHEO SELECTIVO
    let minted = dispatch_tool_operation(
        &application_state,
        &owner,
        "create_alert_rule",
        &json!({
            "monitor_id": monitor_id, "title": "ceiling", "severity": "high",
            "cooldown_minutes": 10,
            "condition": {"type": "threshold", "field": "price", "operator": ">", "value": 50000}
        }),
    )
    .await;
    assert_eq!(minted["success"], true);
    assert_eq!(minted["alert_rule"]["severity"], "high");
    assert_eq!(minted["alert_rule"]["cooldown_minutes"], 10);
    let rule_id = minted["alert_rule"]["id"].as_str().unwrap().to_string();

    let patched = dispatch_tool_operation(
        &application_state,
        &owner,
        "update_alert_rule",
        &json!({"rule_id": rule_id, "is_active": false, "severity": "low"}),
    )
    .await;
    assert_eq!(patched["success"], true);
    assert_eq!(patched["alert_rule"]["is_active"], false);
    assert_eq!(patched["alert_rule"]["severity"], "low");

    // 6. BORRADO Y CATÁLOGO FINAL
    let deleted = dispatch_tool_operation(
        &application_state,
        &owner,
        "delete_alert_rule",
        &json!({"rule_id": rule_id}),
    )
    .await;
    assert_eq!(deleted["success"], true);

    let catalogue = dispatch_tool_operation(
        &application_state,
        &owner,
        "list_alert_rules",
        &json!({"monitor_id": monitor_id}),
    )
    .await;
    assert_eq!(catalogue["alert_rules"].as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn certify_notification_preferences_round_trip() {
    let (application_state, _, owner, intruder) =
        forge_facade_chamber("file:mem_facade_prefs?mode=memory&cache=shared").await;

    // 1. SIN FILA: la vista efectiva son los defaults del proceso
    let pristine = dispatch_tool_operation(
        &application_state,
        &owner,
        "get_notification_preferences",
        &json!({}),
    )
    .await;
    assert_eq!(pristine["success"], true);
    assert_eq!(pristine["preferences"]["email_enabled"], true);
    assert!(pristine["preferences"]["chat_embed_webhook_url"].is_null());

    // 2. SELLADO PARCIAL: la fila nace con los campos enviados
    let sealed = dispatch_tool_operation(
        &application_state,
        &owner,
        "update_notification_preferences",
        &json!({
            "email_enabled": false,
            "chat_embed_webhook_url": "https://chat.example/hooks/ops"
        }),
    )
    .await;
    assert_eq!(sealed["success"], true);
    assert_eq!(sealed["preferences"]["email_enabled"], false);
    assert_eq!(
        sealed["preferences"]["chat_embed_webhook_url"],
        "https://chat.example/hooks/ops"
    );

    // La fila quedó persistida en el Ledger, no solo en la respuesta
    let stored = vigil_infra_db::repositories::PreferenceRepository::new(
        application_state.database_client.clone(),
    )
    .fetch_for_user(&owner.id)
    .await
    .unwrap()
    .expect("preference row must exist after update");
    assert!(!stored.email_enabled);
    assert_eq!(
        stored.chat_embed_webhook_url.as_deref(),
        Some("https://chat.example/hooks/ops")
    );

    // 3. PARCHEO CON NULL: el webhook se limpia, el resto persiste
    let cleared = dispatch_tool_operation(
        &application_state,
        &owner,
        "update_notification_preferences",
        &json!({"chat_embed_webhook_url": null}),
    )
    .await;
    assert_eq!(cleared["success"], true);
    assert!(cleared["preferences"]["chat_embed_webhook_url"].is_null());
    assert_eq!(cleared["preferences"]["email_enabled"], false);

    // 4. TIPO INVÁLIDO: rechazado en el borde
    let malformed = dispatch_tool_operation(
        &application_state,
        &owner,
        "update_notification_preferences",
        &json!({"email_enabled": "yes"}),
    )
    .await;
    assert_eq!(malformed["success"], false);
    assert!(malformed["message"].as_str().unwrap().contains("email_enabled"));

    // 5. AISLAMIENTO: la fila del operador no contamina al intruso
    let foreign_view = dispatch_tool_operation(
        &application_state,
        &intruder,
        "get_notification_preferences",
        &json!({}),
    )
    .await;
    assert_eq!(foreign_view["preferences"]["email_enabled"], true);
}

#[tokio::test]
async fn certify_delete_monitor_dismantles_everything() {
    let (application_state, simulated_cluster, owner, _) =
        forge_facade_chamber("file:mem_facade_delete?mode=memory&cache=shared").await;

    let created = dispatch_tool_operation(
        &application_state,
        &owner,
        "create_monitor",
        &json!({
            "name": "btc", "monitor_type": "crypto_price", "config": {},
            "secrets": {"api_key": "material"}
        }),
    )
    .await;
    let monitor_id = created["monitor"]["id"].as_str().unwrap().to_string();
    assert_eq!(simulated_cluster.workload_count().await, 1);

    dispatch_tool_operation(
        &application_state,
        &owner,
        "create_alert_rule",
        &json!({
            "monitor_id": monitor_id, "title": "ceiling",
            "condition": {"type": "threshold", "field": "price", "operator": ">", "value": 1}
        }),
    )
    .await;

    let farewell = dispatch_tool_operation(
        &application_state,
        &owner,
        "delete_monitor",
        &json!({"monitor_id": monitor_id}),
    )
    .await;
    assert_eq!(farewell["success"], true);
    assert!(farewell["message"].as_str().unwrap().contains("deleted successfully"));

    // Carga física desmontada y catálogos vacíos
    assert_eq!(simulated_cluster.workload_count().await, 0);

    let inventory =
        dispatch_tool_operation(&application_state, &owner, "list_monitors", &json!({})).await;
    assert_eq!(inventory["monitors"].as_array().unwrap().len(), 0);

    let rules =
        dispatch_tool_operation(&application_state, &owner, "list_alert_rules", &json!({})).await;
    assert_eq!(rules["alert_rules"].as_array().unwrap().len(), 0);

    // Operación desconocida: sobre de fallo uniforme
    let unknown =
        dispatch_tool_operation(&application_state, &owner, "teleport_monitor", &json!({})).await;
    assert_eq!(unknown["success"], false);
    assert!(unknown["message"].as_str().unwrap().contains("Unknown operation"));
}
