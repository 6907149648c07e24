// [tests/mirror/apps/control_plane/alert_engine_cycle.test.rs]
/*!
 * =================================================================
 * APARATO: CERTIFICADOR DEL CICLO DE EVALUACIÓN (V4.2)
 * CLASIFICACIÓN: TRINITY EVIDENCE // ESTRATO L4-MIRROR
 * RESPONSABILIDAD: DISPARO, SUPRESIÓN Y FAIL-OPEN DEL MOTOR
 *
 * # Mathematical Proof (Suppression Window):
 * Con almacén de enfriamiento sano, un disparo sella el marcador
 * TTL y los ciclos subsiguientes dentro de la ventana no producen
 * filas nuevas. Con el almacén caído, el motor falla ABIERTO y
 * privilegia la entrega sobre el silencio.
 * =================================================================
 */

use async_trait::async_trait;
use chrono::{Duration as ChronoDuration, Utc};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use vigil_control_plane::config::RuntimeConfig;
use vigil_control_plane::services::{
    AlertEvaluationEngine, DispatcherSettings, NotificationDispatcher,
};
use vigil_control_plane::state::AppState;
use vigil_core_vault::SecretVault;
use vigil_domain_models::{
    generate_entity_identifier, AlertRule, AlertSeverity, Monitor, MonitorStatus, Sample,
    RULE_PREFIX,
};
use vigil_infra_cluster::{SimulatedCluster, WorkloadManager};
use vigil_infra_cooldown::{CooldownError, CooldownStore, InMemoryCooldownStore};
use vigil_infra_db::repositories::{
    AlertRepository, AlertRuleRepository, MonitorRepository, UserRepository,
};
use vigil_infra_db::TursoClient;
use vigil_infra_samples::{SampleStore, SampleStoreError};

// --- GEMELOS DE BACKEND PARA EL PROVING GROUNDS ---

/// Almacén de muestras con ventana fija (determinismo absoluto).
struct ScriptedSampleStore {
    scripted_window: Vec<Sample>,
}

#[async_trait]
impl SampleStore for ScriptedSampleStore {
    async fn window(
        &self,
        _monitor_id: &str,
        _duration: Duration,
        limit: usize,
    ) -> Result<Vec<Sample>, SampleStoreError> {
        Ok(self.scripted_window.iter().take(limit).cloned().collect())
    }
}

/// Almacén de enfriamiento colapsado (certificación de fail-open).
struct SeveredCooldownStore;

#[async_trait]
impl CooldownStore for SeveredCooldownStore {
    async fn set(&self, _key: &str, _ttl: Duration) -> Result<(), CooldownError> {
        Err(CooldownError::StoreUnavailable("SEVERED_LINK".into()))
    }
    async fn exists(&self, _key: &str) -> Result<bool, CooldownError> {
        Err(CooldownError::StoreUnavailable("SEVERED_LINK".into()))
    }
    async fn probe(&self) -> Result<(), CooldownError> {
        Err(CooldownError::StoreUnavailable("SEVERED_LINK".into()))
    }
}

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

fn forge_price_window(prices: &[f64]) -> Vec<Sample> {
    let newest = Utc::now();
    prices
        .iter()
        .enumerate()
        .map(|(index, price)| Sample {
            monitor_id: "scripted".into(),
            recorded_at: newest - ChronoDuration::seconds(60 * index as i64),
            tags: BTreeMap::new(),
            fields: BTreeMap::from([("price".to_string(), *price)]),
        })
        .collect()
}

/// Ensambla el estado neural con gemelos inyectados y provisiona
/// operador + monitor + regla en el Ledger volátil.
async fn forge_engine_chamber(
    database_anchor_url: &str,
    scripted_window: Vec<Sample>,
    cooldown_store: Arc<dyn CooldownStore>,
    condition: serde_json::Value,
    cooldown_minutes: u32,
) -> (AppState, AlertRule) {
    let database_client = TursoClient::connect(database_anchor_url, None)
        .await
        .expect("CRITICAL_FAULT: memory ledger anchor failed.");

    let owner = UserRepository::new(database_client.clone())
        .resolve_or_create_by_email("engine@vigil.dev")
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
        condition,
        severity: AlertSeverity::High,
        cooldown_minutes,
        is_active: true,
        created_at: now,
    };
    AlertRuleRepository::new(database_client.clone())
        .register_rule(&rule)
        .await
        .unwrap();

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
        database_client,
        Arc::new(SecretVault::from_master_key("proving-grounds-master")),
        Arc::new(ScriptedSampleStore { scripted_window }),
        cooldown_store,
        Arc::new(WorkloadManager::new(
            Arc::new(SimulatedCluster::new()),
            "http://influxdb:8086".into(),
        )),
        dispatcher,
        Arc::new(forge_runtime_config()),
    );

    (application_state, rule)
}

#[tokio::test]
async fn certify_latest_greater_fires_once_and_cooldown_suppresses() {
    let threshold_condition = serde_json::json!({
        "type": "threshold", "field": "price", "operator": ">",
        "value": 50000, "aggregation": "latest"
    });

    let (application_state, rule) = forge_engine_chamber(
        "file:mem_engine_fires?mode=memory&cache=shared",
        forge_price_window(&[51000.0, 49000.0]),
        Arc::new(InMemoryCooldownStore::new()),
        threshold_condition,
        5,
    )
    .await;

    let alert_repository = AlertRepository::new(application_state.database_client.clone());
    let engine = AlertEvaluationEngine::new(application_state.clone());

    // Primer ciclo: la regla dispara y cristaliza exactamente una fila
    engine.execute_evaluation_cycle().await.unwrap();
    let first_pass = alert_repository.list_recent(&rule.user_id, None, 50).await.unwrap();
    assert_eq!(first_pass.len(), 1);
    assert_eq!(first_pass[0].title, "BTC above ceiling");
    assert_eq!(first_pass[0].severity, AlertSeverity::High);

    // El snapshot detonante preserva a lo sumo 3 muestras y la condición
    let trigger_data = first_pass[0].data["trigger_data"].as_array().unwrap();
    assert!(trigger_data.len() <= 3);
    assert_eq!(first_pass[0].data["condition"]["field"], "price");

    // Segundo ciclo dentro de la ventana: supresión total
    engine.execute_evaluation_cycle().await.unwrap();
    let second_pass = alert_repository.list_recent(&rule.user_id, None, 50).await.unwrap();
    assert_eq!(second_pass.len(), 1);
}

#[tokio::test]
async fn certify_zero_cooldown_disables_suppression() {
    let threshold_condition = serde_json::json!({
        "type": "threshold", "field": "price", "operator": ">", "value": 50000
    });

    let (application_state, rule) = forge_engine_chamber(
        "file:mem_engine_zero?mode=memory&cache=shared",
        forge_price_window(&[51000.0, 49000.0]),
        Arc::new(InMemoryCooldownStore::new()),
        threshold_condition,
        0,
    )
    .await;

    let alert_repository = AlertRepository::new(application_state.database_client.clone());
    let engine = AlertEvaluationEngine::new(application_state.clone());

    engine.execute_evaluation_cycle().await.unwrap();
    engine.execute_evaluation_cycle().await.unwrap();

    // Cero minutos: cada ciclo que dispara produce su propia fila
    let trail = alert_repository.list_recent(&rule.user_id, None, 50).await.unwrap();
    assert_eq!(trail.len(), 2);
}

#[tokio::test]
async fn certify_average_suppresses_spike() {
    let average_condition = serde_json::json!({
        "type": "threshold", "field": "price", "operator": ">",
        "value": 50000, "aggregation": "avg"
    });

    let (application_state, rule) = forge_engine_chamber(
        "file:mem_engine_avg?mode=memory&cache=shared",
        forge_price_window(&[60000.0, 40000.0]),
        Arc::new(InMemoryCooldownStore::new()),
        average_condition,
        5,
    )
    .await;

    let alert_repository = AlertRepository::new(application_state.database_client.clone());
    let engine = AlertEvaluationEngine::new(application_state.clone());

    engine.execute_evaluation_cycle().await.unwrap();

    // Media exacta en el umbral: el pico aislado no dispara
    let trail = alert_repository.list_recent(&rule.user_id, None, 50).await.unwrap();
    assert!(trail.is_empty());
}

#[tokio::test]
async fn certify_missing_field_is_silent() {
    let price_condition = serde_json::json!({
        "type": "threshold", "field": "price", "operator": ">", "value": 1
    });

    // La ventana solo porta response_time; el campo vigilado no existe
    let newest = Utc::now();
    let foreign_window = vec![Sample {
        monitor_id: "scripted".into(),
        recorded_at: newest,
        tags: BTreeMap::new(),
        fields: BTreeMap::from([("response_time".to_string(), 900.0)]),
    }];

    let (application_state, rule) = forge_engine_chamber(
        "file:mem_engine_missing?mode=memory&cache=shared",
        foreign_window,
        Arc::new(InMemoryCooldownStore::new()),
        price_condition,
        5,
    )
    .await;

    let alert_repository = AlertRepository::new(application_state.database_client.clone());
    let engine = AlertEvaluationEngine::new(application_state.clone());

    engine.execute_evaluation_cycle().await.unwrap();

    let trail = alert_repository.list_recent(&rule.user_id, None, 50).await.unwrap();
    assert!(trail.is_empty());
}

#[tokio::test]
async fn certify_severed_cooldown_fails_open() {
    let threshold_condition = serde_json::json!({
        "type": "threshold", "field": "price", "operator": ">", "value": 50000
    });

    let (application_state, rule) = forge_engine_chamber(
        "file:mem_engine_open?mode=memory&cache=shared",
        forge_price_window(&[51000.0]),
        Arc::new(SeveredCooldownStore),
        threshold_condition,
        5,
    )
    .await;

    let alert_repository = AlertRepository::new(application_state.database_client.clone());
    let engine = AlertEvaluationEngine::new(application_state.clone());

    // Con el almacén caído la supresión falla ABIERTA: ambos ciclos
    // disparan y el motor jamás aborta por el fallo del marcador.
    engine.execute_evaluation_cycle().await.unwrap();
    engine.execute_evaluation_cycle().await.unwrap();

    let trail = alert_repository.list_recent(&rule.user_id, None, 50).await.unwrap();
    assert_eq!(trail.len(), 2);
}
