// [tests/mirror/libs/infra/cluster/workload_idempotence.test.rs]
/*!
 * =================================================================
 * APARATO: CERTIFICADOR DE IDEMPOTENCIA DE CARGAS (V4.1)
 * CLASIFICACIÓN: TRINITY EVIDENCE // ESTRATO L3-MIRROR
 * RESPONSABILIDAD: APPLY CONVERGENTE, STOP Y LECTURA DE FASE
 *
 * # Mathematical Proof (Revision Invariance):
 * Con una especificación byte-igual, N applies dejan exactamente
 * una carga con revisión invariante. La revisión solo avanza ante
 * una mutación real del spec.
 * =================================================================
 */

use chrono::Utc;
use std::collections::BTreeMap;
use std::sync::Arc;
use vigil_domain_models::{Monitor, MonitorStatus};
use vigil_infra_cluster::{
    secret_bundle_name, workload_name, SimulatedCluster, WorkloadManager, WorkloadPhase,
};

fn forge_monitor(config: serde_json::Value) -> Monitor {
    let now = Utc::now();
    Monitor {
        id: "mon_idem0001".into(),
        user_id: "usr_idem0001".into(),
        name: "btc-ticker".into(),
        description: None,
        monitor_type: "crypto_price".into(),
        config,
        secret_refs: BTreeMap::from([("api_key".to_string(), "sec_idem0001".to_string())]),
        status: MonitorStatus::Starting,
        workload_id: None,
        created_at: now,
        updated_at: now,
        last_sample_at: None,
    }
}

#[tokio::test]
async fn certify_double_apply_leaves_single_invariant_workload() {
    let simulated_cluster = Arc::new(SimulatedCluster::new());
    let workload_manager = WorkloadManager::new(
        simulated_cluster.clone(),
        "http://influxdb:8086".to_string(),
    );

    let monitor = forge_monitor(serde_json::json!({"symbol": "BTC"}));
    let plaintext_secrets =
        BTreeMap::from([("api_key".to_string(), "plain-material".to_string())]);

    // 1. PRIMER APPLY: materialización
    let first_receipt = workload_manager.apply(&monitor, &plaintext_secrets).await.unwrap();
    assert_eq!(first_receipt.workload_id, workload_name(&monitor.id));
    assert_eq!(simulated_cluster.workload_count().await, 1);
    assert_eq!(
        simulated_cluster.revision_of(&first_receipt.workload_id).await,
        Some(1)
    );

    // 2. SEGUNDO APPLY IDÉNTICO: misma carga, revisión invariante
    let second_receipt = workload_manager.apply(&monitor, &plaintext_secrets).await.unwrap();
    assert_eq!(second_receipt.workload_id, first_receipt.workload_id);
    assert_eq!(simulated_cluster.workload_count().await, 1);
    assert_eq!(
        simulated_cluster.revision_of(&second_receipt.workload_id).await,
        Some(1)
    );

    // 3. MUTACIÓN REAL: la revisión avanza exactamente una unidad
    let mutated_monitor = forge_monitor(serde_json::json!({"symbol": "ETH"}));
    workload_manager.apply(&mutated_monitor, &plaintext_secrets).await.unwrap();
    assert_eq!(
        simulated_cluster.revision_of(&first_receipt.workload_id).await,
        Some(2)
    );

    // El material llegó al objeto de secretos, no al spec
    let bundle_entries = simulated_cluster
        .secret_bundle_entries(&secret_bundle_name(&monitor.id))
        .await
        .unwrap();
    assert_eq!(bundle_entries.get("api_key").map(String::as_str), Some("plain-material"));
}

#[tokio::test]
async fn certify_phase_reading_and_teardown() {
    let simulated_cluster = Arc::new(SimulatedCluster::new());
    let workload_manager = WorkloadManager::new(
        simulated_cluster.clone(),
        "http://influxdb:8086".to_string(),
    );

    let monitor = forge_monitor(serde_json::json!({"symbol": "BTC"}));
    let receipt = workload_manager
        .apply(&monitor, &BTreeMap::new())
        .await
        .unwrap();

    // El cluster simulado converge instantáneamente: running
    let live_report = workload_manager.status(&receipt.workload_id).await;
    assert_eq!(live_report.status, WorkloadPhase::Running);
    assert_eq!(live_report.ready_replicas, 1);
    assert_eq!(live_report.total_replicas, 1);

    // Carga inexistente: not_found, sin réplicas fantasma
    let ghost_report = workload_manager.status("monitor-mon_ghost001").await;
    assert_eq!(ghost_report.status, WorkloadPhase::NotFound);
    assert_eq!(ghost_report.total_replicas, 0);

    // Desmonte: carga y objeto de secretos fuera del cluster
    workload_manager.stop(&receipt.workload_id).await.unwrap();
    assert_eq!(simulated_cluster.workload_count().await, 0);
    assert!(simulated_cluster
        .secret_bundle_entries(&secret_bundle_name(&monitor.id))
        .await
        .is_none());

    // Stop repetido: convergencia, no fallo
    workload_manager.stop(&receipt.workload_id).await.unwrap();
}
