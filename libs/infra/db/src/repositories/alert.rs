// [libs/infra/db/src/repositories/alert.rs]
/*!
 * =================================================================
 * APARATO: ALERT TRAIL REPOSITORY (V4.2 - DELIVERY ACCOUNTING)
 * CLASIFICACIÓN: INFRASTRUCTURE ADAPTER (ESTRATO L3)
 * RESPONSABILIDAD: RASTRO DURABLE DE DISPAROS Y SU ENTREGA
 *
 * VISION HIPER-HOLÍSTICA 2026:
 * 1. TRANSACTIONAL BIRTH: El alta de una alerta verifica dentro de
 *    la MISMA transacción que el monitor referenciado siga vivo;
 *    jamás nacen alertas huérfanas.
 * 2. IMMUTABLE CORE: Tras el alta solo mutan los campos de entrega
 *    y reconocimiento.
 * 3. EXACT ACCOUNTING: `delivered_channels` refleja únicamente los
 *    canales con confirmación 2xx.
 * =================================================================
 */

use crate::errors::DbError;
use crate::mapping::{
    format_timestamp, parse_json_column, parse_optional_timestamp, parse_timestamp,
};
use crate::TursoClient;
use chrono::{DateTime, Utc};
use libsql::params;
use tracing::{info, instrument};
use vigil_domain_models::{
    generate_entity_identifier, Alert, AlertRule, AlertStatus, ALERT_PREFIX,
};

const ALERT_PROJECTION: &str =
    "id, rule_id, monitor_id, user_id, severity, title, data_json, status,
     delivered_channels_json, delivered_at, acknowledged_at, created_at";

pub struct AlertRepository {
    database_client: TursoClient,
}

impl AlertRepository {
    pub fn new(client: TursoClient) -> Self {
        Self { database_client: client }
    }

    /**
     * Alta transaccional de una alerta detonada por una regla.
     *
     * # Logic:
     * 1. Abre transacción.
     * 2. Certifica que el monitor de la regla sigue en el Ledger
     *    (si no, la regla quedó huérfana y el alta se aborta).
     * 3. Inserta la fila con severidad y título copiados de la regla.
     * 4. Compromete.
     */
    #[instrument(skip(self, rule, trigger_snapshot))]
    pub async fn insert_for_rule(
        &self,
        rule: &AlertRule,
        trigger_snapshot: serde_json::Value,
    ) -> Result<Alert, DbError> {
        let connection = self.database_client.get_connection()?;
        let now = Utc::now();

        let alert = Alert {
            id: generate_entity_identifier(ALERT_PREFIX),
            rule_id: rule.id.clone(),
            monitor_id: rule.monitor_id.clone(),
            user_id: rule.user_id.clone(),
            severity: rule.severity,
            title: rule.title.clone(),
            data: trigger_snapshot,
            status: AlertStatus::Pending,
            delivered_channels: Vec::new(),
            delivered_at: None,
            acknowledged_at: None,
            created_at: now,
        };

        let data_json = serde_json::to_string(&alert.data)
            .map_err(|fault| DbError::MappingError(format!("DATA_SERIALIZATION: {}", fault)))?;

        let transaction = connection
            .transaction()
            .await
            .map_err(|fault| DbError::TransactionError(fault.to_string()))?;

        // Integridad referencial dentro de la misma sesión
        let monitor_is_present = {
            let mut monitor_rows = transaction
                .query(
                    "SELECT id FROM monitors WHERE id = ?1",
                    params![rule.monitor_id.clone()],
                )
                .await?;
            monitor_rows.next().await?.is_some()
        };

        if !monitor_is_present {
            // La transacción se descarta sin comprometer nada
            return Err(DbError::EntityNotFound);
        }

        transaction
            .execute(
                "INSERT INTO alerts
                    (id, rule_id, monitor_id, user_id, severity, title, data_json,
                     status, delivered_channels_json, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, '[]', ?9)",
                params![
                    alert.id.clone(),
                    alert.rule_id.clone(),
                    alert.monitor_id.clone(),
                    alert.user_id.clone(),
                    alert.severity.as_str(),
                    alert.title.clone(),
                    data_json,
                    alert.status.as_str(),
                    format_timestamp(now)
                ],
            )
            .await?;

        transaction
            .commit()
            .await
            .map_err(|fault| DbError::TransactionError(fault.to_string()))?;

        info!("🔔 [ALERT_TRAIL]: Alert {} crystallized for rule {}.", alert.id, rule.id);
        Ok(alert)
    }

    /// Listado del operador, más reciente primero.
    #[instrument(skip(self))]
    pub async fn list_recent(
        &self,
        user_id: &str,
        monitor_id: Option<&str>,
        limit: i64,
    ) -> Result<Vec<Alert>, DbError> {
        let connection = self.database_client.get_connection()?;
        let mut alerts = Vec::new();

        match monitor_id {
            Some(monitor_filter) => {
                let mut rows = connection
                    .query(
                        &format!(
                            "SELECT {} FROM alerts
                             WHERE user_id = ?1 AND monitor_id = ?2
                             ORDER BY created_at DESC LIMIT ?3",
                            ALERT_PROJECTION
                        ),
                        params![user_id.to_string(), monitor_filter.to_string(), limit],
                    )
                    .await?;
                while let Some(row) = rows.next().await? {
                    alerts.push(map_alert_row(&row)?);
                }
            }
            None => {
                let mut rows = connection
                    .query(
                        &format!(
                            "SELECT {} FROM alerts WHERE user_id = ?1
                             ORDER BY created_at DESC LIMIT ?2",
                            ALERT_PROJECTION
                        ),
                        params![user_id.to_string(), limit],
                    )
                    .await?;
                while let Some(row) = rows.next().await? {
                    alerts.push(map_alert_row(&row)?);
                }
            }
        }

        Ok(alerts)
    }

    /**
     * Reconocimiento por parte del operador propietario.
     *
     * # Errors:
     * `EntityNotFound` si la alerta no existe o es de otro operador.
     */
    #[instrument(skip(self))]
    pub async fn acknowledge_owned(
        &self,
        alert_id: &str,
        user_id: &str,
    ) -> Result<Alert, DbError> {
        let connection = self.database_client.get_connection()?;
        let acknowledged_at = Utc::now();

        let affected = connection
            .execute(
                "UPDATE alerts SET status = ?1, acknowledged_at = ?2
                 WHERE id = ?3 AND user_id = ?4",
                params![
                    AlertStatus::Acknowledged.as_str(),
                    format_timestamp(acknowledged_at),
                    alert_id.to_string(),
                    user_id.to_string()
                ],
            )
            .await?;

        if affected == 0 {
            return Err(DbError::EntityNotFound);
        }

        self.fetch_owned(alert_id, user_id)
            .await?
            .ok_or(DbError::EntityNotFound)
    }

    #[instrument(skip(self))]
    pub async fn fetch_owned(
        &self,
        alert_id: &str,
        user_id: &str,
    ) -> Result<Option<Alert>, DbError> {
        let connection = self.database_client.get_connection()?;

        let mut rows = connection
            .query(
                &format!(
                    "SELECT {} FROM alerts WHERE id = ?1 AND user_id = ?2",
                    ALERT_PROJECTION
                ),
                params![alert_id.to_string(), user_id.to_string()],
            )
            .await?;

        match rows.next().await? {
            Some(row) => Ok(Some(map_alert_row(&row)?)),
            None => Ok(None),
        }
    }

    /**
     * Contabilidad exacta de entrega: canales confirmados 2xx, sello
     * temporal y veredicto delivered/failed según el conjunto.
     */
    #[instrument(skip(self, confirmed_channels))]
    pub async fn record_delivery_outcome(
        &self,
        alert_id: &str,
        confirmed_channels: &[String],
        delivered_at: DateTime<Utc>,
    ) -> Result<(), DbError> {
        let connection = self.database_client.get_connection()?;

        let final_status = if confirmed_channels.is_empty() {
            AlertStatus::Failed
        } else {
            AlertStatus::Delivered
        };

        let channels_json = serde_json::to_string(confirmed_channels)
            .map_err(|fault| DbError::MappingError(format!("CHANNELS_SERIALIZATION: {}", fault)))?;

        let affected = connection
            .execute(
                "UPDATE alerts
                 SET delivered_channels_json = ?1, delivered_at = ?2, status = ?3
                 WHERE id = ?4",
                params![
                    channels_json,
                    format_timestamp(delivered_at),
                    final_status.as_str(),
                    alert_id.to_string()
                ],
            )
            .await?;

        if affected == 0 {
            return Err(DbError::EntityNotFound);
        }

        Ok(())
    }
}

fn map_alert_row(row: &libsql::Row) -> Result<Alert, DbError> {
    let severity_label: String = row.get(4)?;
    let data_raw: Option<String> = row.get(6)?;
    let status_label: String = row.get(7)?;
    let channels_raw: Option<String> = row.get(8)?;
    let delivered_at_raw: Option<String> = row.get(9)?;
    let acknowledged_at_raw: Option<String> = row.get(10)?;
    let created_at_raw: String = row.get(11)?;

    Ok(Alert {
        id: row.get(0)?,
        rule_id: row.get(1)?,
        monitor_id: row.get(2)?,
        user_id: row.get(3)?,
        severity: vigil_domain_models::AlertSeverity::parse(&severity_label)
            .ok_or_else(|| DbError::MappingError(format!("SEVERITY_DRIFT: {}", severity_label)))?,
        title: row.get(5)?,
        data: parse_json_column(data_raw, serde_json::json!({}))?,
        status: AlertStatus::parse(&status_label)
            .ok_or_else(|| DbError::MappingError(format!("STATUS_DRIFT: {}", status_label)))?,
        delivered_channels: parse_json_column(channels_raw, Vec::new())?,
        delivered_at: parse_optional_timestamp(delivered_at_raw)?,
        acknowledged_at: parse_optional_timestamp(acknowledged_at_raw)?,
        created_at: parse_timestamp(&created_at_raw)?,
    })
}
