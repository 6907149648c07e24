// [libs/infra/db/src/repositories/monitor.rs]
/*!
 * =================================================================
 * APARATO: MONITOR LIFECYCLE REPOSITORY (V4.2 - CASCADE HARDENED)
 * CLASIFICACIÓN: INFRASTRUCTURE ADAPTER (ESTRATO L3)
 * RESPONSABILIDAD: PERSISTENCIA DEL CICLO DE VIDA DE MONITORES
 *
 * VISION HIPER-HOLÍSTICA 2026:
 * 1. ROW-FIRST POLICY: El registro relacional precede siempre a la
 *    carga física del cluster; el fallo de apply degrada a 'error'
 *    sin borrar la fila.
 * 2. EXPLICIT CASCADE: El borrado de un monitor arrastra reglas,
 *    alertas y secretos referenciados dentro de UNA transacción.
 * 3. OWNERSHIP GATE: Toda lectura dirigida valida propietario.
 * =================================================================
 */

use crate::errors::DbError;
use crate::mapping::{
    format_timestamp, parse_json_column, parse_optional_timestamp, parse_timestamp,
};
use crate::TursoClient;
use chrono::Utc;
use libsql::params;
use std::collections::BTreeMap;
use tracing::{info, instrument};
use vigil_domain_models::{Monitor, MonitorStatus};

const MONITOR_PROJECTION: &str =
    "id, user_id, name, description, monitor_type, config_json, secret_refs_json,
     status, workload_id, created_at, updated_at, last_sample_at";

pub struct MonitorRepository {
    database_client: TursoClient,
}

impl MonitorRepository {
    pub fn new(client: TursoClient) -> Self {
        Self { database_client: client }
    }

    /// Inserta la declaración completa del monitor (fila primero).
    #[instrument(skip(self, monitor))]
    pub async fn register_monitor(&self, monitor: &Monitor) -> Result<(), DbError> {
        let connection = self.database_client.get_connection()?;

        let config_json = serde_json::to_string(&monitor.config)
            .map_err(|fault| DbError::MappingError(format!("CONFIG_SERIALIZATION: {}", fault)))?;
        let secret_refs_json = serde_json::to_string(&monitor.secret_refs)
            .map_err(|fault| DbError::MappingError(format!("SECRET_REFS_SERIALIZATION: {}", fault)))?;

        connection
            .execute(
                "INSERT INTO monitors
                    (id, user_id, name, description, monitor_type, config_json,
                     secret_refs_json, status, workload_id, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
                params![
                    monitor.id.clone(),
                    monitor.user_id.clone(),
                    monitor.name.clone(),
                    monitor.description.clone(),
                    monitor.monitor_type.clone(),
                    config_json,
                    secret_refs_json,
                    monitor.status.as_str(),
                    monitor.workload_id.clone(),
                    format_timestamp(monitor.created_at),
                    format_timestamp(monitor.updated_at)
                ],
            )
            .await?;

        Ok(())
    }

    #[instrument(skip(self))]
    pub async fn fetch_owned(
        &self,
        monitor_id: &str,
        user_id: &str,
    ) -> Result<Option<Monitor>, DbError> {
        let connection = self.database_client.get_connection()?;

        let mut rows = connection
            .query(
                &format!(
                    "SELECT {} FROM monitors WHERE id = ?1 AND user_id = ?2",
                    MONITOR_PROJECTION
                ),
                params![monitor_id.to_string(), user_id.to_string()],
            )
            .await?;

        match rows.next().await? {
            Some(row) => Ok(Some(map_monitor_row(&row)?)),
            None => Ok(None),
        }
    }

    /// Lectura sin puerta de propiedad; reservada al motor de alertas
    /// y al reconciliador (rutas internas del proceso).
    #[instrument(skip(self))]
    pub async fn fetch_by_id(&self, monitor_id: &str) -> Result<Option<Monitor>, DbError> {
        let connection = self.database_client.get_connection()?;

        let mut rows = connection
            .query(
                &format!("SELECT {} FROM monitors WHERE id = ?1", MONITOR_PROJECTION),
                params![monitor_id.to_string()],
            )
            .await?;

        match rows.next().await? {
            Some(row) => Ok(Some(map_monitor_row(&row)?)),
            None => Ok(None),
        }
    }

    #[instrument(skip(self))]
    pub async fn list_for_user(&self, user_id: &str) -> Result<Vec<Monitor>, DbError> {
        let connection = self.database_client.get_connection()?;

        let mut rows = connection
            .query(
                &format!(
                    "SELECT {} FROM monitors WHERE user_id = ?1 ORDER BY created_at DESC",
                    MONITOR_PROJECTION
                ),
                params![user_id.to_string()],
            )
            .await?;

        let mut monitors = Vec::new();
        while let Some(row) = rows.next().await? {
            monitors.push(map_monitor_row(&row)?);
        }
        Ok(monitors)
    }

    /// Monitores con carga esperada en el cluster (barrido del reconciliador).
    #[instrument(skip(self))]
    pub async fn list_reconcilable(&self) -> Result<Vec<Monitor>, DbError> {
        let connection = self.database_client.get_connection()?;

        let mut rows = connection
            .query(
                &format!(
                    "SELECT {} FROM monitors
                     WHERE status IN ('deploying', 'running', 'error')
                     ORDER BY created_at ASC",
                    MONITOR_PROJECTION
                ),
                (),
            )
            .await?;

        let mut monitors = Vec::new();
        while let Some(row) = rows.next().await? {
            monitors.push(map_monitor_row(&row)?);
        }
        Ok(monitors)
    }

    /**
     * Sella el resultado de una mutación de despliegue: estado nuevo
     * y, si aplica, el manejador de la carga.
     */
    #[instrument(skip(self))]
    pub async fn update_deployment_state(
        &self,
        monitor_id: &str,
        next_status: MonitorStatus,
        workload_id: Option<&str>,
    ) -> Result<(), DbError> {
        let connection = self.database_client.get_connection()?;

        let affected = connection
            .execute(
                "UPDATE monitors SET status = ?1, workload_id = ?2, updated_at = ?3 WHERE id = ?4",
                params![
                    next_status.as_str(),
                    workload_id.map(|handle| handle.to_string()),
                    format_timestamp(Utc::now()),
                    monitor_id.to_string()
                ],
            )
            .await?;

        if affected == 0 {
            return Err(DbError::EntityNotFound);
        }

        Ok(())
    }

    /**
     * Cascada explícita de borrado en UNA transacción:
     * alertas -> reglas -> secretos referenciados -> monitor.
     *
     * # Errors:
     * `EntityNotFound` si el monitor no existe o no pertenece al
     * operador (ambos casos indistinguibles hacia el exterior).
     */
    #[instrument(skip(self))]
    pub async fn delete_cascade(&self, monitor_id: &str, user_id: &str) -> Result<(), DbError> {
        let connection = self.database_client.get_connection()?;

        // 1. ADQUISICIÓN DE REFERENCIAS BAJO PUERTA DE PROPIEDAD
        let monitor = self
            .fetch_owned(monitor_id, user_id)
            .await?
            .ok_or(DbError::EntityNotFound)?;

        let transaction = connection
            .transaction()
            .await
            .map_err(|fault| DbError::TransactionError(fault.to_string()))?;

        // 2. CASCADA EXPLÍCITA SOBRE LA MISMA SESIÓN
        transaction
            .execute("DELETE FROM alerts WHERE monitor_id = ?1", params![monitor_id.to_string()])
            .await?;
        transaction
            .execute(
                "DELETE FROM alert_rules WHERE monitor_id = ?1",
                params![monitor_id.to_string()],
            )
            .await?;

        for secret_identifier in monitor.secret_refs.values() {
            transaction
                .execute(
                    "DELETE FROM secrets WHERE id = ?1 AND user_id = ?2",
                    params![secret_identifier.clone(), user_id.to_string()],
                )
                .await?;
        }

        transaction
            .execute("DELETE FROM monitors WHERE id = ?1", params![monitor_id.to_string()])
            .await?;

        // 3. COMPROMISO ATÓMICO
        transaction
            .commit()
            .await
            .map_err(|fault| DbError::TransactionError(fault.to_string()))?;

        info!("🗑️ [MONITOR_REPO]: Monitor {} and its strata removed.", monitor_id);
        Ok(())
    }
}

fn map_monitor_row(row: &libsql::Row) -> Result<Monitor, DbError> {
    let config_raw: Option<String> = row.get(5)?;
    let secret_refs_raw: Option<String> = row.get(6)?;
    let status_label: String = row.get(7)?;
    let created_at_raw: String = row.get(9)?;
    let updated_at_raw: String = row.get(10)?;
    let last_sample_raw: Option<String> = row.get(11)?;

    Ok(Monitor {
        id: row.get(0)?,
        user_id: row.get(1)?,
        name: row.get(2)?,
        description: row.get(3)?,
        monitor_type: row.get(4)?,
        config: parse_json_column(config_raw, serde_json::json!({}))?,
        secret_refs: parse_json_column(secret_refs_raw, BTreeMap::new())?,
        status: MonitorStatus::parse(&status_label)
            .ok_or_else(|| DbError::MappingError(format!("STATUS_DRIFT: {}", status_label)))?,
        workload_id: row.get(8)?,
        created_at: parse_timestamp(&created_at_raw)?,
        updated_at: parse_timestamp(&updated_at_raw)?,
        last_sample_at: parse_optional_timestamp(last_sample_raw)?,
    })
}
