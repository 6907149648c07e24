// [libs/infra/db/src/repositories/alert_rule.rs]
/*!
 * =================================================================
 * APARATO: ALERT RULE REPOSITORY (V4.1)
 * CLASIFICACIÓN: INFRASTRUCTURE ADAPTER (ESTRATO L3)
 * RESPONSABILIDAD: PERSISTENCIA DE PREDICADOS Y BARRIDO ACTIVO
 *
 * # Mathematical Proof (Single-Scan Evaluation):
 * El motor de alertas consume `list_active` una vez por ciclo; el
 * índice sobre `is_active` garantiza que el barrido sea O(reglas
 * activas) y no O(reglas históricas).
 * =================================================================
 */

use crate::errors::DbError;
use crate::mapping::{format_timestamp, parse_json_column, parse_timestamp};
use crate::TursoClient;
use libsql::params;
use tracing::instrument;
use vigil_domain_models::{AlertRule, AlertSeverity};

const RULE_PROJECTION: &str =
    "id, monitor_id, user_id, title, condition_json, severity, cooldown_minutes, is_active, created_at";

pub struct AlertRuleRepository {
    database_client: TursoClient,
}

impl AlertRuleRepository {
    pub fn new(client: TursoClient) -> Self {
        Self { database_client: client }
    }

    #[instrument(skip(self, rule))]
    pub async fn register_rule(&self, rule: &AlertRule) -> Result<(), DbError> {
        let connection = self.database_client.get_connection()?;

        let condition_json = serde_json::to_string(&rule.condition)
            .map_err(|fault| DbError::MappingError(format!("CONDITION_SERIALIZATION: {}", fault)))?;

        connection
            .execute(
                "INSERT INTO alert_rules
                    (id, monitor_id, user_id, title, condition_json, severity,
                     cooldown_minutes, is_active, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
                params![
                    rule.id.clone(),
                    rule.monitor_id.clone(),
                    rule.user_id.clone(),
                    rule.title.clone(),
                    condition_json,
                    rule.severity.as_str(),
                    rule.cooldown_minutes as i64,
                    rule.is_active as i64,
                    format_timestamp(rule.created_at)
                ],
            )
            .await?;

        Ok(())
    }

    #[instrument(skip(self))]
    pub async fn fetch_owned(
        &self,
        rule_id: &str,
        user_id: &str,
    ) -> Result<Option<AlertRule>, DbError> {
        let connection = self.database_client.get_connection()?;

        let mut rows = connection
            .query(
                &format!(
                    "SELECT {} FROM alert_rules WHERE id = ?1 AND user_id = ?2",
                    RULE_PROJECTION
                ),
                params![rule_id.to_string(), user_id.to_string()],
            )
            .await?;

        match rows.next().await? {
            Some(row) => Ok(Some(map_rule_row(&row)?)),
            None => Ok(None),
        }
    }

    /// Actualiza los campos mutables de una regla ya certificada.
    #[instrument(skip(self, rule))]
    pub async fn update_rule(&self, rule: &AlertRule) -> Result<(), DbError> {
        let connection = self.database_client.get_connection()?;

        let condition_json = serde_json::to_string(&rule.condition)
            .map_err(|fault| DbError::MappingError(format!("CONDITION_SERIALIZATION: {}", fault)))?;

        let affected = connection
            .execute(
                "UPDATE alert_rules
                 SET title = ?1, condition_json = ?2, severity = ?3,
                     cooldown_minutes = ?4, is_active = ?5
                 WHERE id = ?6 AND user_id = ?7",
                params![
                    rule.title.clone(),
                    condition_json,
                    rule.severity.as_str(),
                    rule.cooldown_minutes as i64,
                    rule.is_active as i64,
                    rule.id.clone(),
                    rule.user_id.clone()
                ],
            )
            .await?;

        if affected == 0 {
            return Err(DbError::EntityNotFound);
        }

        Ok(())
    }

    #[instrument(skip(self))]
    pub async fn delete_owned(&self, rule_id: &str, user_id: &str) -> Result<(), DbError> {
        let connection = self.database_client.get_connection()?;

        let affected = connection
            .execute(
                "DELETE FROM alert_rules WHERE id = ?1 AND user_id = ?2",
                params![rule_id.to_string(), user_id.to_string()],
            )
            .await?;

        if affected == 0 {
            return Err(DbError::EntityNotFound);
        }

        Ok(())
    }

    /// Listado del operador, opcionalmente restringido a un monitor.
    #[instrument(skip(self))]
    pub async fn list_for_owner(
        &self,
        user_id: &str,
        monitor_id: Option<&str>,
    ) -> Result<Vec<AlertRule>, DbError> {
        let connection = self.database_client.get_connection()?;

        let mut rules = Vec::new();

        match monitor_id {
            Some(monitor_filter) => {
                let mut rows = connection
                    .query(
                        &format!(
                            "SELECT {} FROM alert_rules
                             WHERE user_id = ?1 AND monitor_id = ?2
                             ORDER BY created_at DESC",
                            RULE_PROJECTION
                        ),
                        params![user_id.to_string(), monitor_filter.to_string()],
                    )
                    .await?;
                while let Some(row) = rows.next().await? {
                    rules.push(map_rule_row(&row)?);
                }
            }
            None => {
                let mut rows = connection
                    .query(
                        &format!(
                            "SELECT {} FROM alert_rules WHERE user_id = ?1
                             ORDER BY created_at DESC",
                            RULE_PROJECTION
                        ),
                        params![user_id.to_string()],
                    )
                    .await?;
                while let Some(row) = rows.next().await? {
                    rules.push(map_rule_row(&row)?);
                }
            }
        }

        Ok(rules)
    }

    /// Barrido global de reglas activas (una consulta por ciclo del motor).
    #[instrument(skip(self))]
    pub async fn list_active(&self) -> Result<Vec<AlertRule>, DbError> {
        let connection = self.database_client.get_connection()?;

        let mut rows = connection
            .query(
                &format!(
                    "SELECT {} FROM alert_rules WHERE is_active = 1 ORDER BY created_at ASC",
                    RULE_PROJECTION
                ),
                (),
            )
            .await?;

        let mut rules = Vec::new();
        while let Some(row) = rows.next().await? {
            rules.push(map_rule_row(&row)?);
        }
        Ok(rules)
    }
}

fn map_rule_row(row: &libsql::Row) -> Result<AlertRule, DbError> {
    let condition_raw: Option<String> = row.get(4)?;
    let severity_label: String = row.get(5)?;
    let cooldown_minutes: i64 = row.get(6)?;
    let is_active_flag: i64 = row.get(7)?;
    let created_at_raw: String = row.get(8)?;

    Ok(AlertRule {
        id: row.get(0)?,
        monitor_id: row.get(1)?,
        user_id: row.get(2)?,
        title: row.get(3)?,
        condition: parse_json_column(condition_raw, serde_json::json!({}))?,
        severity: AlertSeverity::parse(&severity_label)
            .ok_or_else(|| DbError::MappingError(format!("SEVERITY_DRIFT: {}", severity_label)))?,
        cooldown_minutes: cooldown_minutes.max(0) as u32,
        is_active: is_active_flag != 0,
        created_at: parse_timestamp(&created_at_raw)?,
    })
}
