// [libs/infra/db/src/repositories/secret.rs]
/*!
 * =================================================================
 * APARATO: SECRET VAULT REPOSITORY (V4.0)
 * CLASIFICACIÓN: INFRASTRUCTURE ADAPTER (ESTRATO L3)
 * RESPONSABILIDAD: CUSTODIA EN REPOSO DE SOBRES CIFRADOS
 *
 * El repositorio solo transporta sobres ya sellados por la bóveda;
 * el texto plano no cruza este estrato en ninguna dirección.
 * =================================================================
 */

use crate::errors::DbError;
use crate::mapping::{format_timestamp, parse_timestamp};
use crate::TursoClient;
use chrono::Utc;
use libsql::params;
use tracing::instrument;
use vigil_domain_models::{generate_entity_identifier, SecretRecord, SECRET_PREFIX};

pub struct SecretRepository {
    database_client: TursoClient,
}

impl SecretRepository {
    pub fn new(client: TursoClient) -> Self {
        Self { database_client: client }
    }

    /// Persiste un sobre sellado y devuelve el registro acuñado.
    #[instrument(skip(self, sealed_envelope))]
    pub async fn seal_secret(
        &self,
        user_id: &str,
        secret_name: &str,
        sealed_envelope: &str,
    ) -> Result<SecretRecord, DbError> {
        let connection = self.database_client.get_connection()?;
        let now = Utc::now();

        let record = SecretRecord {
            id: generate_entity_identifier(SECRET_PREFIX),
            user_id: user_id.to_string(),
            name: secret_name.to_string(),
            encrypted_value: sealed_envelope.to_string(),
            created_at: now,
        };

        connection
            .execute(
                "INSERT INTO secrets (id, user_id, name, encrypted_value, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    record.id.clone(),
                    record.user_id.clone(),
                    record.name.clone(),
                    record.encrypted_value.clone(),
                    format_timestamp(now)
                ],
            )
            .await?;

        Ok(record)
    }

    /// Recupera un secreto solo si pertenece al operador indicado.
    #[instrument(skip(self))]
    pub async fn fetch_owned(
        &self,
        secret_id: &str,
        user_id: &str,
    ) -> Result<Option<SecretRecord>, DbError> {
        let connection = self.database_client.get_connection()?;

        let mut rows = connection
            .query(
                "SELECT id, user_id, name, encrypted_value, created_at
                 FROM secrets WHERE id = ?1 AND user_id = ?2",
                params![secret_id.to_string(), user_id.to_string()],
            )
            .await?;

        match rows.next().await? {
            Some(row) => {
                let created_at_raw: String = row.get(4)?;
                Ok(Some(SecretRecord {
                    id: row.get(0)?,
                    user_id: row.get(1)?,
                    name: row.get(2)?,
                    encrypted_value: row.get(3)?,
                    created_at: parse_timestamp(&created_at_raw)?,
                }))
            }
            None => Ok(None),
        }
    }
}
