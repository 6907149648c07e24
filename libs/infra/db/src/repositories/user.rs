// [libs/infra/db/src/repositories/user.rs]
/*!
 * =================================================================
 * APARATO: OPERATOR IDENTITY REPOSITORY (V4.0)
 * CLASIFICACIÓN: INFRASTRUCTURE ADAPTER (ESTRATO L3)
 * RESPONSABILIDAD: RESOLUCIÓN Y ALTA DE OPERADORES MULTI-TENANT
 *
 * # Mathematical Proof (Identity Anchor):
 * El correo es único a nivel de esquema; la resolución ejecuta
 * SELECT-antes-de-INSERT dentro de la misma sesión, por lo que dos
 * llegadas simultáneas del mismo correo colapsan en la restricción
 * UNIQUE y no en filas gemelas.
 * =================================================================
 */

use crate::errors::DbError;
use crate::mapping::{format_timestamp, parse_optional_timestamp, parse_timestamp};
use crate::TursoClient;
use chrono::Utc;
use libsql::params;
use tracing::{info, instrument};
use vigil_domain_models::{generate_entity_identifier, User, UserTier, USER_PREFIX};

pub struct UserRepository {
    database_client: TursoClient,
}

impl UserRepository {
    pub fn new(client: TursoClient) -> Self {
        Self { database_client: client }
    }

    /**
     * Resuelve el operador por correo; si no existe lo acuña (primer
     * ingreso) y si existe sella `last_login`.
     */
    #[instrument(skip(self))]
    pub async fn resolve_or_create_by_email(&self, operator_email: &str) -> Result<User, DbError> {
        let connection = self.database_client.get_connection()?;
        let now = Utc::now();

        let mut existing_rows = connection
            .query(
                "SELECT id, email, tier, is_active, created_at, last_login
                 FROM users WHERE email = ?1",
                params![operator_email.to_string()],
            )
            .await?;

        if let Some(row) = existing_rows.next().await? {
            let user = map_user_row(&row)?;

            connection
                .execute(
                    "UPDATE users SET last_login = ?1 WHERE id = ?2",
                    params![format_timestamp(now), user.id.clone()],
                )
                .await?;

            return Ok(User { last_login: Some(now), ..user });
        }

        // Primer ingreso: acuñación del operador
        let minted_user = User {
            id: generate_entity_identifier(USER_PREFIX),
            email: operator_email.to_string(),
            tier: UserTier::Free,
            is_active: true,
            created_at: now,
            last_login: Some(now),
        };

        connection
            .execute(
                "INSERT INTO users (id, email, tier, is_active, created_at, last_login)
                 VALUES (?1, ?2, ?3, 1, ?4, ?5)",
                params![
                    minted_user.id.clone(),
                    minted_user.email.clone(),
                    minted_user.tier.as_str(),
                    format_timestamp(now),
                    format_timestamp(now)
                ],
            )
            .await
            .map_err(|fault| {
                if fault.to_string().contains("UNIQUE") {
                    DbError::UniquenessViolation(format!("EMAIL_COLLISION: {}", operator_email))
                } else {
                    DbError::QueryError(fault)
                }
            })?;

        info!("👤 [IDENTITY]: Operator {} minted for {}.", minted_user.id, operator_email);
        Ok(minted_user)
    }

    #[instrument(skip(self))]
    pub async fn fetch_by_id(&self, user_id: &str) -> Result<Option<User>, DbError> {
        let connection = self.database_client.get_connection()?;

        let mut rows = connection
            .query(
                "SELECT id, email, tier, is_active, created_at, last_login
                 FROM users WHERE id = ?1",
                params![user_id.to_string()],
            )
            .await?;

        match rows.next().await? {
            Some(row) => Ok(Some(map_user_row(&row)?)),
            None => Ok(None),
        }
    }
}

fn map_user_row(row: &libsql::Row) -> Result<User, DbError> {
    let tier_label: String = row.get(2)?;
    let is_active_flag: i64 = row.get(3)?;
    let created_at_raw: String = row.get(4)?;
    let last_login_raw: Option<String> = row.get(5)?;

    Ok(User {
        id: row.get(0)?,
        email: row.get(1)?,
        tier: UserTier::parse(&tier_label)
            .ok_or_else(|| DbError::MappingError(format!("TIER_DRIFT: {}", tier_label)))?,
        is_active: is_active_flag != 0,
        created_at: parse_timestamp(&created_at_raw)?,
        last_login: parse_optional_timestamp(last_login_raw)?,
    })
}
