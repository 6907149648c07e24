// [libs/domain/models/src/secret.rs]

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use typeshare::typeshare;

/// Credencial del operador en reposo. El campo `encrypted_value`
/// contiene exclusivamente el sobre autenticado producido por la
/// bóveda; el texto plano jamás toca este contrato.
#[typeshare]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecretRecord {
    /// Identificador opaco con prefijo `sec_`.
    pub id: String,
    pub user_id: String,
    /// Nombre humano (ej. `btc-ticker_api_key`).
    pub name: String,
    /// Sobre AES-256-GCM auto-descriptivo serializado como JSON.
    pub encrypted_value: String,
    #[typeshare(serialized_as = "String")]
    pub created_at: DateTime<Utc>,
}
