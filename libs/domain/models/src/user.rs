// [libs/domain/models/src/user.rs]
/*!
 * =================================================================
 * APARATO: OPERATOR IDENTITY CONTRACTS (V1.3)
 * CLASIFICACIÓN: DOMAIN MODELS (ESTRATO L2)
 * RESPONSABILIDAD: CONTRATO SOBERANO DEL OPERADOR MULTI-TENANT
 * =================================================================
 */

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use typeshare::typeshare;

/// Nivel de suscripción del operador.
#[typeshare]
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum UserTier {
    Free,
    Pro,
    Enterprise,
}

impl UserTier {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserTier::Free => "free",
            UserTier::Pro => "pro",
            UserTier::Enterprise => "enterprise",
        }
    }

    pub fn parse(raw_label: &str) -> Option<Self> {
        match raw_label {
            "free" => Some(UserTier::Free),
            "pro" => Some(UserTier::Pro),
            "enterprise" => Some(UserTier::Enterprise),
            _ => None,
        }
    }
}

/// Operador autenticado del plano de control. Se crea en la primera
/// autenticación y nunca se elimina físicamente desde el núcleo.
#[typeshare]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    /// Identificador opaco con prefijo `usr_`.
    pub id: String,
    /// Correo único del operador (ancla de identidad).
    pub email: String,
    pub tier: UserTier,
    pub is_active: bool,
    #[typeshare(serialized_as = "String")]
    pub created_at: DateTime<Utc>,
    #[typeshare(serialized_as = "String")]
    pub last_login: Option<DateTime<Utc>>,
}
