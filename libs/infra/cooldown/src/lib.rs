// [libs/infra/cooldown/src/lib.rs]
/*!
 * =================================================================
 * APARATO: COOLDOWN SUPPRESSION STORE (V2.1 - FAIL-OPEN AWARE)
 * CLASIFICACIÓN: INFRASTRUCTURE LAYER (ESTRATO L3)
 * RESPONSABILIDAD: MARCADORES TTL DE ENFRIAMIENTO POR REGLA
 *
 * VISION HIPER-HOLÍSTICA 2026:
 * 1. ATOMIC PRIMITIVES: `set(key, ttl)` y `exists(key)` son
 *    independientes y atómicas; no se exige linealizabilidad
 *    entre llaves.
 * 2. DISTRIBUTED FIRST: La implementación Redis comparte la
 *    supresión entre procesos; la variante en memoria sirve al
 *    modo simulación y a las pruebas.
 * 3. FAIL-OPEN UPSTREAM: Ante indisponibilidad, el MOTOR decide
 *    tratar toda regla como fuera de enfriamiento (favorece la
 *    entrega sobre el silencio); este estrato solo reporta el fallo.
 * =================================================================
 */

use async_trait::async_trait;
use std::collections::HashMap;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::instrument;

#[derive(Error, Debug)]
pub enum CooldownError {
    #[error("[L3_COOLDOWN_FAULT]: STORE_UNAVAILABLE -> {0}")]
    StoreUnavailable(String),
}

/// Forma canónica de la llave de enfriamiento de una regla.
pub fn cooldown_key(rule_id: &str) -> String {
    format!("alert_cooldown:{}", rule_id)
}

/**
 * Contrato del almacén de supresión. TTL honrado a ±1 s.
 */
#[async_trait]
pub trait CooldownStore: Send + Sync {
    async fn set(&self, key: &str, ttl: Duration) -> Result<(), CooldownError>;
    async fn exists(&self, key: &str) -> Result<bool, CooldownError>;
    /// Sonda trivial para el endpoint /ready.
    async fn probe(&self) -> Result<(), CooldownError>;
}

// =================================================================
// IMPLEMENTACIÓN DISTRIBUIDA (REDIS)
// =================================================================

pub struct RedisCooldownStore {
    redis_client: redis::Client,
}

impl RedisCooldownStore {
    pub fn connect(redis_url: &str) -> Result<Self, CooldownError> {
        let redis_client = redis::Client::open(redis_url)
            .map_err(|fault| CooldownError::StoreUnavailable(fault.to_string()))?;

        Ok(Self { redis_client })
    }

    async fn acquire_link(&self) -> Result<redis::aio::MultiplexedConnection, CooldownError> {
        self.redis_client
            .get_multiplexed_async_connection()
            .await
            .map_err(|fault| CooldownError::StoreUnavailable(fault.to_string()))
    }
}

#[async_trait]
impl CooldownStore for RedisCooldownStore {
    #[instrument(skip(self))]
    async fn set(&self, key: &str, ttl: Duration) -> Result<(), CooldownError> {
        let mut link = self.acquire_link().await?;

        redis::cmd("SET")
            .arg(key)
            .arg("1")
            .arg("EX")
            .arg(ttl.as_secs().max(1))
            .query_async::<_, ()>(&mut link)
            .await
            .map_err(|fault| CooldownError::StoreUnavailable(fault.to_string()))
    }

    #[instrument(skip(self))]
    async fn exists(&self, key: &str) -> Result<bool, CooldownError> {
        let mut link = self.acquire_link().await?;

        let presence: i64 = redis::cmd("EXISTS")
            .arg(key)
            .query_async(&mut link)
            .await
            .map_err(|fault| CooldownError::StoreUnavailable(fault.to_string()))?;

        Ok(presence > 0)
    }

    async fn probe(&self) -> Result<(), CooldownError> {
        let mut link = self.acquire_link().await?;

        redis::cmd("PING")
            .query_async::<_, String>(&mut link)
            .await
            .map_err(|fault| CooldownError::StoreUnavailable(fault.to_string()))?;

        Ok(())
    }
}

// =================================================================
// IMPLEMENTACIÓN EN MEMORIA (SIMULACIÓN / PROVING GROUNDS)
// =================================================================

#[derive(Default)]
pub struct InMemoryCooldownStore {
    expiry_ledger: Mutex<HashMap<String, Instant>>,
}

impl InMemoryCooldownStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CooldownStore for InMemoryCooldownStore {
    async fn set(&self, key: &str, ttl: Duration) -> Result<(), CooldownError> {
        let mut ledger = self.expiry_ledger.lock().await;
        ledger.insert(key.to_string(), Instant::now() + ttl);
        Ok(())
    }

    async fn exists(&self, key: &str) -> Result<bool, CooldownError> {
        let mut ledger = self.expiry_ledger.lock().await;

        match ledger.get(key) {
            Some(expiry) if *expiry > Instant::now() => Ok(true),
            Some(_) => {
                // Marcador vencido: purga perezosa
                ledger.remove(key);
                Ok(false)
            }
            None => Ok(false),
        }
    }

    async fn probe(&self) -> Result<(), CooldownError> {
        Ok(())
    }
}
