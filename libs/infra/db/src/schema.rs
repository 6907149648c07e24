// [libs/infra/db/src/schema.rs]
/**
 * =================================================================
 * APARATO: LEDGER DATABASE SCHEMA (V4.2 - CONTROL PLANE STRATA)
 * CLASIFICACIÓN: INFRASTRUCTURE LAYER (ESTRATO L3)
 * RESPONSABILIDAD: GOBERNANZA ESTRUCTURAL E IDEMPOTENCIA TOTAL
 *
 * VISION HIPER-HOLÍSTICA:
 * 1. CONTROL PLANE TABLES: Operadores, secretos, monitores, reglas,
 *    alertas y preferencias de notificación.
 * 2. IDEMPOTENCIA: Gestión de errores para migraciones en caliente;
 *    las filas legadas reciben defaults seguros (secret_refs vacío).
 * 3. PERFORMANCE: Índices de aceleración para el barrido de reglas
 *    activas y el listado de alertas recientes.
 * =================================================================
 */

use anyhow::{Context, Result};
use libsql::Connection;
use tracing::{debug, info, instrument, warn};

/**
 * ESTRATO 1: SOLIDIFICACIÓN (Génesis de Tablas)
 * Define las entidades base del plano de control.
 */
const CONTROL_PLANE_TABLES: &[(&str, &str)] = &[
    ("TABLE_USERS", r#"
        CREATE TABLE IF NOT EXISTS users (
            id TEXT PRIMARY KEY,
            email TEXT NOT NULL UNIQUE,
            tier TEXT DEFAULT 'free',
            is_active INTEGER DEFAULT 1,
            created_at TEXT DEFAULT CURRENT_TIMESTAMP,
            last_login TEXT
        );
    "#),
    ("TABLE_SECRETS", r#"
        CREATE TABLE IF NOT EXISTS secrets (
            id TEXT PRIMARY KEY,
            user_id TEXT NOT NULL,
            name TEXT NOT NULL,
            encrypted_value TEXT NOT NULL,
            created_at TEXT DEFAULT CURRENT_TIMESTAMP
        );
    "#),
    ("TABLE_MONITORS", r#"
        CREATE TABLE IF NOT EXISTS monitors (
            id TEXT PRIMARY KEY,
            user_id TEXT NOT NULL,
            name TEXT NOT NULL,
            description TEXT,
            monitor_type TEXT NOT NULL,
            config_json TEXT NOT NULL,
            status TEXT DEFAULT 'starting',
            created_at TEXT DEFAULT CURRENT_TIMESTAMP,
            updated_at TEXT DEFAULT CURRENT_TIMESTAMP
        );
    "#),
    ("TABLE_ALERT_RULES", r#"
        CREATE TABLE IF NOT EXISTS alert_rules (
            id TEXT PRIMARY KEY,
            monitor_id TEXT NOT NULL,
            user_id TEXT NOT NULL,
            title TEXT NOT NULL,
            condition_json TEXT NOT NULL,
            severity TEXT NOT NULL,
            cooldown_minutes INTEGER DEFAULT 5,
            is_active INTEGER DEFAULT 1,
            created_at TEXT DEFAULT CURRENT_TIMESTAMP
        );
    "#),
    ("TABLE_ALERTS", r#"
        CREATE TABLE IF NOT EXISTS alerts (
            id TEXT PRIMARY KEY,
            rule_id TEXT NOT NULL,
            monitor_id TEXT NOT NULL,
            user_id TEXT NOT NULL,
            severity TEXT NOT NULL,
            title TEXT NOT NULL,
            data_json TEXT,
            status TEXT DEFAULT 'pending',
            delivered_channels_json TEXT,
            delivered_at TEXT,
            acknowledged_at TEXT,
            created_at TEXT DEFAULT CURRENT_TIMESTAMP
        );
    "#),
    ("TABLE_NOTIFICATION_PREFERENCES", r#"
        CREATE TABLE IF NOT EXISTS notification_preferences (
            user_id TEXT PRIMARY KEY,
            email_enabled INTEGER DEFAULT 1,
            chat_block_webhook_url TEXT,
            chat_embed_webhook_url TEXT,
            chat_card_webhook_url TEXT,
            updated_at TEXT DEFAULT CURRENT_TIMESTAMP
        );
    "#),
];

/**
 * ESTRATO 2: EVOLUCIÓN (Mutaciones de Columna)
 * Asegura que las tablas existentes se adapten a las nuevas
 * capacidades. Las filas legadas reciben defaults seguros.
 */
const EVOLUTIONARY_STRATA: &[(&str, &str)] = &[
    // --- REFERENCIAS DE SECRETOS Y DESPLIEGUE ---
    ("MONITOR_SECRET_REFS", "ALTER TABLE monitors ADD COLUMN secret_refs_json TEXT DEFAULT '{}'"),
    ("MONITOR_WORKLOAD_ID", "ALTER TABLE monitors ADD COLUMN workload_id TEXT"),
    ("MONITOR_LAST_SAMPLE", "ALTER TABLE monitors ADD COLUMN last_sample_at TEXT"),
];

/**
 * ESTRATO 3: ENDURECIMIENTO (Índices de Aceleración)
 * Optimiza el barrido de reglas activas y los listados recientes.
 */
const ACCELERATION_INDEXES: &[(&str, &str)] = &[
    ("IDX_SECRETS_OWNER", "CREATE INDEX IF NOT EXISTS idx_secrets_owner ON secrets(user_id);"),
    ("IDX_MONITORS_OWNER", "CREATE INDEX IF NOT EXISTS idx_monitors_owner ON monitors(user_id);"),
    ("IDX_RULES_ACTIVE", "CREATE INDEX IF NOT EXISTS idx_rules_active ON alert_rules(is_active);"),
    ("IDX_RULES_MONITOR", "CREATE INDEX IF NOT EXISTS idx_rules_monitor ON alert_rules(monitor_id);"),
    ("IDX_ALERTS_OWNER", "CREATE INDEX IF NOT EXISTS idx_alerts_owner ON alerts(user_id, created_at);"),
    ("IDX_ALERTS_MONITOR", "CREATE INDEX IF NOT EXISTS idx_alerts_monitor ON alerts(monitor_id);"),
];

/**
 * Ejecuta la secuencia maestra de sincronización del esquema.
 *
 * # Errors:
 * Retorna error si alguna tabla base falla en solidificarse,
 * indicando un colapso en el enlace relacional.
 */
#[instrument(skip(database_connection))]
pub async fn apply_full_ledger_schema(database_connection: &Connection) -> Result<()> {
    info!("🏗️ [SCHEMA_ENGINE]: Initiating structural synchronization V4.2...");

    solidify_base_strata(database_connection).await?;
    execute_evolutionary_repair(database_connection).await?;
    harden_access_layer(database_connection).await?;

    info!("✅ [SCHEMA_ENGINE]: Relational Ledger V4.2 level and certified.");
    Ok(())
}

async fn solidify_base_strata(db: &Connection) -> Result<()> {
    for (identifier, sql) in CONTROL_PLANE_TABLES {
        debug!("  ↳ Solidifying: {}", identifier);
        db.execute(*sql, ()).await
            .with_context(|| format!("CRITICAL_SOLIDIFICATION_FAULT: {}", identifier))?;
    }
    Ok(())
}

async fn execute_evolutionary_repair(db: &Connection) -> Result<()> {
    for (identifier, sql) in EVOLUTIONARY_STRATA {
        match db.execute(*sql, ()).await {
            Ok(_) => info!("  🟢 [REPAIR_OK]: Applied evolutionary stratum {}", identifier),
            Err(e) => {
                let message = e.to_string();
                if message.contains("duplicate column name") {
                    debug!("  ⚪ [REPAIR_SKIP]: {} already level.", identifier);
                } else {
                    warn!("  ⚠️ [REPAIR_BYPASS]: {} check incomplete: {}", identifier, message);
                }
            }
        }
    }
    Ok(())
}

async fn harden_access_layer(db: &Connection) -> Result<()> {
    for (identifier, sql) in ACCELERATION_INDEXES {
        debug!("  ↳ Hardening: {}", identifier);
        db.execute(*sql, ()).await
            .with_context(|| format!("CRITICAL_HARDENING_FAULT: {}", identifier))?;
    }
    Ok(())
}
