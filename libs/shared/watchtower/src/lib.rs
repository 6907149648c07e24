// [libs/shared/watchtower/src/lib.rs]
/*!
 * =================================================================
 * APARATO: WATCHTOWER NEURAL OBSERVER (V2.1 - GOLD MASTER)
 * CLASIFICACIÓN: SHARED UTILITY (ESTRATO L4)
 * RESPONSABILIDAD: GESTIÓN DE TELEMETRÍA, TRAZADO Y CAPTURA DE PÁNICOS
 *
 * VISION HIPER-HOLÍSTICA 2026:
 * 1. DUAL MODE: Tramas JSON planas en producción para la ingesta del
 *    Dashboard; salida compacta coloreada en desarrollo.
 * 2. NOISE SHIELD: Silencia los estratos de infraestructura (Tower,
 *    Hyper, libSQL, Redis) priorizando el rastro del dominio.
 * 3. PANIC SHIELD: Hook global que captura colapsos en daemons de
 *    fondo (Alert Engine, Reconciler) antes de la defunción.
 * 4. ZERO ABBREVIATIONS: Nomenclatura nominal absoluta.
 * =================================================================
 */

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt as formatting_layer, EnvFilter};
use tracing::{error, info};
use std::panic;

/// Inicializa el sistema de trazas Watchtower con blindaje de pánicos.
///
/// # Comportamiento:
/// - Desarrollo: Logs interactivos compactos con resaltado de color.
/// - Producción: Estructura JSON plana para la ingesta estructurada.
///
/// # Errors:
/// Retorna pánico si otro suscriptor global ya ha sido inicializado
/// en el runtime.
pub fn init_tracing(service_nominal_identifier: &str) {
    // 1. CONFIGURACIÓN DEL FILTRO DINÁMICO
    // Priorizamos los logs de nuestro dominio y silenciamos ruidos de
    // infraestructura (Tower, Hyper, libSQL, Redis).
    let environmental_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| {
            format!(
                "{}={level},tower_http=warn,hyper=warn,libsql=error,redis=warn",
                service_nominal_identifier,
                level = if cfg!(debug_assertions) { "debug" } else { "info" }
            ).into()
        });

    let is_production_strata = !cfg!(debug_assertions);

    // 2. CONSTRUCCIÓN DE LA ARQUITECTURA DE SUSCRIPCIÓN (Dual Mode)
    if is_production_strata {
        tracing_subscriber::registry()
            .with(environmental_filter)
            .with(formatting_layer::layer().json().flatten_event(true))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(environmental_filter)
            .with(formatting_layer::layer().compact().with_target(false))
            .init();
    }

    // 3. PANIC SHIELD (Global Panic Hook)
    // Un colapso en un daemon de fondo (motor de alertas, barrido del
    // reconciliador) debe dejar rastro estructurado antes de que el
    // hilo muera; sin este hook el pánico solo llega a stderr.
    let observed_service_label = service_nominal_identifier.to_string();

    panic::set_hook(Box::new(move |panic_context| {
        let crash_site = match panic_context.location() {
            Some(site) => format!("{}:{}:{}", site.file(), site.line(), site.column()),
            None => "SITE_WITHHELD_BY_RUNTIME".to_string(),
        };

        let crash_diagnosis = panic_context
            .payload()
            .downcast_ref::<&str>()
            .copied()
            .or_else(|| panic_context.payload().downcast_ref::<String>().map(String::as_str))
            .unwrap_or("OPAQUE_PANIC_PAYLOAD");

        error!(
            target: "panic_shield",
            service = %observed_service_label,
            crash_site = %crash_site,
            "🔥 [PANIC_SHIELD]: Background thread collapsed. Diagnosis: {}",
            crash_diagnosis
        );
    }));

    info!(
        "👁️  [WATCHTOWER_ONLINE]: Observability strata levelized for [{}]. Panic Shield ACTIVE.",
        service_nominal_identifier
    );
}
