// INICIO DEL ARCHIVO [apps/control-plane/src/routes.rs]
/*!
 * =================================================================
 * APARATO: SOVEREIGN ROUTING MATRIX (V4.2)
 * CLASIFICACIÓN: API ADAPTER LAYER (ESTRATO L3-APP)
 * RESPONSABILIDAD: TOPOLOGÍA HTTP DEL PLANO DE CONTROL
 *
 * VISION HIPER-HOLÍSTICA:
 * La topología expone dos estratos:
 * 1. SONDAS (sin identidad): /health, /ready, /status.
 * 2. FACHADA DE HERRAMIENTAS (identidad obligatoria):
 *    /api/v1/tools/:operation bajo el guardián de identidad.
 * =================================================================
 */

use crate::handlers::{health, tools};
use crate::middleware::identity_guard;
use crate::state::AppState;
use axum::http::{header, Method};
use axum::routing::{get, post};
use axum::{middleware, Router};
use std::time::Duration;
use tower_http::cors::{Any, CorsLayer};

pub fn create_control_plane_router(application_shared_state: AppState) -> Router {
    // Escudo de Red: CORS para el Dashboard y herramientas de Ops
    let network_security_shield = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
        .max_age(Duration::from_secs(3600));

    // ESTRATO DE FACHADA: Operaciones del agente orquestador
    let tool_facade_stratum = Router::new()
        .route("/tools/:operation", post(tools::handle_tool_dispatch))
        .layer(middleware::from_fn_with_state(
            application_shared_state.clone(),
            identity_guard,
        ));

    // COMPOSICIÓN GLOBAL (Root Topology)
    Router::new()
        .route("/health", get(health::handle_health))
        .route("/ready", get(health::handle_ready))
        .route("/status", get(health::handle_status))
        .nest("/api/v1", tool_facade_stratum)
        .layer(network_security_shield)
        .with_state(application_shared_state)
}
// FIN DEL ARCHIVO [apps/control-plane/src/routes.rs]
