// [apps/control-plane/src/main.rs]
/*!
 * =================================================================
 * APARATO: CONTROL PLANE MAIN ENTRY POINT (V4.2 - GOLD MASTER)
 * CLASIFICACIÓN: APPLICATION SHELL (ESTRATO L3-APP)
 * RESPONSABILIDAD: BOOTSTRAP DE INFRAESTRUCTURA E IGNICIÓN SEGURA
 *
 * # Mathematical Proof (Deterministic Ignition):
 * La cosecha de configuración (incluida la llave maestra) ocurre
 * antes que la apertura del socket TCP y que el primer tick del
 * motor; un entorno fatalmente incompleto aborta con código
 * distinto de cero sin efectos laterales.
 * =================================================================
 */

use vigil_control_plane::prelude::*;

use dotenvy::dotenv;
use tracing::{error, info};
use vigil_shared_watchtower::init_tracing;

/**
 * Punto de ignición del binario del plano de control.
 */
fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 1. CARGA DE ENTORNO
    // Hidrata las variables de .env en el espacio de nombres del proceso.
    dotenv().ok();

    // 2. INICIALIZACIÓN DE OBSERVABILIDAD (WATCHTOWER)
    init_tracing("vigil_control_plane");

    // 3. RUNTIME ASÍNCRONO
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;

    runtime.block_on(async {
        info!("🛰️  [CONTROL_PLANE]: Global ignition sequence starting...");

        // 4. COSECHA DE CONFIGURACIÓN (FATAL GATE)
        let runtime_config = match RuntimeConfig::from_environment() {
            Ok(config) => config,
            Err(configuration_fault) => {
                error!("❌ [IGNITION_ABORT]: {}", configuration_fault);
                std::process::exit(1);
            }
        };

        let listen_port = runtime_config.listen_port;

        // 5. CONSTRUCCIÓN DEL KERNEL SOBERANO
        let kernel_instance = ControlPlaneKernel::ignite(runtime_config).await;

        // 6. IGNICIÓN DE OPERACIONES
        info!("🚀 [VIGIL_ONLINE]: System fully operational on port {}.", listen_port);
        kernel_instance.launch_operations().await;

        Ok(())
    })
}
