// [apps/control-plane/src/handlers/mod.rs]

/// Sondas de vida, disponibilidad y estado no sensible.
pub mod health;
/// Despacho HTTP de la fachada de herramientas.
pub mod tools;
