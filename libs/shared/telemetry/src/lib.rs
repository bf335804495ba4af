// [libs/shared/telemetry/src/lib.rs]
/*!
 * =================================================================
 * APARATO: TELEMETRY BOOTSTRAP (ESTRATO L0 COMPARTIDO)
 * RESPONSABILIDAD: INICIALIZACIÓN ÚNICA DEL SUSCRIPTOR DE TRAZAS
 *
 * Cada binario del workspace llama a `init_tracing` exactamente una vez,
 * antes de levantar cualquier tarea asíncrona. El filtro de nivel se
 * resuelve desde `RUST_LOG`, con "info" como nivel de base cuando la
 * variable no está definida.
 * =================================================================
 */

use tracing_subscriber::{fmt, EnvFilter};

/// Inicializa el suscriptor global de `tracing` con formato humano y
/// soporte para `RUST_LOG`. `service_name` se adjunta como campo
/// estático a cada evento para distinguir procesos en agregadores de logs.
pub fn init_tracing(service_name: &'static str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let subscriber = fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_span_events(fmt::format::FmtSpan::NONE);

    if subscriber.try_init().is_err() {
        tracing::debug!(service_name, "tracing subscriber already initialized, skipping");
    }
}

/// Variant used by tests and short-lived tools that want JSON output
/// instead of the human-readable default (e.g. when piping into a log
/// aggregator during integration testing).
pub fn init_tracing_json(service_name: &'static str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let subscriber = fmt().with_env_filter(filter).json().with_current_span(true);

    if subscriber.try_init().is_err() {
        tracing::debug!(service_name, "tracing subscriber already initialized, skipping");
    }
}
