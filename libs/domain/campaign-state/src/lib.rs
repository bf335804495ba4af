// [libs/domain/campaign-state/src/lib.rs]
/*!
 * =================================================================
 * APARATO: CAMPAIGN STATE MACHINE (ESTRATO L2)
 * RESPONSABILIDAD: TRANSICIONES PURAS SOBRE CAMPAÑA Y PROGRESO DE FASE
 *
 * Implementa spec.md §4.H. No conoce la cola de trabajos ni la capa de
 * persistencia; el orquestador (ESTRATO L0) envuelve cada llamada en
 * una transacción y decide cuándo invocar estas funciones.
 * =================================================================
 */

pub mod errors;
pub mod transitions;

pub use errors::TransitionError;
pub use transitions::{
    cancel_campaign, configure_phase, exceeds_failure_threshold, fail_phase, pause_phase,
    resume_phase, start_phase, try_complete_phase, CompletionOutcome,
};
