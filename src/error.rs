//! Error taxonomy for the state machine runtime.

use thiserror::Error;

/// Errors surfaced synchronously by the state machine and its collaborators.
///
/// Failures reported by an external resource loader are *not* part of this
/// taxonomy's control flow: they travel through the state space as an explicit
/// error state carrying a [`crate::query::LoadFailure`], so consumers observe
/// them through the normal event mechanism. Only programmer errors (invalid
/// keys, illegal lifecycle requests) and the cascade cap are returned directly.
#[derive(Debug, Error)]
pub enum MachineError {
    /// A key name outside the machine's declared state space was used.
    #[error("Unknown state key '{name}'")]
    InvalidKey { name: String },

    /// An auto-transition chain exceeded the per-emission depth cap.
    ///
    /// The machine performs no general cycle detection; a listener map in
    /// which every reachable key keeps producing a next state will hit this
    /// cap instead of hanging. State is left at the last applied event.
    #[error("Transition cascade from key '{key}' exceeded {limit} steps")]
    TransitionCycle { key: &'static str, limit: usize },

    /// An operation was requested that is illegal for the current state.
    #[error("Cannot perform '{attempted}' while in state '{from}'")]
    InvalidStateTransition {
        from: &'static str,
        attempted: &'static str,
    },

    /// An external resource loader reported failure.
    #[error("Resource failed to load: {message}")]
    ResourceLoadFailure { message: String },
}
