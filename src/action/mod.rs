//! Action system: UI events, collaborators, dispatch, trigger runtime.

pub mod dispatch;
pub mod runtime;

use serde_json::Value;

pub use dispatch::{ActionDispatcher, SubmitHook, DEFAULT_EMIT_EVENT};
pub use runtime::{Gate, TriggerRuntime};

// ---------------------------------------------------------------------------
// UiEvent
// ---------------------------------------------------------------------------

/// An originating UI event delivered to a component's triggers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UiEvent {
    /// Event name, e.g. `"click"`.
    pub name: String,
    /// Set when a trigger requested default-prevention.
    pub default_prevented: bool,
    /// Set when a trigger requested propagation-stop.
    pub propagation_stopped: bool,
}

impl UiEvent {
    /// Create an event with the given name.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            default_prevented: false,
            propagation_stopped: false,
        }
    }
}

// ---------------------------------------------------------------------------
// EmittedEvent
// ---------------------------------------------------------------------------

/// A named event produced by an `emit` action.
///
/// Queued on the dispatcher and drained by the embedder, which forwards it
/// to whatever event target the host environment provides.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmittedEvent {
    /// Event name (defaults to [`DEFAULT_EMIT_EVENT`]).
    pub name: String,
    /// Payload declared on the action definition.
    pub payload: Value,
    /// Snapshot of the context scope at invocation time.
    pub context: Value,
}

// ---------------------------------------------------------------------------
// Router
// ---------------------------------------------------------------------------

/// Failure reported by a router collaborator. Caught and logged, never
/// propagated.
#[derive(Debug, thiserror::Error)]
#[error("navigation failed: {0}")]
pub struct NavigationError(pub String);

impl NavigationError {
    /// Create an error with the given message.
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

/// Optional routing collaborator used by `navigate` actions.
///
/// When absent, the dispatcher falls back to recording a direct location
/// change.
pub trait Router {
    fn navigate_by_url(&mut self, url: &str) -> Result<(), NavigationError>;
}
