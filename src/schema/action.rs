//! Action definitions and per-component triggers.
//!
//! An [`ActionDef`] describes what an action does (navigate, emit, submit,
//! or a native handler). An [`ActionTrigger`] attaches an action to a UI
//! event on a component, with optional debounce/throttle modifiers.

use std::fmt;
use std::rc::Rc;

use serde::Deserialize;
use serde_json::Value;

use super::expr::EvalError;

// ---------------------------------------------------------------------------
// ActionDef
// ---------------------------------------------------------------------------

/// A native action handler invoked with the context scope.
pub type ActionHandler = Rc<dyn Fn(&Value) -> Result<(), EvalError>>;

/// The kind of effect an action produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActionType {
    /// Delegate to the router collaborator (or the direct-location fallback).
    Navigate,
    /// Emit a named event carrying a payload and a context snapshot.
    Emit,
    /// Hook point for an external submit collaborator; no I/O in this core.
    Submit,
    /// Invoke a native handler.
    Custom,
}

/// A single entry in the action table.
#[derive(Clone, Deserialize)]
pub struct ActionDef {
    /// Unique id referenced by triggers. Duplicates overwrite earlier entries.
    pub id: String,
    /// What this action does.
    #[serde(rename = "type")]
    pub kind: ActionType,
    /// Navigation target for `navigate` actions.
    #[serde(default, alias = "route")]
    pub to: Option<String>,
    /// Event name for `emit` actions.
    #[serde(default, alias = "name")]
    pub event: Option<String>,
    /// Payload carried by `emit` actions.
    #[serde(default)]
    pub payload: Option<Value>,
    /// Native handler for `custom` actions. Construction-only.
    #[serde(skip)]
    pub handler: Option<ActionHandler>,
}

impl ActionDef {
    /// Create a `navigate` action.
    pub fn navigate(id: impl Into<String>, to: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            kind: ActionType::Navigate,
            to: Some(to.into()),
            event: None,
            payload: None,
            handler: None,
        }
    }

    /// Create an `emit` action.
    pub fn emit(id: impl Into<String>, event: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            kind: ActionType::Emit,
            to: None,
            event: Some(event.into()),
            payload: None,
            handler: None,
        }
    }

    /// Create a `submit` action.
    pub fn submit(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            kind: ActionType::Submit,
            to: None,
            event: None,
            payload: None,
            handler: None,
        }
    }

    /// Create a `custom` action with a native handler.
    pub fn custom(
        id: impl Into<String>,
        handler: impl Fn(&Value) -> Result<(), EvalError> + 'static,
    ) -> Self {
        Self {
            id: id.into(),
            kind: ActionType::Custom,
            to: None,
            event: None,
            payload: None,
            handler: Some(Rc::new(handler)),
        }
    }

    /// Set the payload (builder).
    pub fn with_payload(mut self, payload: impl Into<Value>) -> Self {
        self.payload = Some(payload.into());
        self
    }
}

impl fmt::Debug for ActionDef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActionDef")
            .field("id", &self.id)
            .field("kind", &self.kind)
            .field("to", &self.to)
            .field("event", &self.event)
            .field("payload", &self.payload)
            .field("handler", &self.handler.as_ref().map(|_| "<fn>"))
            .finish()
    }
}

// ---------------------------------------------------------------------------
// ActionTrigger
// ---------------------------------------------------------------------------

fn default_trigger_event() -> String {
    "click".to_owned()
}

/// Wires a UI event on a component to an action table entry.
#[derive(Debug, Clone, Deserialize)]
pub struct ActionTrigger {
    /// The UI event name this trigger listens for.
    #[serde(default = "default_trigger_event")]
    pub event: String,
    /// The action table id to invoke.
    pub action: String,
    /// Mark the originating event's default as prevented before dispatch.
    #[serde(default, rename = "preventDefault")]
    pub prevent_default: bool,
    /// Stop the originating event's propagation before dispatch.
    #[serde(default, rename = "stopPropagation")]
    pub stop_propagation: bool,
    /// Debounce window in milliseconds; reschedules and cancels per action id.
    #[serde(default, rename = "debounceMs")]
    pub debounce_ms: Option<u64>,
    /// Throttle window in milliseconds; drops calls inside the window.
    #[serde(default, rename = "throttleMs")]
    pub throttle_ms: Option<u64>,
}

impl ActionTrigger {
    /// Create a click trigger for the given action id.
    pub fn click(action: impl Into<String>) -> Self {
        Self::on("click", action)
    }

    /// Create a trigger for an arbitrary event name.
    pub fn on(event: impl Into<String>, action: impl Into<String>) -> Self {
        Self {
            event: event.into(),
            action: action.into(),
            prevent_default: false,
            stop_propagation: false,
            debounce_ms: None,
            throttle_ms: None,
        }
    }

    /// Set the debounce window (builder).
    pub fn debounce(mut self, ms: u64) -> Self {
        self.debounce_ms = Some(ms);
        self
    }

    /// Set the throttle window (builder).
    pub fn throttle(mut self, ms: u64) -> Self {
        self.throttle_ms = Some(ms);
        self
    }

    /// Request default-prevention on the originating event (builder).
    pub fn prevent_default(mut self) -> Self {
        self.prevent_default = true;
        self
    }

    /// Request propagation-stop on the originating event (builder).
    pub fn stop_propagation(mut self) -> Self {
        self.stop_propagation = true;
        self
    }
}

// ===========================================================================
// Tests
// ===========================================================================
