//! Per-trigger runtime state: throttle windows and debounce scheduling.
//!
//! State is keyed by action id, so rapid firings of the same action share
//! one throttle window and one pending debounce slot regardless of which
//! component fired them. Deadlines use the tokio clock, which tests pause
//! and advance deterministically.

use std::collections::HashMap;
use std::time::Duration;

use serde_json::Value;
use tokio::time::Instant;

use crate::schema::ActionTrigger;

// ---------------------------------------------------------------------------
// TriggerRuntime
// ---------------------------------------------------------------------------

/// Outcome of gating one trigger firing.
#[derive(Debug)]
pub enum Gate {
    /// Invoke the action now with this scope.
    Invoke(Value),
    /// Dropped by the throttle window.
    Throttled,
    /// A debounced invocation was (re)scheduled; nothing runs yet.
    Scheduled(Instant),
}

#[derive(Debug, Default)]
struct TriggerState {
    last_fired: Option<Instant>,
    pending: Option<Pending>,
}

#[derive(Debug)]
struct Pending {
    due: Instant,
    scope: Value,
}

/// Debounce/throttle bookkeeping for all action ids.
#[derive(Debug, Default)]
pub struct TriggerRuntime {
    states: HashMap<String, TriggerState>,
}

impl TriggerRuntime {
    /// Create an empty runtime.
    pub fn new() -> Self {
        Self::default()
    }

    /// Gate one firing of a trigger at `now`.
    ///
    /// Throttle is checked first: inside the window the call is dropped
    /// outright. Debounce then (re)schedules, replacing any pending slot
    /// for the same action id — the scope of the *last* firing wins.
    pub fn gate(&mut self, trigger: &ActionTrigger, scope: Value, now: Instant) -> Gate {
        let state = self.states.entry(trigger.action.clone()).or_default();

        if let (Some(throttle_ms), Some(last)) = (trigger.throttle_ms, state.last_fired) {
            if now.duration_since(last) < Duration::from_millis(throttle_ms) {
                return Gate::Throttled;
            }
        }

        if let Some(debounce_ms) = trigger.debounce_ms {
            let due = now + Duration::from_millis(debounce_ms);
            state.pending = Some(Pending { due, scope });
            return Gate::Scheduled(due);
        }

        Gate::Invoke(scope)
    }

    /// Record a completed invocation for throttle accounting.
    pub fn record(&mut self, action_id: &str, now: Instant) {
        self.states
            .entry(action_id.to_owned())
            .or_default()
            .last_fired = Some(now);
    }

    /// Take every pending debounced invocation whose deadline has passed.
    pub fn take_due(&mut self, now: Instant) -> Vec<(String, Value)> {
        let mut due = Vec::new();
        for (id, state) in &mut self.states {
            if state.pending.as_ref().is_some_and(|p| p.due <= now) {
                let pending = state.pending.take().expect("checked above");
                due.push((id.clone(), pending.scope));
            }
        }
        due
    }

    /// The earliest pending debounce deadline, if any.
    pub fn next_deadline(&self) -> Option<Instant> {
        self.states
            .values()
            .filter_map(|state| state.pending.as_ref().map(|p| p.due))
            .min()
    }

    /// Whether any debounced invocation is pending.
    pub fn has_pending(&self) -> bool {
        self.states.values().any(|state| state.pending.is_some())
    }

    /// Drop all pending invocations and throttle history.
    pub fn clear(&mut self) {
        self.states.clear();
    }
}

// ===========================================================================
// Tests
// ===========================================================================
