//! Action dispatcher: table lookup, effect execution, trigger gating.
//!
//! The dispatcher owns the action table built from the schema, the optional
//! router and submit collaborators, a drainable queue of emitted events,
//! and the debounce/throttle runtime. Failures never unwind out of a
//! dispatch: unknown ids are no-ops, handler and navigation errors are
//! swallowed (logged when the debug flag is set).

use std::collections::{HashMap, VecDeque};

use serde_json::Value;
use tokio::time::Instant;
use tracing::warn;

use super::runtime::{Gate, TriggerRuntime};
use super::{EmittedEvent, Router, UiEvent};
use crate::schema::{ActionDef, ActionTrigger, ActionType};

/// Event name used by `emit` actions that don't specify one.
pub const DEFAULT_EMIT_EVENT: &str = "trellis:event";

/// Callback invoked for `submit` actions; the core performs no I/O itself.
pub type SubmitHook = Box<dyn Fn(&ActionDef, &Value)>;

// ---------------------------------------------------------------------------
// ActionDispatcher
// ---------------------------------------------------------------------------

/// Resolves action ids and executes their effects.
pub struct ActionDispatcher {
    table: HashMap<String, ActionDef>,
    router: Option<Box<dyn Router>>,
    submit_hook: Option<SubmitHook>,
    runtime: TriggerRuntime,
    emitted: VecDeque<EmittedEvent>,
    fallback_location: Option<String>,
    debug: bool,
}

impl ActionDispatcher {
    /// Create an empty dispatcher.
    pub fn new() -> Self {
        Self {
            table: HashMap::new(),
            router: None,
            submit_hook: None,
            runtime: TriggerRuntime::new(),
            emitted: VecDeque::new(),
            fallback_location: None,
            debug: false,
        }
    }

    /// Rebuild the action table. Duplicate ids overwrite earlier entries.
    pub fn set_table(&mut self, actions: &[ActionDef]) {
        self.table.clear();
        for action in actions {
            self.table.insert(action.id.clone(), action.clone());
        }
    }

    /// Attach the router collaborator.
    pub fn set_router(&mut self, router: Box<dyn Router>) {
        self.router = Some(router);
    }

    /// Attach the submit collaborator.
    pub fn set_submit_hook(&mut self, hook: SubmitHook) {
        self.submit_hook = Some(hook);
    }

    /// Enable or disable debug warnings.
    pub fn set_debug(&mut self, debug: bool) {
        self.debug = debug;
    }

    /// Whether an action id is registered.
    pub fn contains(&self, action_id: &str) -> bool {
        self.table.contains_key(action_id)
    }

    /// Number of registered actions.
    pub fn len(&self) -> usize {
        self.table.len()
    }

    /// Whether the action table is empty.
    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    /// Drain all events emitted since the last drain.
    pub fn drain_emitted(&mut self) -> Vec<EmittedEvent> {
        self.emitted.drain(..).collect()
    }

    /// The last direct-location fallback recorded by a routerless
    /// `navigate` action.
    pub fn last_location(&self) -> Option<&str> {
        self.fallback_location.as_deref()
    }

    // ── Invocation ───────────────────────────────────────────────────

    /// Invoke an action by id with the given scope.
    ///
    /// Unknown ids are a no-op (warned in debug mode only).
    pub fn invoke(&mut self, action_id: &str, scope: &Value) {
        let Some(action) = self.table.get(action_id).cloned() else {
            if self.debug {
                warn!(action_id, "action not found in table");
            }
            return;
        };

        match action.kind {
            ActionType::Custom => {
                if let Some(handler) = &action.handler {
                    if let Err(err) = handler(scope) {
                        if self.debug {
                            warn!(action_id, %err, "custom action handler failed");
                        }
                    }
                } else if self.debug {
                    warn!(action_id, "custom action has no handler");
                }
            }
            ActionType::Submit => {
                if let Some(hook) = &self.submit_hook {
                    hook(&action, scope);
                }
            }
            ActionType::Navigate => {
                let Some(to) = action.to.as_deref() else {
                    if self.debug {
                        warn!(action_id, "navigate action has no target");
                    }
                    return;
                };
                match &mut self.router {
                    Some(router) => {
                        if let Err(err) = router.navigate_by_url(to) {
                            if self.debug {
                                warn!(action_id, %err, "navigation failed");
                            }
                        }
                    }
                    // No router: fall back to a direct location change.
                    None => self.fallback_location = Some(to.to_owned()),
                }
            }
            ActionType::Emit => {
                let name = action
                    .event
                    .clone()
                    .unwrap_or_else(|| DEFAULT_EMIT_EVENT.to_owned());
                self.emitted.push_back(EmittedEvent {
                    name,
                    payload: action.payload.clone().unwrap_or(Value::Null),
                    context: scope.clone(),
                });
            }
        }
    }

    /// Fire a trigger with its originating event and scope.
    ///
    /// Applies `preventDefault`/`stopPropagation` to the event first, then
    /// routes through the throttle/debounce runtime. Immediate invocations
    /// record their timestamp for throttle accounting.
    pub fn fire(&mut self, trigger: &ActionTrigger, event: &mut UiEvent, scope: Value) {
        if trigger.prevent_default {
            event.default_prevented = true;
        }
        if trigger.stop_propagation {
            event.propagation_stopped = true;
        }

        let now = Instant::now();
        match self.runtime.gate(trigger, scope, now) {
            Gate::Invoke(scope) => {
                self.invoke(&trigger.action, &scope);
                self.runtime.record(&trigger.action, now);
            }
            Gate::Throttled | Gate::Scheduled(_) => {}
        }
    }

    // ── Debounce pump ────────────────────────────────────────────────

    /// Invoke every debounced action whose deadline has passed.
    ///
    /// Returns the number of invocations performed.
    pub fn flush_due(&mut self) -> usize {
        let now = Instant::now();
        let due = self.runtime.take_due(now);
        let count = due.len();
        for (action_id, scope) in due {
            self.invoke(&action_id, &scope);
            self.runtime.record(&action_id, now);
        }
        count
    }

    /// The earliest pending debounce deadline, if any.
    pub fn next_deadline(&self) -> Option<Instant> {
        self.runtime.next_deadline()
    }

    /// Whether any debounced invocation is pending.
    pub fn has_pending(&self) -> bool {
        self.runtime.has_pending()
    }

    /// Sleep until the next debounce deadline, then flush.
    ///
    /// Returns immediately with 0 when nothing is pending.
    pub async fn flush_next(&mut self) -> usize {
        let Some(deadline) = self.runtime.next_deadline() else {
            return 0;
        };
        tokio::time::sleep_until(deadline).await;
        self.flush_due()
    }
}

impl Default for ActionDispatcher {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ActionDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ActionDispatcher")
            .field("actions", &self.table.len())
            .field("router", &self.router.is_some())
            .field("pending_events", &self.emitted.len())
            .field("debug", &self.debug)
            .finish()
    }
}

// ===========================================================================
// Tests
// ===========================================================================
