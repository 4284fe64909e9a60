//! Binding resolution and value-back wiring.
//!
//! Forward direction: a [`Binding`] resolves a context path into a concrete
//! property value through the default/strict/transform chain. Reverse
//! direction: a binding targeting the widget's value property subscribes to
//! the widget's change notifications and writes new values back into the
//! shared context. Each subscription carries an alive-guard killed on
//! instance destruction, so a torn-down widget can never write into the
//! context afterwards.

use std::cell::Cell;
use std::rc::Rc;

use serde_json::Value;

use crate::context::{path_get, Context};
use crate::host::WidgetInstance;
use crate::schema::Binding;

// ---------------------------------------------------------------------------
// Forward resolution
// ---------------------------------------------------------------------------

/// Resolve a binding against a scope.
///
/// - `base = path ? path_get(scope, path) : undefined`
/// - undefined base: strict → undefined; otherwise substitute `default`
/// - transform runs over the (possibly substituted) base; an error falls
///   back to the untransformed base; an undefined base reaches the
///   transform as JSON null
pub fn resolve(binding: &Binding, scope: &Value) -> Option<Value> {
    let base = binding
        .path
        .as_deref()
        .and_then(|path| path_get(scope, path));

    let base = match base {
        None if binding.strict => return None,
        None => binding.default.clone(),
        some => some,
    };

    if let Some(transform) = &binding.transform {
        let input = base.clone().unwrap_or(Value::Null);
        return match transform(&input, scope) {
            Ok(out) => Some(out),
            Err(_) => base,
        };
    }

    base
}

/// Whether a binding target path is the widget's value property.
pub fn is_value_target(target: &str) -> bool {
    target == "value" || target == "config.value"
}

/// Strip the `config.` prefix off a binding target, leaving the widget
/// property name.
pub fn property_name(target: &str) -> &str {
    target.strip_prefix("config.").unwrap_or(target)
}

// ---------------------------------------------------------------------------
// Value-back wiring
// ---------------------------------------------------------------------------

/// Guard for one value-back subscription.
///
/// Killing the guard turns the widget-side listener into a no-op; the
/// interpreter kills it when the owning instance is destroyed.
#[derive(Clone)]
pub struct ValueBack {
    alive: Rc<Cell<bool>>,
}

impl ValueBack {
    /// Whether the subscription is still live.
    pub fn is_alive(&self) -> bool {
        self.alive.get()
    }

    /// Disconnect the subscription.
    pub fn kill(&self) {
        self.alive.set(false);
    }
}

impl std::fmt::Debug for ValueBack {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ValueBack(alive: {})", self.alive.get())
    }
}

/// Subscribe a widget's value changes back into the context at `path`.
///
/// Prefers the value-changed notification, falling back to the generic
/// change notification. Returns `None` when the widget supports neither.
pub fn wire_value_back(
    widget: &mut dyn WidgetInstance,
    path: &str,
    context: &Context,
) -> Option<ValueBack> {
    let alive = Rc::new(Cell::new(true));
    let make_listener = || {
        let alive = alive.clone();
        let context = context.clone();
        let path = path.to_owned();
        Box::new(move |value: &Value| {
            if alive.get() {
                context.set(&path, value.clone());
            }
        }) as Box<dyn Fn(&Value)>
    };

    if widget.on_value_changed(make_listener()) || widget.on_changed(make_listener()) {
        Some(ValueBack { alive })
    } else {
        None
    }
}

// ===========================================================================
// Tests
// ===========================================================================
