//! Condition gate: decides whether a node renders at all.
//!
//! Gating runs before any instantiation side effect. `disabled` and
//! `readonly` conditions never gate rendering; they only mutate the
//! instantiated widget's state.

use serde_json::Value;

use crate::eval::{evaluate, truthy, truthy_opt};
use crate::schema::{Conditions, Expr};

/// Whether a node with the given `visible` expression and conditions should
/// render against the scope.
///
/// The `visible` field is checked literally, not path-evaluated: a native
/// function is invoked (error or falsy hides), a literal `false` hides, and
/// every other form passes through to the condition checks. `conditions.if`
/// and `conditions.visible` are then each fully evaluated; falsy (including
/// undefined) hides.
pub fn should_render(
    visible: Option<&Expr>,
    conditions: Option<&Conditions>,
    scope: &Value,
) -> bool {
    match visible {
        Some(Expr::Func(f)) => {
            let shown = f(scope).map(|v| truthy(&v)).unwrap_or(false);
            if !shown {
                return false;
            }
        }
        Some(Expr::Literal(Value::Bool(false))) => return false,
        _ => {}
    }

    if let Some(conditions) = conditions {
        if let Some(expr) = &conditions.if_ {
            if !truthy_opt(evaluate(expr, scope).as_ref()) {
                return false;
            }
        }
        if let Some(expr) = &conditions.visible {
            if !truthy_opt(evaluate(expr, scope).as_ref()) {
                return false;
            }
        }
    }

    true
}

// ===========================================================================
// Tests
// ===========================================================================
