//! Expression evaluation against a context scope.
//!
//! The evaluator never propagates a failure: a broken path, an absent
//! expression, or an erroring native function all evaluate to `None`
//! ("value unavailable"). Truthiness follows loose scripting semantics so
//! schemas behave the same here as in a browser host.

use serde_json::Value;

use crate::context::path_get;
use crate::schema::Expr;

/// Evaluate an expression against a scope.
///
/// - literal → returned as-is (a literal null is a defined null)
/// - dotted path → traversed via [`path_get`]
/// - native function → invoked; an error yields `None`
pub fn evaluate(expr: &Expr, scope: &Value) -> Option<Value> {
    match expr {
        Expr::Literal(value) => Some(value.clone()),
        Expr::Path(path) => path_get(scope, path),
        Expr::Func(f) => f(scope).ok(),
    }
}

/// Evaluate an optional expression; an absent expression is undefined.
pub fn evaluate_opt(expr: Option<&Expr>, scope: &Value) -> Option<Value> {
    expr.and_then(|e| evaluate(e, scope))
}

/// Loose truthiness: null, false, zero, NaN, and "" are falsy; everything
/// else (including empty arrays and objects) is truthy.
pub fn truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map(|f| f != 0.0 && !f.is_nan()).unwrap_or(true),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// Truthiness of an evaluation result; undefined is falsy.
pub fn truthy_opt(value: Option<&Value>) -> bool {
    value.map(truthy).unwrap_or(false)
}

// ===========================================================================
// Tests
// ===========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{EvalError, Expr};
    use serde_json::json;

    #[test]
    fn literal_returned_as_is() {
        let scope = json!({});
        assert_eq!(evaluate(&Expr::literal(7), &scope), Some(json!(7)));
        assert_eq!(
            evaluate(&Expr::Literal(Value::Null), &scope),
            Some(Value::Null)
        );
    }

    #[test]
    fn path_traverses_scope() {
        let scope = json!({"a": {"b": "deep"}});
        assert_eq!(evaluate(&Expr::path("a.b"), &scope), Some(json!("deep")));
    }

    #[test]
    fn path_missing_is_undefined() {
        let scope = json!({"a": {}});
        assert_eq!(evaluate(&Expr::path("a.b.c"), &scope), None);
    }

    #[test]
    fn func_invoked_with_scope() {
        let scope = json!({"n": 2});
        let expr = Expr::func(|ctx| {
            let n = ctx["n"].as_i64().unwrap_or(0);
            Ok(json!(n * 10))
        });
        assert_eq!(evaluate(&expr, &scope), Some(json!(20)));
    }

    #[test]
    fn func_error_is_undefined() {
        let expr = Expr::func(|_| Err(EvalError::new("boom")));
        assert_eq!(evaluate(&expr, &json!({})), None);
    }

    #[test]
    fn absent_expression_is_undefined() {
        assert_eq!(evaluate_opt(None, &json!({})), None);
    }

    #[test]
    fn truthiness_table() {
        assert!(!truthy(&Value::Null));
        assert!(!truthy(&json!(false)));
        assert!(!truthy(&json!(0)));
        assert!(!truthy(&json!(0.0)));
        assert!(!truthy(&json!("")));
        assert!(truthy(&json!(true)));
        assert!(truthy(&json!(1)));
        assert!(truthy(&json!(-3.5)));
        assert!(truthy(&json!("x")));
        assert!(truthy(&json!([])));
        assert!(truthy(&json!({})));
    }

    #[test]
    fn truthy_opt_undefined_is_falsy() {
        assert!(!truthy_opt(None));
        assert!(truthy_opt(Some(&json!(1))));
    }
}
