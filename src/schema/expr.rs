//! Expression type: literal, dotted context path, or native function.
//!
//! An [`Expr`] is the value-producing half of the schema DSL. In serialized
//! form an expression is either a JSON literal or a string; a string is
//! always interpreted as a dotted path into the context (`"user.name"`).
//! The function variant can only be attached programmatically — it has no
//! JSON representation and is skipped by deserialization.

use std::fmt;
use std::rc::Rc;

use serde::{Deserialize, Deserializer};
use serde_json::Value;

// ---------------------------------------------------------------------------
// EvalError
// ---------------------------------------------------------------------------

/// Failure signaled by a native expression function, transform, or handler.
///
/// Callers never see this error directly: the evaluator catches it at the
/// smallest boundary and treats the value as unavailable.
#[derive(Debug, Clone, thiserror::Error)]
#[error("evaluation failed: {0}")]
pub struct EvalError(pub String);

impl EvalError {
    /// Create an error with the given message.
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

// ---------------------------------------------------------------------------
// Expr
// ---------------------------------------------------------------------------

/// A native computation over the context scope.
pub type ExprFn = Rc<dyn Fn(&Value) -> Result<Value, EvalError>>;

/// An expression evaluated against a context scope.
#[derive(Clone)]
pub enum Expr {
    /// A literal JSON value, returned as-is.
    Literal(Value),
    /// A dotted path into the context (`"a.b.c"`).
    Path(String),
    /// A native function invoked with the scope.
    Func(ExprFn),
}

impl Expr {
    /// Create a literal expression.
    pub fn literal(value: impl Into<Value>) -> Self {
        Self::Literal(value.into())
    }

    /// Create a dotted-path expression.
    pub fn path(path: impl Into<String>) -> Self {
        Self::Path(path.into())
    }

    /// Create a native-function expression.
    pub fn func(f: impl Fn(&Value) -> Result<Value, EvalError> + 'static) -> Self {
        Self::Func(Rc::new(f))
    }
}

impl fmt::Debug for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Literal(v) => write!(f, "Literal({v})"),
            Self::Path(p) => write!(f, "Path({p:?})"),
            Self::Func(_) => write!(f, "Func(<fn>)"),
        }
    }
}

impl<'de> Deserialize<'de> for Expr {
    /// A JSON string is a path; any other JSON value is a literal.
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        Ok(match value {
            Value::String(s) => Self::Path(s),
            other => Self::Literal(other),
        })
    }
}

impl From<&str> for Expr {
    fn from(path: &str) -> Self {
        Self::Path(path.to_owned())
    }
}

// ===========================================================================
// Tests
// ===========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn deserialize_string_is_path() {
        let expr: Expr = serde_json::from_value(json!("user.name")).unwrap();
        assert!(matches!(expr, Expr::Path(p) if p == "user.name"));
    }

    #[test]
    fn deserialize_number_is_literal() {
        let expr: Expr = serde_json::from_value(json!(42)).unwrap();
        assert!(matches!(expr, Expr::Literal(v) if v == json!(42)));
    }

    #[test]
    fn deserialize_bool_is_literal() {
        let expr: Expr = serde_json::from_value(json!(true)).unwrap();
        assert!(matches!(expr, Expr::Literal(Value::Bool(true))));
    }

    #[test]
    fn deserialize_object_is_literal() {
        let expr: Expr = serde_json::from_value(json!({"a": 1})).unwrap();
        assert!(matches!(expr, Expr::Literal(Value::Object(_))));
    }

    #[test]
    fn func_debug_is_opaque() {
        let expr = Expr::func(|_| Ok(Value::Null));
        assert_eq!(format!("{expr:?}"), "Func(<fn>)");
    }

    #[test]
    fn from_str_is_path() {
        let expr: Expr = "a.b".into();
        assert!(matches!(expr, Expr::Path(p) if p == "a.b"));
    }
}
