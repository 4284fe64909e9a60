//! Binding definition: context path plus transform/default/strict modifiers.

use std::fmt;
use std::rc::Rc;

use serde::Deserialize;
use serde_json::Value;

use super::expr::EvalError;

/// A native transform applied to a resolved base value.
///
/// Receives `(base_value, scope)` and produces the final bound value. An
/// error falls back to the untransformed base value.
pub type TransformFn = Rc<dyn Fn(&Value, &Value) -> Result<Value, EvalError>>;

/// Declarative rule mapping a context path to a widget property.
///
/// Resolution order: evaluate `path` against the scope; if it comes back
/// undefined, `strict` short-circuits to undefined, otherwise `default`
/// substitutes; finally `transform` runs over the result.
#[derive(Clone, Default, Deserialize)]
#[serde(default)]
pub struct Binding {
    /// Dotted context path supplying the base value.
    pub path: Option<String>,
    /// Optional transform. Construction-only; no JSON representation.
    #[serde(skip)]
    pub transform: Option<TransformFn>,
    /// Fallback when the path resolves to nothing (non-strict only).
    pub default: Option<Value>,
    /// When set, a missing path yields undefined even if `default` is present.
    pub strict: bool,
}

impl Binding {
    /// Create a binding reading from a context path.
    pub fn path(path: impl Into<String>) -> Self {
        Self {
            path: Some(path.into()),
            ..Self::default()
        }
    }

    /// Set the fallback value (builder).
    pub fn with_default(mut self, default: impl Into<Value>) -> Self {
        self.default = Some(default.into());
        self
    }

    /// Set strict mode (builder).
    pub fn strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    /// Attach a transform (builder).
    pub fn with_transform(
        mut self,
        f: impl Fn(&Value, &Value) -> Result<Value, EvalError> + 'static,
    ) -> Self {
        self.transform = Some(Rc::new(f));
        self
    }
}

impl fmt::Debug for Binding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Binding")
            .field("path", &self.path)
            .field("transform", &self.transform.as_ref().map(|_| "<fn>"))
            .field("default", &self.default)
            .field("strict", &self.strict)
            .finish()
    }
}
