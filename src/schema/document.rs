//! Schema root: document normalization from JSON text or loose values.
//!
//! A schema root is either a full document (`{ root, contextDefaults?,
//! actions? }`) or a bare container object. [`Document::from_json`] and
//! [`Document::from_value`] normalize both shapes; failures surface as
//! [`SchemaError`] and abort only the render that supplied them.

use serde::Deserialize;
use serde_json::{Map, Value};

use super::action::ActionDef;
use super::node::Container;

/// Errors from schema normalization.
#[derive(Debug, thiserror::Error)]
pub enum SchemaError {
    #[error("invalid schema JSON: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("schema root is neither a document nor a container: {0}")]
    Shape(String),
}

/// A normalized schema root.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Document {
    /// The root container.
    pub root: Container,
    /// Initial context entries, overridden by externally supplied context.
    #[serde(rename = "contextDefaults")]
    pub context_defaults: Map<String, Value>,
    /// The action table. Duplicate ids overwrite earlier entries.
    pub actions: Vec<ActionDef>,
}

impl Document {
    /// Wrap a bare container into a document.
    pub fn from_root(root: Container) -> Self {
        Self {
            root,
            context_defaults: Map::new(),
            actions: Vec::new(),
        }
    }

    /// Set the context defaults (builder).
    pub fn with_defaults(mut self, defaults: Map<String, Value>) -> Self {
        self.context_defaults = defaults;
        self
    }

    /// Append an action definition (builder).
    pub fn with_action(mut self, action: ActionDef) -> Self {
        self.actions.push(action);
        self
    }

    /// Parse a JSON string into a document.
    pub fn from_json(json: &str) -> Result<Self, SchemaError> {
        let value: Value = serde_json::from_str(json)?;
        Self::from_value(value)
    }

    /// Normalize a loose JSON value into a document.
    ///
    /// Accepts a full document (detected by a `root` key) or a bare
    /// container (detected by `kind: "container"` or a `rows` key).
    pub fn from_value(value: Value) -> Result<Self, SchemaError> {
        let Value::Object(ref map) = value else {
            return Err(SchemaError::Shape(format!(
                "expected an object, got {}",
                type_name(&value)
            )));
        };

        if map.contains_key("root") {
            return Ok(serde_json::from_value(value)?);
        }

        let is_container = map
            .get("kind")
            .and_then(Value::as_str)
            .map(|kind| kind == "container")
            .unwrap_or_else(|| map.contains_key("rows"));
        if is_container {
            let root: Container = serde_json::from_value(value)?;
            return Ok(Self::from_root(root));
        }

        Err(SchemaError::Shape(
            "object has neither a `root` key nor a container shape".to_owned(),
        ))
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

// ===========================================================================
// Tests
// ===========================================================================
