//! Layout node tree: Container, Row, Column, Component.
//!
//! These are the plain-data schema types the interpreter walks. The tagged
//! union [`LayoutNode`] is discriminated by `kind` in serialized form.
//! Rows, columns, and components all carry optional repeater fields; only
//! components carry bindings, conditions, triggers, and virtualization.

use std::collections::BTreeMap;

use serde::Deserialize;
use serde_json::{Map, Value};

use super::action::ActionTrigger;
use super::binding::Binding;
use super::expr::Expr;

// ---------------------------------------------------------------------------
// LayoutNode
// ---------------------------------------------------------------------------

/// A node in the layout tree, discriminated by `kind`.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum LayoutNode {
    Container(Container),
    Row(Row),
    Column(Column),
    Component(Component),
}

// ---------------------------------------------------------------------------
// Repeat
// ---------------------------------------------------------------------------

/// Repeater fields shared by rows, columns, and components.
///
/// A node repeats when `rOf` is present. The collection expression is
/// evaluated against the current scope; each item renders with an overlay
/// scope exposing the item under `rAs` (default `"item"`) and its index
/// under `rIndex` (default `"index"`).
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Repeat {
    /// Collection expression. Presence activates the repeater.
    #[serde(rename = "rOf")]
    pub of: Option<Expr>,
    /// Item alias in the overlay scope.
    #[serde(rename = "rAs")]
    pub alias: Option<String>,
    /// Index alias in the overlay scope.
    #[serde(rename = "rIndex")]
    pub index_alias: Option<String>,
    /// Stable per-item key expression; falls back to the item index.
    #[serde(rename = "rKey")]
    pub key: Option<Expr>,
    /// Maximum number of items to render.
    #[serde(rename = "rLimit")]
    pub limit: Option<usize>,
    /// Fallback node rendered once when the collection is empty.
    #[serde(rename = "rEmpty")]
    pub empty: Option<Box<LayoutNode>>,
}

impl Repeat {
    /// Whether this node repeats.
    pub fn is_active(&self) -> bool {
        self.of.is_some()
    }

    /// The item alias, defaulted.
    pub fn alias(&self) -> &str {
        self.alias.as_deref().unwrap_or("item")
    }

    /// The index alias, defaulted.
    pub fn index_alias(&self) -> &str {
        self.index_alias.as_deref().unwrap_or("index")
    }

    /// Repeat over a collection expression (builder).
    pub fn of(expr: impl Into<Expr>) -> Self {
        Self {
            of: Some(expr.into()),
            ..Self::default()
        }
    }

    /// Set the item alias (builder).
    pub fn with_alias(mut self, alias: impl Into<String>) -> Self {
        self.alias = Some(alias.into());
        self
    }

    /// Set the key expression (builder).
    pub fn keyed_by(mut self, expr: impl Into<Expr>) -> Self {
        self.key = Some(expr.into());
        self
    }

    /// Set the item limit (builder).
    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Set the empty-collection fallback node (builder).
    pub fn with_empty(mut self, node: LayoutNode) -> Self {
        self.empty = Some(Box::new(node));
        self
    }
}

// ---------------------------------------------------------------------------
// Conditions
// ---------------------------------------------------------------------------

/// Conditional expressions on a component.
///
/// `if` and `visible` gate rendering; `disabled` and `readonly` only mutate
/// the instantiated widget's state.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Conditions {
    #[serde(rename = "if")]
    pub if_: Option<Expr>,
    pub visible: Option<Expr>,
    pub disabled: Option<Expr>,
    pub readonly: Option<Expr>,
}

// ---------------------------------------------------------------------------
// I18n
// ---------------------------------------------------------------------------

/// Translation keys resolved through the translator collaborator.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct I18n {
    /// Key resolved into the widget's `label` property.
    #[serde(rename = "labelKey")]
    pub label_key: Option<String>,
    /// Property name to translation key, resolved into each named property.
    pub placeholders: BTreeMap<String, String>,
}

// ---------------------------------------------------------------------------
// Container / Row / Column
// ---------------------------------------------------------------------------

/// Top-level grouping node holding an ordered sequence of rows.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Container {
    pub title: Option<String>,
    pub class: Option<String>,
    pub visible: Option<Expr>,
    pub rows: Vec<Row>,
}

impl Container {
    /// Create an empty container.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the title (builder).
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Set the class string (builder).
    pub fn with_class(mut self, class: impl Into<String>) -> Self {
        self.class = Some(class.into());
        self
    }

    /// Set the visibility expression (builder).
    pub fn with_visible(mut self, expr: impl Into<Expr>) -> Self {
        self.visible = Some(expr.into());
        self
    }

    /// Append a row (builder).
    pub fn with_row(mut self, row: Row) -> Self {
        self.rows.push(row);
        self
    }
}

/// A horizontal grouping of columns.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Row {
    pub class: Option<String>,
    pub visible: Option<Expr>,
    pub columns: Vec<Column>,
    #[serde(flatten)]
    pub repeat: Repeat,
}

impl Row {
    /// Create an empty row.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a column (builder).
    pub fn with_column(mut self, column: Column) -> Self {
        self.columns.push(column);
        self
    }

    /// Set the repeater (builder).
    pub fn with_repeat(mut self, repeat: Repeat) -> Self {
        self.repeat = repeat;
        self
    }
}

fn default_span() -> u8 {
    12
}

/// A span-sized cell holding arbitrary content nodes.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Column {
    /// Grid span; layout engines render 12 spans per row.
    pub span: u8,
    pub class: Option<String>,
    pub visible: Option<Expr>,
    pub content: Vec<LayoutNode>,
    #[serde(flatten)]
    pub repeat: Repeat,
}

impl Default for Column {
    fn default() -> Self {
        Self {
            span: default_span(),
            class: None,
            visible: None,
            content: Vec::new(),
            repeat: Repeat::default(),
        }
    }
}

impl Column {
    /// Create a full-width column.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the span (builder). Clamped into [1, 12] at mount time.
    pub fn with_span(mut self, span: u8) -> Self {
        self.span = span;
        self
    }

    /// Append a content node (builder).
    pub fn with_content(mut self, node: LayoutNode) -> Self {
        self.content.push(node);
        self
    }

    /// Set the repeater (builder).
    pub fn with_repeat(mut self, repeat: Repeat) -> Self {
        self.repeat = repeat;
        self
    }

    /// The span clamped into the valid [1, 12] range.
    pub fn clamped_span(&self) -> u8 {
        self.span.clamp(1, 12)
    }
}

// ---------------------------------------------------------------------------
// Component
// ---------------------------------------------------------------------------

fn default_virtual_limit() -> usize {
    100
}

/// A leaf node instantiating an external UI widget by type tag.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Component {
    /// Type tag naming which external widget to instantiate.
    pub component: String,
    /// Flat property bag applied verbatim onto the instantiated widget.
    pub config: Map<String, Value>,
    /// Target property path to binding. `bind` is accepted as an alias.
    #[serde(alias = "bind")]
    pub bindings: BTreeMap<String, Binding>,
    pub conditions: Conditions,
    pub actions: Vec<ActionTrigger>,
    /// Style custom-property map applied to the mounted node.
    #[serde(rename = "cssVars")]
    pub css_vars: BTreeMap<String, String>,
    pub class: Option<String>,
    pub visible: Option<Expr>,
    #[serde(flatten)]
    pub repeat: Repeat,
    /// Cap actually-instantiated items for large repeated collections.
    pub virtualize: bool,
    #[serde(rename = "virtualLimit")]
    pub virtual_limit: usize,
    pub i18n: Option<I18n>,
}

impl Default for Component {
    fn default() -> Self {
        Self {
            component: String::new(),
            config: Map::new(),
            bindings: BTreeMap::new(),
            conditions: Conditions::default(),
            actions: Vec::new(),
            css_vars: BTreeMap::new(),
            class: None,
            visible: None,
            repeat: Repeat::default(),
            virtualize: false,
            virtual_limit: default_virtual_limit(),
            i18n: None,
        }
    }
}

impl Component {
    /// Create a component node with the given type tag.
    pub fn new(component: impl Into<String>) -> Self {
        Self {
            component: component.into(),
            ..Self::default()
        }
    }

    /// Set a config property (builder).
    pub fn with_config(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.config.insert(key.into(), value.into());
        self
    }

    /// Attach a binding to a target property path (builder).
    pub fn with_binding(mut self, target: impl Into<String>, binding: Binding) -> Self {
        self.bindings.insert(target.into(), binding);
        self
    }

    /// Set the conditions (builder).
    pub fn with_conditions(mut self, conditions: Conditions) -> Self {
        self.conditions = conditions;
        self
    }

    /// Append an action trigger (builder).
    pub fn with_trigger(mut self, trigger: ActionTrigger) -> Self {
        self.actions.push(trigger);
        self
    }

    /// Set the class string (builder).
    pub fn with_class(mut self, class: impl Into<String>) -> Self {
        self.class = Some(class.into());
        self
    }

    /// Set a style custom property (builder).
    pub fn with_css_var(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.css_vars.insert(name.into(), value.into());
        self
    }

    /// Set the visibility expression (builder).
    pub fn with_visible(mut self, expr: impl Into<Expr>) -> Self {
        self.visible = Some(expr.into());
        self
    }

    /// Set the repeater (builder).
    pub fn with_repeat(mut self, repeat: Repeat) -> Self {
        self.repeat = repeat;
        self
    }

    /// Enable virtualization with the given instantiation cap (builder).
    pub fn virtualized(mut self, limit: usize) -> Self {
        self.virtualize = true;
        self.virtual_limit = limit;
        self
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
    fn deserialize_tagged_component() {
        let node: LayoutNode = serde_json::from_value(json!({
            "kind": "component",
            "component": "text",
            "config": {"label": "Name"}
        }))
        .unwrap();
        let LayoutNode::Component(comp) = node else {
            panic!("expected component");
        };
        assert_eq!(comp.component, "text");
        assert_eq!(comp.config.get("label"), Some(&json!("Name")));
        assert_eq!(comp.virtual_limit, 100);
    }

    #[test]
    fn deserialize_nested_tree() {
        let node: LayoutNode = serde_json::from_value(json!({
            "kind": "container",
            "title": "Account",
            "rows": [{
                "kind": "row",
                "columns": [{
                    "kind": "column",
                    "span": 6,
                    "content": [{"kind": "component", "component": "badge"}]
                }]
            }]
        }))
        .unwrap();
        let LayoutNode::Container(container) = node else {
            panic!("expected container");
        };
        assert_eq!(container.title.as_deref(), Some("Account"));
        assert_eq!(container.rows.len(), 1);
        assert_eq!(container.rows[0].columns[0].span, 6);
        assert_eq!(container.rows[0].columns[0].content.len(), 1);
    }

    #[test]
    fn column_span_defaults_to_twelve() {
        let column: Column = serde_json::from_value(json!({"kind": "column"})).unwrap();
        assert_eq!(column.span, 12);
    }

    #[test]
    fn column_span_clamped() {
        assert_eq!(Column::new().with_span(0).clamped_span(), 1);
        assert_eq!(Column::new().with_span(200).clamped_span(), 12);
        assert_eq!(Column::new().with_span(7).clamped_span(), 7);
    }

    #[test]
    fn repeat_fields_flatten() {
        let row: Row = serde_json::from_value(json!({
            "rOf": "users",
            "rAs": "user",
            "rKey": "user.id",
            "rLimit": 3,
            "columns": []
        }))
        .unwrap();
        assert!(row.repeat.is_active());
        assert_eq!(row.repeat.alias(), "user");
        assert_eq!(row.repeat.limit, Some(3));
        assert!(row.repeat.key.is_some());
    }

    #[test]
    fn repeat_aliases_default() {
        let repeat = Repeat::of("items");
        assert_eq!(repeat.alias(), "item");
        assert_eq!(repeat.index_alias(), "index");
    }

    #[test]
    fn repeat_inactive_without_collection() {
        assert!(!Repeat::default().is_active());
    }

    #[test]
    fn bind_alias_accepted() {
        let comp: Component = serde_json::from_value(json!({
            "component": "text",
            "bind": {"value": {"path": "user.name"}}
        }))
        .unwrap();
        assert!(comp.bindings.contains_key("value"));
    }

    #[test]
    fn conditions_if_keyword() {
        let comp: Component = serde_json::from_value(json!({
            "component": "text",
            "conditions": {"if": "flags.on", "disabled": "flags.locked"}
        }))
        .unwrap();
        assert!(comp.conditions.if_.is_some());
        assert!(comp.conditions.disabled.is_some());
        assert!(comp.conditions.visible.is_none());
    }

    #[test]
    fn i18n_placeholders_map() {
        let comp: Component = serde_json::from_value(json!({
            "component": "text",
            "i18n": {"labelKey": "form.name", "placeholders": {"placeholder": "form.hint"}}
        }))
        .unwrap();
        let i18n = comp.i18n.unwrap();
        assert_eq!(i18n.label_key.as_deref(), Some("form.name"));
        assert_eq!(i18n.placeholders.get("placeholder").map(String::as_str), Some("form.hint"));
    }

    #[test]
    fn virtualize_fields() {
        let comp: Component = serde_json::from_value(json!({
            "component": "card",
            "rOf": "entries",
            "virtualize": true,
            "virtualLimit": 50
        }))
        .unwrap();
        assert!(comp.virtualize);
        assert_eq!(comp.virtual_limit, 50);
    }

    #[test]
    fn empty_fallback_node() {
        let row: Row = serde_json::from_value(json!({
            "rOf": "items",
            "rEmpty": {"kind": "component", "component": "placeholder"},
            "columns": []
        }))
        .unwrap();
        assert!(matches!(
            row.repeat.empty.as_deref(),
            Some(LayoutNode::Component(_))
        ));
    }
}
