//! Mount node types: MountId, MountKind, MountData.

use std::collections::BTreeMap;

use slotmap::new_key_type;

use crate::bind::ValueBack;
use crate::host::WidgetInstance;

new_key_type! {
    /// Unique identifier for a mounted node. Copy, lightweight (u64).
    pub struct MountId;
}

/// What a mounted node is.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MountKind {
    /// A container, with its resolved title.
    Container { title: Option<String> },
    /// A row.
    Row,
    /// A column with its clamped span.
    Column { span: u8 },
    /// An instantiated component.
    Component { type_tag: String },
    /// Placeholder for a component whose type tag the host rejected.
    Unsupported { type_tag: String },
}

impl MountKind {
    /// Short kind label, used by queries and debugging.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Container { .. } => "container",
            Self::Row => "row",
            Self::Column { .. } => "column",
            Self::Component { .. } => "component",
            Self::Unsupported { .. } => "unsupported",
        }
    }
}

/// Data associated with a single mounted node.
pub struct MountData {
    /// What this node is.
    pub kind: MountKind,
    /// Classes applied to the node (split from the schema's class string).
    pub classes: Vec<String>,
    /// Style custom properties applied to the node.
    ///
    /// Application is idempotent; hosts may defer the cosmetic write to a
    /// later frame.
    pub css_vars: BTreeMap<String, String>,
    /// The live widget instance, for component nodes.
    pub widget: Option<Box<dyn WidgetInstance>>,
    /// Value-back subscriptions owned by this node.
    pub value_backs: Vec<ValueBack>,
}

impl MountData {
    /// Create node data with the given kind and no styling.
    pub fn new(kind: MountKind) -> Self {
        Self {
            kind,
            classes: Vec::new(),
            css_vars: BTreeMap::new(),
            widget: None,
            value_backs: Vec::new(),
        }
    }

    /// Split a schema class string into classes (builder).
    pub fn with_class_str(mut self, class: Option<&str>) -> Self {
        if let Some(class) = class {
            for part in class.split_whitespace() {
                let part = part.to_owned();
                if !self.classes.contains(&part) {
                    self.classes.push(part);
                }
            }
        }
        self
    }

    /// Set the style custom properties (builder).
    pub fn with_css_vars(mut self, vars: BTreeMap<String, String>) -> Self {
        self.css_vars = vars;
        self
    }

    /// Attach the widget instance (builder).
    pub fn with_widget(mut self, widget: Box<dyn WidgetInstance>) -> Self {
        self.widget = Some(widget);
        self
    }

    /// Check whether this node has a given class.
    pub fn has_class(&self, class: &str) -> bool {
        self.classes.iter().any(|c| c == class)
    }

    /// The component type tag, for component and unsupported nodes.
    pub fn type_tag(&self) -> Option<&str> {
        match &self.kind {
            MountKind::Component { type_tag } | MountKind::Unsupported { type_tag } => {
                Some(type_tag)
            }
            _ => None,
        }
    }

    /// Kill subscriptions and destroy the widget.
    ///
    /// Killing the guards first guarantees no notification fired during
    /// widget teardown can write into the context.
    pub fn teardown(&mut self) {
        for guard in &self.value_backs {
            guard.kill();
        }
        self.value_backs.clear();
        if let Some(widget) = &mut self.widget {
            widget.destroy();
        }
    }
}

impl std::fmt::Debug for MountData {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MountData")
            .field("kind", &self.kind)
            .field("classes", &self.classes)
            .field("css_vars", &self.css_vars)
            .field("widget", &self.widget.as_ref().map(|w| w.type_tag().to_owned()))
            .field("value_backs", &self.value_backs.len())
            .finish()
    }
}

// ===========================================================================
// Tests
// ===========================================================================
