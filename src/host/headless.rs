//! Headless widgets: programmatic instances for tests and embedders
//! without a real UI layer.
//!
//! A [`HeadlessWidget`] records every property write and lets callers
//! simulate user interaction (`emit_value`, `emit_change`) the way a live
//! widget would fire its notifications.

use std::any::Any;
use std::collections::BTreeMap;

use serde_json::Value;

use super::{ComponentHost, HostRegistry, ValueListener, WidgetInstance};

// ---------------------------------------------------------------------------
// HeadlessWidget
// ---------------------------------------------------------------------------

/// An in-memory widget with a property bag and simulated notifications.
pub struct HeadlessWidget {
    type_tag: String,
    properties: BTreeMap<String, Value>,
    value_listeners: Vec<ValueListener>,
    change_listeners: Vec<ValueListener>,
    supports_value_changes: bool,
    destroyed: bool,
}

impl HeadlessWidget {
    /// Create a widget supporting both notification channels.
    pub fn new(type_tag: impl Into<String>) -> Self {
        Self {
            type_tag: type_tag.into(),
            properties: BTreeMap::new(),
            value_listeners: Vec::new(),
            change_listeners: Vec::new(),
            supports_value_changes: true,
            destroyed: false,
        }
    }

    /// Create a widget without value-changed support, so subscribers fall
    /// back to the generic change channel.
    pub fn without_value_changes(type_tag: impl Into<String>) -> Self {
        Self {
            supports_value_changes: false,
            ..Self::new(type_tag)
        }
    }

    /// Read a recorded property.
    pub fn property(&self, name: &str) -> Option<&Value> {
        self.properties.get(name)
    }

    /// All recorded properties.
    pub fn properties(&self) -> &BTreeMap<String, Value> {
        &self.properties
    }

    /// Whether `destroy` has been called.
    pub fn is_destroyed(&self) -> bool {
        self.destroyed
    }

    /// Number of live value-changed subscribers.
    pub fn value_listener_count(&self) -> usize {
        self.value_listeners.len()
    }

    /// Number of live generic-change subscribers.
    pub fn change_listener_count(&self) -> usize {
        self.change_listeners.len()
    }

    /// Simulate the user changing the widget's value.
    ///
    /// Records the value property and fires value-changed listeners.
    pub fn emit_value(&mut self, value: Value) {
        self.properties.insert("value".to_owned(), value.clone());
        for listener in &self.value_listeners {
            listener(&value);
        }
    }

    /// Simulate a generic change notification.
    pub fn emit_change(&mut self, value: Value) {
        for listener in &self.change_listeners {
            listener(&value);
        }
    }
}

impl WidgetInstance for HeadlessWidget {
    fn type_tag(&self) -> &str {
        &self.type_tag
    }

    fn set_property(&mut self, name: &str, value: Value) {
        self.properties.insert(name.to_owned(), value);
    }

    fn on_value_changed(&mut self, listener: ValueListener) -> bool {
        if !self.supports_value_changes {
            return false;
        }
        self.value_listeners.push(listener);
        true
    }

    fn on_changed(&mut self, listener: ValueListener) -> bool {
        self.change_listeners.push(listener);
        true
    }

    fn destroy(&mut self) {
        self.value_listeners.clear();
        self.change_listeners.clear();
        self.destroyed = true;
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

impl std::fmt::Debug for HeadlessWidget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HeadlessWidget")
            .field("type_tag", &self.type_tag)
            .field("properties", &self.properties)
            .field("destroyed", &self.destroyed)
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Built-in registry
// ---------------------------------------------------------------------------

/// A registry of common headless widget tags.
///
/// Tags: `text`, `button`, `select`, `checkbox`, `label`, `badge`, `card`.
pub fn headless_registry() -> HostRegistry {
    let mut registry = HostRegistry::new();
    for tag in ["text", "button", "select", "checkbox", "label", "badge", "card"] {
        registry.register(tag, move || Box::new(HeadlessWidget::new(tag)));
    }
    registry
}

// ===========================================================================
// Tests
// ===========================================================================
