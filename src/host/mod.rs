//! Component host: the collaborator that instantiates UI widgets.
//!
//! The interpreter never assumes more of a widget than this minimal surface:
//! a settable property bag, optional value-changed and generic change
//! notifications, a destroy operation, and downcast hooks for inspection.
//! Hosts resolve type tags through an explicit, closed registry — unknown
//! tags are a first-class "unsupported" outcome, not a crash.

pub mod headless;

use std::any::Any;
use std::collections::HashMap;

use serde_json::Value;

pub use headless::{headless_registry, HeadlessWidget};

// ---------------------------------------------------------------------------
// WidgetInstance
// ---------------------------------------------------------------------------

/// Callback receiving a widget's new value.
pub type ValueListener = Box<dyn Fn(&Value)>;

/// One instantiated UI widget, owned by the mount tree.
///
/// Object-safe: the interpreter holds these as `Box<dyn WidgetInstance>`.
pub trait WidgetInstance {
    /// The type tag this widget was instantiated from.
    fn type_tag(&self) -> &str;

    /// Set a named property. Applied verbatim; unknown names are the
    /// widget's business.
    fn set_property(&mut self, name: &str, value: Value);

    /// Subscribe to value-changed notifications.
    ///
    /// Returns `false` (dropping the listener) when the widget does not
    /// support them. Defaults to unsupported.
    fn on_value_changed(&mut self, listener: ValueListener) -> bool {
        let _ = listener;
        false
    }

    /// Subscribe to generic change notifications (fallback channel).
    ///
    /// Defaults to unsupported.
    fn on_changed(&mut self, listener: ValueListener) -> bool {
        let _ = listener;
        false
    }

    /// Tear the widget down. Implementations drop their listeners here.
    fn destroy(&mut self);

    /// Downcast to `&dyn Any` for runtime type inspection.
    fn as_any(&self) -> &dyn Any;

    /// Downcast to `&mut dyn Any` for mutable runtime type inspection.
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

// ---------------------------------------------------------------------------
// ComponentHost
// ---------------------------------------------------------------------------

/// Produces widget instances from type tags.
pub trait ComponentHost {
    /// Instantiate a widget for the given type tag.
    ///
    /// `None` means the tag is unsupported; the interpreter renders a
    /// visible placeholder node instead of aborting the tree.
    fn instantiate(&mut self, type_tag: &str) -> Option<Box<dyn WidgetInstance>>;
}

// ---------------------------------------------------------------------------
// HostRegistry
// ---------------------------------------------------------------------------

/// Factory producing a fresh widget instance.
pub type WidgetFactory = Box<dyn Fn() -> Box<dyn WidgetInstance>>;

/// A closed type-tag registry backing [`ComponentHost`].
///
/// Registering a tag that already exists replaces the previous factory.
pub struct HostRegistry {
    factories: HashMap<String, WidgetFactory>,
}

impl HostRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            factories: HashMap::new(),
        }
    }

    /// Register a factory for a type tag.
    pub fn register(
        &mut self,
        type_tag: impl Into<String>,
        factory: impl Fn() -> Box<dyn WidgetInstance> + 'static,
    ) {
        self.factories.insert(type_tag.into(), Box::new(factory));
    }

    /// Remove a type tag. Returns whether it was registered.
    pub fn unregister(&mut self, type_tag: &str) -> bool {
        self.factories.remove(type_tag).is_some()
    }

    /// Whether a type tag is registered.
    pub fn contains(&self, type_tag: &str) -> bool {
        self.factories.contains_key(type_tag)
    }

    /// Number of registered type tags.
    pub fn len(&self) -> usize {
        self.factories.len()
    }

    /// Whether the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.factories.is_empty()
    }
}

impl Default for HostRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ComponentHost for HostRegistry {
    fn instantiate(&mut self, type_tag: &str) -> Option<Box<dyn WidgetInstance>> {
        self.factories.get(type_tag).map(|factory| factory())
    }
}

impl std::fmt::Debug for HostRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut tags: Vec<&str> = self.factories.keys().map(String::as_str).collect();
        tags.sort_unstable();
        f.debug_struct("HostRegistry").field("tags", &tags).finish()
    }
}

// ===========================================================================
// Tests
// ===========================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_registry_rejects_everything() {
        let mut registry = HostRegistry::new();
        assert!(registry.is_empty());
        assert!(registry.instantiate("text").is_none());
    }

    #[test]
    fn register_and_instantiate() {
        let mut registry = HostRegistry::new();
        registry.register("text", || Box::new(HeadlessWidget::new("text")));
        assert!(registry.contains("text"));
        assert_eq!(registry.len(), 1);

        let widget = registry.instantiate("text").unwrap();
        assert_eq!(widget.type_tag(), "text");
    }

    #[test]
    fn unknown_tag_is_none() {
        let mut registry = HostRegistry::new();
        registry.register("text", || Box::new(HeadlessWidget::new("text")));
        assert!(registry.instantiate("chart").is_none());
    }

    #[test]
    fn reregister_replaces_factory() {
        let mut registry = HostRegistry::new();
        registry.register("x", || Box::new(HeadlessWidget::new("first")));
        registry.register("x", || Box::new(HeadlessWidget::new("second")));
        assert_eq!(registry.len(), 1);
        let widget = registry.instantiate("x").unwrap();
        assert_eq!(widget.type_tag(), "second");
    }

    #[test]
    fn unregister() {
        let mut registry = HostRegistry::new();
        registry.register("x", || Box::new(HeadlessWidget::new("x")));
        assert!(registry.unregister("x"));
        assert!(!registry.unregister("x"));
        assert!(registry.instantiate("x").is_none());
    }

    #[test]
    fn factories_produce_fresh_instances() {
        let mut registry = HostRegistry::new();
        registry.register("text", || Box::new(HeadlessWidget::new("text")));
        let mut a = registry.instantiate("text").unwrap();
        let b = registry.instantiate("text").unwrap();
        a.set_property("label", serde_json::json!("A"));
        let a = a.as_any().downcast_ref::<HeadlessWidget>().unwrap();
        let b = b.as_any().downcast_ref::<HeadlessWidget>().unwrap();
        assert!(a.property("label").is_some());
        assert!(b.property("label").is_none());
    }
}
