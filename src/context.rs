//! Context: the shared mutable data object bindings evaluate against.
//!
//! One context lives for the lifetime of one interpreter instance. It is an
//! explicit, passed-by-reference state container with a documented
//! path-get/path-set contract; there are no hidden globals. Value-back
//! bindings hold a cloned handle, so `render()` replaces the contents in
//! place rather than swapping the allocation.

use std::cell::RefCell;
use std::rc::Rc;

use serde_json::{Map, Value};

// ---------------------------------------------------------------------------
// Path traversal
// ---------------------------------------------------------------------------

/// Read a dotted path out of a JSON value.
///
/// Traversal stops with `None` at the first missing key or null/scalar hop.
/// Numeric segments index into arrays. A path that resolves *to* JSON null
/// returns `Some(Value::Null)` — only a broken hop is "undefined".
pub fn path_get(scope: &Value, path: &str) -> Option<Value> {
    if path.is_empty() {
        return None;
    }
    let mut current = scope;
    for segment in path.split('.') {
        current = match current {
            Value::Object(map) => map.get(segment)?,
            Value::Array(items) => {
                let index: usize = segment.parse().ok()?;
                items.get(index)?
            }
            _ => return None,
        };
    }
    Some(current.clone())
}

/// Write a dotted path into a JSON value, auto-creating intermediate objects.
///
/// A non-object intermediate (null, scalar, array) is replaced by a fresh
/// object so the write always lands. Last write wins.
pub fn path_set(target: &mut Value, path: &str, value: Value) {
    if path.is_empty() {
        return;
    }
    let mut current = target;
    let mut segments = path.split('.').peekable();
    while let Some(segment) = segments.next() {
        if !current.is_object() {
            *current = Value::Object(Map::new());
        }
        let map = current.as_object_mut().expect("just ensured object");
        if segments.peek().is_none() {
            map.insert(segment.to_owned(), value);
            return;
        }
        current = map
            .entry(segment.to_owned())
            .or_insert_with(|| Value::Object(Map::new()));
    }
}

// ---------------------------------------------------------------------------
// Context
// ---------------------------------------------------------------------------

/// Shared mutable context object.
///
/// Cloning a `Context` clones the handle, not the data: all clones observe
/// the same underlying object. All access happens on the single render/event
/// thread, so writers follow last-write-wins with no locking.
#[derive(Clone)]
pub struct Context {
    inner: Rc<RefCell<Value>>,
}

impl Context {
    /// Create an empty context.
    pub fn new() -> Self {
        Self {
            inner: Rc::new(RefCell::new(Value::Object(Map::new()))),
        }
    }

    /// Replace the contents in place with `defaults` overlaid by `external`.
    ///
    /// The shared allocation is untouched, so handles held by surviving
    /// value-back listeners keep pointing at live data.
    pub fn reset(&self, defaults: &Map<String, Value>, external: Value) {
        let mut merged = defaults.clone();
        if let Value::Object(ext) = external {
            for (key, value) in ext {
                merged.insert(key, value);
            }
        }
        *self.inner.borrow_mut() = Value::Object(merged);
    }

    /// Shallow-merge a patch object into the live context.
    ///
    /// Non-object patches are ignored.
    pub fn merge(&self, patch: Value) {
        let Value::Object(patch) = patch else {
            return;
        };
        let mut guard = self.inner.borrow_mut();
        let Value::Object(map) = &mut *guard else {
            return;
        };
        for (key, value) in patch {
            map.insert(key, value);
        }
    }

    /// Clone the current contents.
    pub fn snapshot(&self) -> Value {
        self.inner.borrow().clone()
    }

    /// Read a dotted path.
    pub fn get(&self, path: &str) -> Option<Value> {
        path_get(&self.inner.borrow(), path)
    }

    /// Write a dotted path, auto-creating intermediate objects.
    pub fn set(&self, path: &str, value: Value) {
        path_set(&mut self.inner.borrow_mut(), path, value);
    }
}

impl Default for Context {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Context {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Context({})", self.inner.borrow())
    }
}

// ===========================================================================
// Tests
// ===========================================================================
