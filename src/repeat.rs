//! Repeater support: key tokens, per-site keyed state, collection
//! resolution, and scope overlays.
//!
//! A repeat *site* is one repeater-bearing schema node, identified by its
//! path through the schema (including enclosing item keys, so a repeater
//! nested inside a repeated subtree gets per-item state). Each site tracks
//! a map from computed key token to live mount entry plus the last-seen
//! key order; the render walk drives create/update/destroy off that map.

use std::collections::HashMap;

use serde_json::Value;
use tracing::warn;

use crate::context::path_set;
use crate::eval::evaluate;
use crate::mount::MountId;
use crate::schema::Repeat;

// ---------------------------------------------------------------------------
// KeyToken
// ---------------------------------------------------------------------------

/// Canonical form of a computed repeat key.
///
/// Keys can be any JSON value; tokens normalize them to their compact JSON
/// text so they can be hashed and compared across renders.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct KeyToken(String);

impl KeyToken {
    /// Token for a computed key value.
    pub fn from_value(value: &Value) -> Self {
        Self(value.to_string())
    }

    /// Fallback token for an item index.
    ///
    /// Stable only as long as the collection never reorders or filters.
    pub fn from_index(index: usize) -> Self {
        Self(format!("#{index}"))
    }

    /// Synthetic token for a duplicate key seen in one pass.
    pub fn disambiguate(&self, index: usize) -> Self {
        Self(format!("{}~{index}", self.0))
    }

    /// The token text.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

// ---------------------------------------------------------------------------
// KeyedState
// ---------------------------------------------------------------------------

/// One tracked instance of a repeated node.
#[derive(Debug, Clone, Copy)]
pub struct KeyedEntry {
    /// Root mount of the instance subtree.
    pub mount: MountId,
}

/// Reconciliation state for one repeat site.
#[derive(Debug, Default)]
pub struct KeyedState {
    entries: HashMap<KeyToken, KeyedEntry>,
    order: Vec<KeyToken>,
}

impl KeyedState {
    /// Look up a tracked entry by key.
    pub fn get(&self, key: &KeyToken) -> Option<KeyedEntry> {
        self.entries.get(key).copied()
    }

    /// Track a new entry.
    pub fn insert(&mut self, key: KeyToken, entry: KeyedEntry) {
        self.entries.insert(key, entry);
    }

    /// Remove every entry whose key was not seen this pass, returning the
    /// removed entries for teardown, and record the new key order.
    pub fn retain_seen(&mut self, seen: &[KeyToken]) -> Vec<KeyedEntry> {
        let mut removed = Vec::new();
        self.entries.retain(|key, entry| {
            if seen.contains(key) {
                true
            } else {
                removed.push(*entry);
                false
            }
        });
        self.order = seen.to_vec();
        removed
    }

    /// Keys in last-render order.
    pub fn order(&self) -> &[KeyToken] {
        &self.order
    }

    /// All tracked entries, in arbitrary order.
    pub fn entries(&self) -> impl Iterator<Item = KeyedEntry> + '_ {
        self.entries.values().copied()
    }

    /// Drop entries whose mounts were destroyed externally (e.g. when an
    /// enclosing subtree was rebuilt).
    pub fn purge_mounts(&mut self, destroyed: &[MountId]) {
        let entries = &mut self.entries;
        entries.retain(|_, entry| !destroyed.contains(&entry.mount));
        self.order.retain(|key| entries.contains_key(key));
    }

    /// Number of tracked instances.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the site tracks no instances.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Collection resolution
// ---------------------------------------------------------------------------

/// A repeat collection resolved against a scope, after virtualization and
/// limit accounting.
#[derive(Debug)]
pub struct ResolvedRepeat {
    /// Items that will actually be rendered, in collection order.
    pub items: Vec<Value>,
    /// How many items virtualization cut from instantiation.
    pub truncated: usize,
    /// Whether the underlying collection was empty.
    pub collection_empty: bool,
}

impl ResolvedRepeat {
    /// Evaluate and slice a repeat's collection.
    ///
    /// `virtual_cap` is the instantiation cap for virtualizing component
    /// nodes (`None` for rows/columns). Virtualization truncates
    /// *instantiation*, not the logical collection: `truncated` is
    /// `collection.len() - working.len()` before the `rLimit` cut.
    pub fn resolve(repeat: &Repeat, scope: &Value, virtual_cap: Option<usize>) -> Self {
        let collection = repeat
            .of
            .as_ref()
            .and_then(|expr| evaluate(expr, scope))
            .and_then(|value| match value {
                Value::Array(items) => Some(items),
                _ => None,
            })
            .unwrap_or_default();
        let collection_empty = collection.is_empty();
        let total = collection.len();

        let mut items = collection;
        let mut truncated = 0;
        if let Some(cap) = virtual_cap {
            if total > cap {
                items.truncate(cap);
                truncated = total - items.len();
            }
        }

        let limit = repeat.limit.unwrap_or(items.len());
        items.truncate(limit);

        Self {
            items,
            truncated,
            collection_empty,
        }
    }
}

/// Build the overlay scope for one repeat item: the base scope plus the
/// item under its alias and the index under its index alias.
pub fn overlay_scope(scope: &Value, repeat: &Repeat, item: &Value, index: usize) -> Value {
    let mut overlaid = scope.clone();
    path_set(&mut overlaid, repeat.alias(), item.clone());
    path_set(&mut overlaid, repeat.index_alias(), Value::from(index));
    overlaid
}

/// Compute the key token for one item, disambiguating duplicates.
pub fn item_key(
    repeat: &Repeat,
    item_scope: &Value,
    index: usize,
    seen: &[KeyToken],
    debug: bool,
) -> KeyToken {
    let key = match &repeat.key {
        Some(expr) => evaluate(expr, item_scope)
            .map(|value| KeyToken::from_value(&value))
            .unwrap_or_else(|| KeyToken::from_index(index)),
        None => KeyToken::from_index(index),
    };
    if seen.contains(&key) {
        if debug {
            warn!(key = key.as_str(), index, "duplicate repeat key");
        }
        return key.disambiguate(index);
    }
    key
}

// ===========================================================================
// Tests
// ===========================================================================
