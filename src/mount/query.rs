//! Mount tree queries: by component tag, class, kind; generic predicates.

use super::node::{MountData, MountId};
use super::tree::MountTree;

impl MountTree {
    /// Find all component nodes with the given type tag, in tree order
    /// under the current root (detached nodes are not visited).
    pub fn query_by_component(&self, type_tag: &str) -> Vec<MountId> {
        self.query_tree(|data| data.type_tag() == Some(type_tag))
    }

    /// Find all nodes that have the given class, in tree order.
    pub fn query_by_class(&self, class: &str) -> Vec<MountId> {
        self.query_tree(|data| data.has_class(class))
    }

    /// Find all nodes with the given kind label, in tree order.
    pub fn query_by_kind(&self, label: &str) -> Vec<MountId> {
        self.query_tree(|data| data.kind.label() == label)
    }

    /// Find all nodes under the root matching an arbitrary predicate,
    /// in tree order.
    pub fn query_tree(&self, predicate: impl Fn(&MountData) -> bool) -> Vec<MountId> {
        let Some(root) = self.root() else {
            return Vec::new();
        };
        self.walk(root)
            .into_iter()
            .filter(|&id| self.get(id).map(&predicate).unwrap_or(false))
            .collect()
    }

    /// Find all nodes in the whole arena (including detached ones)
    /// matching a predicate. Arena order, not tree order.
    pub fn query_all(&self, predicate: impl Fn(&MountData) -> bool) -> Vec<MountId> {
        self.nodes
            .iter()
            .filter(|(_, data)| predicate(data))
            .map(|(id, _)| id)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use crate::mount::node::{MountData, MountKind};
    use crate::mount::tree::MountTree;

    /// Build a small query tree:
    /// ```text
    ///        root (container)
    ///        /              \
    ///     row .list       row
    ///      /     \           \
    ///  text     badge       text .muted
    /// ```
    fn build_tree() -> MountTree {
        let mut tree = MountTree::new();
        let root = tree.insert(MountData::new(MountKind::Container { title: None }));
        tree.set_root(Some(root));
        let row_a =
            tree.insert_child(root, MountData::new(MountKind::Row).with_class_str(Some("list")));
        let row_b = tree.insert_child(root, MountData::new(MountKind::Row));
        tree.insert_child(
            row_a,
            MountData::new(MountKind::Component {
                type_tag: "text".to_owned(),
            }),
        );
        tree.insert_child(
            row_a,
            MountData::new(MountKind::Component {
                type_tag: "badge".to_owned(),
            }),
        );
        tree.insert_child(
            row_b,
            MountData::new(MountKind::Component {
                type_tag: "text".to_owned(),
            })
            .with_class_str(Some("muted")),
        );
        tree
    }

    #[test]
    fn query_by_component_tag() {
        let tree = build_tree();
        assert_eq!(tree.query_by_component("text").len(), 2);
        assert_eq!(tree.query_by_component("badge").len(), 1);
        assert!(tree.query_by_component("chart").is_empty());
    }

    #[test]
    fn query_by_class() {
        let tree = build_tree();
        assert_eq!(tree.query_by_class("list").len(), 1);
        assert_eq!(tree.query_by_class("muted").len(), 1);
        assert!(tree.query_by_class("missing").is_empty());
    }

    #[test]
    fn query_by_kind() {
        let tree = build_tree();
        assert_eq!(tree.query_by_kind("row").len(), 2);
        assert_eq!(tree.query_by_kind("component").len(), 3);
        assert_eq!(tree.query_by_kind("container").len(), 1);
    }

    #[test]
    fn query_tree_skips_detached() {
        let mut tree = build_tree();
        tree.insert(MountData::new(MountKind::Component {
            type_tag: "text".to_owned(),
        }));
        // The detached node exists in the arena but not under the root.
        assert_eq!(tree.query_by_component("text").len(), 2);
        assert_eq!(
            tree.query_all(|d| d.type_tag() == Some("text")).len(),
            3
        );
    }

    #[test]
    fn query_without_root_is_empty() {
        let tree = MountTree::new();
        assert!(tree.query_by_kind("row").is_empty());
    }
}
