use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use uuid::Uuid;

/// Opaque metadata attached to an item. Never inspected by the engine.
pub type Metadata = Map<String, Value>;

/// Unique identifier for an item in the source list
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemId(pub Uuid);

impl ItemId {
    /// Generate a fresh random identifier
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Build a deterministic identifier (fixtures, tests, restored state)
    pub const fn from_u128(value: u128) -> Self {
        Self(Uuid::from_u128(value))
    }
}

impl Default for ItemId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Item({})", self.0)
    }
}

/// An entry in the source list hierarchy, in owned value form.
///
/// Groups and leaves share this type: a group is simply an item whose
/// `children` is present and non-empty. Values of this type are what the
/// store hands out in snapshots and what callers pass in to insert or
/// replace nodes.
///
/// `Clone`, `PartialEq` and `Drop` work level by level with an explicit
/// stack, so arbitrarily deep values never exhaust the thread stack.
#[derive(Debug, Serialize, Deserialize)]
pub struct SourceItem {
    pub id: ItemId,

    pub title: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub badge: Option<String>,

    /// Child items. `Some(vec![])` and `None` both mean "no children" for
    /// `has_children`, but the store never leaves an emptied parent at
    /// `Some(vec![])` after a delete.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub children: Option<Vec<SourceItem>>,

    #[serde(default)]
    pub is_editable: bool,

    #[serde(default = "default_true")]
    pub is_selectable: bool,

    #[serde(default)]
    pub is_expanded: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Metadata>,
}

fn default_true() -> bool {
    true
}

impl SourceItem {
    /// Create a selectable, non-editable item with a fresh id
    pub fn new(title: impl Into<String>) -> Self {
        Self::with_id(ItemId::new(), title)
    }

    /// Create an item with an explicit id
    pub fn with_id(id: ItemId, title: impl Into<String>) -> Self {
        Self {
            id,
            title: title.into(),
            icon: None,
            badge: None,
            children: None,
            is_editable: false,
            is_selectable: true,
            is_expanded: false,
            metadata: None,
        }
    }

    /// Create a plain leaf item
    pub fn item(title: impl Into<String>) -> Self {
        Self::new(title)
    }

    /// Create a group holding `children`.
    ///
    /// Groups are not selectable by default.
    pub fn group(title: impl Into<String>, children: Vec<SourceItem>) -> Self {
        let mut group = Self::new(title);
        group.children = Some(children);
        group.is_selectable = false;
        group
    }

    pub fn id(mut self, id: ItemId) -> Self {
        self.id = id;
        self
    }

    pub fn icon(mut self, icon: impl Into<String>) -> Self {
        self.icon = Some(icon.into());
        self
    }

    pub fn badge(mut self, badge: impl Into<String>) -> Self {
        self.badge = Some(badge.into());
        self
    }

    pub fn children(mut self, children: Vec<SourceItem>) -> Self {
        self.children = Some(children);
        self
    }

    pub fn editable(mut self, editable: bool) -> Self {
        self.is_editable = editable;
        self
    }

    pub fn selectable(mut self, selectable: bool) -> Self {
        self.is_selectable = selectable;
        self
    }

    pub fn expanded(mut self, expanded: bool) -> Self {
        self.is_expanded = expanded;
        self
    }

    pub fn metadata(mut self, metadata: Metadata) -> Self {
        self.metadata = Some(metadata);
        self
    }

    /// Check if the item has at least one child
    pub fn has_children(&self) -> bool {
        self.children.as_ref().is_some_and(|c| !c.is_empty())
    }

    /// Same as `has_children`
    pub fn is_group(&self) -> bool {
        self.has_children()
    }

    /// Visit this item and all of its descendants in pre-order
    pub fn walk<'a>(&'a self, f: &mut impl FnMut(&'a SourceItem)) {
        let mut stack = vec![self];
        while let Some(item) = stack.pop() {
            f(item);
            if let Some(children) = &item.children {
                stack.extend(children.iter().rev());
            }
        }
    }

    /// Copy of the value fields with `children` in place of the item's own
    pub(crate) fn copy_with_children(&self, children: Option<Vec<SourceItem>>) -> SourceItem {
        SourceItem {
            id: self.id,
            title: self.title.clone(),
            icon: self.icon.clone(),
            badge: self.badge.clone(),
            children,
            is_editable: self.is_editable,
            is_selectable: self.is_selectable,
            is_expanded: self.is_expanded,
            metadata: self.metadata.clone(),
        }
    }

    /// Everything but the children
    fn same_value(&self, other: &SourceItem) -> bool {
        self.id == other.id
            && self.title == other.title
            && self.icon == other.icon
            && self.badge == other.badge
            && self.is_editable == other.is_editable
            && self.is_selectable == other.is_selectable
            && self.is_expanded == other.is_expanded
            && self.metadata == other.metadata
    }
}

impl Clone for SourceItem {
    fn clone(&self) -> Self {
        let children = self.children.as_ref().map(|children| {
            rebuild_forest(children, |item, rebuilt| {
                Some(item.copy_with_children(rebuilt))
            })
        });
        self.copy_with_children(children)
    }
}

impl PartialEq for SourceItem {
    fn eq(&self, other: &Self) -> bool {
        let mut stack = vec![(self, other)];
        while let Some((a, b)) = stack.pop() {
            if !a.same_value(b) {
                return false;
            }
            match (&a.children, &b.children) {
                (None, None) => {}
                (Some(x), Some(y)) if x.len() == y.len() => stack.extend(x.iter().zip(y)),
                _ => return false,
            }
        }
        true
    }
}

impl Drop for SourceItem {
    fn drop(&mut self) {
        let Some(mut stack) = self.children.take() else {
            return;
        };
        // Detach each level before the item goes out of scope so the drop
        // glue below never sees a child list
        while let Some(mut item) = stack.pop() {
            if let Some(children) = item.children.take() {
                stack.extend(children);
            }
        }
    }
}

/// Rebuild a forest bottom-up without recursion.
///
/// `build` is called once per item, children before parents, with the item
/// and its already rebuilt children (`None` when the item has no children
/// container). Returning `None` drops the item from its parent's list.
/// Sibling order is preserved.
pub(crate) fn rebuild_forest<'a>(
    roots: &'a [SourceItem],
    mut build: impl FnMut(&'a SourceItem, Option<Vec<SourceItem>>) -> Option<SourceItem>,
) -> Vec<SourceItem> {
    // Pre-order list of items with the index of their parent
    let mut order: Vec<(&'a SourceItem, Option<usize>)> = Vec::new();
    let mut stack: Vec<(&'a SourceItem, Option<usize>)> =
        roots.iter().rev().map(|item| (item, None)).collect();
    while let Some((item, parent)) = stack.pop() {
        let index = order.len();
        order.push((item, parent));
        if let Some(children) = &item.children {
            stack.extend(children.iter().rev().map(|child| (child, Some(index))));
        }
    }

    // Walking backwards visits children before parents, last sibling first
    let mut built: Vec<Option<Vec<SourceItem>>> = order
        .iter()
        .map(|(item, _)| item.children.as_ref().map(|_| Vec::new()))
        .collect();
    let mut forest = Vec::new();
    for index in (0..order.len()).rev() {
        let (item, parent) = order[index];
        let mut children = built[index].take();
        if let Some(children) = children.as_mut() {
            children.reverse();
        }
        let Some(rebuilt) = build(item, children) else {
            continue;
        };
        match parent {
            Some(parent) => {
                if let Some(siblings) = built[parent].as_mut() {
                    siblings.push(rebuilt);
                }
            }
            None => forest.push(rebuilt),
        }
    }
    forest.reverse();
    forest
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_item_defaults() {
        let item = SourceItem::item("Inbox");

        assert_eq!(item.title, "Inbox");
        assert!(item.icon.is_none());
        assert!(item.badge.is_none());
        assert!(item.children.is_none());
        assert!(!item.is_editable);
        assert!(item.is_selectable);
        assert!(!item.is_expanded);
        assert!(!item.has_children());
        assert!(!item.is_group());
    }

    #[test]
    fn test_group_is_not_selectable() {
        let group = SourceItem::group("Library", vec![SourceItem::item("Music")]);

        assert!(group.has_children());
        assert!(group.is_group());
        assert!(!group.is_selectable);
    }

    #[test]
    fn test_empty_children_is_not_a_group() {
        let item = SourceItem::item("Empty").children(vec![]);

        assert!(item.children.is_some());
        assert!(!item.has_children());
        assert!(!item.is_group());
    }

    #[test]
    fn test_fresh_ids_are_unique() {
        let a = SourceItem::item("A");
        let b = SourceItem::item("B");
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn test_builder_sets_fields() {
        let mut meta = Metadata::new();
        meta.insert("count".to_string(), json!(5));

        let item = SourceItem::item("Photos")
            .id(ItemId::from_u128(7))
            .icon("photo")
            .badge("12")
            .editable(true)
            .metadata(meta.clone());

        assert_eq!(item.id, ItemId::from_u128(7));
        assert_eq!(item.icon.as_deref(), Some("photo"));
        assert_eq!(item.badge.as_deref(), Some("12"));
        assert!(item.is_editable);
        assert_eq!(item.metadata, Some(meta));
    }

    #[test]
    fn test_walk_is_preorder() {
        let tree = SourceItem::group(
            "root",
            vec![
                SourceItem::group("a", vec![SourceItem::item("a1")]),
                SourceItem::item("b"),
            ],
        );

        let mut titles = Vec::new();
        tree.walk(&mut |item| titles.push(item.title.as_str()));
        assert_eq!(titles, vec!["root", "a", "a1", "b"]);
    }

    #[test]
    fn test_rebuild_forest_keeps_order_and_drops() {
        let forest = vec![
            SourceItem::group(
                "a",
                vec![
                    SourceItem::item("a1"),
                    SourceItem::item("skip"),
                    SourceItem::item("a2"),
                ],
            ),
            SourceItem::item("b"),
        ];

        let rebuilt = rebuild_forest(&forest, |item, children| {
            (item.title != "skip").then(|| item.copy_with_children(children))
        });

        let mut titles = Vec::new();
        for item in &rebuilt {
            item.walk(&mut |i| titles.push(i.title.clone()));
        }
        assert_eq!(titles, vec!["a", "a1", "a2", "b"]);
    }

    #[test]
    fn test_clone_and_eq_are_structural() {
        let tree = SourceItem::group("root", vec![SourceItem::item("child").badge("1")]);
        let mut copy = tree.clone();
        assert_eq!(copy, tree);

        if let Some(children) = copy.children.as_mut() {
            children[0].badge = None;
        }
        assert_ne!(copy, tree);
    }

    #[test]
    fn test_deep_chain_clone_compare_and_drop() {
        let mut deep = SourceItem::item("bottom");
        for level in 0..50_000 {
            deep = SourceItem::item(format!("level {level}")).children(vec![deep]);
        }

        let copy = deep.clone();
        assert!(copy == deep);

        let mut count = 0;
        copy.walk(&mut |_| count += 1);
        assert_eq!(count, 50_001);
    }

    #[test]
    fn test_deserialize_applies_defaults() {
        let id = ItemId::from_u128(1);
        let value = json!({ "id": id, "title": "Drafts" });

        let item: SourceItem = serde_json::from_value(value).unwrap();
        assert_eq!(item.id, id);
        assert!(item.is_selectable);
        assert!(!item.is_editable);
        assert!(item.children.is_none());
    }
}
