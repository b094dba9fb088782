use crate::model::{ItemId, Metadata, SourceItem};

/// A node as stored in the arena.
///
/// Same fields as `SourceItem`, except that children are referenced by id
/// and every node knows its parent.
#[derive(Debug, Clone, PartialEq)]
pub struct TreeNode {
    /// Unique identifier
    pub id: ItemId,
    pub title: String,
    pub icon: Option<String>,
    pub badge: Option<String>,
    pub is_editable: bool,
    pub is_selectable: bool,
    pub is_expanded: bool,
    pub metadata: Option<Metadata>,
    /// Parent node ID (None for roots)
    pub parent: Option<ItemId>,
    /// Ordered child IDs. `None` for leaves and for groups emptied by a delete.
    pub children: Option<Vec<ItemId>>,
}

impl TreeNode {
    /// Create an arena node from an item value, ignoring its children.
    ///
    /// The child id list is initialized to mirror whether the value carried a
    /// children container at all; the store fills it in as children are inserted.
    pub fn from_item(item: &SourceItem, parent: Option<ItemId>) -> Self {
        Self {
            id: item.id,
            title: item.title.clone(),
            icon: item.icon.clone(),
            badge: item.badge.clone(),
            is_editable: item.is_editable,
            is_selectable: item.is_selectable,
            is_expanded: item.is_expanded,
            metadata: item.metadata.clone(),
            parent,
            children: item.children.as_ref().map(|c| Vec::with_capacity(c.len())),
        }
    }

    /// Copy the value fields (everything but id, parent and children) from an item
    pub fn assign_from(&mut self, item: &SourceItem) {
        self.title = item.title.clone();
        self.icon = item.icon.clone();
        self.badge = item.badge.clone();
        self.is_editable = item.is_editable;
        self.is_selectable = item.is_selectable;
        self.is_expanded = item.is_expanded;
        self.metadata = item.metadata.clone();
    }

    /// Build the item value for this node with the given materialized children
    pub fn to_item(&self, children: Option<Vec<SourceItem>>) -> SourceItem {
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

    /// Child IDs as a slice (empty for leaves)
    pub fn child_ids(&self) -> &[ItemId] {
        self.children.as_deref().unwrap_or(&[])
    }

    /// Check if this node has at least one child
    pub fn has_children(&self) -> bool {
        !self.child_ids().is_empty()
    }

    /// Same as `has_children`
    pub fn is_group(&self) -> bool {
        self.has_children()
    }

    /// Check if this node is a root
    pub fn is_root(&self) -> bool {
        self.parent.is_none()
    }

    /// Get the depth of this node in the forest (roots are 0)
    pub fn depth(&self, get_parent: impl Fn(ItemId) -> Option<ItemId>) -> usize {
        let mut depth = 0;
        let mut current = self.parent;

        while let Some(parent_id) = current {
            depth += 1;
            current = get_parent(parent_id);
        }

        depth
    }
}
