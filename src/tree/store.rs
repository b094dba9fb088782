use super::node::TreeNode;
use super::view::{self, VisibleItem};
use crate::config::StoreConfig;
use crate::events::{ListenerId, Listeners};
use crate::model::{ItemId, SourceItem};
use std::collections::{HashMap, HashSet};
use std::fmt;

/// Notification published by the store
#[derive(Debug, Clone, PartialEq)]
pub enum StoreEvent {
    /// A node (with its subtree) was added under `parent` (None for roots)
    Inserted {
        id: ItemId,
        parent: Option<ItemId>,
    },
    /// A node's value was changed in place. When `update_item` replaces the
    /// subtree, `Removed` and `Inserted` for the direct children come first.
    Updated { id: ItemId },
    /// A node (with its subtree) was removed from under `parent`
    Removed {
        id: ItemId,
        parent: Option<ItemId>,
    },
    /// Whole forest after a change
    ItemsChanged(Vec<SourceItem>),
    /// An item was renamed
    ItemRenamed { id: ItemId, title: String },
    /// `delete_item` was called for this id
    ItemDeleted(ItemId),
}

/// Error returned by store mutations.
///
/// None of these leave the forest modified: a failed call is a no-op.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TreeError {
    /// No node with this id exists in the forest
    NotFound(ItemId),
    /// The id is already used by another node
    DuplicateId(ItemId),
}

impl fmt::Display for TreeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TreeError::NotFound(id) => write!(f, "Item not found: {id}"),
            TreeError::DuplicateId(id) => write!(f, "Duplicate item id: {id}"),
        }
    }
}

impl std::error::Error for TreeError {}

/// Result of `find_item`: the node and its direct parent, both materialized
#[derive(Debug, Clone, PartialEq)]
pub struct FoundItem {
    pub item: SourceItem,
    /// None when the item is a root
    pub parent: Option<SourceItem>,
}

/// Owner of the source list forest.
///
/// Nodes live in a flat arena indexed by id; each node records its parent
/// and the ordered ids of its children. Callers exchange whole `SourceItem`
/// values with the store and never hold references into it across calls.
///
/// Listeners are called synchronously from inside the mutating call. They
/// receive the event by reference and cannot reach the store through it, so
/// re-entrant mutation is not possible without shared ownership; with
/// `Rc<RefCell<SourceListStore>>` it panics on the second borrow.
pub struct SourceListStore {
    /// All nodes indexed by ID
    nodes: HashMap<ItemId, TreeNode>,
    /// Root node IDs in display order
    roots: Vec<ItemId>,
    config: StoreConfig,
    listeners: Listeners<StoreEvent>,
}

impl SourceListStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::with_config(StoreConfig::default())
    }

    /// Create an empty store with the given configuration
    pub fn with_config(config: StoreConfig) -> Self {
        Self {
            nodes: HashMap::new(),
            roots: Vec::new(),
            config,
            listeners: Listeners::new(),
        }
    }

    /// Create a store holding `root_items`.
    ///
    /// # Errors
    ///
    /// Returns `DuplicateId` if any id appears more than once in the input.
    pub fn from_items(root_items: Vec<SourceItem>, config: StoreConfig) -> Result<Self, TreeError> {
        let mut store = Self::with_config(config);
        check_unique(root_items.iter(), |_| false)?;
        for item in root_items {
            let id = store.insert_subtree(item, None);
            store.roots.push(id);
        }
        Ok(store)
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// Register a listener for store events
    pub fn subscribe(&mut self, listener: impl FnMut(&StoreEvent) + 'static) -> ListenerId {
        self.listeners.subscribe(listener)
    }

    /// Remove a listener
    pub fn unsubscribe(&mut self, id: ListenerId) -> bool {
        self.listeners.unsubscribe(id)
    }

    /// Get a node by ID
    pub fn get(&self, id: ItemId) -> Option<&TreeNode> {
        self.nodes.get(&id)
    }

    /// Check whether a node with this id exists anywhere in the forest
    pub fn contains(&self, id: ItemId) -> bool {
        self.nodes.contains_key(&id)
    }

    /// Number of nodes in the forest, at any depth
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Root IDs in order
    pub fn root_ids(&self) -> &[ItemId] {
        &self.roots
    }

    /// Direct parent of a node (None for roots and unknown ids)
    pub fn parent_of(&self, id: ItemId) -> Option<ItemId> {
        self.get(id).and_then(|n| n.parent)
    }

    /// Ordered child IDs of a node (empty for leaves and unknown ids)
    pub fn children_of(&self, id: ItemId) -> &[ItemId] {
        self.get(id).map(|n| n.child_ids()).unwrap_or(&[])
    }

    /// Get the parent chain for a node (from root to node).
    /// Empty if the node does not exist.
    pub fn ancestors(&self, id: ItemId) -> Vec<ItemId> {
        let mut ancestors = Vec::new();
        let mut current = self.get(id).map(|n| n.id);

        while let Some(node_id) = current {
            ancestors.push(node_id);
            current = self.parent_of(node_id);
        }

        ancestors.reverse();
        ancestors
    }

    /// Get the depth of a node (roots are 0)
    pub fn depth(&self, id: ItemId) -> Option<usize> {
        self.get(id).map(|n| n.depth(|p| self.parent_of(p)))
    }

    /// The whole forest as owned values
    pub fn root_items(&self) -> Vec<SourceItem> {
        self.roots
            .iter()
            .filter_map(|&id| self.materialize(id))
            .collect()
    }

    /// Build the owned value of a node and its subtree
    pub fn materialize(&self, id: ItemId) -> Option<SourceItem> {
        self.get(id)?;

        // Reverse pre-order finishes every child before its parent
        let mut built: HashMap<ItemId, Vec<SourceItem>> = HashMap::new();
        for node_id in self.subtree_ids(id).into_iter().rev() {
            let Some(node) = self.get(node_id) else {
                continue;
            };
            let children = node.children.as_ref().map(|_| {
                let mut children = built.remove(&node_id).unwrap_or_default();
                children.reverse();
                children
            });
            let item = node.to_item(children);
            if node_id == id {
                return Some(item);
            }
            if let Some(parent) = node.parent {
                built.entry(parent).or_default().push(item);
            }
        }
        None
    }

    /// Locate a node and its direct parent
    pub fn find_item(&self, id: ItemId) -> Option<FoundItem> {
        let item = self.materialize(id)?;
        let parent = self.parent_of(id).and_then(|p| self.materialize(p));
        Some(FoundItem { item, parent })
    }

    /// All node IDs in pre-order (roots in order, each followed by its subtree)
    pub fn preorder_ids(&self) -> Vec<ItemId> {
        let mut out = Vec::with_capacity(self.nodes.len());
        for &root in &self.roots {
            self.collect_preorder(root, &mut out);
        }
        out
    }

    /// IDs of a node and all its descendants in pre-order (empty if unknown)
    pub fn subtree_ids(&self, id: ItemId) -> Vec<ItemId> {
        let mut out = Vec::new();
        if self.contains(id) {
            self.collect_preorder(id, &mut out);
        }
        out
    }

    fn collect_preorder(&self, id: ItemId, out: &mut Vec<ItemId>) {
        let mut stack = vec![id];
        while let Some(node_id) = stack.pop() {
            out.push(node_id);
            stack.extend(self.children_of(node_id).iter().rev());
        }
    }

    /// IDs of every node whose expansion flag is set, in pre-order
    pub fn expanded_ids(&self) -> Vec<ItemId> {
        self.preorder_ids()
            .into_iter()
            .filter(|id| self.get(*id).is_some_and(|n| n.is_expanded))
            .collect()
    }

    /// Get all visible nodes in tree order
    ///
    /// Returns a flat list of rows that should be shown, respecting the
    /// expansion state of their ancestors.
    pub fn visible_items(&self) -> Vec<VisibleItem> {
        let mut visible = Vec::new();
        let mut stack: Vec<(ItemId, usize)> = self.roots.iter().rev().map(|&r| (r, 0)).collect();

        while let Some((id, depth)) = stack.pop() {
            visible.push(VisibleItem { id, depth });

            if let Some(node) = self.get(id) {
                if node.is_expanded {
                    stack.extend(node.child_ids().iter().rev().map(|&c| (c, depth + 1)));
                }
            }
        }
        visible
    }

    /// Filtered copy of the forest for a search query.
    /// Does not modify the store.
    pub fn filter(&self, query: &str) -> Vec<SourceItem> {
        view::filter_items(&self.root_items(), query)
    }

    /// Plain text dump of the forest, one node per line
    pub fn outline(&self) -> String {
        view::outline(&self.root_items())
    }

    /// Replace the node with the same id as `item`, including its subtree.
    ///
    /// The node keeps its position and parent.
    ///
    /// # Errors
    ///
    /// `NotFound` if no node has `item.id`; `DuplicateId` if the new subtree
    /// uses an id that belongs to a node outside the replaced subtree.
    pub fn update_item(&mut self, item: SourceItem) -> Result<(), TreeError> {
        let id = item.id;
        if !self.contains(id) {
            tracing::trace!("update_item: {} not found", id);
            return Err(TreeError::NotFound(id));
        }

        let old_subtree: HashSet<ItemId> = self.subtree_ids(id).into_iter().collect();
        check_unique(std::iter::once(&item), |other| {
            self.contains(other) && !old_subtree.contains(&other)
        })?;

        let old_children = self
            .get(id)
            .map(|n| n.child_ids().to_vec())
            .unwrap_or_default();
        for &child in &old_children {
            self.remove_subtree(child);
        }

        let mut item = item;
        let new_children = item.children.take();
        if let Some(node) = self.nodes.get_mut(&id) {
            node.assign_from(&item);
            node.children = new_children.as_ref().map(|c| Vec::with_capacity(c.len()));
        }
        let mut added = Vec::new();
        if let Some(children) = new_children {
            for child in children {
                let child_id = self.insert_subtree(child, Some(id));
                self.attach(child_id, Some(id));
                added.push(child_id);
            }
        }

        tracing::debug!(
            "Updated item {} ({} children replaced by {})",
            id,
            old_children.len(),
            added.len()
        );
        for child in old_children {
            self.listeners.emit(&StoreEvent::Removed {
                id: child,
                parent: Some(id),
            });
        }
        for child in added {
            self.listeners.emit(&StoreEvent::Inserted {
                id: child,
                parent: Some(id),
            });
        }
        self.publish(StoreEvent::Updated { id });
        Ok(())
    }

    /// Change the title of an item.
    ///
    /// Publishes the regular change notification followed by `ItemRenamed`.
    /// Unknown ids publish nothing.
    pub fn rename_item(
        &mut self,
        id: ItemId,
        new_title: impl Into<String>,
    ) -> Result<(), TreeError> {
        let new_title = new_title.into();
        let Some(node) = self.nodes.get_mut(&id) else {
            tracing::trace!("rename_item: {} not found", id);
            return Err(TreeError::NotFound(id));
        };
        node.title = new_title.clone();

        tracing::debug!("Renamed item {} to {:?}", id, new_title);
        self.publish(StoreEvent::Updated { id });
        self.listeners.emit(&StoreEvent::ItemRenamed {
            id,
            title: new_title,
        });
        Ok(())
    }

    /// Remove a node and all of its descendants.
    ///
    /// A parent left without children gets its child list cleared to `None`.
    /// `ItemsChanged` and `ItemDeleted` are published even when the id is
    /// unknown, unless `notify_unknown_deletes` is off.
    pub fn delete_item(&mut self, id: ItemId) -> Result<(), TreeError> {
        let Some(parent) = self.get(id).map(|n| n.parent) else {
            tracing::trace!("delete_item: {} not found", id);
            if self.config.notify_unknown_deletes {
                self.broadcast_snapshot();
                self.listeners.emit(&StoreEvent::ItemDeleted(id));
            }
            return Err(TreeError::NotFound(id));
        };

        match parent {
            None => self.roots.retain(|&r| r != id),
            Some(parent_id) => {
                if let Some(parent_node) = self.nodes.get_mut(&parent_id) {
                    if let Some(children) = parent_node.children.as_mut() {
                        children.retain(|&c| c != id);
                        if children.is_empty() {
                            parent_node.children = None;
                        }
                    }
                }
            }
        }
        self.remove_subtree(id);

        tracing::debug!("Deleted item {}", id);
        self.publish(StoreEvent::Removed { id, parent });
        self.listeners.emit(&StoreEvent::ItemDeleted(id));
        Ok(())
    }

    /// Append an item (with its subtree) to the roots, or to the children of
    /// `parent_id`, creating the child list if needed.
    ///
    /// # Errors
    ///
    /// `NotFound` if `parent_id` is given but unknown; `DuplicateId` if any
    /// id in `item` is already in the forest. The forest is left unchanged.
    pub fn add_item(
        &mut self,
        item: SourceItem,
        parent_id: Option<ItemId>,
    ) -> Result<(), TreeError> {
        if let Some(parent_id) = parent_id {
            if !self.contains(parent_id) {
                tracing::trace!("add_item: parent {} not found", parent_id);
                return Err(TreeError::NotFound(parent_id));
            }
        }
        if let Err(e) = check_unique(std::iter::once(&item), |other| self.contains(other)) {
            tracing::warn!("Rejected add_item: {}", e);
            return Err(e);
        }

        let id = self.insert_subtree(item, parent_id);
        self.attach(id, parent_id);

        tracing::debug!("Added item {} under {:?}", id, parent_id);
        self.publish(StoreEvent::Inserted {
            id,
            parent: parent_id,
        });
        Ok(())
    }

    /// Flip the expansion state of a group.
    ///
    /// Returns `Ok(false)` without publishing if the node has no children.
    pub fn toggle_expansion(&mut self, id: ItemId) -> Result<bool, TreeError> {
        let expanded = self.get(id).ok_or(TreeError::NotFound(id))?.is_expanded;
        self.set_expanded(id, !expanded)
    }

    /// Expand a group. No-op if it is a leaf or already expanded.
    pub fn expand_item(&mut self, id: ItemId) -> Result<bool, TreeError> {
        self.set_expanded(id, true)
    }

    /// Collapse a group. No-op if it is a leaf or already collapsed.
    pub fn collapse_item(&mut self, id: ItemId) -> Result<bool, TreeError> {
        self.set_expanded(id, false)
    }

    fn set_expanded(&mut self, id: ItemId, expanded: bool) -> Result<bool, TreeError> {
        let node = self.nodes.get_mut(&id).ok_or(TreeError::NotFound(id))?;
        if !node.has_children() || node.is_expanded == expanded {
            tracing::trace!("set_expanded({}, {}): nothing to do", id, expanded);
            return Ok(false);
        }
        node.is_expanded = expanded;

        tracing::debug!("Set expanded={} on {}", expanded, id);
        self.publish(StoreEvent::Updated { id });
        Ok(true)
    }

    /// Insert a node and its descendants into the arena without linking it
    /// into a parent's child list or the roots
    fn insert_subtree(&mut self, item: SourceItem, parent: Option<ItemId>) -> ItemId {
        let id = item.id;
        let mut stack = vec![(item, parent)];

        while let Some((mut item, parent)) = stack.pop() {
            let children = item.children.take();
            let mut node = TreeNode::from_item(&item, parent);
            node.children = children
                .as_ref()
                .map(|c| c.iter().map(|child| child.id).collect());
            let node_id = node.id;
            self.nodes.insert(node_id, node);

            if let Some(children) = children {
                stack.extend(children.into_iter().map(|child| (child, Some(node_id))));
            }
        }

        id
    }

    /// Link an inserted node at the end of its parent's children or the roots
    fn attach(&mut self, id: ItemId, parent: Option<ItemId>) {
        match parent {
            None => self.roots.push(id),
            Some(parent_id) => {
                if let Some(node) = self.nodes.get_mut(&parent_id) {
                    node.children.get_or_insert_with(Vec::new).push(id);
                }
            }
        }
    }

    /// Remove a node and all its descendants from the arena
    fn remove_subtree(&mut self, id: ItemId) {
        let mut stack = vec![id];
        while let Some(node_id) = stack.pop() {
            if let Some(node) = self.nodes.remove(&node_id) {
                stack.extend(node.children.unwrap_or_default());
            }
        }
    }

    fn publish(&mut self, change: StoreEvent) {
        self.listeners.emit(&change);
        self.broadcast_snapshot();
    }

    fn broadcast_snapshot(&mut self) {
        if !self.config.broadcast_snapshots || self.listeners.is_empty() {
            return;
        }
        let snapshot = self.root_items();
        self.listeners.emit(&StoreEvent::ItemsChanged(snapshot));
    }
}

impl Default for SourceListStore {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for SourceListStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SourceListStore")
            .field("nodes", &self.nodes.len())
            .field("roots", &self.roots)
            .field("config", &self.config)
            .field("listeners", &self.listeners)
            .finish()
    }
}

/// Check that every id in `items` (and their subtrees) appears once and is
/// not reported as taken by `taken`
fn check_unique<'a>(
    items: impl Iterator<Item = &'a SourceItem>,
    taken: impl Fn(ItemId) -> bool,
) -> Result<(), TreeError> {
    let mut seen = HashSet::new();
    let mut duplicate = None;
    for item in items {
        item.walk(&mut |node| {
            if duplicate.is_none() && (!seen.insert(node.id) || taken(node.id)) {
                duplicate = Some(node.id);
            }
        });
    }
    match duplicate {
        Some(id) => Err(TreeError::DuplicateId(id)),
        None => Ok(()),
    }
}
