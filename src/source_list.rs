//! Source list: the tree store and selection tracker wired together the way a
//! sidebar drives them.
//!
//! This holds the small amount of per-view state a sidebar needs besides the
//! forest and the selection: the item being renamed inline and the current
//! search query. Item flags are honored here, not in the store: only
//! selectable items get selected and only editable items get an edit session.

use crate::config::{ConfigError, SourceListConfig};
use crate::model::{ItemId, SourceItem};
use crate::selection::{SelectionMode, SelectionTracker};
use crate::tree::{SourceListStore, TreeError};
use std::fmt;

/// Error returned by `SourceList::new`
#[derive(Debug)]
pub enum SourceListError {
    /// The configuration failed validation
    Config(ConfigError),
    /// The initial items are not a valid forest
    Tree(TreeError),
}

impl fmt::Display for SourceListError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceListError::Config(e) => write!(f, "Invalid configuration: {e}"),
            SourceListError::Tree(e) => write!(f, "Invalid items: {e}"),
        }
    }
}

impl std::error::Error for SourceListError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SourceListError::Config(e) => Some(e),
            SourceListError::Tree(e) => Some(e),
        }
    }
}

impl From<ConfigError> for SourceListError {
    fn from(e: ConfigError) -> Self {
        SourceListError::Config(e)
    }
}

impl From<TreeError> for SourceListError {
    fn from(e: TreeError) -> Self {
        SourceListError::Tree(e)
    }
}

#[derive(Debug)]
pub struct SourceList {
    store: SourceListStore,
    selection: SelectionTracker,
    /// Item currently being renamed inline
    editing: Option<ItemId>,
    search_query: String,
}

impl SourceList {
    /// Create a source list over `root_items`.
    ///
    /// The configuration is validated the same way `load_from_file` does.
    pub fn new(
        root_items: Vec<SourceItem>,
        config: &SourceListConfig,
    ) -> Result<Self, SourceListError> {
        config.validate()?;
        Ok(Self {
            store: SourceListStore::from_items(root_items, config.store.clone())?,
            selection: SelectionTracker::from_config(&config.selection),
            editing: None,
            search_query: String::new(),
        })
    }

    pub fn store(&self) -> &SourceListStore {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut SourceListStore {
        &mut self.store
    }

    pub fn selection(&self) -> &SelectionTracker {
        &self.selection
    }

    pub fn selection_mut(&mut self) -> &mut SelectionTracker {
        &mut self.selection
    }

    /// Select an item if it exists and is selectable
    pub fn select(&mut self, id: ItemId) -> bool {
        if !self.is_selectable(id) {
            tracing::trace!("select: {} is not selectable", id);
            return false;
        }
        self.selection.select_item(id);
        true
    }

    /// Handle a click on a row.
    ///
    /// In multiple mode a click toggles the item; in single mode it selects
    /// it. Returns false if the item is missing or not selectable.
    pub fn activate(&mut self, id: ItemId) -> bool {
        if !self.is_selectable(id) {
            return false;
        }
        match self.selection.mode() {
            SelectionMode::Multiple => self.selection.toggle_selection(id),
            SelectionMode::Single => self.selection.select_item(id),
        }
        true
    }

    fn is_selectable(&self, id: ItemId) -> bool {
        self.store.get(id).is_some_and(|n| n.is_selectable)
    }

    /// Start renaming an item. Only editable items can be renamed.
    pub fn begin_edit(&mut self, id: ItemId) -> bool {
        if !self.store.get(id).is_some_and(|n| n.is_editable) {
            return false;
        }
        self.editing = Some(id);
        true
    }

    /// Item currently being renamed
    pub fn editing_item(&self) -> Option<ItemId> {
        self.editing
    }

    /// Finish the current inline edit by renaming the item.
    ///
    /// Returns `Ok(false)` if no edit was in progress.
    pub fn commit_edit(&mut self, new_title: impl Into<String>) -> Result<bool, TreeError> {
        let Some(id) = self.editing.take() else {
            return Ok(false);
        };
        self.store.rename_item(id, new_title)?;
        Ok(true)
    }

    /// Abandon the current inline edit without renaming
    pub fn cancel_edit(&mut self) {
        self.editing = None;
    }

    pub fn search_query(&self) -> &str {
        &self.search_query
    }

    pub fn set_search_query(&mut self, query: impl Into<String>) {
        self.search_query = query.into();
    }

    /// Items to display: the whole forest, or its filtered copy while a
    /// search query is set
    pub fn displayed_items(&self) -> Vec<SourceItem> {
        self.store.filter(&self.search_query)
    }

    /// Expand a collapsed group or collapse an expanded one
    pub fn toggle_expansion(&mut self, id: ItemId) -> Result<bool, TreeError> {
        self.store.toggle_expansion(id)
    }

    /// Delete an item and its subtree, dropping them from the selection and
    /// ending an inline edit on any of them
    pub fn remove_item(&mut self, id: ItemId) -> Result<(), TreeError> {
        let removed = self.store.subtree_ids(id);
        self.store.delete_item(id)?;

        for gone in removed {
            if self.selection.is_selected(gone) {
                self.selection.deselect_item(gone);
            }
            if self.editing == Some(gone) {
                self.editing = None;
            }
        }
        Ok(())
    }
}
