use super::history::SelectionHistory;
use crate::config::SelectionConfig;
use crate::events::{ListenerId, Listeners};
use crate::model::ItemId;
use indexmap::IndexSet;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;

/// How `select_item` combines with the existing selection
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum SelectionMode {
    /// Selecting an item replaces the selection
    #[default]
    Single,
    /// Selecting an item adds it to the selection
    Multiple,
}

/// Published after every selection change with the selected ids in
/// selection order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectionChanged(pub Vec<ItemId>);

/// Tracks which items are selected and the order they were visited in.
///
/// The selection keeps insertion order, so `first_selected_id` is the
/// earliest still-selected item rather than whatever a hash set yields first.
pub struct SelectionTracker {
    mode: SelectionMode,
    selected: IndexSet<ItemId>,
    history: SelectionHistory,
    listeners: Listeners<SelectionChanged>,
}

impl SelectionTracker {
    /// Create a tracker in the given mode with the default history size
    pub fn new(mode: SelectionMode) -> Self {
        Self {
            mode,
            selected: IndexSet::new(),
            history: SelectionHistory::new(),
            listeners: Listeners::new(),
        }
    }

    /// Create a tracker from configuration. `SourceListConfig::validate`
    /// rejects a history size of 0; a tracker built from such a config keeps
    /// no history.
    pub fn from_config(config: &SelectionConfig) -> Self {
        Self {
            history: SelectionHistory::with_capacity(config.max_history_size),
            ..Self::new(config.mode)
        }
    }

    /// Register a listener for selection changes
    pub fn subscribe(&mut self, listener: impl FnMut(&SelectionChanged) + 'static) -> ListenerId {
        self.listeners.subscribe(listener)
    }

    /// Remove a listener
    pub fn unsubscribe(&mut self, id: ListenerId) -> bool {
        self.listeners.unsubscribe(id)
    }

    pub fn mode(&self) -> SelectionMode {
        self.mode
    }

    /// Change the selection mode. The current selection is left as is.
    pub fn set_mode(&mut self, mode: SelectionMode) {
        tracing::trace!("Selection mode {:?} -> {:?}", self.mode, mode);
        self.mode = mode;
    }

    pub fn max_history_size(&self) -> usize {
        self.history.max_entries()
    }

    /// Change the history cap, dropping the oldest entries if needed
    pub fn set_max_history_size(&mut self, max: usize) {
        self.history.set_max_entries(max);
    }

    /// Selected ids in selection order
    pub fn selected_ids(&self) -> impl Iterator<Item = ItemId> + '_ {
        self.selected.iter().copied()
    }

    pub fn selected_count(&self) -> usize {
        self.selected.len()
    }

    /// History entries, most recent first
    pub fn history(&self) -> &[ItemId] {
        self.history.entries()
    }

    /// Select an item according to the current mode and record it in history
    pub fn select_item(&mut self, id: ItemId) {
        match self.mode {
            SelectionMode::Single => {
                self.selected.clear();
                self.selected.insert(id);
            }
            SelectionMode::Multiple => {
                self.selected.insert(id);
            }
        }
        self.history.push(id);
        self.publish();
    }

    /// Remove an item from the selection
    pub fn deselect_item(&mut self, id: ItemId) {
        self.selected.shift_remove(&id);
        self.publish();
    }

    /// Deselect the item if it is selected, select it otherwise
    pub fn toggle_selection(&mut self, id: ItemId) {
        if self.is_selected(id) {
            self.deselect_item(id);
        } else {
            self.select_item(id);
        }
    }

    /// Deselect everything. Publishes even if nothing was selected.
    pub fn clear_selection(&mut self) {
        self.selected.clear();
        self.publish();
    }

    /// Select several items at once.
    ///
    /// In multiple mode all of `ids` are added and only the first one is
    /// recorded in history. In single mode this is `select_item` on the
    /// first id; the rest are ignored.
    pub fn select_items(&mut self, ids: &[ItemId]) {
        match self.mode {
            SelectionMode::Single => {
                if let Some(&first) = ids.first() {
                    self.select_item(first);
                }
            }
            SelectionMode::Multiple => {
                self.selected.extend(ids.iter().copied());
                if let Some(&first) = ids.first() {
                    self.history.push(first);
                }
                self.publish();
            }
        }
    }

    pub fn is_selected(&self, id: ItemId) -> bool {
        self.selected.contains(&id)
    }

    /// Earliest selected id that is still selected
    pub fn first_selected_id(&self) -> Option<ItemId> {
        self.selected.first().copied()
    }

    /// Most recently added id that is still selected
    pub fn last_selected_id(&self) -> Option<ItemId> {
        self.selected.last().copied()
    }

    /// Go back to the previously selected item.
    ///
    /// Re-selects the second history entry, which also moves it to the front
    /// of the history, so calling this repeatedly alternates between the two
    /// most recent items.
    pub fn navigate_to_previous(&mut self) -> Option<ItemId> {
        let previous = self.history.get(1)?;
        self.select_item(previous);
        Some(previous)
    }

    /// Forward navigation. Forward history is not tracked, so this never
    /// moves and always returns None.
    pub fn navigate_to_next(&mut self) -> Option<ItemId> {
        None
    }

    fn publish(&mut self) {
        tracing::trace!("Selection changed: {} selected", self.selected.len());
        if self.listeners.is_empty() {
            return;
        }
        let selected = SelectionChanged(self.selected.iter().copied().collect());
        self.listeners.emit(&selected);
    }
}

impl Default for SelectionTracker {
    fn default() -> Self {
        Self::new(SelectionMode::Single)
    }
}

impl fmt::Debug for SelectionTracker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SelectionTracker")
            .field("mode", &self.mode)
            .field("selected", &self.selected)
            .field("history", &self.history)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn id(n: u128) -> ItemId {
        ItemId::from_u128(n)
    }

    fn record(tracker: &mut SelectionTracker) -> Rc<RefCell<Vec<Vec<ItemId>>>> {
        let log = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&log);
        tracker.subscribe(move |event: &SelectionChanged| sink.borrow_mut().push(event.0.clone()));
        log
    }

    #[test]
    fn test_single_selection_mode() {
        let mut tracker = SelectionTracker::new(SelectionMode::Single);

        tracker.select_item(id(1));
        assert!(tracker.is_selected(id(1)));
        assert_eq!(tracker.selected_count(), 1);

        tracker.select_item(id(2));
        assert!(!tracker.is_selected(id(1)));
        assert!(tracker.is_selected(id(2)));
        assert_eq!(tracker.selected_count(), 1);
    }

    #[test]
    fn test_multiple_selection_mode() {
        let mut tracker = SelectionTracker::new(SelectionMode::Multiple);

        tracker.select_item(id(1));
        tracker.select_item(id(2));
        tracker.select_item(id(3));

        assert!(tracker.is_selected(id(1)));
        assert!(tracker.is_selected(id(2)));
        assert!(tracker.is_selected(id(3)));
        assert_eq!(tracker.selected_count(), 3);
    }

    #[test]
    fn test_toggle_selection() {
        let mut tracker = SelectionTracker::new(SelectionMode::Multiple);
        tracker.select_item(id(2));

        tracker.toggle_selection(id(1));
        assert!(tracker.is_selected(id(1)));

        tracker.toggle_selection(id(1));
        assert!(!tracker.is_selected(id(1)));
        assert!(tracker.is_selected(id(2)));
    }

    #[test]
    fn test_deselect_absent_is_noop() {
        let mut tracker = SelectionTracker::default();
        tracker.select_item(id(1));

        tracker.deselect_item(id(2));

        assert_eq!(tracker.selected_ids().collect::<Vec<_>>(), vec![id(1)]);
    }

    #[test]
    fn test_clear_selection_always_publishes() {
        let mut tracker = SelectionTracker::new(SelectionMode::Multiple);
        let log = record(&mut tracker);

        tracker.select_item(id(1));
        tracker.select_item(id(2));
        tracker.clear_selection();
        tracker.clear_selection();

        assert_eq!(tracker.selected_count(), 0);
        assert_eq!(
            *log.borrow(),
            vec![vec![id(1)], vec![id(1), id(2)], vec![], vec![]]
        );
    }

    #[test]
    fn test_selection_history() {
        let mut tracker = SelectionTracker::default();

        tracker.select_item(id(1));
        tracker.select_item(id(2));
        tracker.select_item(id(3));

        assert_eq!(tracker.history(), &[id(3), id(2), id(1)]);
    }

    #[test]
    fn test_history_cap() {
        let mut tracker = SelectionTracker::default();
        tracker.set_max_history_size(2);

        tracker.select_item(id(1));
        tracker.select_item(id(2));
        tracker.select_item(id(3));

        assert_eq!(tracker.history(), &[id(3), id(2)]);
    }

    #[test]
    fn test_history_deduplicates() {
        let mut tracker = SelectionTracker::default();

        tracker.select_item(id(1));
        tracker.select_item(id(2));
        tracker.select_item(id(1));

        assert_eq!(tracker.history(), &[id(1), id(2)]);
    }

    #[test]
    fn test_first_selected_id() {
        let mut tracker = SelectionTracker::default();

        tracker.select_item(id(1));
        assert_eq!(tracker.first_selected_id(), Some(id(1)));

        tracker.select_item(id(2));
        assert_eq!(tracker.first_selected_id(), Some(id(2)));
    }

    #[test]
    fn test_first_and_last_follow_selection_order() {
        let mut tracker = SelectionTracker::new(SelectionMode::Multiple);
        assert_eq!(tracker.first_selected_id(), None);

        tracker.select_item(id(3));
        tracker.select_item(id(1));
        tracker.select_item(id(2));
        assert_eq!(tracker.first_selected_id(), Some(id(3)));
        assert_eq!(tracker.last_selected_id(), Some(id(2)));

        tracker.deselect_item(id(3));
        assert_eq!(tracker.first_selected_id(), Some(id(1)));
    }

    #[test]
    fn test_select_items_multiple() {
        let mut tracker = SelectionTracker::new(SelectionMode::Multiple);
        let log = record(&mut tracker);
        tracker.select_item(id(9));

        tracker.select_items(&[id(1), id(2), id(3)]);

        assert_eq!(tracker.selected_count(), 4);
        assert_eq!(tracker.history(), &[id(1), id(9)]);
        assert_eq!(log.borrow().len(), 2);
    }

    #[test]
    fn test_select_items_single_uses_first() {
        let mut tracker = SelectionTracker::new(SelectionMode::Single);

        tracker.select_items(&[id(4), id(5)]);

        assert_eq!(tracker.selected_ids().collect::<Vec<_>>(), vec![id(4)]);
        assert_eq!(tracker.history(), &[id(4)]);
    }

    #[test]
    fn test_select_items_empty() {
        let mut single = SelectionTracker::new(SelectionMode::Single);
        let single_log = record(&mut single);
        single.select_items(&[]);
        assert!(single_log.borrow().is_empty());

        let mut multiple = SelectionTracker::new(SelectionMode::Multiple);
        let multiple_log = record(&mut multiple);
        multiple.select_items(&[]);
        assert_eq!(*multiple_log.borrow(), vec![Vec::<ItemId>::new()]);
        assert!(multiple.history().is_empty());
    }

    #[test]
    fn test_navigate_to_previous() {
        let mut tracker = SelectionTracker::default();
        assert_eq!(tracker.navigate_to_previous(), None);

        tracker.select_item(id(1));
        assert_eq!(tracker.navigate_to_previous(), None);

        tracker.select_item(id(2));
        assert_eq!(tracker.navigate_to_previous(), Some(id(1)));
        assert!(tracker.is_selected(id(1)));
        assert_eq!(tracker.history(), &[id(1), id(2)]);

        // Going back again returns to the item we just left
        assert_eq!(tracker.navigate_to_previous(), Some(id(2)));
    }

    #[test]
    fn test_navigate_to_next_is_not_tracked() {
        let mut tracker = SelectionTracker::default();
        tracker.select_item(id(1));
        tracker.select_item(id(2));
        tracker.navigate_to_previous();

        assert_eq!(tracker.navigate_to_next(), None);
        assert!(tracker.is_selected(id(1)));
    }

    #[test]
    fn test_from_config() {
        let config = SelectionConfig {
            mode: SelectionMode::Multiple,
            max_history_size: 3,
        };
        let tracker = SelectionTracker::from_config(&config);

        assert_eq!(tracker.mode(), SelectionMode::Multiple);
        assert_eq!(tracker.max_history_size(), 3);
    }

    #[test]
    fn test_switching_mode_keeps_selection() {
        let mut tracker = SelectionTracker::new(SelectionMode::Multiple);
        tracker.select_items(&[id(1), id(2)]);

        tracker.set_mode(SelectionMode::Single);
        assert_eq!(tracker.selected_count(), 2);

        tracker.select_item(id(3));
        assert_eq!(tracker.selected_ids().collect::<Vec<_>>(), vec![id(3)]);
    }

    mod property_tests {
        use super::*;
        use proptest::prelude::*;
        use std::collections::HashSet;

        proptest! {
            /// History never exceeds its cap, holds no duplicates, and starts
            /// with the latest selection
            #[test]
            fn prop_history_bounded_and_unique(
                picks in prop::collection::vec(0u128..20, 1..100),
                cap in 1usize..10
            ) {
                let mut tracker = SelectionTracker::new(SelectionMode::Multiple);
                tracker.set_max_history_size(cap);
                for &p in &picks {
                    tracker.select_item(id(p));
                }

                let history = tracker.history();
                prop_assert!(history.len() <= cap);
                let unique: HashSet<_> = history.iter().collect();
                prop_assert_eq!(unique.len(), history.len());
                prop_assert_eq!(history[0], id(*picks.last().unwrap()));
            }

            /// Single mode never holds more than one selected item
            #[test]
            fn prop_single_mode_selects_one(picks in prop::collection::vec(0u128..20, 1..50)) {
                let mut tracker = SelectionTracker::new(SelectionMode::Single);
                for &p in &picks {
                    tracker.toggle_selection(id(p));
                    prop_assert!(tracker.selected_count() <= 1);
                }
            }
        }
    }
}
