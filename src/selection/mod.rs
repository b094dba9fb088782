// Selection state for source list items
//
// Single or multiple selection with a bounded back-navigation history.

pub mod history;
pub mod tracker;

pub use history::SelectionHistory;
pub use tracker::{SelectionChanged, SelectionMode, SelectionTracker};
