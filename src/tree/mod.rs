// Source list tree store
//
// This module keeps the forest of source list items in a flat arena indexed
// by item id, with parent links and ordered child id lists, and exposes the
// find/update/rename/delete/add/expand operations over it.

pub mod node;
pub mod store;
pub mod view;

pub use node::TreeNode;
pub use store::{FoundItem, SourceListStore, StoreEvent, TreeError};
pub use view::{filter_items, outline, VisibleItem};
