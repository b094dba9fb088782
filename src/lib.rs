//! Source list engine: a hierarchical sidebar model with expansion,
//! selection and navigation history, independent of any UI toolkit.
//!
//! - [`tree::SourceListStore`] owns the forest and performs every mutation by id.
//! - [`selection::SelectionTracker`] owns the selection and its history.
//! - [`SourceList`] wires both together for a sidebar view.

pub mod config;
pub mod events;
pub mod model;
pub mod selection;
pub mod source_list;
pub mod tree;

pub use config::{ConfigError, SourceListConfig};
pub use model::{ItemId, SourceItem};
pub use selection::{SelectionMode, SelectionTracker};
pub use source_list::{SourceList, SourceListError};
pub use tree::{SourceListStore, StoreEvent, TreeError};
